use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Player colour as the server spells it
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

/// Events on the account-wide stream (`/api/stream/event`)
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AccountEvent {
    Challenge { challenge: ChallengeInfo },
    ChallengeCanceled { challenge: ChallengeInfo },
    ChallengeDeclined { challenge: ChallengeInfo },
    GameStart { game: GameStart },
    GameFinish { game: GameStart },
    #[serde(other)]
    Unsupported,
}

/// Incoming or outgoing challenge
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeInfo {
    pub id: String,
    #[serde(default)]
    pub challenger: Option<PlayerRef>,
    #[serde(default)]
    pub dest_user: Option<PlayerRef>,
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub variant: Option<Variant>,
}

impl ChallengeInfo {
    /// Challenges without a variant field are standard chess
    pub fn is_standard(&self) -> bool {
        self.variant.as_ref().map_or(true, Variant::is_standard)
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Variant {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Variant {
    pub fn is_standard(&self) -> bool {
        self.key == "standard"
    }
}

/// Lightweight user reference embedded in challenges and game starts
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct PlayerRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "name")]
    pub username: Option<String>,
    #[serde(default)]
    pub rating: Option<i32>,
}

/// Game announcement carried by `gameStart` / `gameFinish`
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameStart {
    pub id: String,
    pub color: Color,
    #[serde(default)]
    pub fen: Option<String>,
    #[serde(default)]
    pub opponent: Option<PlayerRef>,
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub variant: Option<Variant>,
    #[serde(default)]
    pub is_my_turn: bool,
}

/// Events on a per-game stream (`/api/bot/game/stream/{id}`)
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    GameFull(GameFull),
    GameState(GameState),
    ChatLine(ChatLine),
    OpponentGone(OpponentGone),
    #[serde(other)]
    Unsupported,
}

impl GameEvent {
    /// Authoritative state carried by the event, if any
    pub fn state(&self) -> Option<&GameState> {
        match self {
            GameEvent::GameFull(full) => Some(&full.state),
            GameEvent::GameState(state) => Some(state),
            GameEvent::ChatLine(_) | GameEvent::OpponentGone(_) | GameEvent::Unsupported => None,
        }
    }
}

/// Snapshot sent first on every game stream
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameFull {
    pub id: String,
    #[serde(default)]
    pub white: Option<PlayerRef>,
    #[serde(default)]
    pub black: Option<PlayerRef>,
    #[serde(default)]
    pub initial_fen: Option<String>,
    #[serde(default)]
    pub variant: Option<Variant>,
    pub state: GameState,
}

impl GameFull {
    /// Games that start from the normal initial position
    pub fn starts_from_initial_position(&self) -> bool {
        matches!(self.initial_fen.as_deref(), None | Some("startpos"))
    }
}

/// Cumulative move list and clock state
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct GameState {
    /// Space-separated UCI moves from the start of the game
    #[serde(default)]
    pub moves: String,
    pub status: GameStatus,
    #[serde(default)]
    pub winner: Option<Color>,
    #[serde(default)]
    pub wtime: Option<u64>,
    #[serde(default)]
    pub btime: Option<u64>,
}

/// Server-side game status
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Created,
    Started,
    Aborted,
    Mate,
    Resign,
    Stalemate,
    Timeout,
    Draw,
    Outoftime,
    Cheat,
    NoStart,
    UnknownFinish,
    VariantEnd,
    #[serde(other)]
    Other,
}

impl GameStatus {
    pub fn is_ongoing(self) -> bool {
        matches!(self, GameStatus::Created | GameStatus::Started)
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ChatLine {
    pub username: String,
    pub text: String,
    pub room: String,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpponentGone {
    pub gone: bool,
    #[serde(default)]
    pub claim_win_in_seconds: Option<u32>,
}

/// Public profile, also the line format of `/api/bot/online`
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub perfs: HashMap<String, PerfStats>,
}

impl UserProfile {
    /// Rating in the given perf (`bullet`, `blitz`, ...)
    pub fn rating(&self, perf: &str) -> Option<i32> {
        self.perfs.get(perf).map(|stats| stats.rating)
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct PerfStats {
    pub rating: i32,
    #[serde(default)]
    pub games: u32,
    #[serde(default)]
    pub prov: bool,
}

/// Colour requested when challenging
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    White,
    Black,
    Random,
}

/// Outgoing challenge
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Challenge {
    #[serde(skip)]
    pub opponent: String,
    pub rated: bool,
    /// Initial clock in seconds
    #[serde(rename = "clock.limit")]
    pub clock_limit: u32,
    /// Increment in seconds
    #[serde(rename = "clock.increment")]
    pub clock_increment: u32,
    pub color: ColorChoice,
}

/// Reason sent when declining a challenge
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DeclineReason {
    Generic,
    Later,
    Standard,
    Variant,
}

#[derive(Serialize)]
pub struct DeclineForm {
    pub reason: DeclineReason,
}

/// Decode one NDJSON line; blank keep-alive lines yield `None`
pub fn decode_line<T>(line: &str) -> Result<Option<T>, serde_json::Error>
where
    T: for<'de> Deserialize<'de>,
{
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}
