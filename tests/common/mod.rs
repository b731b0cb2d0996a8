//! Scripted server and oracle shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shared::{
    AccountEvent, Challenge, ChallengeInfo, Color, DeclineReason, GameEvent, GameFull, GameStart,
    GameState, GameStatus, PerfStats, PlayerRef, UserProfile, Variant,
};
use xfchess_bot::core::{BotError, BotResult};
use xfchess_bot::game::ai::{
    FallbackPolicy, MoveGenerator, Oracle, RetryPolicy, SamplingConfig,
};
use xfchess_bot::networking::{EventStream, GameServer};

// ============================================================================
// Mock Game Server
// ============================================================================

/// In-memory server that replays scripted streams and records every request
#[derive(Default)]
pub struct MockServer {
    /// Events per game id; the stream stays open after the script unless
    /// `close_game_streams` is set
    pub game_scripts: Mutex<HashMap<String, Vec<GameEvent>>>,
    pub close_game_streams: AtomicBool,
    /// One script per account stream connection; exhausted scripts end the
    /// connection, and once all are used the stream stays open
    pub account_scripts: Mutex<VecDeque<Vec<AccountEvent>>>,
    pub account_connections: AtomicU32,

    pub profile: Mutex<Option<UserProfile>>,
    pub online: Mutex<Vec<UserProfile>>,
    pub accept_error_status: Mutex<Option<u16>>,
    pub failing_opponents: Mutex<HashSet<String>>,

    pub moves: Mutex<Vec<(String, String)>>,
    pub accepted: Mutex<Vec<String>>,
    pub declined: Mutex<Vec<(String, DeclineReason)>>,
    pub resigned: Mutex<Vec<String>>,
    pub aborted: Mutex<Vec<String>>,
    pub challenges: Mutex<Vec<Challenge>>,
    pub profile_requests: AtomicU32,
}

impl MockServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_game(&self, game_id: &str, events: Vec<GameEvent>) {
        self.game_scripts.lock().insert(game_id.to_string(), events);
    }

    pub fn moves_for(&self, game_id: &str) -> Vec<String> {
        self.moves
            .lock()
            .iter()
            .filter(|(id, _)| id == game_id)
            .map(|(_, uci)| uci.clone())
            .collect()
    }
}

#[async_trait]
impl GameServer for MockServer {
    async fn stream_incoming_events(&self) -> BotResult<EventStream<AccountEvent>> {
        self.account_connections.fetch_add(1, Ordering::SeqCst);
        match self.account_scripts.lock().pop_front() {
            Some(events) => Ok(stream::iter(events.into_iter().map(Ok)).boxed()),
            None => Ok(stream::pending().boxed()),
        }
    }

    async fn stream_game(&self, game_id: &str) -> BotResult<EventStream<GameEvent>> {
        let events = self
            .game_scripts
            .lock()
            .get(game_id)
            .cloned()
            .unwrap_or_default();
        let scripted = stream::iter(events.into_iter().map(Ok));
        if self.close_game_streams.load(Ordering::SeqCst) {
            Ok(scripted.boxed())
        } else {
            Ok(scripted.chain(stream::pending()).boxed())
        }
    }

    async fn accept_challenge(&self, challenge_id: &str) -> BotResult<()> {
        if let Some(status) = *self.accept_error_status.lock() {
            return Err(BotError::Api {
                status,
                message: "{\"error\":\"Challenge already accepted\"}".to_string(),
            });
        }
        self.accepted.lock().push(challenge_id.to_string());
        Ok(())
    }

    async fn decline_challenge(&self, challenge_id: &str, reason: DeclineReason) -> BotResult<()> {
        self.declined.lock().push((challenge_id.to_string(), reason));
        Ok(())
    }

    async fn make_move(&self, game_id: &str, uci: &str) -> BotResult<()> {
        self.moves.lock().push((game_id.to_string(), uci.to_string()));
        Ok(())
    }

    async fn resign_game(&self, game_id: &str) -> BotResult<()> {
        self.resigned.lock().push(game_id.to_string());
        Ok(())
    }

    async fn abort_game(&self, game_id: &str) -> BotResult<()> {
        self.aborted.lock().push(game_id.to_string());
        Ok(())
    }

    async fn create_challenge(&self, challenge: &Challenge) -> BotResult<()> {
        if self.failing_opponents.lock().contains(&challenge.opponent) {
            return Err(BotError::Api {
                status: 400,
                message: "{\"error\":\"not accepting challenges\"}".to_string(),
            });
        }
        self.challenges.lock().push(challenge.clone());
        Ok(())
    }

    async fn user_profile(&self, username: &str) -> BotResult<UserProfile> {
        self.profile_requests.fetch_add(1, Ordering::SeqCst);
        self.profile.lock().clone().ok_or_else(|| BotError::Api {
            status: 404,
            message: format!("no such user {username}"),
        })
    }

    async fn online_bots(&self, limit: usize) -> BotResult<Vec<UserProfile>> {
        Ok(self.online.lock().iter().take(limit).cloned().collect())
    }
}

// ============================================================================
// Mock Oracle
// ============================================================================

/// Oracle that answers from a script, then with `default_answer`
pub struct MockOracle {
    script: Mutex<VecDeque<String>>,
    default_answer: String,
    calls: AtomicU32,
    pub prompts: Mutex<Vec<String>>,
}

impl MockOracle {
    pub fn answering(default_answer: &str) -> Arc<Self> {
        Self::scripted(Vec::new(), default_answer)
    }

    pub fn scripted(script: Vec<&str>, default_answer: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().map(str::to_string).collect()),
            default_answer: default_answer.to_string(),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn complete(&self, prompt: &str, _sampling: &SamplingConfig) -> BotResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        Ok(self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_answer.clone()))
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn generator(oracle: Arc<MockOracle>, max_attempts: u32, fallback: FallbackPolicy) -> Arc<MoveGenerator> {
    let retry = RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
        fallback,
    };
    Arc::new(MoveGenerator::new(oracle, SamplingConfig::default(), retry))
}

pub fn game_start(id: &str, color: Color) -> GameStart {
    GameStart {
        id: id.to_string(),
        color,
        fen: None,
        opponent: Some(player("rival", Some(1500))),
        rated: true,
        speed: Some("bullet".to_string()),
        variant: None,
        is_my_turn: color == Color::White,
    }
}

pub fn game_state(moves: &str, status: GameStatus) -> GameState {
    GameState {
        moves: moves.to_string(),
        status,
        winner: None,
        wtime: Some(60_000),
        btime: Some(60_000),
    }
}

pub fn game_full(id: &str, moves: &str) -> GameEvent {
    GameEvent::GameFull(GameFull {
        id: id.to_string(),
        white: Some(player("white", None)),
        black: Some(player("black", None)),
        initial_fen: Some("startpos".to_string()),
        variant: Some(Variant {
            key: "standard".to_string(),
            name: Some("Standard".to_string()),
        }),
        state: game_state(moves, GameStatus::Started),
    })
}

pub fn player(name: &str, rating: Option<i32>) -> PlayerRef {
    PlayerRef {
        id: Some(name.to_lowercase()),
        username: Some(name.to_string()),
        rating,
    }
}

pub fn challenge(id: &str, challenger: &str, variant: &str) -> ChallengeInfo {
    ChallengeInfo {
        id: id.to_string(),
        challenger: Some(player(challenger, Some(1500))),
        dest_user: Some(player("xfbot", Some(1500))),
        rated: true,
        speed: Some("bullet".to_string()),
        variant: Some(Variant {
            key: variant.to_string(),
            name: None,
        }),
    }
}

pub fn profile(username: &str, bullet: Option<i32>) -> UserProfile {
    let mut perfs = HashMap::new();
    if let Some(rating) = bullet {
        perfs.insert(
            "bullet".to_string(),
            PerfStats {
                rating,
                games: 100,
                prov: false,
            },
        );
    }
    UserProfile {
        id: username.to_lowercase(),
        username: username.to_string(),
        perfs,
    }
}

/// Poll `condition` until it holds or two seconds pass
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
