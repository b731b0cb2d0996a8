//! Wire types shared between the Lichess client and the bot runtime
//!
//! Both server streams are decoded once, at the boundary, into the closed
//! tagged unions in [`protocol`].

pub mod protocol;

pub use protocol::{
    decode_line, AccountEvent, Challenge, ChallengeInfo, ChatLine, Color, ColorChoice,
    DeclineForm, DeclineReason, GameEvent, GameFull, GameStart, GameState, GameStatus,
    OpponentGone, PerfStats, PlayerRef, UserProfile, Variant,
};
