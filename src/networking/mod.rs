//! Game server access
//!
//! Everything the bot needs from the chess server goes through
//! [`GameServer`]. The lobby and game workers only ever see the trait, so the
//! whole bot can be driven by a scripted server in tests.
//!
//! # Streams
//!
//! Both the account stream and per-game streams are newline-delimited JSON.
//! Keep-alive blank lines are swallowed; every other line is decoded into a
//! typed event from [`shared::protocol`]. A stream ending is a normal
//! condition the caller decides how to handle.
//!
//! # Errors
//!
//! Non-2xx responses become [`BotError::Api`](crate::core::BotError::Api)
//! with the status and body, so callers can tell conflicts (already accepted,
//! game gone) from transient failures.

pub mod client;
pub mod stream;

use async_trait::async_trait;
use shared::{AccountEvent, Challenge, DeclineReason, GameEvent, UserProfile};

use crate::core::BotResult;

pub use client::{LichessClient, LichessConfig};
pub use stream::{ndjson_stream, EventStream};

/// Operations the bot performs against the chess server
#[async_trait]
pub trait GameServer: Send + Sync {
    /// Account-wide event stream (challenges, game starts and finishes)
    async fn stream_incoming_events(&self) -> BotResult<EventStream<AccountEvent>>;

    /// Event stream for one game, starting with its full state
    async fn stream_game(&self, game_id: &str) -> BotResult<EventStream<GameEvent>>;

    async fn accept_challenge(&self, challenge_id: &str) -> BotResult<()>;

    async fn decline_challenge(&self, challenge_id: &str, reason: DeclineReason)
        -> BotResult<()>;

    /// Submit one move in UCI notation
    async fn make_move(&self, game_id: &str, uci: &str) -> BotResult<()>;

    async fn resign_game(&self, game_id: &str) -> BotResult<()>;

    async fn abort_game(&self, game_id: &str) -> BotResult<()>;

    /// Challenge `challenge.opponent`
    async fn create_challenge(&self, challenge: &Challenge) -> BotResult<()>;

    async fn user_profile(&self, username: &str) -> BotResult<UserProfile>;

    /// Bots currently online, at most `limit`
    async fn online_bots(&self, limit: usize) -> BotResult<Vec<UserProfile>>;
}
