//! Error types for the bot runtime
//!
//! Provides the error type shared by the networking layer, the move
//! generator, session workers and the lobby loops.

use chess_rules::RulesError;
use thiserror::Error;

/// Errors that can occur while running the bot
#[derive(Error, Debug)]
pub enum BotError {
    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Stream read failure
    #[error("Stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Server answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Payload did not match the expected schema
    #[error("Failed to decode server payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Server-supplied history does not replay
    #[error("Protocol inconsistency in game {game_id}: {source}")]
    ProtocolInconsistency {
        game_id: String,
        #[source]
        source: RulesError,
    },

    /// Game uses a setup or variant the bot cannot play
    #[error("Unsupported game {game_id}: {reason}")]
    UnsupportedGame { game_id: String, reason: String },

    /// The text-generation service failed or returned nothing usable
    #[error("Oracle error: {message}")]
    Oracle { message: String },

    /// Oracle call exceeded its deadline
    #[error("Oracle call timed out after {seconds:.1}s")]
    OracleTimeout { seconds: f32 },

    /// No legal move could be produced and no fallback applies
    #[error("No legal move available after {attempts} attempts")]
    NoLegalMove { attempts: u32 },

    /// Game id already present in the session registry
    #[error("Session already registered: {game_id}")]
    SessionAlreadyRegistered { game_id: String },

    /// Session registry is at capacity
    #[error("Session registry full ({capacity} games)")]
    RegistryFull { capacity: usize },

    /// Invalid or missing configuration value
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Work was cancelled by shutdown
    #[error("Cancelled")]
    Cancelled,
}

impl BotError {
    /// Conflict-style rejection of an idempotent request
    ///
    /// Lichess answers 400/404/409 when accepting a challenge that is already
    /// accepted or gone; callers treat these as success.
    pub fn is_conflict(&self) -> bool {
        matches!(self, BotError::Api { status, .. } if matches!(status, 400 | 404 | 409))
    }

    /// Failures worth retrying (network errors, 429, 5xx)
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::Http(_) | BotError::Io(_) => true,
            BotError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for bot operations
pub type BotResult<T> = Result<T, BotError>;
