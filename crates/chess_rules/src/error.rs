//! Error types for the rules engine
//!
//! Provides custom error types for move parsing, legality checks and
//! history replay.

use thiserror::Error;

/// Errors that can occur in the rules engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// Token is not valid SAN
    #[error("Unparseable SAN token: {token}")]
    InvalidSan { token: String },

    /// Token is not valid UCI
    #[error("Unparseable UCI token: {token}")]
    InvalidUci { token: String },

    /// Token parsed but does not name a legal move in the position
    #[error("Illegal move {token} in current position")]
    IllegalMove { token: String },

    /// Pawn-capture shorthand matches more than one legal capture
    #[error("Ambiguous move {token}: {candidates} legal captures match")]
    AmbiguousMove { token: String, candidates: usize },

    /// A move in a replayed history could not be applied
    #[error("History replay failed at ply {ply} ({token}): {reason}")]
    ReplayFailed {
        ply: usize,
        token: String,
        reason: String,
    },
}

/// Result type alias for rules engine operations
pub type RulesResult<T> = Result<T, RulesError>;
