//! Rules engine for xfchess-bot
//!
//! Thin layer over `shakmaty` exposing exactly what the bot needs: token
//! parsing in both notations, legality checks, history replay and terminal
//! position detection.
//!
//! ## Module Organization
//!
//! - `moves` - Notation conversion and legality (parse_uci, resolve_san, to_san)
//! - `replay` - Position reconstruction from a UCI history (replay_uci)
//! - `state` - Terminal detection (position_status, plus repetition via classify)

pub mod error;
mod moves;
mod replay;
mod state;

pub use error::{RulesError, RulesResult};
pub use moves::{is_legal_san, legal_moves, parse_uci, resolve_san, to_san, to_uci};
pub use replay::{classify, replay_tokens, replay_uci, Replay};
pub use state::{position_status, PositionStatus};

pub use shakmaty::{Chess, Color, Move, Position};
