//! xfchess-bot - a Lichess bot account driven by a language model
//!
//! # Module Organization
//!
//! - `core` - errors and configuration
//! - `networking` - the [`GameServer`](networking::GameServer) seam and the Lichess client
//! - `game` - board tracking, oracle prompting and the per-game worker
//! - `lobby` - session registry, account event dispatcher, matchmaker
//!
//! Chess rules live in the `chess_rules` workspace crate and wire types in
//! `shared`.

pub mod core;
pub mod game;
pub mod lobby;
pub mod networking;
