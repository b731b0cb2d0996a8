//! Runtime infrastructure shared by every subsystem
//!
//! - [`BotError`] / [`BotResult`] - the crate-wide error type
//! - [`Cli`] / [`BotConfig`] - flags, environment and validation

pub mod config;
pub mod error;

pub use config::{BotConfig, Cli};
pub use error::{BotError, BotResult};
