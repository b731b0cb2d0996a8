//! Account-level orchestration
//!
//! - `registry` - bounded table of live game sessions
//! - `dispatcher` - account event stream: challenges in, workers out
//! - `matchmaker` - outgoing challenges while slots are free

pub mod dispatcher;
pub mod matchmaker;
pub mod registry;

pub use dispatcher::Dispatcher;
pub use matchmaker::{Matchmaker, MatchmakingConfig};
pub use registry::{Session, SessionRegistry};
