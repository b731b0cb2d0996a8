//! Per-game logic
//!
//! - `tracker` - rebuilds the position and SAN transcript from server move lists
//! - `ai` - oracle prompting and move selection
//! - `session` - the worker that plays one game end to end

pub mod ai;
pub mod session;
pub mod tracker;

pub use session::{GameWorker, SessionState};
pub use tracker::{format_transcript, rebuild, TrackedPosition};
