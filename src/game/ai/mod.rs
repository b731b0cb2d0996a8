//! Oracle-driven move selection
//!
//! The bot does not search. It asks a text-generation service to continue a
//! PGN transcript and plays the first legal move it can pull out of the reply.
//!
//! # Architecture
//!
//! - [`Oracle`]: seam over the completion service ([`OpenAiOracle`] in production)
//! - [`extract_move`]: first move-shaped token in free text
//! - [`MoveGenerator`]: prompt, retry, validate, fall back
//! - [`SamplingConfig`] / [`RetryPolicy`]: knobs shared by every session
//!
//! Legality is always checked against the tracked position before a move is
//! returned, so nothing the oracle says reaches the server unvalidated.

pub mod extractor;
pub mod generator;
pub mod oracle;
pub mod resource;

pub use extractor::extract_move;
pub use generator::{build_prompt, MoveDecision, MoveGenerator, MoveSource, PlannedMove};
pub use oracle::{OpenAiOracle, Oracle, OracleConfig};
pub use resource::{FallbackPolicy, RetryPolicy, SamplingConfig};
