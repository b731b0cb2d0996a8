//! Move generation from oracle output
//!
//! Turns unstructured completions into exactly one legal move:
//!
//! 1. Build the prompt (PGN header + transcript) once per decision
//! 2. Ask the oracle for a completion, bounded by a per-call timeout
//! 3. Extract the first move token and resolve it against the position
//! 4. On any failure back off and try again, up to `max_attempts`
//! 5. When attempts run out, apply the [`FallbackPolicy`]
//!
//! Every oracle call and backoff sleep races the session's cancellation
//! token, so shutdown never waits on a slow model.

use rand::seq::IndexedRandom;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chess_rules::{legal_moves, resolve_san, to_san, to_uci, Chess, Color, Move, RulesError};

use super::extractor::extract_move;
use super::oracle::Oracle;
use super::resource::{FallbackPolicy, RetryPolicy, SamplingConfig};
use crate::core::{BotError, BotResult};
use crate::game::tracker::TrackedPosition;

/// Per-call deadline used when none is configured
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a planned move came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    /// Accepted oracle output on the given (1-based) attempt
    Oracle { attempts: u32 },
    /// Picked by the random-legal fallback
    Fallback,
}

/// A legal move ready for submission
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMove {
    pub chess_move: Move,
    pub san: String,
    pub uci: String,
    pub source: MoveSource,
}

/// Result of one move decision
#[derive(Debug, Clone, PartialEq)]
pub enum MoveDecision {
    Play(PlannedMove),
    /// Oracle exhausted under [`FallbackPolicy::Resign`]
    Resign { attempts: u32 },
}

/// Why a single attempt was discarded
#[derive(Error, Debug)]
enum Rejection {
    #[error("oracle failed: {0}")]
    Oracle(BotError),

    #[error("no move token in {0:?}")]
    NoToken(String),

    #[error("{0}")]
    Rules(RulesError),
}

/// Oracle-backed move generator shared by all sessions
pub struct MoveGenerator {
    oracle: Arc<dyn Oracle>,
    sampling: SamplingConfig,
    retry: RetryPolicy,
    call_timeout: Duration,
}

impl MoveGenerator {
    pub fn new(oracle: Arc<dyn Oracle>, sampling: SamplingConfig, retry: RetryPolicy) -> Self {
        Self {
            oracle,
            sampling,
            retry,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Deadline for a single oracle call
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Decide a move for `our_color` in `tracked`
    ///
    /// # Errors
    ///
    /// - [`BotError::Cancelled`] if `cancel` fires first
    /// - [`BotError::NoLegalMove`] if the fallback has nothing to play
    pub async fn generate(
        &self,
        tracked: &TrackedPosition,
        our_color: Color,
        cancel: &CancellationToken,
    ) -> BotResult<MoveDecision> {
        let prompt = build_prompt(&tracked.transcript, our_color);
        let max_attempts = self.retry.max_attempts.max(1);

        debug!("[AI] Prompt:\n{}", prompt);

        for attempt in 0..max_attempts {
            let completion = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BotError::Cancelled),
                result = timeout(self.call_timeout, self.oracle.complete(&prompt, &self.sampling)) => {
                    result.unwrap_or(Err(BotError::OracleTimeout {
                        seconds: self.call_timeout.as_secs_f32(),
                    }))
                }
            };

            match self.accept_candidate(&tracked.position, completion) {
                Ok((chess_move, token)) => {
                    let planned = PlannedMove {
                        san: to_san(&tracked.position, &chess_move),
                        uci: to_uci(&chess_move),
                        chess_move,
                        source: MoveSource::Oracle {
                            attempts: attempt + 1,
                        },
                    };
                    info!(
                        "[AI] Accepted {} ({}) from token {:?} on attempt {}/{}",
                        planned.san,
                        planned.uci,
                        token,
                        attempt + 1,
                        max_attempts
                    );
                    return Ok(MoveDecision::Play(planned));
                }
                Err(rejection) => {
                    warn!(
                        "[AI] Attempt {}/{} rejected: {}",
                        attempt + 1,
                        max_attempts,
                        rejection
                    );
                }
            }

            if attempt + 1 < max_attempts {
                let wait = self.retry.backoff(attempt);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(BotError::Cancelled),
                    _ = sleep(wait) => {}
                }
            }
        }

        self.fallback(&tracked.position, max_attempts)
    }

    fn accept_candidate(
        &self,
        position: &Chess,
        completion: BotResult<String>,
    ) -> Result<(Move, String), Rejection> {
        let text = completion.map_err(Rejection::Oracle)?;
        let token = extract_move(&text).ok_or_else(|| Rejection::NoToken(text.clone()))?;
        let chess_move = resolve_san(position, token).map_err(Rejection::Rules)?;
        Ok((chess_move, token.to_string()))
    }

    fn fallback(&self, position: &Chess, attempts: u32) -> BotResult<MoveDecision> {
        match self.retry.fallback {
            FallbackPolicy::Resign => {
                warn!("[AI] Oracle exhausted after {} attempts, resigning", attempts);
                Ok(MoveDecision::Resign { attempts })
            }
            FallbackPolicy::RandomLegal => {
                let moves = legal_moves(position);
                let chess_move = moves
                    .choose(&mut rand::rng())
                    .cloned()
                    .ok_or(BotError::NoLegalMove { attempts })?;
                let planned = PlannedMove {
                    san: to_san(position, &chess_move),
                    uci: to_uci(&chess_move),
                    chess_move,
                    source: MoveSource::Fallback,
                };
                warn!(
                    "[AI] Oracle exhausted after {} attempts, playing random legal move {}",
                    attempts, planned.san
                );
                Ok(MoveDecision::Play(planned))
            }
        }
    }
}

/// PGN header followed by the transcript
///
/// The result tag claims a win for our side, which nudges the model toward
/// moves from the winning side's perspective.
pub fn build_prompt(transcript: &str, our_color: Color) -> String {
    let result = match our_color {
        Color::White => "1-0",
        Color::Black => "0-1",
    };
    format!(
        "[Event \"Shamkir Chess\"]\n\
         [White \"Anand, Viswanathan\"]\n\
         [Black \"Topalov, Veselin\"]\n\
         [Result \"{result}\"]\n\
         [WhiteElo \"2779\"]\n\
         [BlackElo \"2740\"]\n\
         \n\
         \n\
         {transcript}"
    )
}
