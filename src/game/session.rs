//! Game session worker
//!
//! One worker plays one game from the moment it starts until it ends. It
//! consumes the game's event stream strictly in arrival order and drives a
//! small state machine:
//!
//! | Event                         | Effect                                  |
//! |-------------------------------|-----------------------------------------|
//! | `gameFull` / `gameState`      | rebuild position, then decide whose turn |
//! | terminal position or status   | `Finished`, stop consuming              |
//! | our colour to move            | `OurTurn`: generate and submit a move   |
//! | opponent to move              | `OpponentTurn`: wait                    |
//! | `chatLine` / `opponentGone`   | logged only                             |
//!
//! The worker removes its own registry entry on every exit path, including
//! errors, cancellation and panics.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use chess_rules::Color;
use shared::{GameEvent, GameFull, GameStart, GameState};

use crate::core::{BotError, BotResult};
use crate::game::ai::{MoveDecision, MoveGenerator};
use crate::game::tracker::{rebuild, TrackedPosition};
use crate::lobby::SessionRegistry;
use crate::networking::GameServer;

/// Move submission attempts before the session gives up
const SUBMIT_ATTEMPTS: u32 = 3;
const SUBMIT_BACKOFF: Duration = Duration::from_millis(500);

/// Worker state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the first state-bearing event
    Idle,
    OurTurn,
    OpponentTurn,
    /// Game over; no further events are consumed
    Finished,
}

/// Plays a single game
pub struct GameWorker {
    game_id: String,
    our_color: Color,
    server: Arc<dyn GameServer>,
    generator: Arc<MoveGenerator>,
    cancel: CancellationToken,
    state: SessionState,
    /// Ply at which we last submitted, so a repeated state is not answered twice
    submitted_ply: Option<usize>,
}

impl GameWorker {
    pub fn new(
        start: &GameStart,
        server: Arc<dyn GameServer>,
        generator: Arc<MoveGenerator>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            game_id: start.id.clone(),
            our_color: rules_color(start.color),
            server,
            generator,
            cancel,
            state: SessionState::Idle,
            submitted_ply: None,
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Play the game to completion, then deregister from `registry`
    pub async fn run(mut self, registry: Arc<SessionRegistry>) {
        let _deregister = DeregisterOnDrop {
            registry,
            game_id: self.game_id.clone(),
        };
        let span = info_span!("game", id = %self.game_id);

        async move {
            info!("[GAME] Session started as {:?}", self.our_color);
            match self.play().await {
                Ok(()) => info!("[GAME] Session finished"),
                Err(BotError::Cancelled) => info!("[GAME] Session cancelled"),
                Err(err @ BotError::UnsupportedGame { .. }) => {
                    warn!("[GAME] {}, resigning", err);
                    if let Err(err) = self.server.resign_game(&self.game_id).await {
                        warn!("[GAME] Resign failed: {}", err);
                    }
                }
                Err(err) => error!("[GAME] Session failed: {}", err),
            }
        }
        .instrument(span)
        .await
    }

    async fn play(&mut self) -> BotResult<()> {
        let mut events = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(BotError::Cancelled),
            stream = self.server.stream_game(&self.game_id) => stream?,
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(BotError::Cancelled),
                next = events.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    if self.handle_event(event).await? == SessionState::Finished {
                        return Ok(());
                    }
                }
                Some(Err(BotError::Decode(err))) => {
                    warn!("[GAME] Skipping undecodable event: {}", err);
                }
                Some(Err(err)) => return Err(err),
                None => {
                    info!("[GAME] Game stream closed");
                    self.transition(SessionState::Finished);
                    return Ok(());
                }
            }
        }
    }

    /// Apply one event and return the resulting state
    pub async fn handle_event(&mut self, event: GameEvent) -> BotResult<SessionState> {
        match event {
            GameEvent::GameFull(full) => {
                self.check_supported(&full)?;
                self.apply_state(&full.state).await
            }
            GameEvent::GameState(state) => self.apply_state(&state).await,
            GameEvent::ChatLine(chat) => {
                debug!("[GAME] Chat [{}] {}: {}", chat.room, chat.username, chat.text);
                Ok(self.state)
            }
            GameEvent::OpponentGone(gone) => {
                info!(
                    "[GAME] Opponent gone: {} (claim in {:?}s)",
                    gone.gone, gone.claim_win_in_seconds
                );
                Ok(self.state)
            }
            GameEvent::Unsupported => Ok(self.state),
        }
    }

    fn check_supported(&self, full: &GameFull) -> BotResult<()> {
        if full.variant.as_ref().is_some_and(|variant| !variant.is_standard()) {
            return Err(BotError::UnsupportedGame {
                game_id: self.game_id.clone(),
                reason: "non-standard variant".to_string(),
            });
        }
        if !full.starts_from_initial_position() {
            return Err(BotError::UnsupportedGame {
                game_id: self.game_id.clone(),
                reason: "custom initial position".to_string(),
            });
        }
        Ok(())
    }

    async fn apply_state(&mut self, state: &GameState) -> BotResult<SessionState> {
        let tracked = rebuild(&self.game_id, &state.moves)?;

        if !state.status.is_ongoing() {
            info!(
                "[GAME] Server reports {:?} (winner: {:?}) after {} plies",
                state.status,
                state.winner,
                tracked.ply()
            );
            return Ok(self.transition(SessionState::Finished));
        }

        let status = tracked.status();
        if status.is_terminal() {
            info!("[GAME] Position is terminal: {:?} ({})", status, status.result());
            return Ok(self.transition(SessionState::Finished));
        }

        if tracked.turn() != self.our_color {
            return Ok(self.transition(SessionState::OpponentTurn));
        }

        self.transition(SessionState::OurTurn);
        if self.submitted_ply == Some(tracked.ply()) {
            debug!("[GAME] Already moved at ply {}", tracked.ply());
            return Ok(self.state);
        }
        self.take_turn(&tracked).await
    }

    async fn take_turn(&mut self, tracked: &TrackedPosition) -> BotResult<SessionState> {
        match self
            .generator
            .generate(tracked, self.our_color, &self.cancel)
            .await?
        {
            MoveDecision::Play(planned) => {
                self.submit(&planned.uci).await?;
                self.submitted_ply = Some(tracked.ply());
                info!(
                    "[GAME] Played {} ({}) at ply {} via {:?}",
                    planned.san,
                    planned.uci,
                    tracked.ply(),
                    planned.source
                );
                Ok(self.transition(SessionState::OpponentTurn))
            }
            MoveDecision::Resign { attempts } => {
                info!("[GAME] Resigning after {} failed attempts", attempts);
                self.server.resign_game(&self.game_id).await?;
                Ok(self.transition(SessionState::Finished))
            }
        }
    }

    /// Submit a move, retrying transient failures with backoff
    async fn submit(&self, uci: &str) -> BotResult<()> {
        let mut attempt = 0;
        loop {
            match self.server.make_move(&self.game_id, uci).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() && attempt + 1 < SUBMIT_ATTEMPTS => {
                    let wait = SUBMIT_BACKOFF * 2u32.pow(attempt);
                    warn!(
                        "[GAME] Move {} submission failed ({}), retrying in {:?}",
                        uci, err, wait
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(BotError::Cancelled),
                        _ = tokio::time::sleep(wait) => {}
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn transition(&mut self, next: SessionState) -> SessionState {
        if self.state != next {
            debug!("[GAME] {:?} -> {:?}", self.state, next);
            self.state = next;
        }
        next
    }
}

/// Removes the registry entry however the worker exits
struct DeregisterOnDrop {
    registry: Arc<SessionRegistry>,
    game_id: String,
}

impl Drop for DeregisterOnDrop {
    fn drop(&mut self) {
        self.registry.deregister(&self.game_id);
    }
}

fn rules_color(color: shared::Color) -> Color {
    match color {
        shared::Color::White => Color::White,
        shared::Color::Black => Color::Black,
    }
}
