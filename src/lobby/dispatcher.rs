//! Account event dispatcher
//!
//! Consumes the account-wide event stream and reacts to each event:
//!
//! - **challenge**: decline with `later` when every game slot is taken,
//!   decline with `standard` for variants, otherwise accept
//! - **gameStart**: register a session and spawn its worker
//! - **gameFinish**, **challengeCanceled**, **challengeDeclined**: logged
//!
//! The stream is reopened after `reconnect_delay` whenever it ends or fails.
//! Lichess replays `gameStart` for games in progress on reconnect; those
//! duplicates are ignored by the registry.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use shared::{AccountEvent, ChallengeInfo, DeclineReason, GameStart};

use crate::core::{BotError, BotResult};
use crate::game::ai::MoveGenerator;
use crate::game::GameWorker;
use crate::lobby::SessionRegistry;
use crate::networking::GameServer;

const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub struct Dispatcher {
    username: String,
    server: Arc<dyn GameServer>,
    registry: Arc<SessionRegistry>,
    generator: Arc<MoveGenerator>,
    reconnect_delay: Duration,
}

impl Dispatcher {
    pub fn new(
        username: impl Into<String>,
        server: Arc<dyn GameServer>,
        registry: Arc<SessionRegistry>,
        generator: Arc<MoveGenerator>,
    ) -> Self {
        Self {
            username: username.into(),
            server,
            registry,
            generator,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn with_reconnect_delay(mut self, reconnect_delay: Duration) -> Self {
        self.reconnect_delay = reconnect_delay;
        self
    }

    /// Consume the account stream until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) {
        while !cancel.is_cancelled() {
            let opened = tokio::select! {
                _ = cancel.cancelled() => break,
                opened = self.server.stream_incoming_events() => opened,
            };

            match opened {
                Ok(mut events) => {
                    info!("[LOBBY] Listening for account events");
                    loop {
                        let next = tokio::select! {
                            _ = cancel.cancelled() => return,
                            next = events.next() => next,
                        };
                        match next {
                            Some(Ok(event)) => self.handle_event(event, &cancel).await,
                            Some(Err(BotError::Decode(err))) => {
                                warn!("[LOBBY] Skipping undecodable event: {}", err);
                            }
                            Some(Err(err)) => {
                                warn!("[LOBBY] Account stream failed: {}", err);
                                break;
                            }
                            None => {
                                warn!("[LOBBY] Account stream closed");
                                break;
                            }
                        }
                    }
                }
                Err(err) => warn!("[LOBBY] Could not open account stream: {}", err),
            }

            debug!("[LOBBY] Reconnecting in {:?}", self.reconnect_delay);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
        info!("[LOBBY] Dispatcher stopped");
    }

    /// React to one account event; errors are logged, never returned
    pub async fn handle_event(&self, event: AccountEvent, cancel: &CancellationToken) {
        match event {
            AccountEvent::Challenge { challenge } => self.handle_challenge(challenge).await,
            AccountEvent::GameStart { game } => self.handle_game_start(game, cancel).await,
            AccountEvent::GameFinish { game } => {
                info!("[LOBBY] Game {} finished", game.id);
            }
            AccountEvent::ChallengeCanceled { challenge } => {
                debug!("[LOBBY] Challenge {} canceled", challenge.id);
            }
            AccountEvent::ChallengeDeclined { challenge } => {
                debug!("[LOBBY] Challenge {} declined", challenge.id);
            }
            AccountEvent::Unsupported => {}
        }
    }

    async fn handle_challenge(&self, challenge: ChallengeInfo) {
        let challenger = challenge
            .challenger
            .as_ref()
            .and_then(|player| player.username.clone().or_else(|| player.id.clone()))
            .unwrap_or_else(|| "unknown".to_string());

        if challenger.eq_ignore_ascii_case(&self.username) {
            debug!("[LOBBY] Ignoring our own challenge {}", challenge.id);
            return;
        }

        let decline = if !self.registry.has_capacity() {
            Some(DeclineReason::Later)
        } else if !challenge.is_standard() {
            Some(DeclineReason::Standard)
        } else {
            None
        };

        if let Some(reason) = decline {
            info!(
                "[LOBBY] Declining challenge {} from {} ({:?})",
                challenge.id, challenger, reason
            );
            if let Err(err) = self.server.decline_challenge(&challenge.id, reason).await {
                warn!("[LOBBY] Decline of {} failed: {}", challenge.id, err);
            }
            return;
        }

        match self.server.accept_challenge(&challenge.id).await {
            Ok(()) => info!("[LOBBY] Accepted challenge {} from {}", challenge.id, challenger),
            Err(err) if err.is_conflict() => {
                info!(
                    "[LOBBY] Challenge {} already accepted or gone: {}",
                    challenge.id, err
                );
            }
            Err(err) => warn!("[LOBBY] Accept of {} failed: {}", challenge.id, err),
        }
    }

    async fn handle_game_start(&self, game: GameStart, cancel: &CancellationToken) {
        let game_id = game.id.clone();
        match self.spawn_session(game, cancel) {
            Ok(()) => {}
            Err(BotError::SessionAlreadyRegistered { .. }) => {
                debug!("[LOBBY] Game {} already running", game_id);
            }
            Err(BotError::RegistryFull { capacity }) => {
                warn!(
                    "[LOBBY] Game {} started while all {} slots are busy, aborting",
                    game_id, capacity
                );
                if let Err(err) = self.server.abort_game(&game_id).await {
                    warn!("[LOBBY] Abort of {} failed: {}", game_id, err);
                }
            }
            Err(err) => error!("[LOBBY] Could not start game {}: {}", game_id, err),
        }
    }

    /// Register `game` and spawn its worker as an independent task
    ///
    /// The session token is a child of `parent`, so cancelling the dispatcher's
    /// token stops every game it spawned.
    pub fn spawn_session(&self, game: GameStart, parent: &CancellationToken) -> BotResult<()> {
        let cancel = parent.child_token();
        self.registry.register(game.clone(), cancel.clone())?;

        let worker = GameWorker::new(&game, self.server.clone(), self.generator.clone(), cancel);
        let handle = tokio::spawn(worker.run(self.registry.clone()));
        self.registry.attach_handle(&game.id, handle);
        Ok(())
    }
}
