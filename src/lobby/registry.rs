//! Active game registry
//!
//! Tracks every game the bot is currently playing, keyed by game id, and
//! enforces the concurrency cap. All checks and mutations happen under one
//! lock, so a check-then-insert can never overshoot the capacity even when
//! the dispatcher and several workers race.
//!
//! # Lifecycle
//!
//! 1. The dispatcher [`register`](SessionRegistry::register)s a game before
//!    spawning its worker
//! 2. It then [`attach_handle`](SessionRegistry::attach_handle)es the task
//! 3. The worker [`deregister`](SessionRegistry::deregister)s itself on every
//!    exit path
//!
//! If the worker finishes before step 2, the entry is already gone and the
//! late attach is a no-op.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use shared::GameStart;

use crate::core::{BotError, BotResult};

/// One live game
#[derive(Debug)]
pub struct Session {
    pub game_id: String,
    /// The `gameStart` announcement that created this session
    pub initiating_event: GameStart,
    pub cancel: CancellationToken,
    pub handle: Option<JoinHandle<()>>,
}

/// Bounded map of live sessions
#[derive(Debug)]
pub struct SessionRegistry {
    capacity: usize,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sessions: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Insert a session for `event.id`
    ///
    /// # Errors
    ///
    /// - [`BotError::SessionAlreadyRegistered`] if the id is present
    /// - [`BotError::RegistryFull`] if the registry is at capacity
    pub fn register(&self, event: GameStart, cancel: CancellationToken) -> BotResult<()> {
        let mut sessions = self.sessions.lock();

        if sessions.contains_key(&event.id) {
            return Err(BotError::SessionAlreadyRegistered { game_id: event.id });
        }
        if sessions.len() >= self.capacity {
            return Err(BotError::RegistryFull {
                capacity: self.capacity,
            });
        }

        let game_id = event.id.clone();
        sessions.insert(
            game_id.clone(),
            Session {
                game_id: game_id.clone(),
                initiating_event: event,
                cancel,
                handle: None,
            },
        );
        info!(
            "[LOBBY] Registered game {} ({}/{})",
            game_id,
            sessions.len(),
            self.capacity
        );
        Ok(())
    }

    /// Attach the worker task to its session
    ///
    /// Returns `false` if the session already deregistered itself.
    pub fn attach_handle(&self, game_id: &str, handle: JoinHandle<()>) -> bool {
        match self.sessions.lock().get_mut(game_id) {
            Some(session) => {
                session.handle = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Remove a session; removing an absent id is a no-op
    pub fn deregister(&self, game_id: &str) -> Option<Session> {
        let mut sessions = self.sessions.lock();
        let removed = sessions.remove(game_id);
        if removed.is_some() {
            info!(
                "[LOBBY] Deregistered game {} ({}/{})",
                game_id,
                sessions.len(),
                self.capacity
            );
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has_capacity(&self) -> bool {
        self.count() < self.capacity
    }

    pub fn contains(&self, game_id: &str) -> bool {
        self.sessions.lock().contains_key(game_id)
    }

    pub fn game_ids(&self) -> Vec<String> {
        self.sessions.lock().keys().cloned().collect()
    }

    /// Cancel every session and wait up to `grace` for each worker
    ///
    /// Workers still running after the grace period are aborted.
    pub async fn shutdown(&self, grace: Duration) {
        let handles: Vec<(String, JoinHandle<()>)> = {
            let mut sessions = self.sessions.lock();
            sessions
                .values_mut()
                .filter_map(|session| {
                    session.cancel.cancel();
                    session
                        .handle
                        .take()
                        .map(|handle| (session.game_id.clone(), handle))
                })
                .collect()
        };

        info!("[LOBBY] Shutting down {} session(s)", handles.len());

        for (game_id, mut handle) in handles {
            if tokio::time::timeout(grace, &mut handle).await.is_err() {
                warn!("[LOBBY] Worker for {} did not stop in time, aborting", game_id);
                handle.abort();
            }
        }

        self.sessions.lock().clear();
    }
}
