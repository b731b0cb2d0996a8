//! Outgoing challenge loop
//!
//! While the bot has free game slots it looks for online bots rated close to
//! itself and challenges them. Challenges are fire-and-forget: an accepted
//! one shows up later as a `gameStart` on the account stream, where the
//! dispatcher takes over. The matchmaker never creates sessions itself.

use rand::seq::{IndexedRandom, SliceRandom};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shared::{Challenge, ColorChoice};

use crate::core::{BotError, BotResult};
use crate::lobby::SessionRegistry;
use crate::networking::GameServer;

/// Matchmaking settings
#[derive(Debug, Clone)]
pub struct MatchmakingConfig {
    /// Our own account name, never challenged
    pub username: String,
    /// Rating category to compare (`bullet`, `blitz`, ...)
    pub perf: String,
    /// Ratings must differ by strictly less than this
    pub rating_window: i32,
    pub poll_interval: Duration,
    /// Pause after each issued challenge
    pub pacing: Duration,
    /// Upper bound on bots listed per cycle
    pub online_limit: usize,
    pub rated: bool,
    /// Initial clock in seconds
    pub clock_limit: u32,
    /// Increment in seconds
    pub clock_increment: u32,
}

impl MatchmakingConfig {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            perf: "bullet".to_string(),
            rating_window: 100,
            poll_interval: Duration::from_secs(5),
            pacing: Duration::from_secs(3),
            online_limit: 100,
            rated: true,
            clock_limit: 60,
            clock_increment: 0,
        }
    }
}

pub struct Matchmaker {
    server: Arc<dyn GameServer>,
    registry: Arc<SessionRegistry>,
    config: MatchmakingConfig,
}

impl Matchmaker {
    pub fn new(
        server: Arc<dyn GameServer>,
        registry: Arc<SessionRegistry>,
        config: MatchmakingConfig,
    ) -> Self {
        Self {
            server,
            registry,
            config,
        }
    }

    /// Run cycles every `poll_interval` until cancelled
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            "[MATCH] Matchmaking as {} ({}, window {})",
            self.config.username, self.config.perf, self.config.rating_window
        );
        loop {
            match self.run_cycle(&cancel).await {
                Ok(0) => {}
                Ok(issued) => info!("[MATCH] Issued {} challenge(s)", issued),
                Err(BotError::Cancelled) => break,
                Err(err) => warn!("[MATCH] Cycle failed: {}", err),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
        info!("[MATCH] Matchmaking stopped");
    }

    /// One matchmaking pass; returns the number of challenges issued
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> BotResult<usize> {
        if !self.registry.has_capacity() {
            debug!("[MATCH] At capacity, skipping cycle");
            return Ok(0);
        }

        let own_rating = self
            .server
            .user_profile(&self.config.username)
            .await?
            .rating(&self.config.perf)
            .ok_or_else(|| BotError::Config {
                message: format!("account has no {} rating", self.config.perf),
            })?;

        let mut candidates = self.server.online_bots(self.config.online_limit).await?;
        candidates.shuffle(&mut rand::rng());

        let mut issued = 0;
        for candidate in candidates {
            if !self.registry.has_capacity() {
                break;
            }
            if candidate.id.eq_ignore_ascii_case(&self.config.username)
                || candidate.username.eq_ignore_ascii_case(&self.config.username)
            {
                continue;
            }
            let Some(rating) = candidate.rating(&self.config.perf) else {
                continue;
            };
            if (rating - own_rating).abs() >= self.config.rating_window {
                continue;
            }

            let challenge = Challenge {
                opponent: candidate.username.clone(),
                rated: self.config.rated,
                clock_limit: self.config.clock_limit,
                clock_increment: self.config.clock_increment,
                color: challenge_color(),
            };
            match self.server.create_challenge(&challenge).await {
                Ok(()) => {
                    issued += 1;
                    debug!(
                        "[MATCH] Challenged {} ({} vs our {})",
                        candidate.username, rating, own_rating
                    );
                }
                Err(err) => warn!("[MATCH] Challenge to {} failed: {}", candidate.username, err),
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(BotError::Cancelled),
                _ = tokio::time::sleep(self.config.pacing) => {}
            }
        }

        Ok(issued)
    }
}

/// White or Black, picked here rather than left to the server
fn challenge_color() -> ColorChoice {
    [ColorChoice::White, ColorChoice::Black]
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(ColorChoice::White)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatchmakingConfig::new("xfbot");
        assert_eq!(config.perf, "bullet");
        assert_eq!(config.rating_window, 100);
        assert_eq!(config.clock_limit, 60);
        assert_eq!(config.clock_increment, 0);
        assert!(config.rated);
    }

    #[test]
    fn test_challenge_color_is_never_random() {
        let picks: Vec<ColorChoice> = (0..200).map(|_| challenge_color()).collect();
        assert!(picks.iter().all(|c| *c != ColorChoice::Random));
        assert!(picks.contains(&ColorChoice::White));
        assert!(picks.contains(&ColorChoice::Black));
    }
}
