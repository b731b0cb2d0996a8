//! Command line and environment configuration
//!
//! Every flag can also be given through the environment, and a `.env` file in
//! the working directory is loaded before parsing. Only the two account
//! credentials and the oracle key are required.
//!
//! # Examples
//!
//! ```text
//! LICHESS_TOKEN=lip_... LICHESS_USERNAME=xfbot OPENAI_API_KEY=sk-... \
//!     xfchess-bot --max-games 2 --fallback resign --poll-interval 10s
//! ```

use clap::Parser;
use std::time::Duration;

use super::error::{BotError, BotResult};
use crate::game::ai::{FallbackPolicy, OracleConfig, RetryPolicy, SamplingConfig};
use crate::lobby::MatchmakingConfig;
use crate::networking::LichessConfig;

/// Lichess bot that asks a language model for its moves
#[derive(Parser, Debug, Clone)]
#[command(name = "xfchess-bot", version, about)]
pub struct Cli {
    /// Lichess API token of the bot account
    #[arg(long, env = "LICHESS_TOKEN", hide_env_values = true)]
    pub lichess_token: String,

    /// Bot account username
    #[arg(long, env = "LICHESS_USERNAME")]
    pub username: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    #[arg(long, env = "LICHESS_URL", default_value = "https://lichess.org")]
    pub lichess_url: String,

    #[arg(long, env = "OPENAI_URL", default_value = "https://api.openai.com/v1")]
    pub openai_url: String,

    /// Completion model
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-3.5-turbo-instruct")]
    pub model: String,

    /// Concurrent games
    #[arg(long, env = "MAX_GAMES", default_value_t = 4)]
    pub max_games: usize,

    /// Only accept challenges, never issue them
    #[arg(long, env = "NO_MATCHMAKING")]
    pub no_matchmaking: bool,

    /// Rating category used for matchmaking
    #[arg(long, env = "PERF", default_value = "bullet")]
    pub perf: String,

    #[arg(long, env = "RATING_WINDOW", default_value_t = 100)]
    pub rating_window: i32,

    #[arg(long, env = "POLL_INTERVAL", default_value = "5s", value_parser = humantime::parse_duration)]
    pub poll_interval: Duration,

    #[arg(long, env = "CHALLENGE_PACING", default_value = "3s", value_parser = humantime::parse_duration)]
    pub challenge_pacing: Duration,

    /// Initial clock of issued challenges, in seconds
    #[arg(long, env = "CLOCK_LIMIT", default_value_t = 60)]
    pub clock_limit: u32,

    /// Increment of issued challenges, in seconds
    #[arg(long, env = "CLOCK_INCREMENT", default_value_t = 0)]
    pub clock_increment: u32,

    /// Issue casual instead of rated challenges
    #[arg(long, env = "CASUAL")]
    pub casual: bool,

    #[arg(long, env = "TEMPERATURE", default_value_t = 0.5)]
    pub temperature: f32,

    #[arg(long, env = "MAX_TOKENS", default_value_t = 6)]
    pub max_tokens: u32,

    /// Deadline for one oracle call
    #[arg(long, env = "ORACLE_TIMEOUT", default_value = "10s", value_parser = humantime::parse_duration)]
    pub oracle_timeout: Duration,

    /// Oracle calls per move before falling back
    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = 8)]
    pub max_attempts: u32,

    #[arg(long, env = "INITIAL_BACKOFF", default_value = "250ms", value_parser = humantime::parse_duration)]
    pub initial_backoff: Duration,

    #[arg(long, env = "MAX_BACKOFF", default_value = "4s", value_parser = humantime::parse_duration)]
    pub max_backoff: Duration,

    /// What to do when the oracle never produces a legal move
    #[arg(long, env = "FALLBACK", value_enum, default_value_t = FallbackPolicy::RandomLegal)]
    pub fallback: FallbackPolicy,

    /// Wait before reopening a closed account stream
    #[arg(long, env = "RECONNECT_DELAY", default_value = "5s", value_parser = humantime::parse_duration)]
    pub reconnect_delay: Duration,

    /// How long running games get to stop on shutdown
    #[arg(long, env = "SHUTDOWN_GRACE", default_value = "5s", value_parser = humantime::parse_duration)]
    pub shutdown_grace: Duration,

    /// Log filter, e.g. `debug` or `xfchess_bot=debug,info`; overrides RUST_LOG
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub lichess: LichessConfig,
    pub oracle: OracleConfig,
    pub username: String,
    pub max_games: usize,
    /// `None` when matchmaking is disabled
    pub matchmaking: Option<MatchmakingConfig>,
    pub sampling: SamplingConfig,
    pub retry: RetryPolicy,
    pub reconnect_delay: Duration,
    pub shutdown_grace: Duration,
}

impl BotConfig {
    pub fn from_cli(cli: Cli) -> BotResult<Self> {
        if cli.max_games == 0 {
            return Err(config_error("--max-games must be at least 1"));
        }
        if cli.max_attempts == 0 {
            return Err(config_error("--max-attempts must be at least 1"));
        }
        if cli.max_tokens == 0 {
            return Err(config_error("--max-tokens must be at least 1"));
        }
        if !(0.0..=2.0).contains(&cli.temperature) {
            return Err(config_error("--temperature must be within 0.0..=2.0"));
        }
        if cli.initial_backoff > cli.max_backoff {
            return Err(config_error(
                "--initial-backoff must not exceed --max-backoff",
            ));
        }
        if cli.rating_window <= 0 {
            return Err(config_error("--rating-window must be positive"));
        }
        for (name, value) in [
            ("--lichess-token", &cli.lichess_token),
            ("--username", &cli.username),
            ("--openai-api-key", &cli.openai_api_key),
        ] {
            if value.trim().is_empty() {
                return Err(config_error(&format!("{name} must not be empty")));
            }
        }

        let matchmaking = (!cli.no_matchmaking).then(|| MatchmakingConfig {
            perf: cli.perf.clone(),
            rating_window: cli.rating_window,
            poll_interval: cli.poll_interval,
            pacing: cli.challenge_pacing,
            rated: !cli.casual,
            clock_limit: cli.clock_limit,
            clock_increment: cli.clock_increment,
            ..MatchmakingConfig::new(cli.username.clone())
        });

        Ok(Self {
            lichess: LichessConfig {
                base_url: cli.lichess_url,
                token: cli.lichess_token,
            },
            oracle: OracleConfig {
                base_url: cli.openai_url,
                api_key: cli.openai_api_key,
                model: cli.model,
                timeout: cli.oracle_timeout,
            },
            username: cli.username,
            max_games: cli.max_games,
            matchmaking,
            sampling: SamplingConfig {
                temperature: cli.temperature,
                max_tokens: cli.max_tokens,
            },
            retry: RetryPolicy {
                max_attempts: cli.max_attempts,
                initial_backoff: cli.initial_backoff,
                max_backoff: cli.max_backoff,
                fallback: cli.fallback,
            },
            reconnect_delay: cli.reconnect_delay,
            shutdown_grace: cli.shutdown_grace,
        })
    }
}

fn config_error(message: &str) -> BotError {
    BotError::Config {
        message: message.to_string(),
    }
}
