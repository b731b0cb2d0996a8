use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xfchess_bot::core::{BotConfig, Cli};
use xfchess_bot::game::ai::{MoveGenerator, OpenAiOracle};
use xfchess_bot::lobby::{Dispatcher, Matchmaker, SessionRegistry};
use xfchess_bot::networking::{GameServer, LichessClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; variables may come from the real environment
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = BotConfig::from_cli(cli).context("invalid configuration")?;
    info!(
        "[LOBBY] Starting as {} against {} ({} games max)",
        config.username, config.lichess.base_url, config.max_games
    );

    let server: Arc<dyn GameServer> = Arc::new(
        LichessClient::new(config.lichess.clone()).context("failed to build Lichess client")?,
    );
    let oracle =
        Arc::new(OpenAiOracle::new(config.oracle.clone()).context("failed to build oracle client")?);
    let generator = Arc::new(
        MoveGenerator::new(oracle, config.sampling, config.retry)
            .with_call_timeout(config.oracle.timeout),
    );
    let registry = Arc::new(SessionRegistry::new(config.max_games));
    let shutdown = CancellationToken::new();

    let dispatcher = Dispatcher::new(
        config.username.clone(),
        server.clone(),
        registry.clone(),
        generator,
    )
    .with_reconnect_delay(config.reconnect_delay);
    let dispatcher_task = tokio::spawn({
        let cancel = shutdown.clone();
        async move { dispatcher.run(cancel).await }
    });

    let matchmaker_task = config.matchmaking.clone().map(|matchmaking| {
        let matchmaker = Matchmaker::new(server.clone(), registry.clone(), matchmaking);
        let cancel = shutdown.clone();
        tokio::spawn(async move { matchmaker.run(cancel).await })
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("[LOBBY] Shutdown requested");
    shutdown.cancel();

    if let Err(err) = dispatcher_task.await {
        warn!("[LOBBY] Dispatcher task ended abnormally: {}", err);
    }
    if let Some(task) = matchmaker_task {
        if let Err(err) = task.await {
            warn!("[MATCH] Matchmaker task ended abnormally: {}", err);
        }
    }
    registry.shutdown(config.shutdown_grace).await;

    info!("[LOBBY] Bye");
    Ok(())
}
