//! Headless gamesign client: restores the session, keeps it synchronized and logs what the
//! participant would see.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamesign_client::{
    config::ClientConfig,
    dao::{remote::HttpTournamentApi, session_store::JsonFileStore},
    services::{session::SessionService, sync_supervisor},
    state::{EngineState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ClientConfig::load();
    let api = HttpTournamentApi::new(&config.base_url, config.request_timeout())
        .context("building tournament service client")?;
    let store = JsonFileStore::new(config.session_path.clone());
    info!(path = %store.path().display(), "session store");
    let session = SessionService::new(Arc::new(store));

    let state = EngineState::new(Arc::new(api), session, config);
    match state.session().restore().await {
        Ok(Some(identity)) => info!(player_id = identity.player_id, name = %identity.name, "resuming session"),
        Ok(None) => info!("no stored session; waiting for a login"),
        Err(err) => warn!(error = %err, "failed to restore session; starting logged out"),
    }

    let shutdown = CancellationToken::new();
    let supervisor = sync_supervisor::spawn(state.clone(), shutdown.clone());
    tokio::spawn(log_notices(state.clone(), shutdown.clone()));
    if let Some(changes) = state.take_match_number_changes().await {
        tokio::spawn(log_match_numbers(changes, shutdown.clone()));
    }

    shutdown_signal().await;
    info!("shutting down");
    shutdown.cancel();
    supervisor.await.context("joining sync supervisor")?;

    Ok(())
}

/// Log every participant-facing notice until shutdown.
async fn log_notices(state: SharedState, shutdown: CancellationToken) {
    let mut notices = state.subscribe_notices();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            notice = notices.recv() => match notice {
                Ok(notice) => info!(kind = ?notice.kind, "{}", notice.text),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "notice log lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }
}

async fn log_match_numbers(
    mut changes: tokio::sync::mpsc::UnboundedReceiver<u32>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            change = changes.recv() => match change {
                Some(match_number) => info!(match_number, "your match number changed"),
                None => break,
            },
        }
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,gamesign_client=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
