// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use axum_server::Handle;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use gatekeeper_server::{
    api::router,
    auth::TokenCodec,
    config::{Settings, DEFAULT_CONFIG_PATH},
    logging,
    ratelimit::{MemoryWindowStore, RateLimiter, RedisWindowStore, WindowStore},
    state::AppState,
    storage::{self, AccountStore},
};

const JANITOR_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let settings = Settings::load(&config_path)?;
    logging::init(&settings.log.level, &settings.log.dir)?;

    tracing::info!(config = %config_path.display(), "Starting gatekeeper server");

    let accounts_path = storage::accounts_path(&settings.storage.data_dir);
    let accounts = AccountStore::open(&accounts_path)?;
    tracing::info!(path = %accounts_path.display(), "Account store opened");

    let shutdown = CancellationToken::new();

    let window_store: Arc<dyn WindowStore> = match settings.redis.url.as_deref() {
        Some(url) => Arc::new(RedisWindowStore::connect(url).await?),
        None => {
            tracing::info!("No Redis URL configured, rate-limit windows kept in memory");
            let store = Arc::new(MemoryWindowStore::new());
            tokio::spawn(store.clone().run_janitor(JANITOR_INTERVAL, shutdown.clone()));
            store
        }
    };

    let limiter = if settings.rate_limit.enabled {
        tracing::info!(
            window_secs = settings.rate_limit.window_secs,
            burst = settings.rate_limit.burst,
            "Rate limiting enabled"
        );
        RateLimiter::new(window_store, settings.rate_window(), settings.rate_limit.burst)
    } else {
        tracing::warn!("Rate limiting disabled");
        RateLimiter::disabled(window_store)
    };

    let state = AppState::new(
        accounts,
        TokenCodec::new(settings.jwt.secret.as_bytes()),
        limiter,
        settings.user_ttl(),
        settings.admin_ttl(),
    );
    let app = router(state);

    let addr: SocketAddr = settings.bind_addr().parse()?;

    let handle = Handle::new();
    let signal_handle = handle.clone();
    let grace = settings.shutdown_grace();
    let background = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        background.cancel();
        signal_handle.graceful_shutdown(Some(grace));
    });

    tracing::info!(%addr, "Listening (docs at /swagger)");
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM. In-flight requests then get the configured
/// grace period before connections are closed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
