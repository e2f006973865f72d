//! helpdesk-server: vehicle-fault and technical ticket intake
//!
//! Startup: load config, init logging, open the database and upload
//! directory, ensure a superuser exists, optionally sweep orphaned
//! attachments, then serve HTTP.

use std::net::SocketAddr;
use std::time::Duration;

use helpdesk_server::services::{identities, tickets};
use helpdesk_server::utils::init_logger;
use helpdesk_server::{AppState, BoxError, Config, create_router};

/// Session and rate-limiter maintenance interval
const CLEANUP_INTERVAL_SECS: u64 = 300;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_logger(
        &config.log_level,
        config.is_production(),
        config.log_dir.as_deref(),
    )?;

    tracing::info!(
        environment = %config.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting helpdesk-server"
    );

    let state = AppState::new(&config).await?;

    if let Some(admin) = identities::ensure_bootstrap_superuser(&state).await? {
        tracing::warn!(
            username = %admin.username,
            "No superuser existed; bootstrap account is active. Rotate its password."
        );
    }

    if config.sweep_orphans_on_start {
        match tickets::sweep_orphan_attachments(&state).await {
            Ok(removed) => tracing::info!(removed, "Orphan attachment sweep finished"),
            Err(e) => tracing::warn!(error = %e, "Orphan attachment sweep failed"),
        }
    }

    // Periodic session and rate limiter cleanup
    let sessions = state.sessions.clone();
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
            let expired = sessions.cleanup_expired();
            if expired > 0 {
                tracing::debug!(expired, "Expired sessions purged");
            }
        }
    });

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("helpdesk-server HTTP listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("helpdesk-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
