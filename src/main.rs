mod config;
mod error;
mod handlers;
mod languages;
mod routes;
mod slack;
mod state;
mod translate;

use anyhow::{Context, Result};
use axum::Router;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be read before the log filter is built
    let dotenv = crate::config::load_dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("slack_translate_bot=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match dotenv {
        Some(Ok(path)) => info!("Loaded environment from {}", path.display()),
        Some(Err(e)) => warn!("No .env file loaded: {}", e),
        None => {}
    }

    let config = Config::load()?;
    info!("Loaded configuration: {:?}", config);

    let app_state = AppState::new(config.clone())?;

    // Not ready until the language directory is filled
    app_state
        .load_languages()
        .await
        .context("Failed to load identifiable languages")?;

    let jobs = app_state.jobs.clone();
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("LISTEN_HOST must be an IP address, got {}", config.host))?;
    let addr = SocketAddr::from((host, config.port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight translations deliver their replies
    jobs.close();
    if !jobs.is_empty() {
        info!("Waiting for {} background jobs", jobs.len());
    }
    let drain = Duration::from_secs(config.http_timeout_secs);
    if tokio::time::timeout(drain, jobs.wait()).await.is_err() {
        warn!("Dropping {} unfinished background jobs", jobs.len());
    }

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM (sent by the platform on stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}
