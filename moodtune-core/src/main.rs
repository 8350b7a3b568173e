//! moodtune-core - Emotion-driven music recommendation service
//!
//! **Module Identity:**
//! - Name: moodtune-core
//! - Default port: 5780
//!
//! Accepts a face image, asks the external classifier for an emotion, maps it with the
//! chosen language to seed genres, fetches tracks from the recommendation service and
//! streams a presentation theme plus tempo ticks over SSE.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use moodtune_common::config::load_toml_config;
use moodtune_common::events::EventBus;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moodtune_core::config::{CliOverrides, ServiceConfig};
use moodtune_core::{build_router, AppState, EVENT_BUS_CAPACITY};

/// Command-line arguments for moodtune-core
#[derive(Parser, Debug)]
#[command(name = "moodtune-core")]
#[command(about = "Emotion-driven music recommendation service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(short, long, env = "MOODTUNE_CONFIG")]
    config: Option<PathBuf>,

    /// Emotion classifier endpoint
    #[arg(long)]
    detector_url: Option<String>,

    /// Track recommendation endpoint
    #[arg(long)]
    recommender_url: Option<String>,

    /// Tracks requested per analysis
    #[arg(short, long)]
    limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref());

    // Initialize tracing
    let default_filter = format!(
        "moodtune_core={level},moodtune_common={level},tower_http=debug",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting moodtune-core v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOverrides {
        port: args.port,
        detector_url: args.detector_url,
        recommender_url: args.recommender_url,
        default_limit: args.limit,
    };
    let config = ServiceConfig::resolve(&cli, &toml_config);

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let state = AppState::from_config(&config, event_bus)
        .context("Failed to initialize service clients")?;
    let orchestrator = state.orchestrator.clone();

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    orchestrator.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
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
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
