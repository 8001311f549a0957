//! Pulsemap server binary.
//!
//! Starts an axum HTTP server with structured logging, background geo dataset
//! loading, the synthetic ingestion feed, and graceful shutdown on
//! SIGTERM/SIGINT.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use pulsemap_geo::GeoResolver;
use pulsemap_server::{app, config, feed, AppState};
use pulsemap_tracker::{OriginTracker, TrackerConfig};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("PULSEMAP_CONFIG") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("pulsemap.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration: the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Start the geo dataset load in the background; the server comes up
    // serving placeholder attributes until it completes.
    let geo = GeoResolver::new();
    if config.geo.dataset_path.trim().is_empty() {
        tracing::info!("no geo dataset configured, serving placeholder attributes");
    } else {
        geo.spawn_load(PathBuf::from(&config.geo.dataset_path));
    }

    let tracker = OriginTracker::new(
        TrackerConfig {
            cooldown: Duration::from_millis(config.tracker.cooldown_ms),
            observer_queue: config.tracker.observer_queue,
        },
        {
            let geo = geo.clone();
            move |origin: &str| geo.resolve(origin)
        },
    );

    // Build application
    let state = AppState {
        tracker: tracker.clone(),
        geo: geo.clone(),
        static_dir: config.server.static_dir.clone(),
    };
    let app = app(state);

    let feed_task = tokio::spawn(feed::run_feed(tracker.clone(), config.feed.clone()));

    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting pulsemap server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address: is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    feed_task.abort();
    tracing::info!("pulsemap server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
