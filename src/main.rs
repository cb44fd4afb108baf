//! Shardcache - A segment-partitioned in-process cache
//!
//! Standalone driver: restores a snapshot, runs the expiration sweeper and
//! writes the snapshot back on shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shardcache::{spawn_sweeper, Cache, CacheError, Config, HashRing};

/// Main entry point for the cache driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and merge any existing snapshot
/// 4. Build the routing ring from the configured destinations
/// 5. Start the expiration sweeper
/// 6. On SIGINT/SIGTERM stop the sweeper and save the snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting shardcache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity={}, default_ttl={}s, sweep_interval={}s, snapshot={:?}",
        config.capacity, config.default_ttl, config.sweep_interval, config.snapshot_path
    );

    let cache = Arc::new(Cache::with_default_ttl(config.capacity, config.default_ttl));

    if let Some(path) = &config.snapshot_path {
        match cache.load(path) {
            Ok(_) => {}
            Err(CacheError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No snapshot at {}, starting empty", path.display());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("loading snapshot {}", path.display()))
            }
        }
    }

    let ring = HashRing::new(config.ring_slots);
    if !config.ring_destinations.is_empty() {
        ring.add_multiple(config.ring_destinations.clone());
        info!(
            "Routing ring ready: destinations={:?}, virtual_nodes={}",
            ring.destinations(),
            ring.size()
        );
    }

    let sweeper = spawn_sweeper(
        cache.clone(),
        Duration::from_secs(config.sweep_interval.max(1)),
    );

    shutdown_signal().await;

    sweeper.shutdown().await;
    warn!("Sweeper stopped");

    if let Some(path) = &config.snapshot_path {
        cache
            .save(path)
            .with_context(|| format!("saving snapshot {}", path.display()))?;
    }

    info!(
        "Final stats: {}",
        serde_json::to_string(&cache.stats()).context("encoding stats")?
    );
    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
