//! herlign-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Open the SQLite database and run pending migrations.
//! 4. Create the bootstrap admin, if configured.
//! 5. Build the completion and YouTube clients and shared state.
//! 6. Start the rate-limit sweeper in a background task.
//! 7. Build the Axum router and start the HTTP server with graceful shutdown.

mod completion;
mod config;
mod entities;
mod error;
mod extract;
mod middleware;
mod routes;
mod schemas;
mod state;
mod youtube;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use herlign_core::RateLimiter;
use tracing::{debug, info, warn};

use crate::completion::HttpCompletionClient;
use crate::config::Config;
use crate::entities::{AdminStore, Store};
use crate::state::AppState;
use crate::youtube::YouTubeClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: HERLIGN_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "herlign-server starting");

    // ── 3. Database ────────────────────────────────────────────────────────────
    let store = Store::connect(&cfg.database_url).await?;
    info!(database_url = %cfg.database_url, "database ready");

    // ── 4. Bootstrap admin ─────────────────────────────────────────────────────
    if let (Some(email), Some(password)) = (&cfg.admin_email, &cfg.admin_password) {
        if store.find_admin_by_email(email).await?.is_none() {
            store.create_admin(email, password).await?;
            info!(%email, "bootstrap admin created");
        }
    }

    // ── 5. Shared application state ────────────────────────────────────────────
    let completion = HttpCompletionClient::new(&cfg.completion)?;
    info!(provider = completion.provider_name(), "completion client ready");
    let youtube = YouTubeClient::new(&cfg.youtube)?;
    info!(configured = youtube.is_configured(), "YouTube client ready");

    tokio::fs::create_dir_all(&cfg.media_dir).await?;

    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        store: Arc::new(store),
        rate_limiter: Arc::new(RateLimiter::new()),
        completion: Arc::new(completion),
        youtube: Arc::new(youtube),
    });

    // ── 6. Rate-limit sweeper ──────────────────────────────────────────────────
    let limiter = Arc::clone(&state.rate_limiter);
    let every = Duration::from_secs(cfg.rate_limit_sweep_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let removed = limiter.sweep(Instant::now());
            if removed > 0 {
                debug!(removed, remaining = limiter.len(), "swept expired rate-limit windows");
            }
        }
    });

    // ── 7. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("herlign-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
