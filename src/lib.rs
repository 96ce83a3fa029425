// src/lib.rs
// Public library surface for the server binary, the preview tool and integration tests.

pub mod api;
pub mod audio;
pub mod compose;
pub mod config;
pub mod error;
pub mod gemini;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod script;
pub mod speech;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::PodcastConfig;
pub use crate::error::{ErrorKind, PipelineError};
pub use crate::pipeline::{Pipeline, PodcastAudio};

use std::sync::Arc;

use axum::Router;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when RUST_LOG is unset.
pub const DEFAULT_LOG_FILTER: &str = "daily_briefing=info,warn";

/// Install the fmt subscriber. Safe to call more than once (later calls are no-ops).
/// `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// Build the full Router from env/config (used by the server binary and tests).
pub async fn app() -> anyhow::Result<Router> {
    let config = Arc::new(PodcastConfig::from_env()?);
    let pipeline = Pipeline::from_config(config)?;
    let metrics = crate::metrics::Metrics::init()?;
    Ok(api::router(api::AppState::new(pipeline), Some(&metrics)))
}
