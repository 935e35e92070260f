// Library crate for the duels global stats service
// This file exposes the public API for integration tests

pub mod clock;
pub mod config;
pub mod patch;
pub mod shared;
pub mod stats;

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

// Re-export commonly used types for easier access in tests
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, StatsConfig};
pub use patch::{HttpPatchFeed, PatchFeed, PatchInfo, PatchManifest, StaticPatchFeed};
pub use shared::{AppError, AppState};
pub use stats::{
    AggregationSettings, GlobalStats, InMemoryQueryExecutor, PostgresQueryExecutor,
    QueryExecutor, StatsError, StatsService,
};

/// Builds the HTTP router. Responses are gzip-compressed for clients that
/// accept it.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/duels/global-stats", get(stats::global_stats))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
