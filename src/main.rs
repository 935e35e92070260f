use duels_stats::{
    router, AppState, HttpPatchFeed, PostgresQueryExecutor, StatsConfig, StatsService,
    SystemClock,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duels_stats=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting duels global stats service");

    let config = StatsConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    info!(max_connections = config.db_max_connections, "Connected to database");

    let patch_feed = HttpPatchFeed::new(config.patch_feed_url.clone(), config.patch_feed_timeout)?;

    let stats_service = StatsService::new(
        Arc::new(PostgresQueryExecutor::new(pool)),
        Arc::new(patch_feed),
        Arc::new(SystemClock),
        config.aggregation_settings(),
    );

    let app = router(AppState::new(Arc::new(stats_service)));

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
