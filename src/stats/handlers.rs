use axum::{extract::State, Json};
use tracing::{info, instrument};

use super::GlobalStatsResponse;
use crate::shared::{AppError, AppState};

/// HTTP handler for the aggregated duels statistics
///
/// GET /duels/global-stats
/// Returns `{ "result": GlobalStats }`
#[instrument(name = "global_stats", skip(state))]
pub async fn global_stats(
    State(state): State<AppState>,
) -> Result<Json<GlobalStatsResponse>, AppError> {
    info!("Computing global stats");

    let result = state.stats_service.global_stats().await?;

    info!(
        full_period_heroes = result.stats_for_full_period.hero_stats.len(),
        since_patch_heroes = result.stats_since_last_patch.hero_stats.len(),
        "Global stats ready"
    );

    Ok(Json(GlobalStatsResponse { result }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::patch::{PatchInfo, PatchManifest, StaticPatchFeed};
    use crate::stats::{AggregationSettings, InMemoryQueryExecutor, StatsService};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    fn app(manifest: PatchManifest) -> Router {
        let service = StatsService::new(
            Arc::new(InMemoryQueryExecutor::new()),
            Arc::new(StaticPatchFeed::new(manifest)),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2021, 9, 1, 0, 0, 0).unwrap())),
            AggregationSettings::default(),
        );
        Router::new()
            .route("/duels/global-stats", axum::routing::get(global_stats))
            .with_state(AppState::new(Arc::new(service)))
    }

    fn request() -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri("/duels/global-stats")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_global_stats_handler() {
        let manifest = PatchManifest {
            current_meta_patch: 1,
            patches: vec![PatchInfo {
                number: 1,
                version: None,
                name: None,
                date: Utc.with_ymd_and_hms(2021, 8, 1, 0, 0, 0).unwrap(),
            }],
        };

        let response = app(manifest).oneshot(request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let result = &json["result"];
        assert!(result["heroStats"].is_array());
        assert!(result["statsForFullPeriod"]["deckStats"].is_array());
        assert!(result["statsSinceLastPatch"].is_object());
        assert!(result["duels"]["statsForFullPeriod"].is_object());
        assert!(result["paidDuels"]["statsSinceLastPatch"].is_object());
        assert!(result["both"]["statsForFullPeriod"].is_object());
    }

    #[tokio::test]
    async fn test_global_stats_handler_reports_failure() {
        let manifest = PatchManifest {
            current_meta_patch: 1,
            patches: vec![],
        };

        let response = app(manifest).oneshot(request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("Patch feed"));
    }
}
