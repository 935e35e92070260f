use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use duels_stats::{
    router, AggregationSettings, AppState, FixedClock, InMemoryQueryExecutor, PatchInfo,
    StaticPatchFeed, StatsService,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub executor: Arc<InMemoryQueryExecutor>,
    pub stats_service: Arc<StatsService>,
    pub app: Router,
    pub now: DateTime<Utc>,
    pub patch_date: DateTime<Utc>,
}

impl TestSetup {
    pub fn full_period_start(&self) -> DateTime<Utc> {
        self.now - Duration::days(100)
    }

    pub fn since_patch_start(&self) -> DateTime<Utc> {
        self.patch_date + Duration::days(1)
    }
}

pub struct TestSetupBuilder {
    now: DateTime<Utc>,
    patch_date: DateTime<Utc>,
    removed_treasures: HashSet<String>,
    executor: Arc<InMemoryQueryExecutor>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            now: Utc.with_ymd_and_hms(2021, 9, 1, 12, 0, 0).unwrap(),
            patch_date: Utc.with_ymd_and_hms(2021, 8, 10, 0, 0, 0).unwrap(),
            removed_treasures: HashSet::new(),
            executor: Arc::new(InMemoryQueryExecutor::new()),
        }
    }

    pub fn with_removed_treasure(mut self, card_id: &str) -> Self {
        self.removed_treasures.insert(card_id.to_string());
        self
    }

    /// Seeds the executor before the service is built
    pub fn with_seed(self, seed: impl FnOnce(&InMemoryQueryExecutor, &SeedClock)) -> Self {
        seed(
            &self.executor,
            &SeedClock {
                now: self.now,
                patch_date: self.patch_date,
            },
        );
        self
    }

    pub fn build(self) -> TestSetup {
        let settings = AggregationSettings {
            removed_treasures: self.removed_treasures,
            ..AggregationSettings::default()
        };
        let stats_service = Arc::new(StatsService::new(
            self.executor.clone(),
            Arc::new(StaticPatchFeed::single(PatchInfo {
                number: 90237,
                version: Some("21.0.0".to_string()),
                name: None,
                date: self.patch_date,
            })),
            Arc::new(FixedClock(self.now)),
            settings,
        ));

        TestSetup {
            executor: self.executor,
            app: router(AppState::new(stats_service.clone())),
            stats_service,
            now: self.now,
            patch_date: self.patch_date,
        }
    }
}

/// Reference instants available while seeding
pub struct SeedClock {
    pub now: DateTime<Utc>,
    pub patch_date: DateTime<Utc>,
}

impl SeedClock {
    /// An instant inside the full period but before the patch window
    pub fn before_patch(&self) -> DateTime<Utc> {
        self.patch_date - Duration::days(20)
    }

    /// An instant inside both windows
    pub fn after_patch(&self) -> DateTime<Utc> {
        self.patch_date + Duration::days(5)
    }

    /// An instant outside both windows
    pub fn too_old(&self) -> DateTime<Utc> {
        self.now - Duration::days(150)
    }
}
