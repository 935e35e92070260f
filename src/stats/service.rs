use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{info, instrument, warn};

use crate::clock::Clock;
use crate::patch::PatchFeed;

use super::{
    merge::merge_bundles, GameVariant, GlobalStats, PeriodBundle, PeriodLoader, QueryExecutor,
    QueryWindow, StatsError, VariantStats,
};

pub const DEFAULT_FULL_PERIOD_DAYS: i64 = 100;
pub const DEFAULT_DECK_LIMIT: u32 = 100;

/// Knobs for a global stats computation.
#[derive(Debug, Clone)]
pub struct AggregationSettings {
    /// Lookback of the full-period window.
    pub full_period: Duration,
    /// Delay after the patch release before the since-patch window opens,
    /// to keep runs on the previous client out.
    pub patch_grace: Duration,
    pub deck_limit: u32,
    /// Treasures removed from the game whose leftover data is ignored.
    pub removed_treasures: HashSet<String>,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            full_period: Duration::days(DEFAULT_FULL_PERIOD_DAYS),
            patch_grace: Duration::days(1),
            deck_limit: DEFAULT_DECK_LIMIT,
            removed_treasures: HashSet::new(),
        }
    }
}

/// Start instants of the two windows a response covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodStarts {
    pub full_period: DateTime<Utc>,
    pub since_last_patch: DateTime<Utc>,
}

pub struct StatsService {
    loader: PeriodLoader,
    patch_feed: Arc<dyn PatchFeed>,
    clock: Arc<dyn Clock>,
    full_period: Duration,
    patch_grace: Duration,
}

impl StatsService {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        patch_feed: Arc<dyn PatchFeed>,
        clock: Arc<dyn Clock>,
        settings: AggregationSettings,
    ) -> Self {
        Self {
            loader: PeriodLoader::new(
                executor,
                Arc::new(settings.removed_treasures),
                settings.deck_limit,
            ),
            patch_feed,
            clock,
            full_period: settings.full_period,
            patch_grace: settings.patch_grace,
        }
    }

    /// Works out both window starts. Fails before any query runs when the
    /// patch feed is unavailable.
    pub async fn period_starts(&self) -> Result<PeriodStarts, StatsError> {
        let patch = self.patch_feed.current_patch().await?;
        Ok(PeriodStarts {
            full_period: self.clock.now() - self.full_period,
            since_last_patch: patch.date + self.patch_grace,
        })
    }

    /// Computes the full response. Any failing load fails the whole result.
    #[instrument(skip(self))]
    pub async fn global_stats(&self) -> Result<GlobalStats, StatsError> {
        let starts = self.period_starts().await.map_err(|e| {
            warn!(error = %e, "Could not determine stats windows");
            e
        })?;
        info!(
            full_period_start = %starts.full_period,
            since_last_patch_start = %starts.since_last_patch,
            "Loading global stats"
        );

        let variants: Vec<GameVariant> = GameVariant::iter().collect();
        let (full_period, since_last_patch) = futures::try_join!(
            self.load_variants(starts.full_period, &variants),
            self.load_variants(starts.since_last_patch, &variants),
        )?;

        let both = VariantStats {
            stats_for_full_period: merge_bundles(starts.full_period, &full_period),
            stats_since_last_patch: merge_bundles(starts.since_last_patch, &since_last_patch),
        };

        let per_variant: BTreeMap<GameVariant, VariantStats> = variants
            .into_iter()
            .zip(full_period.into_iter().zip(since_last_patch))
            .map(|(variant, (full, since_patch))| {
                (
                    variant,
                    VariantStats {
                        stats_for_full_period: full,
                        stats_since_last_patch: since_patch,
                    },
                )
            })
            .collect();

        info!(
            heroes = both.stats_for_full_period.hero_stats.len(),
            decks = both.stats_for_full_period.deck_stats.len(),
            "Global stats computed"
        );

        Ok(GlobalStats {
            legacy: both.stats_for_full_period.clone(),
            stats_for_full_period: both.stats_for_full_period.clone(),
            stats_since_last_patch: both.stats_since_last_patch.clone(),
            variants: per_variant,
            both,
        })
    }

    async fn load_variants(
        &self,
        period_start: DateTime<Utc>,
        variants: &[GameVariant],
    ) -> Result<Vec<PeriodBundle>, StatsError> {
        try_join_all(
            variants
                .iter()
                .map(|variant| self.loader.load(QueryWindow::new(period_start, *variant))),
        )
        .await
    }
}
