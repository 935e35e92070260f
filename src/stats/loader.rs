use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument};

use super::aggregators::{aggregate_entities, aggregate_treasures, load_decks};
use super::{
    HeroPowerStat, HeroStat, PeriodBundle, QueryExecutor, QueryWindow, SignatureTreasureStat,
    StatsError,
};

/// Loads every statistic for one window and variant.
#[derive(Clone)]
pub struct PeriodLoader {
    executor: Arc<dyn QueryExecutor>,
    removed_treasures: Arc<HashSet<String>>,
    deck_limit: u32,
}

impl PeriodLoader {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        removed_treasures: Arc<HashSet<String>>,
        deck_limit: u32,
    ) -> Self {
        Self {
            executor,
            removed_treasures,
            deck_limit,
        }
    }

    /// Runs the entity, treasure and deck loads concurrently. The first
    /// failure fails the whole bundle.
    #[instrument(skip(self))]
    pub async fn load(&self, window: QueryWindow) -> Result<PeriodBundle, StatsError> {
        let executor = self.executor.as_ref();

        let (hero_stats, hero_power_stats, signature_treasure_stats, treasure_stats, deck_stats) =
            futures::try_join!(
                aggregate_entities::<HeroStat>(executor, window),
                aggregate_entities::<HeroPowerStat>(executor, window),
                aggregate_entities::<SignatureTreasureStat>(executor, window),
                aggregate_treasures(executor, window, &self.removed_treasures),
                load_decks(executor, window, self.deck_limit),
            )?;

        info!(
            variant = %window.variant,
            heroes = hero_stats.len(),
            hero_powers = hero_power_stats.len(),
            signature_treasures = signature_treasure_stats.len(),
            treasures = treasure_stats.len(),
            decks = deck_stats.len(),
            "Period loaded"
        );

        Ok(PeriodBundle {
            hero_stats,
            hero_power_stats,
            signature_treasure_stats,
            treasure_stats,
            deck_stats,
        })
    }
}
