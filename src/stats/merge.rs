use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::{EntityStat, EntityTotals, PeriodBundle, TreasureStat, WinDistribution};

/// Combines per-variant bundles of the same window into one.
///
/// Card statistics are regrouped by card id and treasures by
/// `(card id, player class)`, with every count summed. Deck lists are
/// concatenated as-is. Every merged record is stamped with `period_start`.
pub fn merge_bundles(period_start: DateTime<Utc>, bundles: &[PeriodBundle]) -> PeriodBundle {
    PeriodBundle {
        hero_stats: merge_entity_stats(
            period_start,
            bundles.iter().flat_map(|b| b.hero_stats.iter()),
        ),
        hero_power_stats: merge_entity_stats(
            period_start,
            bundles.iter().flat_map(|b| b.hero_power_stats.iter()),
        ),
        signature_treasure_stats: merge_entity_stats(
            period_start,
            bundles.iter().flat_map(|b| b.signature_treasure_stats.iter()),
        ),
        treasure_stats: merge_treasure_stats(
            period_start,
            bundles.iter().flat_map(|b| b.treasure_stats.iter()),
        ),
        deck_stats: bundles
            .iter()
            .flat_map(|b| b.deck_stats.iter().cloned())
            .collect(),
    }
}

/// Sums card statistics sharing a card id. The hero class of the first
/// contributor is kept.
pub fn merge_entity_stats<'a, T, I>(period_start: DateTime<Utc>, stats: I) -> Vec<T>
where
    T: EntityStat,
    I: IntoIterator<Item = &'a T>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut merged: Vec<(&'a str, EntityTotals)> = Vec::new();

    for stat in stats {
        let totals = stat.totals();
        let slot = *index.entry(stat.card_id()).or_insert_with(|| {
            merged.push((
                stat.card_id(),
                EntityTotals {
                    creation_date: period_start,
                    period_start,
                    hero_class: totals.hero_class.clone(),
                    total_matches: 0,
                    total_wins: 0,
                    win_distribution: WinDistribution::new(),
                },
            ));
            merged.len() - 1
        });

        let target = &mut merged[slot].1;
        target.total_matches += totals.total_matches;
        target.total_wins += totals.total_wins;
        target.win_distribution.merge(&totals.win_distribution);
    }

    merged
        .into_iter()
        .map(|(card_id, totals)| T::from_parts(card_id.to_string(), totals))
        .collect()
}

fn add_optional(total: Option<u64>, value: Option<u64>) -> Option<u64> {
    match (total, value) {
        (None, None) => None,
        (total, value) => Some(total.unwrap_or_default() + value.unwrap_or_default()),
    }
}

/// Sums treasure statistics sharing `(card id, player class)`.
///
/// Missing win rate fields count as zero, unless every contributor is
/// missing them, in which case they stay missing.
pub fn merge_treasure_stats<'a, I>(period_start: DateTime<Utc>, stats: I) -> Vec<TreasureStat>
where
    I: IntoIterator<Item = &'a TreasureStat>,
{
    let mut index: HashMap<(&'a str, &'a str), usize> = HashMap::new();
    let mut merged: Vec<TreasureStat> = Vec::new();

    for stat in stats {
        let key = (stat.card_id.as_str(), stat.player_class.as_str());
        let slot = *index.entry(key).or_insert_with(|| {
            merged.push(TreasureStat {
                period_start,
                card_id: stat.card_id.clone(),
                player_class: stat.player_class.clone(),
                total_offered: 0,
                total_picked: 0,
                matches_played: None,
                total_wins: None,
                total_losses: None,
                total_ties: None,
            });
            merged.len() - 1
        });

        let target = &mut merged[slot];
        target.total_offered += stat.total_offered;
        target.total_picked += stat.total_picked;
        target.matches_played = add_optional(target.matches_played, stat.matches_played);
        target.total_wins = add_optional(target.total_wins, stat.total_wins);
        target.total_losses = add_optional(target.total_losses, stat.total_losses);
        target.total_ties = add_optional(target.total_ties, stat.total_ties);
    }

    merged
}
