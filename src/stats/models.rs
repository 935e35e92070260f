use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Highest win count a run can reach. Distributions cover `0..=MAX_WINS`.
pub const MAX_WINS: u32 = 12;

/// Game mode partition the raw records are tracked under.
///
/// The strum representation is the value stored in the `game_mode` column,
/// the serde representation is the key used in the JSON payload.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
pub enum GameVariant {
    #[strum(serialize = "duels")]
    Duels,
    #[strum(serialize = "paid-duels")]
    PaidDuels,
}

/// Histogram of matches keyed by the number of wins reached in a run.
///
/// Every key in `0..=MAX_WINS` is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WinDistribution(BTreeMap<u32, u64>);

impl Default for WinDistribution {
    fn default() -> Self {
        Self((0..=MAX_WINS).map(|wins| (wins, 0)).collect())
    }
}

impl WinDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, wins: u32) -> u64 {
        self.0.get(&wins).copied().unwrap_or_default()
    }

    /// Adds matches to a win count. Returns `false` and ignores the value
    /// when the win count is outside the domain.
    pub fn add(&mut self, wins: u32, matches: u64) -> bool {
        match self.0.get_mut(&wins) {
            Some(slot) => {
                *slot += matches;
                true
            }
            None => false,
        }
    }

    /// Element-wise sum of another distribution into this one.
    pub fn merge(&mut self, other: &WinDistribution) {
        for (wins, matches) in other.iter() {
            self.add(wins, matches);
        }
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.0.iter().map(|(wins, matches)| (*wins, *matches))
    }
}

/// Fields shared by hero, hero power and signature treasure statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTotals {
    pub creation_date: DateTime<Utc>,
    pub period_start: DateTime<Utc>,
    pub hero_class: Option<String>,
    pub total_matches: u64,
    pub total_wins: u64,
    pub win_distribution: WinDistribution,
}

/// Where an entity statistic is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySource {
    pub table: &'static str,
    pub id_column: &'static str,
    /// Table holding per-win-count match totals. `None` leaves the
    /// distribution empty.
    pub position_table: Option<&'static str>,
}

/// A statistic identified by a single card id, aggregated and merged the
/// same way regardless of which card kind it describes.
pub trait EntityStat: Clone + Send + Sync + 'static {
    const SOURCE: EntitySource;

    fn from_parts(card_id: String, totals: EntityTotals) -> Self;
    fn card_id(&self) -> &str;
    fn totals(&self) -> &EntityTotals;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroStat {
    pub hero_card_id: String,
    #[serde(flatten)]
    pub totals: EntityTotals,
}

impl EntityStat for HeroStat {
    const SOURCE: EntitySource = EntitySource {
        table: "duels_stats_hero",
        id_column: "hero_card_id",
        position_table: Some("duels_stats_hero_position"),
    };

    fn from_parts(card_id: String, totals: EntityTotals) -> Self {
        Self {
            hero_card_id: card_id,
            totals,
        }
    }

    fn card_id(&self) -> &str {
        &self.hero_card_id
    }

    fn totals(&self) -> &EntityTotals {
        &self.totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroPowerStat {
    pub hero_power_card_id: String,
    #[serde(flatten)]
    pub totals: EntityTotals,
}

impl EntityStat for HeroPowerStat {
    const SOURCE: EntitySource = EntitySource {
        table: "duels_stats_hero_power",
        id_column: "hero_power_card_id",
        position_table: Some("duels_stats_hero_power_position"),
    };

    fn from_parts(card_id: String, totals: EntityTotals) -> Self {
        Self {
            hero_power_card_id: card_id,
            totals,
        }
    }

    fn card_id(&self) -> &str {
        &self.hero_power_card_id
    }

    fn totals(&self) -> &EntityTotals {
        &self.totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureTreasureStat {
    pub signature_treasure_card_id: String,
    #[serde(flatten)]
    pub totals: EntityTotals,
}

impl EntityStat for SignatureTreasureStat {
    const SOURCE: EntitySource = EntitySource {
        table: "duels_stats_signature_treasure",
        id_column: "signature_treasure_card_id",
        position_table: Some("duels_stats_signature_treasure_position"),
    };

    fn from_parts(card_id: String, totals: EntityTotals) -> Self {
        Self {
            signature_treasure_card_id: card_id,
            totals,
        }
    }

    fn card_id(&self) -> &str {
        &self.signature_treasure_card_id
    }

    fn totals(&self) -> &EntityTotals {
        &self.totals
    }
}

/// Pick rate and win rate of a treasure for one player class.
///
/// The win/loss/tie fields are `None` when no win rate data exists for the
/// treasure, and are left out of the payload in that case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasureStat {
    pub period_start: DateTime<Utc>,
    pub card_id: String,
    pub player_class: String,
    pub total_offered: u64,
    pub total_picked: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches_played: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_wins: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_losses: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ties: Option<u64>,
}

/// A recent run, returned as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStat {
    pub id: i64,
    pub period_start: Option<DateTime<Utc>>,
    pub game_mode: Option<String>,
    pub decklist: Option<String>,
    pub final_decklist: Option<String>,
    pub player_class: Option<String>,
    pub hero_card_id: Option<String>,
    pub hero_power_card_id: Option<String>,
    pub signature_treasure_card_id: Option<String>,
    pub treasures_card_ids: Vec<String>,
    pub run_id: Option<String>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
    pub rating: Option<i64>,
    pub run_start_date: Option<DateTime<Utc>>,
}

/// All statistics for one time window, for one variant or merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBundle {
    pub hero_stats: Vec<HeroStat>,
    pub hero_power_stats: Vec<HeroPowerStat>,
    pub signature_treasure_stats: Vec<SignatureTreasureStat>,
    pub treasure_stats: Vec<TreasureStat>,
    pub deck_stats: Vec<DeckStat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantStats {
    pub stats_for_full_period: PeriodBundle,
    pub stats_since_last_patch: PeriodBundle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    /// Copy of the merged full-period bundle, kept at the top level for
    /// older clients.
    #[serde(flatten)]
    pub legacy: PeriodBundle,
    pub stats_for_full_period: PeriodBundle,
    pub stats_since_last_patch: PeriodBundle,
    #[serde(flatten)]
    pub variants: BTreeMap<GameVariant, VariantStats>,
    pub both: VariantStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStatsResponse {
    pub result: GlobalStats,
}
