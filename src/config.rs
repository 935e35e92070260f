//! Environment-driven service configuration.

use chrono::Duration;
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration as StdDuration;
use thiserror::Error;

use crate::stats::service::{DEFAULT_DECK_LIMIT, DEFAULT_FULL_PERIOD_DAYS};
use crate::stats::AggregationSettings;

pub const DEFAULT_PATCH_FEED_URL: &str =
    "https://static.zerotoheroes.com/hearthstone/data/patches.json?v=2";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_PATCH_FEED_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct StatsConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_address: String,
    pub patch_feed_url: String,
    pub patch_feed_timeout: StdDuration,
    pub full_period_days: i64,
    pub deck_limit: u32,
    /// Treasure card ids taken out of the game; their data is ignored.
    pub removed_treasure_card_ids: HashSet<String>,
}

impl StatsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let full_period_days: i64 =
            parse_or(&lookup, "FULL_PERIOD_DAYS", DEFAULT_FULL_PERIOD_DAYS)?;
        if full_period_days <= 0 {
            return Err(ConfigError::Invalid {
                key: "FULL_PERIOD_DAYS",
                value: full_period_days.to_string(),
            });
        }

        Ok(Self {
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            patch_feed_url: lookup("PATCH_FEED_URL")
                .unwrap_or_else(|| DEFAULT_PATCH_FEED_URL.to_string()),
            patch_feed_timeout: StdDuration::from_secs(parse_or(
                &lookup,
                "PATCH_FEED_TIMEOUT_SECS",
                DEFAULT_PATCH_FEED_TIMEOUT_SECS,
            )?),
            full_period_days,
            deck_limit: parse_or(&lookup, "DECK_LIMIT", DEFAULT_DECK_LIMIT)?,
            removed_treasure_card_ids: lookup("REMOVED_TREASURE_CARD_IDS")
                .map(|raw| parse_id_list(&raw))
                .unwrap_or_default(),
        })
    }

    pub fn aggregation_settings(&self) -> AggregationSettings {
        AggregationSettings {
            full_period: Duration::days(self.full_period_days),
            deck_limit: self.deck_limit,
            removed_treasures: self.removed_treasure_card_ids.clone(),
            ..AggregationSettings::default()
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn parse_id_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_is_set() {
        let config =
            StatsConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/duels")]))
                .unwrap();

        assert_eq!(config.full_period_days, 100);
        assert_eq!(config.deck_limit, 100);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.patch_feed_url, DEFAULT_PATCH_FEED_URL);
        assert!(config.removed_treasure_card_ids.is_empty());

        let settings = config.aggregation_settings();
        assert_eq!(settings.full_period, Duration::days(100));
        assert_eq!(settings.patch_grace, Duration::days(1));
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let result = StatsConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn parses_overrides_and_removed_treasures() {
        let config = StatsConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/duels"),
            ("FULL_PERIOD_DAYS", "30"),
            ("DECK_LIMIT", "25"),
            ("REMOVED_TREASURE_CARD_IDS", "CARD_A, CARD_B,,"),
        ]))
        .unwrap();

        assert_eq!(config.full_period_days, 30);
        assert_eq!(config.deck_limit, 25);
        assert_eq!(config.removed_treasure_card_ids.len(), 2);
        assert!(config.removed_treasure_card_ids.contains("CARD_B"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let result = StatsConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/duels"),
            ("DECK_LIMIT", "lots"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "DECK_LIMIT", .. })
        ));

        let result = StatsConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/duels"),
            ("FULL_PERIOD_DAYS", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
