use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::stats::{parse_timestamp, StatsError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchInfo {
    pub number: u32,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_patch_date")]
    pub date: DateTime<Utc>,
}

/// The published list of patches and which one the current meta is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchManifest {
    #[serde(rename = "currentDuelsMetaPatch", alias = "currentMetaPatch")]
    pub current_meta_patch: u32,
    pub patches: Vec<PatchInfo>,
}

impl PatchManifest {
    /// The patch entry matching the current meta patch number.
    pub fn current_patch(&self) -> Result<&PatchInfo, StatsError> {
        self.patches
            .iter()
            .find(|patch| patch.number == self.current_meta_patch)
            .ok_or_else(|| {
                StatsError::PatchFeed(format!(
                    "current meta patch {} is not listed",
                    self.current_meta_patch
                ))
            })
    }
}

fn parse_patch_date(text: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(text).or_else(|| {
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
    })
}

fn deserialize_patch_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_patch_date(&text)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid patch date: {text}")))
}
