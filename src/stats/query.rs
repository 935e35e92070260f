use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use super::{GameVariant, Row, StatsError};

/// Column every stats table is filtered on for the time window.
pub const PERIOD_START_COLUMN: &str = "period_start";
/// Column every stats table is filtered on for the game variant.
pub const GAME_MODE_COLUMN: &str = "game_mode";

/// Time window and variant a query is bounded by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub period_start: DateTime<Utc>,
    pub variant: GameVariant,
}

impl QueryWindow {
    pub fn new(period_start: DateTime<Utc>, variant: GameVariant) -> Self {
        Self {
            period_start,
            variant,
        }
    }
}

/// A read-only query against the raw stats tables.
///
/// Table and column names are fixed identifiers; only the window and the
/// limit vary per request.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsQuery {
    /// `SELECT group_by.., SUM(sums).. GROUP BY group_by..`
    GroupedSum {
        table: &'static str,
        group_by: Vec<&'static str>,
        sums: Vec<&'static str>,
        window: QueryWindow,
    },
    /// Most recent rows by descending `id`.
    Recent {
        table: &'static str,
        window: QueryWindow,
        limit: u32,
    },
}

impl StatsQuery {
    pub fn grouped_sum(
        table: &'static str,
        group_by: &[&'static str],
        sums: &[&'static str],
        window: QueryWindow,
    ) -> Self {
        StatsQuery::GroupedSum {
            table,
            group_by: group_by.to_vec(),
            sums: sums.to_vec(),
            window,
        }
    }

    pub fn recent(table: &'static str, window: QueryWindow, limit: u32) -> Self {
        StatsQuery::Recent {
            table,
            window,
            limit,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            StatsQuery::GroupedSum { table, .. } | StatsQuery::Recent { table, .. } => *table,
        }
    }

    pub fn window(&self) -> &QueryWindow {
        match self {
            StatsQuery::GroupedSum { window, .. } | StatsQuery::Recent { window, .. } => window,
        }
    }
}

impl fmt::Display for StatsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let window = self.window();
        match self {
            StatsQuery::GroupedSum {
                table,
                group_by,
                sums,
                ..
            } => write!(
                f,
                "sum({}) from {} by ({}) since {} [{}]",
                sums.join(", "),
                table,
                group_by.join(", "),
                window.period_start.to_rfc3339(),
                window.variant
            ),
            StatsQuery::Recent { table, limit, .. } => write!(
                f,
                "latest {} from {} since {} [{}]",
                limit,
                table,
                window.period_start.to_rfc3339(),
                window.variant
            ),
        }
    }
}

/// Executes stats queries and hands back loosely-typed rows.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &StatsQuery) -> Result<Vec<Row>, StatsError>;
}
