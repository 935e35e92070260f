use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column, Postgres, QueryBuilder, Row as _, TypeInfo};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::query::{GAME_MODE_COLUMN, PERIOD_START_COLUMN};
use super::{QueryExecutor, QueryWindow, Row, Scalar, StatsError, StatsQuery};

/// In-memory implementation of QueryExecutor for development and testing
///
/// Tables are plain lists of rows. Queries are evaluated the way the SQL
/// backend would: rows are filtered by window, grouped in first-seen order
/// and summed with NULLs skipped.
pub struct InMemoryQueryExecutor {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    executed: Mutex<Vec<StatsQuery>>,
}

impl Default for InMemoryQueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueryExecutor {
    /// Creates an executor with no tables
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Appends a raw row to a table, creating the table if needed
    pub fn insert(&self, table: &str, row: Row) {
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn insert_all(&self, table: &str, rows: impl IntoIterator<Item = Row>) {
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table.to_string()).or_default().extend(rows);
    }

    /// Number of queries run so far
    pub fn query_count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    /// Queries run so far, in execution order
    pub fn executed_queries(&self) -> Vec<StatsQuery> {
        self.executed.lock().unwrap().clone()
    }

    fn rows_in_window(&self, table: &str, window: &QueryWindow) -> Result<Vec<Row>, StatsError> {
        let tables = self.tables.lock().unwrap();
        let mut selected = Vec::new();
        for row in tables.get(table).map(Vec::as_slice).unwrap_or_default() {
            let in_period = row
                .opt_timestamp(PERIOD_START_COLUMN)?
                .is_some_and(|start| start >= window.period_start);
            let in_variant = row
                .opt_text(GAME_MODE_COLUMN)
                .is_some_and(|mode| mode == window.variant.as_ref());
            if in_period && in_variant {
                selected.push(row.clone());
            }
        }
        Ok(selected)
    }
}

fn grouped_sum(rows: Vec<Row>, group_by: &[&str], sums: &[&str]) -> Result<Vec<Row>, StatsError> {
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<(Row, Vec<Option<i64>>)> = Vec::new();

    for row in rows {
        let key: Vec<String> = group_by
            .iter()
            .map(|column| row.value(column).group_key())
            .collect();

        let slot = *index.entry(key).or_insert_with(|| {
            let mut head = Row::new();
            for column in group_by {
                head.insert(column, row.value(column).clone());
            }
            groups.push((head, vec![None; sums.len()]));
            groups.len() - 1
        });

        let totals = &mut groups[slot].1;
        for (total, column) in totals.iter_mut().zip(sums) {
            if let Some(value) = row.opt_int(column)? {
                *total = Some(total.unwrap_or_default() + value);
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(|(mut head, totals)| {
            for (column, total) in sums.iter().zip(totals) {
                head.insert(column, total);
            }
            head
        })
        .collect())
}

fn most_recent(mut rows: Vec<Row>, limit: u32) -> Result<Vec<Row>, StatsError> {
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows.drain(..) {
        keyed.push((row.opt_int("id")?, row));
    }
    // NULL ids sort last, as Postgres does for DESC.
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    Ok(keyed
        .into_iter()
        .take(limit as usize)
        .map(|(_, row)| row)
        .collect())
}

#[async_trait]
impl QueryExecutor for InMemoryQueryExecutor {
    #[instrument(skip(self, query), fields(table = query.table()))]
    async fn execute(&self, query: &StatsQuery) -> Result<Vec<Row>, StatsError> {
        debug!(query = %query, "Running query in memory");
        self.executed.lock().unwrap().push(query.clone());

        let rows = match query {
            StatsQuery::GroupedSum {
                table,
                group_by,
                sums,
                window,
            } => grouped_sum(self.rows_in_window(table, window)?, group_by, sums)?,
            StatsQuery::Recent {
                table,
                window,
                limit,
            } => most_recent(self.rows_in_window(table, window)?, *limit)?,
        };

        debug!(row_count = rows.len(), "Query completed in memory");
        Ok(rows)
    }
}

/// PostgreSQL implementation of QueryExecutor
pub struct PostgresQueryExecutor {
    pool: PgPool,
}

impl PostgresQueryExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Renders a stats query with the window and limit as bind parameters.
///
/// Sums are cast to BIGINT so they decode as integers rather than NUMERIC.
pub fn build_query(query: &StatsQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT ");
    match query {
        StatsQuery::GroupedSum {
            table,
            group_by,
            sums,
            window,
        } => {
            builder.push(group_by.join(", "));
            for column in sums {
                builder.push(format!(", CAST(SUM({column}) AS BIGINT) AS {column}"));
            }
            builder.push(format!(" FROM {table}"));
            push_window(&mut builder, window);
            builder.push(format!(" GROUP BY {}", group_by.join(", ")));
        }
        StatsQuery::Recent {
            table,
            window,
            limit,
        } => {
            builder.push(format!("* FROM {table}"));
            push_window(&mut builder, window);
            builder.push(" ORDER BY id DESC LIMIT ");
            builder.push_bind(i64::from(*limit));
        }
    }
    builder
}

fn push_window(builder: &mut QueryBuilder<'static, Postgres>, window: &QueryWindow) {
    builder.push(format!(" WHERE {PERIOD_START_COLUMN} >= "));
    builder.push_bind(window.period_start);
    builder.push(format!(" AND {GAME_MODE_COLUMN} = "));
    builder.push_bind(window.variant.to_string());
}

fn decode_row(row: &PgRow) -> Result<Row, StatsError> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value: Scalar = match column.type_info().name() {
            "INT2" => row.try_get::<Option<i16>, _>(index)?.map(i64::from).into(),
            "INT4" => row.try_get::<Option<i32>, _>(index)?.map(i64::from).into(),
            "INT8" => row.try_get::<Option<i64>, _>(index)?.into(),
            "FLOAT4" => row.try_get::<Option<f32>, _>(index)?.map(f64::from).into(),
            "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.into(),
            "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(i64::from).into(),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
                row.try_get::<Option<String>, _>(index)?.into()
            }
            "TIMESTAMPTZ" => row.try_get::<Option<DateTime<Utc>>, _>(index)?.into(),
            "TIMESTAMP" => row
                .try_get::<Option<NaiveDateTime>, _>(index)?
                .map(|naive| naive.and_utc())
                .into(),
            "DATE" => row
                .try_get::<Option<NaiveDate>, _>(index)?
                .map(|date| date.and_time(NaiveTime::MIN).and_utc())
                .into(),
            other => {
                warn!(column = column.name(), type_name = other, "Unsupported column type");
                return Err(StatsError::Query(format!(
                    "unsupported type {} for column {}",
                    other,
                    column.name()
                )));
            }
        };
        decoded.insert(column.name(), value);
    }
    Ok(decoded)
}

#[async_trait]
impl QueryExecutor for PostgresQueryExecutor {
    #[instrument(skip(self, query), fields(table = query.table()))]
    async fn execute(&self, query: &StatsQuery) -> Result<Vec<Row>, StatsError> {
        let mut builder = build_query(query);
        debug!(sql = builder.sql(), query = %query, "Running query in database");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, query = %query, "Failed to run stats query");
                StatsError::Query(e.to_string())
            })?;

        let decoded = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        debug!(row_count = decoded.len(), "Query completed in database");
        Ok(decoded)
    }
}
