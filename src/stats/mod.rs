pub mod aggregators;
pub mod distribution;
pub mod handlers;
pub mod merge;
pub mod query;
pub mod service;

mod errors;
mod loader;
pub mod models;
pub mod repository;
mod row;

pub use errors::StatsError;
pub use handlers::global_stats;
pub use loader::PeriodLoader;
pub use models::*;
pub use query::{QueryExecutor, QueryWindow, StatsQuery};
pub use repository::{InMemoryQueryExecutor, PostgresQueryExecutor};
pub use row::{parse_timestamp, Row, Scalar};
pub use service::{AggregationSettings, PeriodStarts, StatsService};
