use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Query error: {0}")]
    Query(String),

    #[error("Patch feed error: {0}")]
    PatchFeed(String),

    #[error("Malformed number in column {column}: {value:?}")]
    MalformedNumber { column: String, value: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Malformed timestamp in column {column}: {value:?}")]
    MalformedTimestamp { column: String, value: String },
}

impl From<sqlx::Error> for StatsError {
    fn from(err: sqlx::Error) -> Self {
        StatsError::Query(err.to_string())
    }
}
