use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::fmt;

use super::StatsError;

/// A loosely-typed value as returned by the query layer.
///
/// Aggregated sums may come back as integers, floats or numeric strings
/// depending on the backend, so numeric accessors on [`Row`] accept all three.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Strict integer view. `None` means the value is not an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(value) => Some(*value),
            Scalar::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                Some(*value as i64)
            }
            Scalar::Text(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Key used for grouping and equality joins.
    pub fn group_key(&self) -> String {
        match self {
            Scalar::Null => "\u{0}null".to_string(),
            Scalar::Int(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
            Scalar::Text(text) => text.clone(),
            Scalar::Timestamp(ts) => ts.to_rfc3339(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Int(value) => write!(f, "{}", value),
            Scalar::Float(value) => write!(f, "{}", value),
            Scalar::Text(text) => write!(f, "{}", text),
            Scalar::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(value: DateTime<Utc>) -> Self {
        Scalar::Timestamp(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

/// One result row: column name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: HashMap<String, Scalar>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Scalar>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<Scalar>) {
        self.columns.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.columns.get(column)
    }

    /// Value of a column, or `Scalar::Null` when the column is absent.
    pub fn value(&self, column: &str) -> &Scalar {
        static NULL: Scalar = Scalar::Null;
        self.columns.get(column).unwrap_or(&NULL)
    }

    pub fn text(&self, column: &str) -> Result<String, StatsError> {
        match self.columns.get(column) {
            None | Some(Scalar::Null) => Err(StatsError::MissingColumn(column.to_string())),
            Some(value) => Ok(value.to_string()),
        }
    }

    pub fn opt_text(&self, column: &str) -> Option<String> {
        match self.columns.get(column) {
            None | Some(Scalar::Null) => None,
            Some(value) => Some(value.to_string()),
        }
    }

    /// Required non-negative count. Nulls and non-numeric values are errors.
    pub fn count(&self, column: &str) -> Result<u64, StatsError> {
        self.opt_count(column)?
            .ok_or_else(|| StatsError::MissingColumn(column.to_string()))
    }

    /// Optional non-negative count: absent or null yields `None`, anything
    /// present must parse.
    pub fn opt_count(&self, column: &str) -> Result<Option<u64>, StatsError> {
        match self.columns.get(column) {
            None | Some(Scalar::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .and_then(|v| u64::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| StatsError::MalformedNumber {
                    column: column.to_string(),
                    value: value.to_string(),
                }),
        }
    }

    pub fn opt_int(&self, column: &str) -> Result<Option<i64>, StatsError> {
        match self.columns.get(column) {
            None | Some(Scalar::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| StatsError::MalformedNumber {
                    column: column.to_string(),
                    value: value.to_string(),
                }),
        }
    }

    pub fn opt_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>, StatsError> {
        match self.columns.get(column) {
            None | Some(Scalar::Null) => Ok(None),
            Some(Scalar::Timestamp(ts)) => Ok(Some(*ts)),
            Some(Scalar::Text(text)) => parse_timestamp(text).map(Some).ok_or_else(|| {
                StatsError::MalformedTimestamp {
                    column: column.to_string(),
                    value: text.clone(),
                }
            }),
            Some(other) => Err(StatsError::MalformedTimestamp {
                column: column.to_string(),
                value: other.to_string(),
            }),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = (&String, &Scalar)> {
        self.columns.iter()
    }
}

/// Accepts RFC 3339 or a naive `YYYY-MM-DD HH:MM:SS` value taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn counts_accept_loosely_typed_numbers() {
        let row = Row::new()
            .with("int", 4)
            .with("text", "12")
            .with("padded", " 7 ")
            .with("float", 3.0);

        assert_eq!(row.count("int").unwrap(), 4);
        assert_eq!(row.count("text").unwrap(), 12);
        assert_eq!(row.count("padded").unwrap(), 7);
        assert_eq!(row.count("float").unwrap(), 3);
    }

    #[test]
    fn non_numeric_count_is_an_error() {
        let row = Row::new().with("total_matches", "twelve");

        let result = row.count("total_matches");
        assert!(matches!(
            result,
            Err(StatsError::MalformedNumber { ref column, ref value })
                if column == "total_matches" && value == "twelve"
        ));
    }

    #[test]
    fn negative_and_fractional_counts_are_errors() {
        let row = Row::new().with("negative", -1).with("fraction", 2.5);

        assert!(matches!(
            row.count("negative"),
            Err(StatsError::MalformedNumber { .. })
        ));
        assert!(matches!(
            row.count("fraction"),
            Err(StatsError::MalformedNumber { .. })
        ));
    }

    #[test]
    fn optional_count_tolerates_missing_and_null() {
        let row = Row::new().with("wins", Scalar::Null);

        assert_eq!(row.opt_count("wins").unwrap(), None);
        assert_eq!(row.opt_count("absent").unwrap(), None);
        assert!(matches!(
            row.count("absent"),
            Err(StatsError::MissingColumn(_))
        ));
    }

    #[test]
    fn timestamps_parse_from_text_and_native_values() {
        let expected = Utc.with_ymd_and_hms(2021, 6, 29, 10, 0, 0).unwrap();
        let row = Row::new()
            .with("rfc", "2021-06-29T10:00:00Z")
            .with("naive", "2021-06-29 10:00:00")
            .with("native", expected)
            .with("broken", "yesterday");

        assert_eq!(row.opt_timestamp("rfc").unwrap(), Some(expected));
        assert_eq!(row.opt_timestamp("naive").unwrap(), Some(expected));
        assert_eq!(row.opt_timestamp("native").unwrap(), Some(expected));
        assert!(row.opt_timestamp("broken").is_err());
    }
}
