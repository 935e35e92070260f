use super::{Row, StatsError, WinDistribution};

/// Column holding the win count in position tables.
pub const WINS_COLUMN: &str = "total_wins";
/// Column holding the matches played at that win count.
pub const MATCHES_COLUMN: &str = "total_matches";

/// Builds a win distribution from position rows already narrowed to one
/// entity.
///
/// Rows sharing a win count are summed. Win counts outside `0..=MAX_WINS`
/// are dropped. A non-numeric win count or match count fails the whole
/// build.
pub fn build_win_distribution<'a, I>(rows: I) -> Result<WinDistribution, StatsError>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut distribution = WinDistribution::new();
    for row in rows {
        let wins = row.count(WINS_COLUMN)?;
        let matches = row.count(MATCHES_COLUMN)?;
        if let Ok(wins) = u32::try_from(wins) {
            distribution.add(wins, matches);
        }
    }
    Ok(distribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Scalar, MAX_WINS};
    use rstest::rstest;

    fn position(wins: impl Into<Scalar>, matches: impl Into<Scalar>) -> Row {
        Row::new()
            .with("hero_card_id", "PVPDR_Hero_Thrall")
            .with(WINS_COLUMN, wins)
            .with(MATCHES_COLUMN, matches)
    }

    #[test]
    fn empty_input_yields_zeroed_domain() {
        let distribution = build_win_distribution(&Vec::<Row>::new()).unwrap();

        assert_eq!(distribution.len(), 13);
        assert!((0..=MAX_WINS).all(|wins| distribution.get(wins) == 0));
    }

    #[test]
    fn sums_rows_sharing_a_win_count() {
        let rows = vec![position(3, "4"), position(3, "6"), position(12, 1)];

        let distribution = build_win_distribution(&rows).unwrap();

        assert_eq!(distribution.get(3), 10);
        assert_eq!(distribution.get(12), 1);
        assert_eq!(distribution.get(0), 0);
        assert_eq!(distribution.total(), 11);
    }

    #[rstest]
    #[case(vec![(0, 5)], 5)]
    #[case(vec![(1, 2), (2, 3), (1, 4)], 9)]
    #[case(vec![(0, 1), (6, 1), (12, 1)], 3)]
    #[case(vec![], 0)]
    fn total_matches_all_in_domain_rows(#[case] input: Vec<(i64, i64)>, #[case] expected: u64) {
        let rows: Vec<Row> = input
            .into_iter()
            .map(|(wins, matches)| position(wins, matches.to_string()))
            .collect();

        let distribution = build_win_distribution(&rows).unwrap();

        assert_eq!(distribution.len(), 13);
        assert_eq!(distribution.total(), expected);
    }

    #[test]
    fn out_of_domain_win_counts_are_dropped() {
        let rows = vec![position(13, 7), position(2, 1)];

        let distribution = build_win_distribution(&rows).unwrap();

        assert_eq!(distribution.len(), 13);
        assert_eq!(distribution.total(), 1);
    }

    #[rstest]
    #[case(position(3, "abc"))]
    #[case(position("three", 4))]
    #[case(position(3, Scalar::Null))]
    fn malformed_counts_fail_fast(#[case] row: Row) {
        let result = build_win_distribution(&[row]);
        assert!(result.is_err());
    }
}
