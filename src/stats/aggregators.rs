use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use super::distribution::{build_win_distribution, MATCHES_COLUMN, WINS_COLUMN};
use super::{
    DeckStat, EntityStat, EntityTotals, QueryExecutor, QueryWindow, Row, StatsError, StatsQuery,
    TreasureStat, WinDistribution,
};

pub const HERO_CLASS_COLUMN: &str = "hero_class";
pub const TREASURE_PICK_TABLE: &str = "duels_stats_treasure";
pub const TREASURE_WINRATE_TABLE: &str = "duels_stats_treasure_winrate";
pub const DECK_TABLE: &str = "duels_stats_deck";

/// Aggregates one card-keyed statistic for a window.
///
/// Totals are grouped by `(card id, hero class)`. The win distribution is
/// joined on the card id alone, so a card reported under several classes
/// gets the same distribution on every one of its rows.
#[instrument(skip(executor), fields(table = T::SOURCE.table))]
pub async fn aggregate_entities<T: EntityStat>(
    executor: &dyn QueryExecutor,
    window: QueryWindow,
) -> Result<Vec<T>, StatsError> {
    let source = T::SOURCE;
    let totals_query = StatsQuery::grouped_sum(
        source.table,
        &[source.id_column, HERO_CLASS_COLUMN],
        &[MATCHES_COLUMN, WINS_COLUMN],
        window,
    );
    let position_query = source.position_table.map(|table| {
        StatsQuery::grouped_sum(
            table,
            &[source.id_column, HERO_CLASS_COLUMN, WINS_COLUMN],
            &[MATCHES_COLUMN],
            window,
        )
    });

    let (rows, position_rows) = futures::try_join!(executor.execute(&totals_query), async {
        match &position_query {
            Some(query) => executor.execute(query).await,
            None => Ok(Vec::new()),
        }
    })?;

    let mut positions_by_card: HashMap<String, Vec<&Row>> = HashMap::new();
    for row in &position_rows {
        positions_by_card
            .entry(row.text(source.id_column)?)
            .or_default()
            .push(row);
    }

    let mut stats = Vec::with_capacity(rows.len());
    for row in &rows {
        let card_id = row.text(source.id_column)?;
        let win_distribution = match positions_by_card.get(&card_id) {
            Some(positions) => build_win_distribution(positions.iter().copied())?,
            None => WinDistribution::new(),
        };
        let totals = EntityTotals {
            creation_date: window.period_start,
            period_start: window.period_start,
            hero_class: row.opt_text(HERO_CLASS_COLUMN),
            total_matches: row.opt_count(MATCHES_COLUMN)?.unwrap_or_default(),
            total_wins: row.opt_count(WINS_COLUMN)?.unwrap_or_default(),
            win_distribution,
        };
        stats.push(T::from_parts(card_id, totals));
    }

    debug!(stat_count = stats.len(), "Entity stats aggregated");
    Ok(stats)
}

/// Joins treasure pick rates with treasure win rates for a window.
///
/// Treasures listed in `removed` are dropped before the join. A pick row
/// without a matching win rate row keeps its win/loss/tie fields empty.
#[instrument(skip(executor, removed))]
pub async fn aggregate_treasures(
    executor: &dyn QueryExecutor,
    window: QueryWindow,
    removed: &HashSet<String>,
) -> Result<Vec<TreasureStat>, StatsError> {
    let pick_query = StatsQuery::grouped_sum(
        TREASURE_PICK_TABLE,
        &["card_id", "player_class"],
        &["total_offered", "total_picked"],
        window,
    );
    let winrate_query = StatsQuery::grouped_sum(
        TREASURE_WINRATE_TABLE,
        &["card_id", "player_class"],
        &["matches_played", "total_losses", "total_ties", "total_wins"],
        window,
    );

    let (pick_rows, winrate_rows) = futures::try_join!(
        executor.execute(&pick_query),
        executor.execute(&winrate_query)
    )?;

    let mut winrates: HashMap<(String, String), &Row> = HashMap::new();
    for row in &winrate_rows {
        winrates
            .entry((row.text("card_id")?, row.text("player_class")?))
            .or_insert(row);
    }

    let mut stats = Vec::with_capacity(pick_rows.len());
    for row in &pick_rows {
        let card_id = row.text("card_id")?;
        if removed.contains(&card_id) {
            continue;
        }
        let player_class = row.text("player_class")?;
        let winrate = winrates.get(&(card_id.clone(), player_class.clone()));
        let winrate_count = |column: &str| -> Result<Option<u64>, StatsError> {
            match winrate {
                Some(winrate) => winrate.opt_count(column),
                None => Ok(None),
            }
        };

        stats.push(TreasureStat {
            period_start: window.period_start,
            total_offered: row.opt_count("total_offered")?.unwrap_or_default(),
            total_picked: row.opt_count("total_picked")?.unwrap_or_default(),
            matches_played: winrate_count("matches_played")?,
            total_wins: winrate_count("total_wins")?,
            total_losses: winrate_count("total_losses")?,
            total_ties: winrate_count("total_ties")?,
            card_id,
            player_class,
        });
    }

    debug!(stat_count = stats.len(), "Treasure stats aggregated");
    Ok(stats)
}

/// Splits the stored comma-joined treasure list. Empty input is no treasures.
pub fn parse_treasure_ids(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::to_string).collect()
}

fn deck_from_row(row: &Row) -> Result<DeckStat, StatsError> {
    Ok(DeckStat {
        id: row
            .opt_int("id")?
            .ok_or_else(|| StatsError::MissingColumn("id".to_string()))?,
        period_start: row.opt_timestamp("period_start")?,
        game_mode: row.opt_text("game_mode"),
        decklist: row.opt_text("decklist"),
        final_decklist: row.opt_text("final_decklist"),
        player_class: row.opt_text("player_class"),
        hero_card_id: row.opt_text("hero_card_id"),
        hero_power_card_id: row.opt_text("hero_power_card_id"),
        signature_treasure_card_id: row.opt_text("signature_treasure_card_id"),
        treasures_card_ids: parse_treasure_ids(
            &row.opt_text("treasures_card_ids").unwrap_or_default(),
        ),
        run_id: row.opt_text("run_id"),
        wins: row.opt_int("wins")?,
        losses: row.opt_int("losses")?,
        rating: row.opt_int("rating")?,
        run_start_date: row.opt_timestamp("run_start_date")?,
    })
}

/// Loads the most recent runs for a window, newest first.
#[instrument(skip(executor))]
pub async fn load_decks(
    executor: &dyn QueryExecutor,
    window: QueryWindow,
    limit: u32,
) -> Result<Vec<DeckStat>, StatsError> {
    let rows = executor
        .execute(&StatsQuery::recent(DECK_TABLE, window, limit))
        .await?;
    let decks = rows.iter().map(deck_from_row).collect::<Result<Vec<_>, _>>()?;
    debug!(deck_count = decks.len(), "Deck stats loaded");
    Ok(decks)
}
