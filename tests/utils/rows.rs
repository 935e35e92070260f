use chrono::{DateTime, Utc};

use duels_stats::stats::Row;

// ============================================================================
// Raw Row Builders
// ============================================================================

/// Builds raw stats rows stamped with a period start and game mode
pub struct RowBuilder {
    period_start: DateTime<Utc>,
    game_mode: &'static str,
}

impl RowBuilder {
    pub fn new(period_start: DateTime<Utc>, game_mode: &'static str) -> Self {
        Self {
            period_start,
            game_mode,
        }
    }

    fn base(&self) -> Row {
        Row::new()
            .with("period_start", self.period_start)
            .with("game_mode", self.game_mode)
    }

    pub fn hero(&self, card: &str, class: &str, matches: i64, wins: i64) -> Row {
        self.base()
            .with("hero_card_id", card)
            .with("hero_class", class)
            .with("total_matches", matches)
            .with("total_wins", wins)
    }

    /// Matches sums come back as text, like DECIMAL sums do on some backends
    pub fn hero_position(&self, card: &str, class: &str, wins: i64, matches: i64) -> Row {
        self.base()
            .with("hero_card_id", card)
            .with("hero_class", class)
            .with("total_wins", wins)
            .with("total_matches", matches.to_string())
    }

    pub fn treasure_pick(&self, card: &str, class: &str, offered: i64, picked: i64) -> Row {
        self.base()
            .with("card_id", card)
            .with("player_class", class)
            .with("total_offered", offered)
            .with("total_picked", picked)
    }

    pub fn treasure_winrate(&self, card: &str, class: &str, wins: i64, losses: i64) -> Row {
        self.base()
            .with("card_id", card)
            .with("player_class", class)
            .with("matches_played", wins + losses)
            .with("total_wins", wins)
            .with("total_losses", losses)
            .with("total_ties", 0)
    }

    pub fn deck(&self, id: i64, treasures: &str) -> Row {
        self.base()
            .with("id", id)
            .with("run_id", format!("run-{id}"))
            .with("decklist", "AAECAZ8FBg")
            .with("player_class", "paladin")
            .with("treasures_card_ids", treasures)
            .with("wins", 12)
            .with("losses", 1)
    }
}
