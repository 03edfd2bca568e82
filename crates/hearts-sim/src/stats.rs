use std::fs;
use std::path::Path;

use hearts_bot::driver::DecisionSummary;
use hearts_core::game::result::GameResult;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Per-player tallies over many games, keyed by player name in first-seen order.
#[derive(Debug, Default)]
pub struct StatsCollector {
    players: Vec<PlayerAccumulator>,
    games: usize,
    failed: usize,
}

#[derive(Debug)]
struct PlayerAccumulator {
    name: String,
    strategy: String,
    games: usize,
    wins: usize,
    total_score: u64,
    decision_ms: f64,
    decisions: u64,
}

impl PlayerAccumulator {
    fn new(name: &str, strategy: &str) -> Self {
        Self {
            name: name.to_string(),
            strategy: strategy.to_string(),
            games: 0,
            wins: 0,
            total_score: 0,
            decision_ms: 0.0,
            decisions: 0,
        }
    }

    fn into_report(self) -> PlayerReport {
        let games = self.games.max(1) as f64;
        PlayerReport {
            win_rate: self.wins as f64 / games,
            avg_score: self.total_score as f64 / games,
            avg_ms_per_decision: (self.decisions > 0)
                .then(|| self.decision_ms / self.decisions as f64),
            name: self.name,
            strategy: self.strategy,
            games: self.games,
            wins: self.wins,
        }
    }
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn player_mut(&mut self, name: &str, strategy: &str) -> &mut PlayerAccumulator {
        let index = match self.players.iter().position(|player| player.name == name) {
            Some(index) => index,
            None => {
                self.players.push(PlayerAccumulator::new(name, strategy));
                self.players.len() - 1
            }
        };
        &mut self.players[index]
    }

    /// Every player on the lowest final score is credited with a win.
    pub fn record_game(&mut self, result: &GameResult) {
        self.games += 1;
        let low = result.players.iter().map(|p| p.score).min().unwrap_or(0);
        for player in &result.players {
            let acc = self.player_mut(&player.name, &player.strategy);
            acc.games += 1;
            acc.total_score += u64::from(player.score);
            if player.score == low {
                acc.wins += 1;
            }
        }
    }

    pub fn record_timings(&mut self, result: &GameResult, timings: &[DecisionSummary; 4]) {
        for player in &result.players {
            let timing = timings[player.seat.index()];
            let acc = self.player_mut(&player.name, &player.strategy);
            acc.decision_ms += timing.avg_ms_per_decision * f64::from(timing.decisions);
            acc.decisions += u64::from(timing.decisions);
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn finalize(self) -> StatsSummary {
        StatsSummary {
            games: self.games,
            failed_games: self.failed,
            players: self
                .players
                .into_iter()
                .map(PlayerAccumulator::into_report)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    pub name: String,
    pub strategy: String,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub avg_score: f64,
    pub avg_ms_per_decision: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub games: usize,
    pub failed_games: usize,
    pub players: Vec<PlayerReport>,
}

impl StatsSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a GameResult>) -> Self {
        let mut collector = StatsCollector::new();
        for result in results {
            collector.record_game(result);
        }
        collector.finalize()
    }

    pub fn player(&self, name: &str) -> Option<&PlayerReport> {
        self.players.iter().find(|player| player.name == name)
    }

    pub fn to_markdown(&self, title: &str) -> String {
        let mut rows = String::new();
        rows.push_str(&format!("# {title}\n\n"));
        rows.push_str(&format!(
            "Games: {} completed, {} failed\n\n",
            self.games, self.failed_games
        ));
        rows.push_str("| Player | Strategy | Games | Wins | Win % | Avg score | Avg ms/decision |\n");
        rows.push_str("|--------|----------|-------|------|-------|-----------|-----------------|\n");

        for player in &self.players {
            let latency = player
                .avg_ms_per_decision
                .map(|ms| format!("{ms:.3}"))
                .unwrap_or_else(|| "-".to_string());
            rows.push_str(&format!(
                "| {name} | {strategy} | {games} | {wins} | {win:.1}% | {avg:.2} | {latency} |\n",
                name = player.name,
                strategy = player.strategy,
                games = player.games,
                wins = player.wins,
                win = player.win_rate * 100.0,
                avg = player.avg_score,
            ));
        }
        rows
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>, title: &str) -> Result<(), StatsError> {
        fs::write(path.as_ref(), self.to_markdown(title)).map_err(|e| StatsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}
