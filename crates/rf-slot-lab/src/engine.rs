//! Synthetic Outcome Engine — placeholder round outcome generator
//!
//! NOT a certified RNG. A production deployment must source randomness from
//! an audited generator; swap it in behind [`OutcomeSource`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{GridSpec, SlotConfig};
use crate::paytable::PayTable;
use crate::spin::Outcome;
use crate::symbols::{SymbolId, SymbolMatrix, SymbolSet};

/// Anything that can produce the outcome of the next round
pub trait OutcomeSource: Send {
    fn next_outcome(&mut self) -> Outcome;
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub wins: u64,
    pub forced_wins: u64,
    pub total_win: u64,
    pub max_win: u64,
}

impl SessionStats {
    /// Calculate hit rate (%)
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Synthetic Outcome Engine
///
/// Rolls a forced-win flag, fills the grid, then evaluates the center line.
pub struct SyntheticOutcomeEngine {
    grid: GridSpec,
    paytable: PayTable,
    rng: StdRng,
    spin_count: u64,
    stats: SessionStats,
}

impl SyntheticOutcomeEngine {
    /// Create with specific config
    pub fn new(config: &SlotConfig) -> Self {
        Self {
            grid: config.grid,
            paytable: PayTable::new(SymbolSet::classic(), config.math.clone()),
            rng: StdRng::from_os_rng(),
            spin_count: 0,
            stats: SessionStats::default(),
        }
    }

    /// Create with a fixed seed for reproducible results
    pub fn with_seed(config: &SlotConfig, seed: u64) -> Self {
        let mut engine = Self::new(config);
        engine.seed(seed);
        engine
    }

    /// Seed RNG for reproducible results
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Get session stats
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn paytable(&self) -> &PayTable {
        &self.paytable
    }

    /// Reset session stats
    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
        self.spin_count = 0;
    }

    /// Generate the next outcome
    pub fn spin(&mut self) -> Outcome {
        self.spin_count += 1;

        let forced_symbol = self
            .rng
            .random_bool(self.paytable.math.win_probability.clamp(0.0, 1.0))
            .then(|| self.random_symbol());

        let matrix = self.generate_grid(forced_symbol);
        let eval = self.paytable.evaluate(&matrix, self.grid.center_row());
        let outcome = Outcome::new(format!("spin-{:06}", self.spin_count), matrix, eval);

        log::debug!(
            "Generated {} [{}] win={}",
            outcome.spin_id,
            self.paytable
                .symbols
                .render_row(&outcome.matrix, self.grid.center_row()),
            outcome.win_amount
        );

        self.update_stats(&outcome, forced_symbol.is_some());
        outcome
    }

    fn random_symbol(&mut self) -> SymbolId {
        self.rng.random_range(0..self.paytable.symbols.len()) as SymbolId
    }

    fn generate_grid(&mut self, forced_symbol: Option<SymbolId>) -> SymbolMatrix {
        let reels = self.grid.reels as usize;
        let rows = self.grid.rows as usize;
        let center = self.grid.center_row();

        let mut grid = Vec::with_capacity(reels);
        for _ in 0..reels {
            let mut column = Vec::with_capacity(rows);
            for row in 0..rows {
                match forced_symbol {
                    Some(symbol) if row == center => column.push(symbol),
                    _ => column.push(self.random_symbol()),
                }
            }
            grid.push(column);
        }
        grid
    }

    fn update_stats(&mut self, outcome: &Outcome, forced: bool) {
        self.stats.total_spins += 1;
        if forced {
            self.stats.forced_wins += 1;
        }
        if outcome.is_win() {
            self.stats.wins += 1;
            self.stats.total_win = self.stats.total_win.saturating_add(outcome.win_amount);
            self.stats.max_win = self.stats.max_win.max(outcome.win_amount);
        }
    }
}

impl OutcomeSource for SyntheticOutcomeEngine {
    fn next_outcome(&mut self) -> Outcome {
        self.spin()
    }
}

/// Replays a fixed list of outcomes, cycling when exhausted
#[derive(Debug, Clone, Default)]
pub struct ScriptedOutcomes {
    outcomes: Vec<Outcome>,
    cursor: usize,
}

impl ScriptedOutcomes {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes, cursor: 0 }
    }

    /// How many outcomes have been handed out
    pub fn served(&self) -> usize {
        self.cursor
    }
}

impl OutcomeSource for ScriptedOutcomes {
    fn next_outcome(&mut self) -> Outcome {
        let outcome = if self.outcomes.is_empty() {
            Outcome::fixed(format!("scripted-{:06}", self.cursor + 1), Vec::new(), 0)
        } else {
            self.outcomes[self.cursor % self.outcomes.len()].clone()
        };
        self.cursor += 1;
        outcome
    }
}
