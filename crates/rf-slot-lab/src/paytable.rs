//! Center-line win evaluation

use serde::{Deserialize, Serialize};

use crate::config::MathConfig;
use crate::symbols::{SymbolId, SymbolMatrix, SymbolSet};

/// A winning run on the center line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineWin {
    /// Winning symbol ID
    pub symbol_id: SymbolId,
    /// Symbol name
    pub symbol_name: String,
    /// Consecutive matches from the first reel
    pub run_length: u8,
    /// Win amount
    pub win_amount: u64,
}

/// Result of evaluating a matrix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Symbol on the first reel's center row
    pub lead_symbol: Option<SymbolId>,
    /// Run length of the lead symbol (0 for an empty matrix)
    pub run_length: u8,
    /// Paying run, if the run reached the minimum
    pub line_win: Option<LineWin>,
}

impl EvaluationResult {
    pub fn is_win(&self) -> bool {
        self.line_win.is_some()
    }

    pub fn win_amount(&self) -> u64 {
        self.line_win.as_ref().map_or(0, |w| w.win_amount)
    }
}

/// Evaluates the center row of a matrix
#[derive(Debug, Clone)]
pub struct PayTable {
    pub symbols: SymbolSet,
    pub math: MathConfig,
}

impl PayTable {
    pub fn new(symbols: SymbolSet, math: MathConfig) -> Self {
        Self { symbols, math }
    }

    /// Evaluate the row at `row` across all reels.
    ///
    /// The run starts at reel 0 and stops at the first mismatch; it is not a
    /// count of matching symbols anywhere on the line.
    pub fn evaluate(&self, matrix: &SymbolMatrix, row: usize) -> EvaluationResult {
        let mut line = matrix.iter().map(|reel| reel.get(row).copied());

        let Some(Some(lead)) = line.next() else {
            return EvaluationResult::default();
        };

        let run_length = 1 + line.take_while(|s| *s == Some(lead)).count();
        let run_length = u8::try_from(run_length).unwrap_or(u8::MAX);

        let line_win = if run_length >= self.math.match_minimum {
            self.symbols.get(lead).map(|symbol| LineWin {
                symbol_id: lead,
                symbol_name: symbol.name.clone(),
                run_length,
                win_amount: u64::from(run_length)
                    .saturating_mul(self.math.win_multiplier)
                    .saturating_mul(symbol.pay_factor()),
            })
        } else {
            None
        };

        EvaluationResult {
            lead_symbol: Some(lead),
            run_length,
            line_win,
        }
    }
}
