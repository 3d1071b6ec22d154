//! Spin outcome

use serde::{Deserialize, Serialize};

use crate::paytable::{EvaluationResult, LineWin};
use crate::symbols::SymbolMatrix;

/// The result computed for a single round.
///
/// Produced once per round and consumed once by the stop step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Spin ID
    pub spin_id: String,
    /// Final grid (reels × rows)
    pub matrix: SymbolMatrix,
    /// Total win
    pub win_amount: u64,
    /// Paying center-line run
    pub line: Option<LineWin>,
}

impl Outcome {
    /// Build an outcome from an evaluated matrix
    pub fn new(spin_id: impl Into<String>, matrix: SymbolMatrix, eval: EvaluationResult) -> Self {
        Self {
            spin_id: spin_id.into(),
            matrix,
            win_amount: eval.win_amount(),
            line: eval.line_win,
        }
    }

    /// Outcome with an explicit win, used for scripted rounds
    pub fn fixed(spin_id: impl Into<String>, matrix: SymbolMatrix, win_amount: u64) -> Self {
        Self {
            spin_id: spin_id.into(),
            matrix,
            win_amount,
            line: None,
        }
    }

    pub fn is_win(&self) -> bool {
        self.win_amount > 0
    }
}
