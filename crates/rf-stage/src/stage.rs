//! GameStage — The closed set of phases a slot round moves through
//!
//! A GameStage is NOT an animation. It is the SEMANTIC MEANING of where the
//! round currently is: waiting for input, spinning, or presenting a win.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical round stage
///
/// Exactly one stage is active at a time. A round always cycles
/// `Idle → Spinning → ShowingWin → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStage {
    /// Waiting for a spin request
    #[default]
    Idle,
    /// Reels in motion, outcome pending or held
    Spinning,
    /// Reels settled, win (if any) being presented
    ShowingWin,
}

/// Unknown stage name passed to [`GameStage::from_str`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stage name: {0}")]
pub struct UnknownStage(pub String);

impl GameStage {
    /// Every stage, in round order
    pub const ALL: [GameStage; 3] = [GameStage::Idle, GameStage::Spinning, GameStage::ShowingWin];

    /// Snake-case identifier used in traces and config files
    pub fn type_name(&self) -> &'static str {
        match self {
            GameStage::Idle => "idle",
            GameStage::Spinning => "spinning",
            GameStage::ShowingWin => "showing_win",
        }
    }

    /// Upper-case label shown on the stage readout
    pub fn display_name(&self) -> &'static str {
        match self {
            GameStage::Idle => "IDLE",
            GameStage::Spinning => "SPINNING",
            GameStage::ShowingWin => "SHOWING_WIN",
        }
    }

    /// Does this stage accept player bet/spin input?
    pub fn accepts_input(&self) -> bool {
        matches!(self, GameStage::Idle)
    }
}

impl fmt::Display for GameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for GameStage {
    type Err = UnknownStage;

    /// Accepts both `showing_win` and `SHOWING_WIN` spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        GameStage::ALL
            .into_iter()
            .find(|stage| stage.type_name() == lower)
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}
