//! Slot round configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::symbols::SymbolSet;
use crate::timing::RoundTiming;

/// Configuration load/validation failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Grid specification (reels × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: u8,
    /// Number of visible rows per reel
    pub rows: u8,
}

impl GridSpec {
    /// Classic 5×3
    pub fn standard_5x3() -> Self {
        Self { reels: 5, rows: 3 }
    }

    /// Row evaluated for wins
    pub fn center_row(&self) -> usize {
        self.rows as usize / 2
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.reels as usize * self.rows as usize
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::standard_5x3()
    }
}

/// Parameters of the placeholder outcome model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathConfig {
    /// Chance that a round is forced to win on the center line
    pub win_probability: f64,
    /// Shortest center-line run that pays
    pub match_minimum: u8,
    /// Pay per matched symbol, before the symbol rank factor
    pub win_multiplier: u64,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            win_probability: 0.3,
            match_minimum: 3,
            win_multiplier: 10,
        }
    }
}

/// Starting state of the betting ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub initial_balance: u64,
    pub initial_bet: u64,
    /// Selectable bets, cycled in this order
    pub available_bets: Vec<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_balance: 1000,
            initial_bet: 1,
            available_bets: vec![1, 2, 5, 10, 20, 50, 100],
        }
    }
}

/// Complete slot round configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Game identifier used in traces
    #[serde(default = "default_game_id")]
    pub game_id: String,
    #[serde(default)]
    pub grid: GridSpec,
    #[serde(default)]
    pub math: MathConfig,
    #[serde(default)]
    pub timing: RoundTiming,
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Rounds granted to a fresh auto-spin session
    #[serde(default = "default_auto_spin_budget")]
    pub auto_spin_budget: u32,
}

fn default_game_id() -> String {
    "classic_5x3".to_string()
}

fn default_auto_spin_budget() -> u32 {
    999
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            game_id: default_game_id(),
            grid: GridSpec::default(),
            math: MathConfig::default(),
            timing: RoundTiming::default(),
            ledger: LedgerConfig::default(),
            auto_spin_budget: default_auto_spin_budget(),
        }
    }
}

impl SlotConfig {
    /// Default config with turbo timing
    pub fn turbo() -> Self {
        Self {
            timing: RoundTiming::turbo(),
            ..Self::default()
        }
    }

    /// Check every invariant the engine, ledger and controller rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.reels == 0 || self.grid.rows == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must have at least one reel and one row, got {}x{}",
                self.grid.reels, self.grid.rows
            )));
        }
        if !(0.0..=1.0).contains(&self.math.win_probability) {
            return Err(ConfigError::Invalid(format!(
                "win_probability must be within [0, 1], got {}",
                self.math.win_probability
            )));
        }
        if self.math.match_minimum == 0 || self.math.match_minimum > self.grid.reels {
            return Err(ConfigError::Invalid(format!(
                "match_minimum must be within 1..={}, got {}",
                self.grid.reels, self.math.match_minimum
            )));
        }
        let top_pay = SymbolSet::classic().len() as u64;
        let max_line_win = u64::from(self.grid.reels)
            .checked_mul(self.math.win_multiplier)
            .and_then(|v| v.checked_mul(top_pay));
        if max_line_win.is_none() {
            return Err(ConfigError::Invalid(format!(
                "win_multiplier {} overflows the largest line win",
                self.math.win_multiplier
            )));
        }
        if self.ledger.available_bets.is_empty() {
            return Err(ConfigError::Invalid("available_bets is empty".into()));
        }
        if !self.ledger.available_bets.contains(&self.ledger.initial_bet) {
            return Err(ConfigError::Invalid(format!(
                "initial_bet {} is not one of {:?}",
                self.ledger.initial_bet, self.ledger.available_bets
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SlotConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML config
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: SlotConfig = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&text),
            _ => Self::from_json(&text),
        }
    }

    /// Export config as JSON
    pub fn export_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
