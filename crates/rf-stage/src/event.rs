//! RoundEvent — What the round controller publishes to its listeners
//!
//! Display adapters subscribe to these; they never call back into the
//! controller to find out what happened.

use serde::{Deserialize, Serialize};

use crate::stage::GameStage;

/// Read-only view of everything a display needs to refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Current balance
    pub balance: u64,
    /// Current bet
    pub bet: u64,
    /// Win of the last settled round (0 after a new bet)
    pub last_win: u64,
    /// Active stage
    pub stage: GameStage,
    /// Auto-spin session active?
    pub auto_spin: bool,
    /// Spins left in the auto-spin session
    pub auto_spins_remaining: u32,
}

/// Why an auto-spin session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoStopReason {
    /// Player asked to stop
    Requested,
    /// Spin budget used up
    Exhausted,
    /// Balance no longer covers the bet
    InsufficientBalance,
}

/// An item on the controller's event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    /// Bet placed, round starting
    SpinStart {
        round_id: u64,
        bet: u64,
    },

    /// Stop accepted for the round (emitted once, manual or timer)
    SpinStop {
        round_id: u64,
        manual: bool,
    },

    /// Stage entered
    StageChange {
        stage: GameStage,
    },

    /// Outcome final and applied to the ledger
    SpinComplete {
        round_id: u64,
        /// Column-major symbol ids (reels × rows)
        matrix: Vec<Vec<u32>>,
        win_amount: u64,
    },

    /// Auto-spin session created
    AutoSpinStart {
        budget: u32,
    },

    /// Auto-spin session destroyed
    AutoSpinStop {
        reason: AutoStopReason,
    },

    /// Balance, bet, last win or stage changed
    Update(RoundSnapshot),
}

impl RoundEvent {
    /// Snake-case event name
    pub fn type_name(&self) -> &'static str {
        match self {
            RoundEvent::SpinStart { .. } => "spin_start",
            RoundEvent::SpinStop { .. } => "spin_stop",
            RoundEvent::StageChange { .. } => "stage_change",
            RoundEvent::SpinComplete { .. } => "spin_complete",
            RoundEvent::AutoSpinStart { .. } => "auto_spin_start",
            RoundEvent::AutoSpinStop { .. } => "auto_spin_stop",
            RoundEvent::Update(_) => "update",
        }
    }

    /// Stage carried by a stage change, if this is one
    pub fn stage(&self) -> Option<GameStage> {
        match self {
            RoundEvent::StageChange { stage } => Some(*stage),
            _ => None,
        }
    }

    /// Win carried by a spin completion, if this is one
    pub fn win_amount(&self) -> Option<u64> {
        match self {
            RoundEvent::SpinComplete { win_amount, .. } => Some(*win_amount),
            _ => None,
        }
    }
}

/// A round event with the time it was observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The event
    pub event: RoundEvent,

    /// Milliseconds since the trace started
    pub timestamp_ms: f64,
}

impl StageEvent {
    pub fn new(event: RoundEvent, timestamp_ms: f64) -> Self {
        Self {
            event,
            timestamp_ms,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.event.type_name()
    }
}
