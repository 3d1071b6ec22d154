//! # rf-slot-lab — Slot Round Engine
//!
//! Drives a single slot-machine round from spin request to settled win, and
//! chains rounds in auto-spin mode.
//!
//! ## Features
//!
//! - **Round Controller**: `Idle → Spinning → ShowingWin → Idle` on the FSM engine
//! - **Stop Latch**: manual stop and auto-stop timer finalize a round exactly once
//! - **Auto-Spin**: bounded sessions that end on request, budget or balance
//! - **Betting Ledger**: balance, bet cycling and last win
//! - **Synthetic Outcomes**: seedable placeholder generator (not a certified RNG)
//! - **Schedulers**: tokio timers in production, a simulated clock in tests
//!
//! ## Architecture
//!
//! ```text
//! RoundHandle ──commands──▶ RoundController ──events──▶ subscribers
//!                               │
//!                               ├── StateMachine<GameStage, RoundCore>
//!                               ├── BettingLedger (shared, read by displays)
//!                               ├── OutcomeSource (SyntheticOutcomeEngine)
//!                               ├── ReelPresenter (AnimationCue)
//!                               └── Scheduler (TokioScheduler / ManualScheduler)
//! ```

pub mod config;
pub mod engine;
pub mod ledger;
pub mod paytable;
pub mod presentation;
pub mod round;
pub mod runtime;
pub mod scheduler;
pub mod spin;
pub mod symbols;
pub mod timing;

pub use config::*;
pub use engine::*;
pub use ledger::*;
pub use paytable::*;
pub use presentation::*;
pub use round::*;
pub use runtime::*;
pub use scheduler::*;
pub use spin::*;
pub use symbols::*;
pub use timing::*;
