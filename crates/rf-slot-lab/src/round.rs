//! Round Controller — sequences one slot round on top of the FSM engine
//!
//! ```text
//! Idle ──spin──▶ Spinning ──stop/timeout──▶ ShowingWin ──presented──▶ Idle
//! ```
//!
//! The controller is a synchronous state object. The outcome is drawn and
//! held on entering Spinning; timers and animation completion come back in
//! as [`RoundCommand`]s through [`RoundController::handle`], so a single
//! owner drives it and no locks guard the round itself.

use std::sync::Arc;

use parking_lot::RwLock;
use rf_fsm::{StateMachine, TransitionError};
use rf_stage::{AutoStopReason, GameStage, RoundEvent, RoundSnapshot};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{ConfigError, SlotConfig};
use crate::engine::{OutcomeSource, SyntheticOutcomeEngine};
use crate::ledger::{BettingLedger, LedgerError};
use crate::presentation::{AnimationCue, HeadlessPresenter, ReelPresenter};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::spin::Outcome;

/// Ledger shared with display adapters (read) and the controller (write)
pub type SharedLedger = Arc<RwLock<BettingLedger>>;

/// Event channel capacity
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum RoundError {
    #[error("round controller has shut down")]
    ControllerClosed,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Input to the controller, from the player or from the scheduler
#[derive(Debug, Clone, PartialEq)]
pub enum RoundCommand {
    // Player
    Spin { auto: bool },
    Stop,
    StopAuto,
    ChangeBet,

    // Deferred
    AutoStop { round_id: u64 },
    ReelsSettled { round_id: u64 },
    WinShown { round_id: u64 },
    WinHeld { round_id: u64 },
    WinFaded { round_id: u64 },
    AutoSpin,

    /// Ends the runtime loop
    Shutdown,
}

/// Active auto-spin session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSpinSession {
    pub remaining: u32,
}

/// Button state derived from the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub spin_visible: bool,
    pub spin_enabled: bool,
    pub stop_visible: bool,
    pub stop_enabled: bool,
    pub bet_enabled: bool,
    pub auto_label: &'static str,
}

enum StopStep {
    /// Stop latch already set for this round
    Ignored,
    /// No outcome to stop on
    Aborted,
    /// Reels are stopping
    Stopping,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUND CORE (hook context)
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the stage hooks act on
pub struct RoundCore {
    config: SlotConfig,
    ledger: SharedLedger,
    published: Arc<RwLock<RoundSnapshot>>,
    outcomes: Box<dyn OutcomeSource>,
    presenter: Box<dyn ReelPresenter>,
    scheduler: Box<dyn Scheduler>,
    events: broadcast::Sender<RoundEvent>,

    stage: GameStage,
    round_id: u64,
    pending_outcome: Option<Outcome>,
    auto_stop_timer: Option<TimerHandle>,
    stop_guard: bool,
    auto_spin: Option<AutoSpinSession>,

    /// Transition requested by an enter hook, run once the hook returns
    follow_up: Option<GameStage>,
}

impl RoundCore {
    fn emit(&self, event: RoundEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn snapshot(&self) -> RoundSnapshot {
        let ledger = self.ledger.read();
        RoundSnapshot {
            balance: ledger.balance(),
            bet: ledger.bet(),
            last_win: ledger.last_win(),
            stage: self.stage,
            auto_spin: self.auto_spin.is_some(),
            auto_spins_remaining: self.auto_spin.map_or(0, |s| s.remaining),
        }
    }

    fn emit_update(&self) {
        let snapshot = self.snapshot();
        *self.published.write() = snapshot;
        self.emit(RoundEvent::Update(snapshot));
    }

    fn announce_stage(&mut self, stage: GameStage) {
        self.stage = stage;
        self.emit(RoundEvent::StageChange { stage });
    }

    fn can_place_bet(&self) -> bool {
        self.ledger.read().can_place_bet()
    }

    fn cancel_auto_stop(&mut self) {
        if let Some(timer) = self.auto_stop_timer.take() {
            timer.cancel();
        }
    }

    fn after_cue(&mut self, cue: AnimationCue, command: RoundCommand) {
        match cue {
            AnimationCue::Delay(delay) => {
                self.scheduler.schedule(delay, command);
            }
            AnimationCue::Signal(signal) => self.scheduler.schedule_on(signal, command),
        }
    }

    fn start_auto_spin(&mut self) {
        let budget = self.config.auto_spin_budget;
        self.auto_spin = Some(AutoSpinSession { remaining: budget });
        log::info!("Auto-spin started ({budget} spins)");
        self.emit(RoundEvent::AutoSpinStart { budget });
    }

    fn end_auto_spin(&mut self, reason: AutoStopReason) {
        if self.auto_spin.take().is_some() {
            log::info!("Auto-spin stopped: {reason:?}");
            self.emit(RoundEvent::AutoSpinStop { reason });
        }
    }

    fn begin_stop(&mut self, manual: bool) -> StopStep {
        if self.stop_guard {
            log::trace!("Round {} already stopping", self.round_id);
            return StopStep::Ignored;
        }
        self.stop_guard = true;
        self.cancel_auto_stop();
        self.emit(RoundEvent::SpinStop {
            round_id: self.round_id,
            manual,
        });

        let Some(outcome) = self.pending_outcome.as_ref() else {
            log::error!("Round {} stopped without an outcome, aborting", self.round_id);
            return StopStep::Aborted;
        };

        let cue = self.presenter.stop_at_result(&outcome.matrix);
        self.after_cue(cue, RoundCommand::ReelsSettled {
            round_id: self.round_id,
        });
        StopStep::Stopping
    }

    // ─── stage hooks ─────────────────────────────────────────────────────────

    fn enter_spinning(&mut self) {
        self.presenter.hide_win();
        self.cancel_auto_stop();

        // Held before any stop can reach the round
        let outcome = self.outcomes.next_outcome();
        log::debug!(
            "Round {} outcome {} (win {})",
            self.round_id,
            outcome.spin_id,
            outcome.win_amount
        );
        self.pending_outcome = Some(outcome);
        self.presenter.start_continuous_spin();

        let delay = self.config.timing.auto_stop_delay();
        let timer = self.scheduler.schedule(delay, RoundCommand::AutoStop {
            round_id: self.round_id,
        });
        self.auto_stop_timer = Some(timer);
        self.emit_update();
    }

    fn enter_showing_win(&mut self) {
        self.emit_update();

        let win = self.pending_outcome.as_ref().map_or(0, |o| o.win_amount);
        if win == 0 {
            self.follow_up = Some(GameStage::Idle);
            return;
        }

        let cue = self.presenter.show_win(win);
        self.after_cue(cue, RoundCommand::WinShown {
            round_id: self.round_id,
        });
    }

    fn enter_idle(&mut self) {
        self.stop_guard = false;
        self.presenter.hide_win();
        self.pending_outcome = None;

        if let Some(session) = self.auto_spin.as_mut() {
            session.remaining = session.remaining.saturating_sub(1);
            if session.remaining == 0 {
                self.end_auto_spin(AutoStopReason::Exhausted);
            } else if !self.can_place_bet() {
                self.end_auto_spin(AutoStopReason::InsufficientBalance);
            } else {
                let delay = self.config.timing.auto_spin_delay();
                self.scheduler.schedule(delay, RoundCommand::AutoSpin);
            }
        }

        self.emit_update();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROLLER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct RoundController {
    fsm: StateMachine<GameStage, RoundCore>,
    core: RoundCore,
}

impl RoundController {
    /// Controller with the synthetic outcome engine and a headless presenter
    pub fn new(config: SlotConfig, scheduler: Box<dyn Scheduler>) -> Result<Self, RoundError> {
        config.validate()?;
        let ledger = BettingLedger::new(&config.ledger)?;
        let outcomes = SyntheticOutcomeEngine::new(&config);
        let presenter =
            HeadlessPresenter::new(config.timing.clone()).with_center_row(config.grid.center_row());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let core = RoundCore {
            config,
            ledger: Arc::new(RwLock::new(ledger)),
            published: Arc::new(RwLock::new(RoundSnapshot::default())),
            outcomes: Box::new(outcomes),
            presenter: Box::new(presenter),
            scheduler,
            events,
            stage: GameStage::Idle,
            round_id: 0,
            pending_outcome: None,
            auto_stop_timer: None,
            stop_guard: false,
            auto_spin: None,
            follow_up: None,
        };
        *core.published.write() = core.snapshot();

        Ok(Self {
            fsm: Self::build_fsm(),
            core,
        })
    }

    /// Replace the outcome source
    pub fn with_outcomes(mut self, outcomes: impl OutcomeSource + 'static) -> Self {
        self.core.outcomes = Box::new(outcomes);
        self
    }

    /// Replace the presenter
    pub fn with_presenter(mut self, presenter: impl ReelPresenter + 'static) -> Self {
        self.core.presenter = Box::new(presenter);
        self
    }

    fn build_fsm() -> StateMachine<GameStage, RoundCore> {
        let mut fsm = StateMachine::new(GameStage::Idle);
        fsm.add_transition([GameStage::Idle], GameStage::Spinning)
            .add_transition([GameStage::Spinning], GameStage::ShowingWin)
            .add_transition([GameStage::ShowingWin], GameStage::Idle);

        for stage in GameStage::ALL {
            fsm.on_enter(stage, move |core: &mut RoundCore| core.announce_stage(stage));
        }

        fsm.on_exit(GameStage::Spinning, RoundCore::cancel_auto_stop)
            .on_enter(GameStage::Spinning, RoundCore::enter_spinning)
            .on_enter(GameStage::ShowingWin, RoundCore::enter_showing_win)
            .on_enter(GameStage::Idle, RoundCore::enter_idle);
        fsm
    }

    /// Transition, then run whatever the enter hooks queued
    fn transition(&mut self, to: GameStage) -> Result<(), TransitionError<GameStage>> {
        self.fsm.transition_with(to, &mut self.core)?;
        while let Some(next) = self.core.follow_up.take() {
            self.fsm.transition_with(next, &mut self.core)?;
        }
        Ok(())
    }

    fn is_current(&self, round_id: u64, stage: GameStage, what: &str) -> bool {
        let current = round_id == self.core.round_id && self.fsm.is(stage);
        if !current {
            log::debug!(
                "Ignoring stale {what} for round {round_id} (round {}, {:?})",
                self.core.round_id,
                self.fsm.current()
            );
        }
        current
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PLAYER REQUESTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start a round. `auto` opens an auto-spin session if none is active.
    ///
    /// Returns whether the round started.
    pub fn request_spin(&mut self, auto: bool) -> bool {
        if !self.fsm.is(GameStage::Idle) {
            log::debug!("Spin ignored in {:?}", self.fsm.current());
            return false;
        }
        if !self.core.can_place_bet() {
            log::warn!("Spin rejected: balance below bet");
            self.core.end_auto_spin(AutoStopReason::InsufficientBalance);
            self.core.emit_update();
            return false;
        }

        if auto && self.core.auto_spin.is_none() {
            self.core.start_auto_spin();
        }

        let placed = self.core.ledger.write().place_bet();
        let bet = match placed {
            Ok(bet) => bet,
            Err(err) => {
                log::warn!("Spin rejected: {err}");
                self.core.end_auto_spin(AutoStopReason::InsufficientBalance);
                self.core.emit_update();
                return false;
            }
        };

        self.core.round_id += 1;
        self.core.emit(RoundEvent::SpinStart {
            round_id: self.core.round_id,
            bet,
        });
        self.transition(GameStage::Spinning).is_ok()
    }

    /// Manual stop. Only meaningful while spinning.
    pub fn request_stop(&mut self) -> bool {
        if !self.fsm.is(GameStage::Spinning) {
            log::debug!("Stop ignored in {:?}", self.fsm.current());
            return false;
        }
        self.stop(true)
    }

    /// End the auto-spin session. The round in flight finishes normally.
    pub fn request_stop_auto(&mut self) {
        self.core.end_auto_spin(AutoStopReason::Requested);
        self.core.emit_update();
    }

    /// Cycle to the next bet. Only allowed while idle.
    pub fn request_change_bet(&mut self) -> Option<u64> {
        if !self.fsm.is(GameStage::Idle) {
            log::debug!("Bet change ignored in {:?}", self.fsm.current());
            return None;
        }

        let changed = {
            let mut ledger = self.core.ledger.write();
            let next = ledger.next_bet();
            ledger.change_bet(next).map(|_| next)
        };

        match changed {
            Ok(next) => {
                self.core.emit_update();
                Some(next)
            }
            Err(err) => {
                log::warn!("Bet change rejected: {err}");
                None
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // COMMAND DISPATCH
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn handle(&mut self, command: RoundCommand) {
        match command {
            RoundCommand::Spin { auto } => {
                self.request_spin(auto);
            }
            RoundCommand::Stop => {
                self.request_stop();
            }
            RoundCommand::StopAuto => self.request_stop_auto(),
            RoundCommand::ChangeBet => {
                self.request_change_bet();
            }
            RoundCommand::AutoStop { round_id } => {
                if self.is_current(round_id, GameStage::Spinning, "auto-stop") {
                    self.stop(false);
                }
            }
            RoundCommand::ReelsSettled { round_id } => {
                if self.is_current(round_id, GameStage::Spinning, "settle") {
                    self.finish_round();
                }
            }
            RoundCommand::WinShown { round_id } => {
                if self.is_current(round_id, GameStage::ShowingWin, "win entrance") {
                    let hold = self.core.config.timing.win_hold();
                    self.core
                        .scheduler
                        .schedule(hold, RoundCommand::WinHeld { round_id });
                }
            }
            RoundCommand::WinHeld { round_id } => {
                if self.is_current(round_id, GameStage::ShowingWin, "win hold") {
                    let cue = self.core.presenter.fade_win();
                    self.core.after_cue(cue, RoundCommand::WinFaded { round_id });
                }
            }
            RoundCommand::WinFaded { round_id } => {
                if self.is_current(round_id, GameStage::ShowingWin, "win fade") {
                    let _ = self.transition(GameStage::Idle);
                }
            }
            RoundCommand::AutoSpin => {
                if self.core.auto_spin.is_some() {
                    self.request_spin(false);
                } else {
                    log::debug!("Auto-spin re-request ignored, session ended");
                }
            }
            RoundCommand::Shutdown => {}
        }
    }

    fn stop(&mut self, manual: bool) -> bool {
        match self.core.begin_stop(manual) {
            StopStep::Ignored => false,
            StopStep::Aborted => {
                let _ = self.transition(GameStage::ShowingWin);
                true
            }
            StopStep::Stopping => true,
        }
    }

    /// Apply the held outcome, then present it
    fn finish_round(&mut self) {
        let round_id = self.core.round_id;
        let Some((matrix, win_amount)) = self
            .core
            .pending_outcome
            .as_ref()
            .map(|o| (o.matrix.clone(), o.win_amount))
        else {
            log::error!("Round {round_id} settled without an outcome, aborting");
            let _ = self.transition(GameStage::ShowingWin);
            return;
        };

        self.core.ledger.write().apply_win(win_amount);
        log::info!("Round {round_id} complete: win {win_amount}");
        self.core.emit(RoundEvent::SpinComplete {
            round_id,
            matrix,
            win_amount,
        });

        let _ = self.transition(GameStage::ShowingWin);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn stage(&self) -> GameStage {
        self.fsm.current()
    }

    /// Id of the latest round (0 before the first spin)
    pub fn round_id(&self) -> u64 {
        self.core.round_id
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        self.core.snapshot()
    }

    /// Latest snapshot published with an update event
    pub fn published_snapshot(&self) -> Arc<RwLock<RoundSnapshot>> {
        self.core.published.clone()
    }

    pub fn ledger(&self) -> SharedLedger {
        self.core.ledger.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.core.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<RoundEvent> {
        self.core.events.clone()
    }

    pub fn config(&self) -> &SlotConfig {
        &self.core.config
    }

    pub fn auto_spin(&self) -> Option<AutoSpinSession> {
        self.core.auto_spin
    }

    pub fn is_stop_latched(&self) -> bool {
        self.core.stop_guard
    }

    pub fn has_auto_stop_timer(&self) -> bool {
        self.core
            .auto_stop_timer
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    pub fn control_state(&self) -> ControlState {
        let stage = self.fsm.current();
        ControlState {
            spin_visible: stage == GameStage::Idle,
            spin_enabled: stage == GameStage::Idle && self.core.can_place_bet(),
            stop_visible: stage != GameStage::Idle,
            stop_enabled: stage == GameStage::Spinning && !self.core.stop_guard,
            bet_enabled: stage.accepts_input(),
            auto_label: if self.core.auto_spin.is_some() {
                "STOP AUTO"
            } else {
                "AUTO"
            },
        }
    }
}

impl std::fmt::Debug for RoundController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundController")
            .field("stage", &self.fsm.current())
            .field("round_id", &self.core.round_id)
            .field("stop_guard", &self.core.stop_guard)
            .field("auto_spin", &self.core.auto_spin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::engine::ScriptedOutcomes;
    use crate::scheduler::ManualScheduler;
    use crate::symbols::SymbolMatrix;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Center row [S0, S0, S0, S5, S6] pays 3 × 10 × 1
    fn winning_outcome() -> Outcome {
        let matrix: SymbolMatrix = [0, 0, 0, 5, 6].iter().map(|&s| vec![9, s, 8]).collect();
        Outcome::fixed("spin-win", matrix, 30)
    }

    fn losing_outcome() -> Outcome {
        let matrix: SymbolMatrix = [0, 1, 2, 3, 4].iter().map(|&s| vec![9, s, 8]).collect();
        Outcome::fixed("spin-lose", matrix, 0)
    }

    fn setup(config: SlotConfig, outcomes: Vec<Outcome>) -> (RoundController, ManualScheduler) {
        let clock = ManualScheduler::new();
        let controller = RoundController::new(config, Box::new(clock.clone()))
            .unwrap()
            .with_outcomes(ScriptedOutcomes::new(outcomes));
        (controller, clock)
    }

    fn run_for(controller: &mut RoundController, clock: &ManualScheduler, by: Duration) {
        let until = clock.now() + by;
        while let Some(command) = clock.step(until) {
            controller.handle(command);
        }
    }

    fn run_all(controller: &mut RoundController, clock: &ManualScheduler) {
        while let Some(command) = clock.next() {
            controller.handle(command);
        }
    }

    fn drain(rx: &mut broadcast::Receiver<RoundEvent>) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn count(events: &[RoundEvent], type_name: &str) -> usize {
        events.iter().filter(|e| e.type_name() == type_name).count()
    }

    #[test]
    fn test_winning_round_end_to_end() {
        let (mut controller, clock) = setup(SlotConfig::default(), vec![winning_outcome()]);
        let mut rx = controller.subscribe();

        assert!(controller.request_spin(false));
        let snap = controller.snapshot();
        assert_eq!((snap.balance, snap.last_win), (999, 0));
        assert_eq!(controller.stage(), GameStage::Spinning);

        // Outcome arrives, reels spin until the auto-stop timer
        run_for(&mut controller, &clock, ms(999));
        assert_eq!(controller.stage(), GameStage::Spinning);
        assert!(controller.has_auto_stop_timer());

        run_for(&mut controller, &clock, ms(1));
        assert!(controller.is_stop_latched());

        run_all(&mut controller, &clock);
        assert_eq!(clock.now(), SlotConfig::default().timing.winning_round());
        assert_eq!(controller.stage(), GameStage::Idle);
        let snap = controller.snapshot();
        assert_eq!((snap.balance, snap.last_win), (1029, 30));
        assert!(!controller.is_stop_latched());

        let events = drain(&mut rx);
        let stages: Vec<_> = events.iter().filter_map(|e| e.stage()).collect();
        assert_eq!(
            stages,
            vec![GameStage::Spinning, GameStage::ShowingWin, GameStage::Idle]
        );
        assert!(events.contains(&RoundEvent::SpinStop {
            round_id: 1,
            manual: false
        }));
        assert_eq!(events.iter().filter_map(|e| e.win_amount()).sum::<u64>(), 30);
        assert_eq!(controller.published_snapshot().read().balance, 1029);
    }

    #[test]
    fn test_losing_round_skips_win_presentation() {
        let (mut controller, clock) = setup(SlotConfig::default(), vec![losing_outcome()]);
        controller.request_spin(false);
        run_all(&mut controller, &clock);

        assert_eq!(clock.now(), SlotConfig::default().timing.losing_round());
        assert_eq!(controller.stage(), GameStage::Idle);
        assert_eq!(controller.snapshot().balance, 999);
    }

    #[test]
    fn test_manual_stop_and_timer_finalize_once() {
        let (mut controller, clock) = setup(SlotConfig::default(), vec![winning_outcome()]);
        let mut rx = controller.subscribe();

        controller.request_spin(false);
        run_for(&mut controller, &clock, ms(0));
        assert!(controller.has_auto_stop_timer());

        assert!(controller.request_stop());
        assert!(!controller.has_auto_stop_timer());
        // Timer fires anyway, and a second click arrives
        controller.handle(RoundCommand::AutoStop { round_id: 1 });
        assert!(!controller.request_stop());

        run_all(&mut controller, &clock);

        let events = drain(&mut rx);
        assert_eq!(count(&events, "spin_stop"), 1);
        assert_eq!(count(&events, "spin_complete"), 1);
        assert_eq!(controller.snapshot().balance, 1029);
    }

    #[test]
    fn test_stop_right_after_spin_settles_win() {
        let (mut controller, clock) = setup(SlotConfig::default(), vec![winning_outcome()]);
        let mut rx = controller.subscribe();

        controller.request_spin(false);
        assert!(controller.control_state().stop_enabled);
        assert!(controller.request_stop());
        assert_eq!(controller.stage(), GameStage::Spinning);
        assert!(!controller.has_auto_stop_timer());

        run_all(&mut controller, &clock);
        assert_eq!(controller.stage(), GameStage::Idle);
        // Settle plus the win presentation, no auto-stop wait
        let timing = SlotConfig::default().timing;
        assert_eq!(clock.now(), timing.winning_round() - timing.auto_stop_delay());

        let events = drain(&mut rx);
        assert_eq!(count(&events, "spin_stop"), 1);
        assert!(events.contains(&RoundEvent::SpinStop {
            round_id: 1,
            manual: true
        }));
        assert!(events.contains(&RoundEvent::SpinComplete {
            round_id: 1,
            matrix: winning_outcome().matrix,
            win_amount: 30,
        }));
        let snap = controller.snapshot();
        assert_eq!((snap.balance, snap.last_win), (1029, 30));
    }

    #[test]
    fn test_spin_rejected_outside_idle() {
        let (mut controller, clock) = setup(SlotConfig::default(), vec![losing_outcome()]);
        assert!(controller.request_spin(false));
        assert!(!controller.request_spin(false));
        assert_eq!(controller.snapshot().balance, 999);

        run_all(&mut controller, &clock);
        assert!(!controller.request_stop());
    }

    #[test]
    fn test_auto_spin_stops_on_insufficient_balance() {
        let mut config = SlotConfig::default();
        config.ledger = LedgerConfig {
            initial_balance: 3,
            ..LedgerConfig::default()
        };
        let (mut controller, clock) = setup(config, vec![losing_outcome()]);
        let mut rx = controller.subscribe();

        assert!(controller.request_spin(true));
        run_all(&mut controller, &clock);

        let events = drain(&mut rx);
        assert_eq!(count(&events, "spin_start"), 3);
        assert!(events.contains(&RoundEvent::AutoSpinStop {
            reason: AutoStopReason::InsufficientBalance
        }));
        assert!(controller.auto_spin().is_none());
        assert_eq!(clock.pending(), 0);
        assert_eq!(controller.snapshot().balance, 0);
        assert!(!controller.control_state().spin_enabled);
    }

    #[test]
    fn test_auto_spin_budget_exhausts() {
        let mut config = SlotConfig::default();
        config.auto_spin_budget = 3;
        let (mut controller, clock) = setup(config, vec![losing_outcome(), winning_outcome()]);
        let mut rx = controller.subscribe();

        controller.request_spin(true);
        run_all(&mut controller, &clock);

        let events = drain(&mut rx);
        assert_eq!(count(&events, "spin_start"), 3);
        assert!(events.contains(&RoundEvent::AutoSpinStart { budget: 3 }));
        assert!(events.contains(&RoundEvent::AutoSpinStop {
            reason: AutoStopReason::Exhausted
        }));
        assert_eq!(controller.snapshot().balance, 1000 - 3 + 30);
    }

    #[test]
    fn test_stop_auto_lets_round_finish() {
        let (mut controller, clock) = setup(SlotConfig::default(), vec![losing_outcome()]);
        let mut rx = controller.subscribe();

        controller.request_spin(true);
        assert_eq!(controller.control_state().auto_label, "STOP AUTO");
        run_for(&mut controller, &clock, ms(10));

        controller.request_stop_auto();
        assert_eq!(controller.stage(), GameStage::Spinning);
        assert_eq!(controller.control_state().auto_label, "AUTO");

        run_all(&mut controller, &clock);
        let events = drain(&mut rx);
        assert_eq!(count(&events, "spin_start"), 1);
        assert_eq!(controller.stage(), GameStage::Idle);
    }

    #[test]
    fn test_queued_auto_spin_ignored_after_stop_auto() {
        let (mut controller, clock) = setup(SlotConfig::default(), vec![losing_outcome()]);
        controller.request_spin(true);

        // Finish the first round; the next auto-spin is now queued
        run_for(&mut controller, &clock, SlotConfig::default().timing.losing_round());
        assert_eq!(controller.stage(), GameStage::Idle);
        assert_eq!(clock.pending(), 1);

        controller.request_stop_auto();
        run_all(&mut controller, &clock);
        assert_eq!(controller.round_id(), 1);
    }

    #[test]
    fn test_change_bet_only_when_idle() {
        let (mut controller, clock) = setup(SlotConfig::default(), vec![losing_outcome()]);

        assert_eq!(controller.request_change_bet(), Some(2));
        controller.request_spin(false);
        assert_eq!(controller.request_change_bet(), None);
        assert_eq!(controller.snapshot().bet, 2);

        run_all(&mut controller, &clock);
        assert_eq!(controller.request_change_bet(), Some(5));
    }

    #[test]
    fn test_bet_cycle_wraps() {
        let (mut controller, _clock) = setup(SlotConfig::default(), vec![]);
        let bets: Vec<_> = (0..7).filter_map(|_| controller.request_change_bet()).collect();
        assert_eq!(bets, vec![2, 5, 10, 20, 50, 100, 1]);
    }

    #[test]
    fn test_control_state_by_stage() {
        let (mut controller, clock) = setup(SlotConfig::default(), vec![winning_outcome()]);

        let idle = controller.control_state();
        assert!(idle.spin_visible && idle.spin_enabled && idle.bet_enabled);
        assert!(!idle.stop_visible);

        controller.request_spin(false);
        let spinning = controller.control_state();
        assert!(!spinning.spin_visible && !spinning.bet_enabled);
        assert!(spinning.stop_visible && spinning.stop_enabled);

        run_for(&mut controller, &clock, ms(1500));
        assert_eq!(controller.stage(), GameStage::ShowingWin);
        let showing = controller.control_state();
        assert!(showing.stop_visible && !showing.stop_enabled);
    }

    // ─── presenter with explicit completion ─────────────────────────────────

    #[derive(Clone, Default)]
    struct SignalPresenter {
        settle: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ReelPresenter for SignalPresenter {
        fn start_continuous_spin(&mut self) {
            self.calls.lock().push("start");
        }

        fn stop_at_result(&mut self, _matrix: &SymbolMatrix) -> AnimationCue {
            self.calls.lock().push("stop");
            let (tx, rx) = oneshot::channel();
            self.settle.lock().push(tx);
            AnimationCue::Signal(rx)
        }

        fn show_win(&mut self, _amount: u64) -> AnimationCue {
            self.calls.lock().push("show");
            AnimationCue::immediate()
        }

        fn fade_win(&mut self) -> AnimationCue {
            self.calls.lock().push("fade");
            AnimationCue::immediate()
        }

        fn hide_win(&mut self) {
            self.calls.lock().push("hide");
        }
    }

    #[test]
    fn test_settle_waits_for_completion_signal() {
        let presenter = SignalPresenter::default();
        let (controller, clock) = setup(SlotConfig::default(), vec![winning_outcome()]);
        let mut controller = controller.with_presenter(presenter.clone());

        controller.request_spin(false);
        run_for(&mut controller, &clock, ms(60_000));
        assert_eq!(controller.stage(), GameStage::Spinning);

        let tx = presenter.settle.lock().pop().unwrap();
        tx.send(()).unwrap();
        run_all(&mut controller, &clock);

        assert_eq!(controller.stage(), GameStage::Idle);
        assert_eq!(controller.snapshot().balance, 1029);
        assert_eq!(
            *presenter.calls.lock(),
            vec!["hide", "start", "stop", "show", "fade", "hide"]
        );
    }
}
