//! Drivers for the round controller
//!
//! [`spawn_round`] runs the controller on a single tokio task fed by a
//! command channel. [`run_simulated`] and [`run_until_quiet`] drive it from a
//! [`ManualScheduler`] instead, with no wall-clock waiting.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rf_stage::{RoundEvent, RoundSnapshot, RoundTrace};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::SlotConfig;
use crate::round::{RoundCommand, RoundController, RoundError, SharedLedger};
use crate::scheduler::{ManualScheduler, TokioScheduler};

// ═══════════════════════════════════════════════════════════════════════════════
// TOKIO DRIVER
// ═══════════════════════════════════════════════════════════════════════════════

/// Handle to a controller running on its own task
#[derive(Debug)]
pub struct RoundHandle {
    commands: mpsc::UnboundedSender<RoundCommand>,
    events: broadcast::Sender<RoundEvent>,
    snapshot: Arc<RwLock<RoundSnapshot>>,
    ledger: SharedLedger,
    task: Option<JoinHandle<()>>,
}

/// Spawn a controller with the default outcome engine and presenter
pub fn spawn_round(config: SlotConfig) -> Result<RoundHandle, RoundError> {
    spawn_round_with(config, |controller| controller)
}

/// Spawn a controller, letting `customize` swap its collaborators first
pub fn spawn_round_with<F>(config: SlotConfig, customize: F) -> Result<RoundHandle, RoundError>
where
    F: FnOnce(RoundController) -> RoundController,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let scheduler = TokioScheduler::new(tx.clone());
    let controller = customize(RoundController::new(config, Box::new(scheduler))?);

    let events = controller.event_sender();
    let snapshot = controller.published_snapshot();
    let ledger = controller.ledger();
    let task = tokio::spawn(run_loop(controller, rx));

    Ok(RoundHandle {
        commands: tx,
        events,
        snapshot,
        ledger,
        task: Some(task),
    })
}

async fn run_loop(mut controller: RoundController, mut rx: mpsc::UnboundedReceiver<RoundCommand>) {
    log::info!("Round controller started ({})", controller.config().game_id);

    while let Some(command) = rx.recv().await {
        if command == RoundCommand::Shutdown {
            break;
        }
        controller.handle(command);
    }

    log::info!("Round controller stopped after {} rounds", controller.round_id());
}

impl RoundHandle {
    fn send(&self, command: RoundCommand) -> Result<(), RoundError> {
        self.commands
            .send(command)
            .map_err(|_| RoundError::ControllerClosed)
    }

    pub fn request_spin(&self, auto: bool) -> Result<(), RoundError> {
        self.send(RoundCommand::Spin { auto })
    }

    pub fn request_stop(&self) -> Result<(), RoundError> {
        self.send(RoundCommand::Stop)
    }

    pub fn request_stop_auto(&self) -> Result<(), RoundError> {
        self.send(RoundCommand::StopAuto)
    }

    pub fn request_change_bet(&self) -> Result<(), RoundError> {
        self.send(RoundCommand::ChangeBet)
    }

    /// Subscribe to round events
    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> RoundSnapshot {
        *self.snapshot.read()
    }

    /// Read access to the ledger
    pub fn ledger(&self) -> SharedLedger {
        self.ledger.clone()
    }

    /// Stop the controller task and wait for it to exit. Requests made
    /// afterwards fail with [`RoundError::ControllerClosed`].
    pub async fn shutdown(&mut self) -> Result<(), RoundError> {
        let Some(task) = self.task.take() else {
            return Err(RoundError::ControllerClosed);
        };
        self.send(RoundCommand::Shutdown)?;
        task.await.map_err(|_| RoundError::ControllerClosed)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATED DRIVER
// ═══════════════════════════════════════════════════════════════════════════════

/// Handle every command due up to `until` on the simulated clock.
/// Returns the number of commands handled.
pub fn run_simulated(controller: &mut RoundController, clock: &ManualScheduler, until: Duration) -> usize {
    let mut handled = 0;
    while let Some(command) = clock.step(until) {
        controller.handle(command);
        handled += 1;
    }
    handled
}

/// Handle commands until nothing is scheduled. An auto-spin session runs to
/// its end.
pub fn run_until_quiet(controller: &mut RoundController, clock: &ManualScheduler) -> usize {
    let mut handled = 0;
    while let Some(command) = clock.next() {
        controller.handle(command);
        handled += 1;
    }
    handled
}

/// Move every buffered event into `trace`, stamped with `timestamp_ms`
pub fn drain_into(
    rx: &mut broadcast::Receiver<RoundEvent>,
    trace: &mut RoundTrace,
    timestamp_ms: f64,
) -> usize {
    let mut recorded = 0;
    loop {
        match rx.try_recv() {
            Ok(event) => {
                trace.record(event, timestamp_ms);
                recorded += 1;
            }
            Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                log::warn!("Trace lagged, {missed} events dropped");
            }
            Err(_) => break,
        }
    }
    recorded
}
