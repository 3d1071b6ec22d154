//! Cancellable deferred delivery of round commands
//!
//! The round controller never sleeps. Anything that has to happen later is
//! handed to a [`Scheduler`] as a [`RoundCommand`] and comes back through the
//! controller's command input when due.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;

use crate::round::RoundCommand;

/// Handle to one scheduled command
#[derive(Debug, Clone)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    task: Option<AbortHandle>,
}

impl TimerHandle {
    fn new(task: Option<AbortHandle>) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            task,
        }
    }

    /// Prevent delivery. Safe to call more than once.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Deferred command delivery
pub trait Scheduler: Send {
    /// Deliver `command` after `delay`
    fn schedule(&mut self, delay: Duration, command: RoundCommand) -> TimerHandle;

    /// Deliver `command` once `signal` resolves. A dropped sender counts as
    /// resolved so a misbehaving presenter cannot stall the round.
    fn schedule_on(&mut self, signal: oneshot::Receiver<()>, command: RoundCommand);
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOKIO
// ═══════════════════════════════════════════════════════════════════════════════

/// Wall-clock scheduler backed by tokio timers
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<RoundCommand>,
}

impl TokioScheduler {
    pub fn new(tx: mpsc::UnboundedSender<RoundCommand>) -> Self {
        Self { tx }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, command: RoundCommand) -> TimerHandle {
        let mut handle = TimerHandle::new(None);
        let cancelled = handle.cancelled.clone();
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The timer may have woken just before cancel() ran
            if !cancelled.load(Ordering::Acquire) {
                let _ = tx.send(command);
            }
        });

        handle.task = Some(task.abort_handle());
        handle
    }

    fn schedule_on(&mut self, signal: oneshot::Receiver<()>, command: RoundCommand) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if signal.await.is_err() {
                log::warn!("Animation completion sender dropped, continuing round");
            }
            let _ = tx.send(command);
        });
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMULATED CLOCK
// ═══════════════════════════════════════════════════════════════════════════════

struct Entry {
    due: Duration,
    seq: u64,
    command: RoundCommand,
    cancelled: Arc<AtomicBool>,
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    next_seq: u64,
    timers: Vec<Entry>,
    signals: Vec<(oneshot::Receiver<()>, RoundCommand)>,
}

impl ClockState {
    fn take_ready_signal(&mut self) -> Option<RoundCommand> {
        let idx = self.signals.iter_mut().position(|(rx, _)| {
            !matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Empty))
        })?;
        Some(self.signals.remove(idx).1)
    }

    fn earliest_timer(&mut self) -> Option<usize> {
        self.timers.retain(|e| !e.cancelled.load(Ordering::Acquire));
        self.timers
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(idx, _)| idx)
    }
}

/// Simulated clock for tests and instant simulation.
///
/// Cloning shares the clock: hand one clone to the controller, keep another
/// to drive time forward.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ClockState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    pub fn advance(&self, by: Duration) {
        self.state.lock().now += by;
    }

    /// Live (uncancelled) timers plus unresolved signals
    pub fn pending(&self) -> usize {
        let state = self.state.lock();
        state
            .timers
            .iter()
            .filter(|e| !e.cancelled.load(Ordering::Acquire))
            .count()
            + state.signals.len()
    }

    /// Next command due at or before `until`, moving the clock to its due
    /// time. With nothing due, the clock moves to `until` and `None` is
    /// returned. Resolved signals are delivered before timers.
    pub fn step(&self, until: Duration) -> Option<RoundCommand> {
        let mut state = self.state.lock();
        if let Some(command) = state.take_ready_signal() {
            return Some(command);
        }

        match state.earliest_timer() {
            Some(idx) if state.timers[idx].due <= until => {
                let entry = state.timers.remove(idx);
                state.now = state.now.max(entry.due);
                Some(entry.command)
            }
            _ => {
                state.now = state.now.max(until);
                None
            }
        }
    }

    /// Jump straight to the earliest pending command, however far away
    pub fn next(&self) -> Option<RoundCommand> {
        let mut state = self.state.lock();
        if let Some(command) = state.take_ready_signal() {
            return Some(command);
        }

        let idx = state.earliest_timer()?;
        let entry = state.timers.remove(idx);
        state.now = state.now.max(entry.due);
        Some(entry.command)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, command: RoundCommand) -> TimerHandle {
        let handle = TimerHandle::new(None);
        let mut state = self.state.lock();
        let entry = Entry {
            due: state.now + delay,
            seq: state.next_seq,
            command,
            cancelled: handle.cancelled.clone(),
        };
        state.next_seq += 1;
        state.timers.push(entry);
        handle
    }

    fn schedule_on(&mut self, signal: oneshot::Receiver<()>, command: RoundCommand) {
        self.state.lock().signals.push((signal, command));
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("timers", &state.timers.len())
            .field("signals", &state.signals.len())
            .finish()
    }
}
