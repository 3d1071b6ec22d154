//! # rf-fsm — Generic finite-state machine
//!
//! A small, game-agnostic state machine: a fixed transition table plus ordered
//! enter/exit hooks per state.
//!
//! ## Transition contract
//!
//! ```text
//! transition(to)
//!     │
//!     ├── `to` not allowed from current ──> warn, Err(InvalidTransition), nothing runs
//!     │
//!     └── allowed
//!           ├── exit hooks of current (registration order)
//!           ├── current = to
//!           └── enter hooks of `to` (registration order)
//! ```
//!
//! Hooks receive a mutable context `C`. With the default `C = ()` the hooks are
//! effectively zero-argument callbacks and [`StateMachine::transition`] can be
//! used directly.
//!
//! ## Example
//! ```rust
//! use rf_fsm::StateMachine;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Door { Closed, Open }
//!
//! let mut fsm: StateMachine<Door> = StateMachine::new(Door::Closed);
//! fsm.add_transition([Door::Closed], Door::Open);
//! fsm.add_transition([Door::Open], Door::Closed);
//!
//! assert!(fsm.transition(Door::Open).is_ok());
//! assert!(fsm.transition(Door::Open).is_err());
//! assert!(fsm.is(Door::Open));
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

/// Anything usable as a state identifier.
pub trait StateId: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> StateId for T {}

/// Boxed hook invoked on enter/exit
pub type Hook<C> = Box<dyn FnMut(&mut C) + Send>;

/// Transition failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError<S: Debug> {
    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: S, to: S },
}

/// Finite-state machine over states `S`, with hooks operating on context `C`
pub struct StateMachine<S: StateId, C = ()> {
    current: S,
    transitions: HashMap<S, HashSet<S>>,
    on_enter: HashMap<S, Vec<Hook<C>>>,
    on_exit: HashMap<S, Vec<Hook<C>>>,
}

impl<S: StateId, C> StateMachine<S, C> {
    /// Create a machine resting in `initial`, with no edges and no hooks
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            transitions: HashMap::new(),
            on_enter: HashMap::new(),
            on_exit: HashMap::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // REGISTRATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Allow `to` from every state in `from`.
    ///
    /// Adding an edge that already exists has no effect.
    pub fn add_transition<I>(&mut self, from: I, to: S) -> &mut Self
    where
        I: IntoIterator<Item = S>,
    {
        for state in from {
            self.transitions.entry(state).or_default().insert(to);
        }
        self
    }

    /// Append a hook that runs after the machine has entered `state`
    pub fn on_enter<F>(&mut self, state: S, hook: F) -> &mut Self
    where
        F: FnMut(&mut C) + Send + 'static,
    {
        self.on_enter.entry(state).or_default().push(Box::new(hook));
        self
    }

    /// Append a hook that runs before the machine leaves `state`
    pub fn on_exit<F>(&mut self, state: S, hook: F) -> &mut Self
    where
        F: FnMut(&mut C) + Send + 'static,
    {
        self.on_exit.entry(state).or_default().push(Box::new(hook));
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSITION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Move to `to`, running hooks against `ctx`.
    ///
    /// Returns the state that was left. A rejected transition is logged at warn
    /// level and leaves both the state and the hooks untouched.
    pub fn transition_with(&mut self, to: S, ctx: &mut C) -> Result<S, TransitionError<S>> {
        let from = self.current;
        if !self.can_transition_to(to) {
            log::warn!("Invalid transition from {:?} to {:?}", from, to);
            return Err(TransitionError::InvalidTransition { from, to });
        }

        if let Some(hooks) = self.on_exit.get_mut(&from) {
            for hook in hooks.iter_mut() {
                hook(ctx);
            }
        }

        self.current = to;

        if let Some(hooks) = self.on_enter.get_mut(&to) {
            for hook in hooks.iter_mut() {
                hook(ctx);
            }
        }

        log::trace!("Transition {:?} -> {:?}", from, to);
        Ok(from)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Currently active state
    pub fn current(&self) -> S {
        self.current
    }

    /// Is `state` the active state?
    pub fn is(&self, state: S) -> bool {
        self.current == state
    }

    /// Is `state` reachable in one step from the active state?
    pub fn can_transition_to(&self, state: S) -> bool {
        self.transitions
            .get(&self.current)
            .is_some_and(|targets| targets.contains(&state))
    }

    /// Number of edges in the transition table
    pub fn edge_count(&self) -> usize {
        self.transitions.values().map(HashSet::len).sum()
    }
}

impl<S: StateId> StateMachine<S, ()> {
    /// Move to `to` when hooks need no context
    pub fn transition(&mut self, to: S) -> Result<S, TransitionError<S>> {
        self.transition_with(to, &mut ())
    }
}

impl<S: StateId, C> Debug for StateMachine<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("edges", &self.edge_count())
            .finish()
    }
}
