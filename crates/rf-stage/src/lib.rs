//! # rf-stage — FluxForge Round Stage System
//!
//! Defines the stages a slot round passes through and the event stream the
//! round controller publishes to display adapters.
//!
//! ## Philosophy
//!
//! Display code never inspects controller internals. It only listens:
//! - Spin starts → Stage changes → Spin completes → Snapshot updates
//!
//! This crate defines that vocabulary plus a trace recorder for timelines.

pub mod event;
pub mod stage;
pub mod trace;

pub use event::*;
pub use stage::*;
pub use trace::*;
