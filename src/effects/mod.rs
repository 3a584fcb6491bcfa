//! The imperative shell: signals, routines and the transition controller.
//!
//! This is the only part of the crate that suspends, renders or mutates
//! shared state.
//!
//! # Key Concepts
//!
//! - **Signal**: a level-triggered value with a cancellable, timeout-bounded wait
//! - **Slot**: the single execution right; at most one routine holds it
//! - **CancelToken**: what a routine polls to learn it has been preempted
//! - **TransitionController**: claims the slot (preempting the incumbent),
//!   runs the routine for the requested state, then releases the slot

pub mod animation;
mod controller;
mod signal;
mod slot;
mod transition;

pub use animation::{RoutineEnd, Timing};
pub use controller::TransitionController;
pub use signal::Signal;
pub use slot::{CancelToken, SlotPhase};
pub use transition::TransitionError;
