//! Core types for the traffic light.
//!
//! This module contains the pure part of the crate:
//! - Requestable states and rendered frames
//! - The bounded transition history
//!
//! Nothing in here suspends, renders or touches the controller's slot.

mod history;
mod state;

pub use history::{Handoff, Outcome, TransitionHistory, TransitionRecord};
pub use state::{Frame, InvalidStateError, LightState};
