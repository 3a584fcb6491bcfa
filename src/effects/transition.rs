//! Errors surfaced by `transition` calls.

use crate::core::InvalidStateError;
use crate::enforcement::HandoffViolation;

/// Errors that can occur during transitions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error(transparent)]
    InvalidState(#[from] InvalidStateError),

    #[error("Hand-off aborted: {0}")]
    HandoffAborted(HandoffViolation),
}
