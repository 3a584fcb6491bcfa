//! Hand-off violations.

use crate::core::LightState;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// The incumbent did not confirm its exit before the deadline.
///
/// Non-fatal unless the policy says otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error(
    "Hand-off to {requested} timed out: incumbent did not exit within {deadline:?} (attempt {attempt})"
)]
pub struct HandoffViolation {
    /// State the preempting call asked for.
    pub requested: LightState,
    /// Deadline of the wait that elapsed.
    pub deadline: Duration,
    /// Which wait this was, starting at 1.
    pub attempt: u32,
    /// Ticket of the routine that was asked to exit, if known.
    pub incumbent: Option<u64>,
}
