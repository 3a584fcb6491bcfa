//! Policies applied when a hand-off deadline elapses.

use super::violations::HandoffViolation;
use serde::{Deserialize, Serialize};

/// Strategy for handling a missed hand-off deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandoffPolicy {
    /// Log the anomaly and claim the slot anyway.
    #[default]
    Proceed,

    /// Give up: the call returns an error and never runs its routine.
    Abort,

    /// Wait again, up to `attempts` waits in total, then proceed.
    Retry { attempts: u32 },
}

/// What the controller does after a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Claim the slot without the incumbent's confirmation.
    Proceed,
    /// Wait for the incumbent again.
    WaitAgain,
    /// Return the violation to the caller.
    Abort,
}

impl HandoffPolicy {
    /// Total number of deadline waits this policy allows before giving up
    /// on the incumbent.
    pub fn max_waits(&self) -> u32 {
        match self {
            Self::Proceed | Self::Abort => 1,
            Self::Retry { attempts } => (*attempts).max(1),
        }
    }

    /// Decide what to do about `violation`.
    pub fn decide(&self, violation: &HandoffViolation) -> PolicyDecision {
        match self {
            Self::Proceed => PolicyDecision::Proceed,
            Self::Abort => PolicyDecision::Abort,
            Self::Retry { .. } if violation.attempt < self.max_waits() => PolicyDecision::WaitAgain,
            Self::Retry { .. } => PolicyDecision::Proceed,
        }
    }
}
