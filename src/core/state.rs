//! Requestable light states and the frames their animations render.
//!
//! Everything here is pure: parsing, naming and frame lookup have no side
//! effects and never touch the controller's slot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A state that can be requested from the controller.
///
/// `ATTENTION` (the yellow caution phase) is not a variant: it only exists as
/// the transient first half of [`LightState::Closed`].
///
/// # Example
///
/// ```rust
/// use stoplight::core::LightState;
///
/// let state: LightState = "closed".parse().unwrap();
/// assert_eq!(state, LightState::Closed);
/// assert_eq!(state.name(), "CLOSED");
///
/// assert!("ATTENTION".parse::<LightState>().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LightState {
    /// Steady green.
    Open,
    /// Yellow caution, then red unless preempted.
    Closed,
    /// Blinking yellow until preempted.
    Alert,
}

impl LightState {
    /// All requestable states, in declaration order.
    pub const ALL: [LightState; 3] = [Self::Open, Self::Closed, Self::Alert];

    /// Get the state's upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Alert => "ALERT",
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Requested state name did not match any [`LightState`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state '{requested}': expected one of OPEN, CLOSED, ALERT")]
pub struct InvalidStateError {
    /// The text that failed to parse.
    pub requested: String,
}

impl FromStr for LightState {
    type Err = InvalidStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        LightState::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| InvalidStateError {
                requested: s.to_string(),
            })
    }
}

/// A single visual frame handed to the surface.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Frame {
    /// Go.
    Green,
    /// Caution, shown while closing.
    Yellow,
    /// Stop.
    Red,
    /// Alert blink, lamp on.
    AlertLit,
    /// Alert blink, lamp dimmed. Also the first alert frame.
    AlertDim,
}

impl Frame {
    /// Short frame code for compact renderers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Green => "G",
            Self::Yellow => "Y",
            Self::Red => "R",
            Self::AlertLit => "A",
            Self::AlertDim => "a",
        }
    }

    /// Visual phase this frame belongs to.
    ///
    /// Yellow reports `ATTENTION`, the sub-phase of CLOSED that is never
    /// requested directly.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Green => "OPEN",
            Self::Yellow => "ATTENTION",
            Self::Red => "CLOSED",
            Self::AlertLit | Self::AlertDim => "ALERT",
        }
    }

    /// The other half of an alert blink. Non-alert frames map to themselves.
    pub fn toggled(&self) -> Frame {
        match self {
            Self::AlertLit => Self::AlertDim,
            Self::AlertDim => Self::AlertLit,
            other => *other,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
