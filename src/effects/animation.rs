//! Animation routines, one per requestable state.

use super::slot::CancelToken;
use crate::core::{Frame, LightState};
use crate::surface::Surface;
use std::time::Duration;

/// Durations the routines poll with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Time between alert blinks.
    pub blink_interval: Duration,
    /// How long CLOSED shows yellow before red.
    pub attention_duration: Duration,
}

/// How a routine returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutineEnd {
    Completed,
    Preempted,
}

/// Run the routine for `state` until it finishes or observes cancellation.
pub async fn run(
    state: LightState,
    surface: &dyn Surface,
    token: &CancelToken,
    timing: Timing,
) -> RoutineEnd {
    match state {
        LightState::Open => open(surface),
        LightState::Closed => closed(surface, token, timing.attention_duration).await,
        LightState::Alert => alert(surface, token, timing.blink_interval).await,
    }
}

// Never polls, so it cannot be preempted.
fn open(surface: &dyn Surface) -> RoutineEnd {
    surface.render(LightState::Open, Frame::Green);
    RoutineEnd::Completed
}

async fn closed(surface: &dyn Surface, token: &CancelToken, attention: Duration) -> RoutineEnd {
    surface.render(LightState::Closed, Frame::Yellow);
    if token.cancelled_within(attention).await {
        // The incoming routine renders whatever comes next.
        return RoutineEnd::Preempted;
    }
    surface.render(LightState::Closed, Frame::Red);
    RoutineEnd::Completed
}

async fn alert(surface: &dyn Surface, token: &CancelToken, blink: Duration) -> RoutineEnd {
    let mut frame = Frame::AlertDim;
    surface.render(LightState::Alert, frame);
    while !token.cancelled_within(blink).await {
        frame = frame.toggled();
        surface.render(LightState::Alert, frame);
    }
    RoutineEnd::Preempted
}
