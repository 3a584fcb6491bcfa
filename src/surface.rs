//! Rendering surfaces.
//!
//! The controller never draws anything itself. It hands frames, log lines
//! and routine lifecycle events to a [`Surface`], which decides what they
//! look like.

use crate::core::{Frame, LightState};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Routine lifecycle notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutineEvent {
    /// A routine claimed the slot and is about to render its first frame.
    Started { seq: u64, state: LightState },
    /// A routine returned, before its slot is released.
    Finished {
        seq: u64,
        state: LightState,
        preempted: bool,
    },
}

/// Output side of the controller.
///
/// Implementations must be cheap and must not block: they are called from
/// inside routines, between suspension points.
pub trait Surface: Send + Sync {
    /// Show `frame` for the requested `state`.
    fn render(&self, state: LightState, frame: Frame);

    /// Informational message (transition requests, hand-off anomalies).
    fn log(&self, message: &str) {
        tracing::info!(target: "stoplight::surface", "{message}");
    }

    /// Routine lifecycle hook.
    fn routine(&self, _event: RoutineEvent) {}
}

/// Surface that discards frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn render(&self, _state: LightState, _frame: Frame) {}
}

/// A captured render call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub at: Instant,
    pub state: LightState,
    pub frame: Frame,
}

#[derive(Debug, Default)]
struct Recording {
    renders: Vec<Rendered>,
    logs: Vec<String>,
    events: Vec<RoutineEvent>,
    active: usize,
    peak_active: usize,
}

/// Surface that records everything it is given.
///
/// Timestamps come from `tokio::time::Instant`, so they follow virtual time
/// when the runtime clock is paused.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    inner: Mutex<Recording>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every render call, in order.
    pub fn renders(&self) -> Vec<Rendered> {
        self.inner.lock().renders.clone()
    }

    /// Rendered frames, in order.
    pub fn frames(&self) -> Vec<Frame> {
        self.inner.lock().renders.iter().map(|r| r.frame).collect()
    }

    /// Log messages, in order.
    pub fn logs(&self) -> Vec<String> {
        self.inner.lock().logs.clone()
    }

    /// Routine lifecycle events, in order.
    pub fn events(&self) -> Vec<RoutineEvent> {
        self.inner.lock().events.clone()
    }

    /// Largest number of routines seen between `Started` and `Finished` at once.
    pub fn peak_active_routines(&self) -> usize {
        self.inner.lock().peak_active
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.renders.clear();
        inner.logs.clear();
        inner.events.clear();
        inner.active = 0;
        inner.peak_active = 0;
    }
}

impl Surface for RecordingSurface {
    fn render(&self, state: LightState, frame: Frame) {
        self.inner.lock().renders.push(Rendered {
            at: Instant::now(),
            state,
            frame,
        });
    }

    fn log(&self, message: &str) {
        self.inner.lock().logs.push(message.to_string());
    }

    fn routine(&self, event: RoutineEvent) {
        let mut inner = self.inner.lock();
        match event {
            RoutineEvent::Started { .. } => {
                inner.active += 1;
                inner.peak_active = inner.peak_active.max(inner.active);
            }
            RoutineEvent::Finished { .. } => {
                inner.active = inner.active.saturating_sub(1);
            }
        }
        inner.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_surface_captures_renders_in_order() {
        let surface = RecordingSurface::new();
        surface.render(LightState::Closed, Frame::Yellow);
        surface.render(LightState::Closed, Frame::Red);

        assert_eq!(surface.frames(), vec![Frame::Yellow, Frame::Red]);
        assert!(surface.renders().iter().all(|r| r.state == LightState::Closed));
    }

    #[test]
    fn recording_surface_tracks_peak_concurrency() {
        let surface = RecordingSurface::new();
        let started = |seq| RoutineEvent::Started {
            seq,
            state: LightState::Alert,
        };
        let finished = |seq| RoutineEvent::Finished {
            seq,
            state: LightState::Alert,
            preempted: true,
        };

        surface.routine(started(1));
        surface.routine(finished(1));
        surface.routine(started(2));
        assert_eq!(surface.peak_active_routines(), 1);

        surface.routine(started(3));
        assert_eq!(surface.peak_active_routines(), 2);
        assert_eq!(surface.events().len(), 4);
    }

    #[test]
    fn recording_surface_keeps_logs() {
        let surface = RecordingSurface::new();
        surface.log("Move state to: OPEN");
        assert_eq!(surface.logs(), vec!["Move state to: OPEN".to_string()]);

        surface.clear();
        assert!(surface.logs().is_empty());
    }

    #[test]
    fn clear_resets_routine_counters() {
        let surface = RecordingSurface::new();
        for seq in [1, 2] {
            surface.routine(RoutineEvent::Started {
                seq,
                state: LightState::Alert,
            });
        }
        assert_eq!(surface.peak_active_routines(), 2);

        surface.clear();
        assert_eq!(surface.peak_active_routines(), 0);
        assert!(surface.events().is_empty());

        surface.routine(RoutineEvent::Started {
            seq: 3,
            state: LightState::Open,
        });
        assert_eq!(surface.peak_active_routines(), 1);
    }
}
