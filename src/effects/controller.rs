//! Transition controller: claims the slot, runs a routine, releases the slot.

use super::animation::{self, RoutineEnd};
use super::signal::Signal;
use super::slot::{Slot, SlotGuard, SlotPhase, SlotState};
use super::transition::TransitionError;
use crate::builder::{ControllerBuilder, ControllerConfig};
use crate::core::{Handoff, LightState, Outcome, TransitionHistory, TransitionRecord};
use crate::enforcement::{HandoffViolation, PolicyDecision};
use crate::surface::{RoutineEvent, Surface};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Result of Phase A.
enum SyncIn {
    /// The slot is ours; the guard releases it.
    Acquired { guard: SlotGuard, handoff: Handoff },
    /// A newer request took over while we waited.
    Superseded,
    /// The incumbent missed its deadline and the policy gave up.
    Aborted(HandoffViolation),
}

/// Brackets a routine with `Started` and `Finished` events.
///
/// `Finished` is sent on drop, so a `transition` future dropped mid-routine
/// still reports it (as preempted) before the slot is released.
struct RoutineScope<'a> {
    surface: &'a dyn Surface,
    seq: u64,
    state: LightState,
    end: Option<RoutineEnd>,
}

impl<'a> RoutineScope<'a> {
    fn start(surface: &'a dyn Surface, seq: u64, state: LightState) -> Self {
        surface.routine(RoutineEvent::Started { seq, state });
        Self {
            surface,
            seq,
            state,
            end: None,
        }
    }
}

impl Drop for RoutineScope<'_> {
    fn drop(&mut self) {
        let seq = self.seq;
        match self.end {
            Some(end) => tracing::debug!(seq, ?end, "routine returned"),
            None => tracing::debug!(seq, "routine dropped mid-animation"),
        }
        self.surface.routine(RoutineEvent::Finished {
            seq,
            state: self.state,
            preempted: self.end != Some(RoutineEnd::Completed),
        });
    }
}

struct Inner {
    slot: Arc<Slot>,
    surface: Arc<dyn Surface>,
    config: ControllerConfig,
    history: Mutex<TransitionHistory>,
}

/// Runs at most one animation routine at a time and lets new requests
/// preempt the running one.
///
/// The controller is a cheap handle; clones share the same slot, so
/// overlapping `transition` calls can be issued from independent tasks.
///
/// # Example
///
/// ```rust
/// use stoplight::core::{Frame, LightState};
/// use stoplight::effects::TransitionController;
/// use stoplight::surface::RecordingSurface;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let surface = Arc::new(RecordingSurface::new());
/// let controller = TransitionController::new(surface.clone());
///
/// controller.transition(LightState::Open).await.unwrap();
///
/// assert_eq!(surface.frames(), vec![Frame::Green]);
/// assert!(controller.is_idle());
/// # }
/// ```
#[derive(Clone)]
pub struct TransitionController {
    inner: Arc<Inner>,
}

impl TransitionController {
    /// Create a controller with default timing.
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self::from_parts(surface, ControllerConfig::default())
    }

    /// Start building a controller with custom timing or policy.
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::new()
    }

    pub(crate) fn from_parts(surface: Arc<dyn Surface>, config: ControllerConfig) -> Self {
        let history = TransitionHistory::with_capacity(config.history_capacity);
        Self {
            inner: Arc::new(Inner {
                slot: Arc::new(Signal::new(SlotState::new())),
                surface,
                config,
                history: Mutex::new(history),
            }),
        }
    }

    /// Request `state` by name.
    ///
    /// Unknown names fail with [`TransitionError::InvalidState`] before
    /// anything is rendered or the slot is touched.
    pub async fn transition_named(&self, name: &str) -> Result<TransitionRecord, TransitionError> {
        let state: LightState = name.parse()?;
        self.transition(state).await
    }

    /// Request `state`, preempting whatever is animating.
    ///
    /// Completes once the routine for `state` has run to its natural end or
    /// was preempted in turn, and the slot has been released. Returns early
    /// with [`Outcome::Superseded`] if a newer request overtakes this one
    /// before it gets the slot.
    pub async fn transition(&self, state: LightState) -> Result<TransitionRecord, TransitionError> {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("transition", %id, %state);
        self.run_transition(id, state).instrument(span).await
    }

    async fn run_transition(
        &self,
        id: Uuid,
        state: LightState,
    ) -> Result<TransitionRecord, TransitionError> {
        let requested_at = Utc::now();
        tracing::info!("transition requested");
        self.inner.surface.log(&format!("Move state to: {state}"));

        let (seq, sync_in) = self.sync_in(state).await;
        match sync_in {
            SyncIn::Acquired { guard, handoff } => {
                let end = self.run_routine(seq, state, &guard).await;
                let outcome = match end {
                    RoutineEnd::Completed => Outcome::Completed,
                    RoutineEnd::Preempted => Outcome::Preempted,
                };
                // Recorded while still holding the slot, so history order
                // matches slot order.
                let record = self.finish(id, seq, state, handoff, outcome, requested_at);
                drop(guard);
                Ok(record)
            }
            SyncIn::Superseded => {
                tracing::debug!(seq, "superseded by a newer request");
                let outcome = Outcome::Superseded;
                Ok(self.finish(id, seq, state, Handoff::None, outcome, requested_at))
            }
            SyncIn::Aborted(violation) => {
                self.finish(id, seq, state, Handoff::None, Outcome::Aborted, requested_at);
                Err(TransitionError::HandoffAborted(violation))
            }
        }
    }

    /// Phase A: claim the slot, asking any incumbent to exit first.
    async fn sync_in(&self, state: LightState) -> (u64, SyncIn) {
        let slot = &self.inner.slot;
        let (seq, incumbent) = slot.update(|s| {
            s.latest += 1;
            let seq = s.latest;
            if s.phase == SlotPhase::Idle {
                s.phase = SlotPhase::Running;
                s.holder = Some(seq);
                return (seq, None);
            }
            s.phase = SlotPhase::ExitRequested;
            s.exited = false;
            (seq, Some(s.holder))
        });

        let Some(incumbent) = incumbent else {
            tracing::debug!(seq, "slot idle, claimed");
            let guard = SlotGuard::new(Arc::clone(slot), seq);
            return (seq, SyncIn::Acquired { guard, handoff: Handoff::None });
        };
        tracing::debug!(seq, ?incumbent, "requested incumbent exit");

        let deadline = self.inner.config.handoff_deadline;
        let policy = self.inner.config.handoff_policy;
        let started = Instant::now();
        let mut attempt = 0;

        let forced = loop {
            attempt += 1;
            let exited = slot
                .wait_until(deadline, |s| s.exited || s.supersedes(seq))
                .await;
            if slot.read(|s| s.supersedes(seq)) {
                return (seq, SyncIn::Superseded);
            }
            if exited {
                break None;
            }

            let violation = HandoffViolation {
                requested: state,
                deadline,
                attempt,
                incumbent,
            };
            tracing::warn!(%violation, "hand-off deadline elapsed");
            self.inner.surface.log(&violation.to_string());

            match policy.decide(&violation) {
                PolicyDecision::WaitAgain => continue,
                PolicyDecision::Proceed => break Some(attempt),
                PolicyDecision::Abort => return (seq, SyncIn::Aborted(violation)),
            }
        };

        let claimed = slot.update(|s| {
            if s.supersedes(seq) {
                return false;
            }
            s.phase = SlotPhase::Running;
            s.holder = Some(seq);
            true
        });
        if !claimed {
            return (seq, SyncIn::Superseded);
        }

        let waited = started.elapsed();
        let handoff = match forced {
            None => Handoff::Clean { waited },
            Some(attempts) => Handoff::Forced { attempts, waited },
        };
        tracing::debug!(seq, ?handoff, "slot claimed from incumbent");
        let guard = SlotGuard::new(Arc::clone(slot), seq);
        (seq, SyncIn::Acquired { guard, handoff })
    }

    /// Phase B: run the routine for `state` under the held slot.
    async fn run_routine(&self, seq: u64, state: LightState, guard: &SlotGuard) -> RoutineEnd {
        let surface = self.inner.surface.as_ref();
        let mut scope = RoutineScope::start(surface, seq, state);

        let token = guard.token();
        let end = animation::run(state, surface, &token, self.inner.config.timing()).await;

        scope.end = Some(end);
        end
    }

    fn finish(
        &self,
        id: Uuid,
        seq: u64,
        state: LightState,
        handoff: Handoff,
        outcome: Outcome,
        requested_at: DateTime<Utc>,
    ) -> TransitionRecord {
        let record = TransitionRecord {
            id,
            seq,
            state,
            handoff,
            outcome,
            requested_at,
            finished_at: Utc::now(),
        };
        let mut history = self.inner.history.lock();
        *history = history.record(record.clone());
        record
    }

    /// Whether no routine holds the slot.
    pub fn is_idle(&self) -> bool {
        self.slot_phase() == SlotPhase::Idle
    }

    /// Current phase of the shared slot.
    pub fn slot_phase(&self) -> SlotPhase {
        self.inner.slot.read(|s| s.phase)
    }

    /// Snapshot of the transition history.
    pub fn history(&self) -> TransitionHistory {
        self.inner.history.lock().clone()
    }

    /// Configuration the controller was built with.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Surface frames and log lines are sent to.
    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.inner.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frame;
    use crate::effects::CancelToken;
    use crate::enforcement::HandoffPolicy;
    use crate::surface::RecordingSurface;
    use std::time::Duration;

    const PHANTOM: u64 = 99;

    fn controller(policy: HandoffPolicy) -> (TransitionController, Arc<RecordingSurface>) {
        let surface = Arc::new(RecordingSurface::new());
        let controller = TransitionController::builder()
            .surface(Arc::clone(&surface))
            .handoff_policy(policy)
            .build()
            .unwrap();
        (controller, surface)
    }

    /// Pretend a routine holds the slot and will never acknowledge an exit
    /// request.
    fn occupy_with_phantom(controller: &TransitionController) {
        controller.inner.slot.update(|s| {
            s.phase = SlotPhase::Running;
            s.holder = Some(PHANTOM);
            s.latest = PHANTOM;
        });
    }

    #[tokio::test(start_paused = true)]
    async fn idle_claim_does_not_wait_or_touch_exited() {
        let (controller, surface) = controller(HandoffPolicy::Proceed);
        let start = Instant::now();

        let seq = match controller.sync_in(LightState::Open).await {
            (seq, SyncIn::Acquired { guard, handoff }) => {
                assert_eq!(handoff, Handoff::None);
                assert!(!controller.inner.slot.read(|s| s.exited));
                drop(guard);
                seq
            }
            _ => panic!("Expected the idle slot to be acquired"),
        };

        assert_eq!(seq, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(controller.is_idle());
        assert!(surface.frames().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn proceed_policy_claims_after_deadline() {
        let (controller, surface) = controller(HandoffPolicy::Proceed);
        occupy_with_phantom(&controller);
        let start = Instant::now();

        let record = controller.transition(LightState::Open).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(
            record.handoff,
            Handoff::Forced {
                attempts: 1,
                waited: Duration::from_secs(1)
            }
        );
        assert_eq!(record.outcome, Outcome::Completed);
        assert_eq!(surface.frames(), vec![Frame::Green]);
        assert!(surface.logs().iter().any(|l| l.contains("timed out")));
        assert!(controller.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn abort_policy_returns_violation_without_rendering() {
        let (controller, surface) = controller(HandoffPolicy::Abort);
        occupy_with_phantom(&controller);

        let err = controller.transition(LightState::Closed).await.unwrap_err();

        match err {
            TransitionError::HandoffAborted(violation) => {
                assert_eq!(violation.attempt, 1);
                assert_eq!(violation.incumbent, Some(PHANTOM));
                assert_eq!(violation.requested, LightState::Closed);
            }
            other => panic!("Expected HandoffAborted, got {other:?}"),
        }
        assert!(surface.frames().is_empty());
        assert_eq!(controller.slot_phase(), SlotPhase::ExitRequested);
        assert_eq!(
            controller.history().last().map(|r| r.outcome),
            Some(Outcome::Aborted)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retry_policy_waits_every_attempt() {
        let (controller, surface) = controller(HandoffPolicy::Retry { attempts: 3 });
        occupy_with_phantom(&controller);
        let start = Instant::now();

        let record = controller.transition(LightState::Open).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert!(matches!(record.handoff, Handoff::Forced { attempts: 3, .. }));
        assert_eq!(surface.logs().iter().filter(|l| l.contains("timed out")).count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_waiting_once_incumbent_exits() {
        let (controller, _surface) = controller(HandoffPolicy::Retry { attempts: 5 });
        occupy_with_phantom(&controller);
        let start = Instant::now();

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.transition(LightState::Open).await })
        };
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        drop(SlotGuard::new(Arc::clone(&controller.inner.slot), PHANTOM));

        let record = pending.await.unwrap().unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1_500));
        assert_eq!(
            record.handoff,
            Handoff::Clean {
                waited: Duration::from_millis(1_500)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn newer_request_supersedes_waiting_one() {
        let (controller, surface) = controller(HandoffPolicy::Proceed);
        occupy_with_phantom(&controller);

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.transition(LightState::Closed).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.transition(LightState::Open).await })
        };

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.outcome, Outcome::Superseded);
        assert!(!first.ran());

        let second = second.await.unwrap().unwrap();
        assert_eq!(second.outcome, Outcome::Completed);
        assert!(matches!(second.handoff, Handoff::Forced { .. }));
        assert_eq!(surface.frames(), vec![Frame::Green]);
    }

    #[tokio::test(start_paused = true)]
    async fn forced_claim_cancels_overrunning_incumbent() {
        let (controller, _surface) = controller(HandoffPolicy::Proceed);
        occupy_with_phantom(&controller);
        let phantom = CancelToken::new(Arc::clone(&controller.inner.slot), PHANTOM);

        let alert = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.transition(LightState::Alert).await })
        };
        tokio::time::sleep(Duration::from_millis(1_200)).await;

        assert_eq!(controller.slot_phase(), SlotPhase::Running);
        assert!(phantom.is_cancelled());

        controller.transition(LightState::Open).await.unwrap();
        assert_eq!(alert.await.unwrap().unwrap().outcome, Outcome::Preempted);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_transition_releases_slot() {
        let (controller, _surface) = controller(HandoffPolicy::Proceed);

        let alert = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.transition(LightState::Alert).await })
        };
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!controller.is_idle());

        alert.abort();
        assert!(alert.await.unwrap_err().is_cancelled());
        assert!(controller.is_idle());
    }

    #[tokio::test]
    async fn invalid_name_touches_nothing() {
        let (controller, surface) = controller(HandoffPolicy::Proceed);

        let err = controller.transition_named("ATTENTION").await.unwrap_err();

        assert!(matches!(err, TransitionError::InvalidState(_)));
        assert!(surface.frames().is_empty());
        assert!(surface.logs().is_empty());
        assert!(controller.history().is_empty());
        assert_eq!(controller.inner.slot.read(|s| s.latest), 0);
    }
}
