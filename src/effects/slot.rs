//! The execution slot shared by all animation routines.

use super::signal::Signal;
use std::sync::Arc;
use std::time::Duration;

/// Who, if anyone, is allowed to animate right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotPhase {
    /// No routine holds the slot.
    Idle,
    /// The holder is animating.
    Running,
    /// The holder has been asked to return.
    ExitRequested,
}

/// Protocol state. Lives in a single [`Signal`] so each phase of the
/// hand-off is one atomic update.
#[derive(Clone, Debug)]
pub(crate) struct SlotState {
    pub(crate) phase: SlotPhase,
    /// Ticket of the call whose routine owns the slot.
    pub(crate) holder: Option<u64>,
    /// Set by Phase C, cleared by a preempting caller.
    pub(crate) exited: bool,
    /// Most recent ticket handed out.
    pub(crate) latest: u64,
}

impl SlotState {
    pub(crate) fn new() -> Self {
        Self {
            phase: SlotPhase::Idle,
            holder: None,
            exited: false,
            latest: 0,
        }
    }

    /// The holder identified by `ticket` should stop animating.
    pub(crate) fn cancels(&self, ticket: u64) -> bool {
        self.phase != SlotPhase::Running || self.holder != Some(ticket)
    }

    /// A call holding `ticket` has been overtaken by a newer request.
    pub(crate) fn supersedes(&self, ticket: u64) -> bool {
        self.latest != ticket
    }
}

pub(crate) type Slot = Signal<SlotState>;

/// Cancellation handle given to a running routine.
///
/// A routine polls it at each suspension point; nothing ever stops a
/// routine from the outside.
#[derive(Clone, Debug)]
pub struct CancelToken {
    slot: Arc<Slot>,
    ticket: u64,
}

impl CancelToken {
    pub(crate) fn new(slot: Arc<Slot>, ticket: u64) -> Self {
        Self { slot, ticket }
    }

    /// Whether cancellation has already been requested.
    pub fn is_cancelled(&self) -> bool {
        self.slot.read(|s| s.cancels(self.ticket))
    }

    /// Wait up to `timeout` for a cancellation request.
    ///
    /// Returns `true` as soon as one is observed, `false` if the timeout
    /// elapsed without one.
    pub async fn cancelled_within(&self, timeout: Duration) -> bool {
        let ticket = self.ticket;
        self.slot.wait_until(timeout, |s| s.cancels(ticket)).await
    }
}

/// Phase C. Dropping the guard marks the holder as exited and, if it still
/// owns the slot, releases it.
///
/// Runs on every exit path, including a `transition` future dropped
/// mid-animation.
#[derive(Debug)]
pub(crate) struct SlotGuard {
    slot: Arc<Slot>,
    ticket: u64,
}

impl SlotGuard {
    pub(crate) fn new(slot: Arc<Slot>, ticket: u64) -> Self {
        Self { slot, ticket }
    }

    pub(crate) fn token(&self) -> CancelToken {
        CancelToken::new(Arc::clone(&self.slot), self.ticket)
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let ticket = self.ticket;
        let released = self.slot.update(|s| {
            s.exited = true;
            if s.holder != Some(ticket) {
                // Force-claimed by someone else; the slot is theirs now.
                return false;
            }
            s.phase = SlotPhase::Idle;
            s.holder = None;
            true
        });
        tracing::debug!(ticket, released, "slot released");
    }
}
