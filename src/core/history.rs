//! Transition history tracking.
//!
//! Every `transition` call leaves one [`TransitionRecord`] behind. The
//! history keeps them in completion order, bounded so a controller that runs
//! for the lifetime of a process does not grow without limit.

use super::state::LightState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use uuid::Uuid;

/// How the slot was obtained in Phase A.
///
/// Calls that never obtained the slot (superseded or aborted) report `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Handoff {
    /// The slot was idle; nothing was preempted.
    None,
    /// The incumbent confirmed its exit within the deadline.
    Clean { waited: Duration },
    /// The deadline elapsed and the slot was claimed anyway.
    Forced { attempts: u32, waited: Duration },
}

/// How a `transition` call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The routine ran to its natural end.
    Completed,
    /// The routine observed a cancellation request and returned early.
    Preempted,
    /// A newer request arrived during Phase A; the routine never ran.
    Superseded,
    /// The hand-off deadline elapsed and the policy gave up; the routine
    /// never ran.
    Aborted,
}

/// Record of a single `transition` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Unique identifier, also attached to log events.
    pub id: Uuid,
    /// Request sequence number. Later requests have larger numbers.
    pub seq: u64,
    /// The requested state.
    pub state: LightState,
    /// How the slot was obtained.
    pub handoff: Handoff,
    /// How the call ended.
    pub outcome: Outcome,
    /// When the call was made.
    pub requested_at: DateTime<Utc>,
    /// When the call finished, just before the slot was released.
    pub finished_at: DateTime<Utc>,
}

impl TransitionRecord {
    /// Whether the animation routine for this request actually ran.
    pub fn ran(&self) -> bool {
        matches!(self.outcome, Outcome::Completed | Outcome::Preempted)
    }
}

/// Ordered, bounded history of transition records.
///
/// `record` does not mutate: it returns a new history with the record
/// appended and the oldest entries dropped past capacity.
///
/// # Example
///
/// ```rust
/// use stoplight::core::{Handoff, LightState, Outcome, TransitionHistory, TransitionRecord};
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// let history = TransitionHistory::with_capacity(2);
/// let make = |seq, state| TransitionRecord {
///     id: Uuid::new_v4(),
///     seq,
///     state,
///     handoff: Handoff::None,
///     outcome: Outcome::Completed,
///     requested_at: Utc::now(),
///     finished_at: Utc::now(),
/// };
///
/// let history = history
///     .record(make(1, LightState::Open))
///     .record(make(2, LightState::Closed))
///     .record(make(3, LightState::Open));
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.states(), vec![LightState::Closed, LightState::Open]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionHistory {
    capacity: usize,
    records: VecDeque<TransitionRecord>,
}

impl TransitionHistory {
    /// Create an empty history holding at most `capacity` records.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: VecDeque::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, record: TransitionRecord) -> Self {
        let mut records = self.records.clone();
        records.push_back(record);
        while records.len() > self.capacity {
            records.pop_front();
        }
        Self {
            capacity: self.capacity,
            records,
        }
    }

    /// Maximum number of records retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no transition has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in completion order, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    /// The most recently completed record.
    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    /// States whose routines actually ran, in completion order.
    pub fn states(&self) -> Vec<LightState> {
        self.records
            .iter()
            .filter(|r| r.ran())
            .map(|r| r.state)
            .collect()
    }

    /// The state whose routine most recently ran.
    ///
    /// This is what the light last showed, as far as the history knows.
    pub fn last_shown(&self) -> Option<LightState> {
        self.records.iter().rev().find(|r| r.ran()).map(|r| r.state)
    }

    /// Time between the first request and the last release in the window.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.records.iter().map(|r| r.requested_at).min()?;
        let last = self.records.iter().map(|r| r.finished_at).max()?;
        last.signed_duration_since(first).to_std().ok()
    }

    /// Number of records with the given outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: u64, state: LightState, outcome: Outcome) -> TransitionRecord {
        let now = Utc::now();
        TransitionRecord {
            id: Uuid::new_v4(),
            seq,
            state,
            handoff: Handoff::None,
            outcome,
            requested_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = TransitionHistory::with_capacity(8);
        assert!(history.is_empty());
        assert!(history.last().is_none());
        assert!(history.last_shown().is_none());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = TransitionHistory::with_capacity(8);
        let updated = history.record(record(1, LightState::Open, Outcome::Completed));

        assert_eq!(history.len(), 0);
        assert_eq!(updated.len(), 1);
    }

    #[test]
    fn capacity_drops_oldest_records() {
        let mut history = TransitionHistory::with_capacity(3);
        for seq in 1..=5 {
            history = history.record(record(seq, LightState::Open, Outcome::Completed));
        }

        assert_eq!(history.len(), 3);
        let seqs: Vec<u64> = history.records().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![3, 4, 5]);
    }

    #[test]
    fn zero_capacity_keeps_one_record() {
        let history = TransitionHistory::with_capacity(0)
            .record(record(1, LightState::Open, Outcome::Completed))
            .record(record(2, LightState::Alert, Outcome::Preempted));

        assert_eq!(history.capacity(), 1);
        assert_eq!(history.last().map(|r| r.seq), Some(2));
    }

    #[test]
    fn superseded_records_are_not_shown() {
        let history = TransitionHistory::with_capacity(8)
            .record(record(1, LightState::Alert, Outcome::Preempted))
            .record(record(2, LightState::Closed, Outcome::Superseded))
            .record(record(3, LightState::Open, Outcome::Completed))
            .record(record(4, LightState::Alert, Outcome::Superseded));

        assert_eq!(history.states(), vec![LightState::Alert, LightState::Open]);
        assert_eq!(history.last_shown(), Some(LightState::Open));
        assert_eq!(history.count(Outcome::Superseded), 2);
    }

    #[test]
    fn duration_spans_first_request_to_last_release() {
        let start = Utc::now();
        let mut first = record(1, LightState::Closed, Outcome::Completed);
        first.requested_at = start;
        first.finished_at = start + chrono::Duration::seconds(2);
        let mut second = record(2, LightState::Open, Outcome::Completed);
        second.requested_at = start + chrono::Duration::seconds(2);
        second.finished_at = start + chrono::Duration::seconds(3);

        let history = TransitionHistory::with_capacity(8)
            .record(first)
            .record(second);

        assert_eq!(history.duration(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn history_serializes_correctly() {
        let history = TransitionHistory::with_capacity(4).record(TransitionRecord {
            handoff: Handoff::Forced {
                attempts: 2,
                waited: Duration::from_secs(2),
            },
            ..record(7, LightState::Closed, Outcome::Completed)
        });

        let json = serde_json::to_string(&history).unwrap();
        let back: TransitionHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(back.len(), 1);
        assert_eq!(back.last(), history.last());
    }
}
