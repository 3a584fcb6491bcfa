//! Level-triggered signals and the cancellable wait.
//!
//! A [`Signal`] holds a value that persists until changed and can be awaited
//! by any number of tasks. It is the only place in the crate that suspends.

use std::time::Duration;
use tokio::sync::watch;

/// Observable value with level-triggered waiting.
///
/// Updates go through [`Signal::update`], which applies the closure
/// atomically and wakes every waiter. Waiting checks the current value
/// before suspending, so a change made concurrently with the call is never
/// missed.
///
/// # Example
///
/// ```rust
/// use stoplight::effects::Signal;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let event = Signal::new(false);
/// assert!(!event.wait(Duration::from_millis(10)).await);
///
/// event.set();
/// assert!(event.wait(Duration::from_millis(10)).await);
/// # }
/// ```
#[derive(Debug)]
pub struct Signal<T> {
    tx: watch::Sender<T>,
}

impl<T> Signal<T> {
    /// Create a signal holding `initial`.
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Read the current value without suspending.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Apply `f` to the value atomically and notify waiters.
    ///
    /// Returns whatever `f` returns.
    pub fn update<R: Default>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut output = R::default();
        self.tx.send_modify(|value| output = f(value));
        output
    }

    /// Wait until `predicate` holds or `timeout` elapses.
    ///
    /// Returns the predicate evaluated on the value current at return time,
    /// so `true` means "the condition was observed", whether it arrived
    /// before the deadline or exactly at it.
    pub async fn wait_until<F>(&self, timeout: Duration, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        let mut rx = self.tx.subscribe();
        let waited = tokio::time::timeout(timeout, async {
            rx.wait_for(|value| predicate(value)).await.map(|_| ())
        })
        .await;

        if waited.is_err() {
            tracing::trace!(?timeout, "signal wait timed out");
        }

        predicate(&self.tx.borrow())
    }
}

impl Signal<bool> {
    /// Set the signal and wake every waiter.
    pub fn set(&self) {
        self.tx.send_replace(true);
    }

    /// Reset the signal. Waiters keep waiting.
    pub fn clear(&self) {
        self.tx.send_replace(false);
    }

    /// Whether the signal is currently set.
    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait for the signal to be set, up to `timeout`; returns whether it is set.
    pub async fn wait(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, |set| *set).await
    }
}
