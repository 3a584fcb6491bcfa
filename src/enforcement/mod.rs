//! Hand-off deadline enforcement.
//!
//! When a new request preempts a running routine, the caller waits a bounded
//! time for the incumbent to confirm its exit. Missing that deadline is a
//! [`HandoffViolation`]; what happens next is decided by the configured
//! [`HandoffPolicy`].
//!
//! # Example
//!
//! ```rust
//! use stoplight::enforcement::HandoffPolicy;
//!
//! let policy = HandoffPolicy::Retry { attempts: 3 };
//! assert_eq!(policy.max_waits(), 3);
//! assert_eq!(HandoffPolicy::default(), HandoffPolicy::Proceed);
//! ```

pub mod policy;
pub mod violations;

pub use policy::{HandoffPolicy, PolicyDecision};
pub use violations::HandoffViolation;
