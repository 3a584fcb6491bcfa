//! Stoplight: a preemptible transition controller for an animated traffic light.
//!
//! A traffic light shows one of three states: OPEN (green), CLOSED (yellow,
//! then red) and ALERT (blinking yellow). Requests to change state may arrive
//! at any time, including while the previous animation is still running. The
//! controller guarantees that:
//!
//! - at most one animation routine runs at a time;
//! - a new request interrupts the running routine instead of queueing behind it;
//! - the interrupted routine unwinds before the new one starts.
//!
//! Cancellation is cooperative: routines poll a [`effects::CancelToken`] at
//! each wait and return when asked. Nothing is force-terminated.
//!
//! # Example
//!
//! ```rust
//! use stoplight::core::{Frame, LightState, Outcome};
//! use stoplight::effects::TransitionController;
//! use stoplight::surface::RecordingSurface;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let surface = Arc::new(RecordingSurface::new());
//! let controller = TransitionController::builder()
//!     .surface(surface.clone())
//!     .blink_interval(Duration::from_millis(20))
//!     .build()
//!     .unwrap();
//!
//! let alert = tokio::spawn({
//!     let controller = controller.clone();
//!     async move { controller.transition(LightState::Alert).await }
//! });
//! tokio::time::sleep(Duration::from_millis(50)).await;
//!
//! controller.transition(LightState::Open).await.unwrap();
//!
//! let alert = alert.await.unwrap().unwrap();
//! assert_eq!(alert.outcome, Outcome::Preempted);
//! assert_eq!(surface.frames().last(), Some(&Frame::Green));
//! # }
//! ```

pub mod builder;
pub mod core;
pub mod effects;
pub mod enforcement;
pub mod surface;

// Re-export commonly used types
pub use builder::{BuildError, ControllerBuilder, ControllerConfig};
pub use crate::core::{Frame, LightState, Outcome, TransitionRecord};
pub use effects::{TransitionController, TransitionError};
pub use surface::Surface;
