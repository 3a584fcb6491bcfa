//! Builder API and configuration for transition controllers.
//!
//! This module provides a fluent builder plus a serde-backed configuration
//! whose validation reports every problem at once.

pub mod config;
pub mod controller;
pub mod error;

pub use config::ControllerConfig;
pub use controller::ControllerBuilder;
pub use error::{BuildError, ConfigViolation};
