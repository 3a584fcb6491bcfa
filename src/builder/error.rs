//! Build errors for controller construction and configuration.

use thiserror::Error;

/// A single problem with a [`ControllerConfig`](super::ControllerConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigViolation {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("retry policy needs at least one attempt")]
    ZeroRetryAttempts,

    #[error("history_capacity must be greater than zero")]
    ZeroHistoryCapacity,
}

/// Errors that can occur when building a controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("Surface not specified. Call .surface(surface) before .build()")]
    MissingSurface,

    #[error("Invalid controller configuration: {}", describe(.0))]
    InvalidConfig(Vec<ConfigViolation>),

    #[error("Configuration could not be parsed: {0}")]
    ConfigParse(String),
}

fn describe(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
