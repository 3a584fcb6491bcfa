//! Builder for constructing transition controllers.

use super::config::ControllerConfig;
use super::error::BuildError;
use crate::effects::TransitionController;
use crate::enforcement::HandoffPolicy;
use crate::surface::Surface;
use std::sync::Arc;
use std::time::Duration;

/// Builder for constructing controllers with a fluent API.
///
/// # Example
///
/// ```rust
/// use stoplight::builder::ControllerBuilder;
/// use stoplight::enforcement::HandoffPolicy;
/// use stoplight::surface::NullSurface;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let controller = ControllerBuilder::new()
///     .surface(Arc::new(NullSurface))
///     .blink_interval(Duration::from_millis(250))
///     .handoff_policy(HandoffPolicy::Retry { attempts: 2 })
///     .build()
///     .unwrap();
///
/// assert!(controller.is_idle());
/// ```
pub struct ControllerBuilder {
    surface: Option<Arc<dyn Surface>>,
    config: ControllerConfig,
}

impl ControllerBuilder {
    /// Create a new builder with default timing.
    pub fn new() -> Self {
        Self {
            surface: None,
            config: ControllerConfig::default(),
        }
    }

    /// Set the rendering surface (required).
    pub fn surface<S: Surface + 'static>(mut self, surface: Arc<S>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the time between alert blinks.
    pub fn blink_interval(mut self, interval: Duration) -> Self {
        self.config.blink_interval = interval;
        self
    }

    /// Set how long CLOSED shows yellow before red.
    pub fn attention_duration(mut self, duration: Duration) -> Self {
        self.config.attention_duration = duration;
        self
    }

    /// Set how long a preempting call waits for the incumbent to exit.
    pub fn handoff_deadline(mut self, deadline: Duration) -> Self {
        self.config.handoff_deadline = deadline;
        self
    }

    /// Set what happens when the hand-off deadline elapses.
    pub fn handoff_policy(mut self, policy: HandoffPolicy) -> Self {
        self.config.handoff_policy = policy;
        self
    }

    /// Set how many transition records are kept.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    /// Build the controller.
    /// Returns an error if the surface is missing or the configuration is invalid.
    pub fn build(self) -> Result<TransitionController, BuildError> {
        let surface = self.surface.ok_or(BuildError::MissingSurface)?;
        self.config.check()?;
        Ok(TransitionController::from_parts(surface, self.config))
    }
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
