//! Controller configuration.
//!
//! Durations are expressed in milliseconds when serialized. Missing fields
//! take their defaults, which reproduce the classic timing: a 500 ms blink,
//! a 2 s yellow phase and a 1 s hand-off deadline.

use super::error::{BuildError, ConfigViolation};
use crate::effects::Timing;
use crate::enforcement::HandoffPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub const DEFAULT_BLINK_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_ATTENTION_DURATION: Duration = Duration::from_secs(2);
pub const DEFAULT_HANDOFF_DEADLINE: Duration = Duration::from_secs(1);
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Timing and policy knobs for a [`TransitionController`](crate::effects::TransitionController).
///
/// # Example
///
/// ```rust
/// use stoplight::builder::ControllerConfig;
/// use stoplight::enforcement::HandoffPolicy;
/// use std::time::Duration;
///
/// let config = ControllerConfig::from_json(
///     r#"{ "blink_interval_ms": 250, "handoff_policy": { "kind": "abort" } }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.blink_interval, Duration::from_millis(250));
/// assert_eq!(config.attention_duration, Duration::from_secs(2));
/// assert_eq!(config.handoff_policy, HandoffPolicy::Abort);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Time between alert blinks.
    #[serde(rename = "blink_interval_ms", with = "millis")]
    pub blink_interval: Duration,

    /// How long CLOSED shows yellow before red.
    #[serde(rename = "attention_duration_ms", with = "millis")]
    pub attention_duration: Duration,

    /// How long a preempting call waits for the incumbent to exit.
    ///
    /// The same deadline applies whichever routine is being preempted.
    #[serde(rename = "handoff_deadline_ms", with = "millis")]
    pub handoff_deadline: Duration,

    /// What to do when the deadline elapses.
    pub handoff_policy: HandoffPolicy,

    /// Number of transition records kept.
    pub history_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            blink_interval: DEFAULT_BLINK_INTERVAL,
            attention_duration: DEFAULT_ATTENTION_DURATION,
            handoff_deadline: DEFAULT_HANDOFF_DEADLINE,
            handoff_policy: HandoffPolicy::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl ControllerConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BuildError::ConfigParse(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Validate every field, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let checks = vec![
            non_zero("blink_interval", self.blink_interval),
            non_zero("attention_duration", self.attention_duration),
            non_zero("handoff_deadline", self.handoff_deadline),
            require(
                !matches!(self.handoff_policy, HandoffPolicy::Retry { attempts: 0 }),
                ConfigViolation::ZeroRetryAttempts,
            ),
            require(
                self.history_capacity > 0,
                ConfigViolation::ZeroHistoryCapacity,
            ),
        ];

        Validation::all_vec(checks).map(|_| ())
    }

    /// [`validate`](Self::validate) as a `Result`.
    pub fn check(&self) -> Result<(), BuildError> {
        match self.validate() {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => Err(BuildError::InvalidConfig(
                errors.iter().cloned().collect(),
            )),
        }
    }

    /// Durations the animation routines poll with.
    pub fn timing(&self) -> Timing {
        Timing {
            blink_interval: self.blink_interval,
            attention_duration: self.attention_duration,
        }
    }
}

fn require(ok: bool, violation: ConfigViolation) -> Validation<(), NonEmptyVec<ConfigViolation>> {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation)
    }
}

fn non_zero(
    field: &'static str,
    duration: Duration,
) -> Validation<(), NonEmptyVec<ConfigViolation>> {
    require(!duration.is_zero(), ConfigViolation::ZeroDuration { field })
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
