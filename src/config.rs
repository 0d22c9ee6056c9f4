//! Engine configuration.
//!
//! The defaults send every tick and snap observers onto the latest sample.
//! Throttled sends, frame-rate independent smoothing and blended rotation are
//! opt-in.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LERP_RATE;
use crate::error::SyncError;
use crate::policy::{InterpolationPolicy, RotationPolicy, SendPolicy};

/// Tunables for [`TransformSyncEngine`](crate::engine::TransformSyncEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Interpolation rate fed into [`InterpolationPolicy::factor`].
    pub lerp_rate: f32,
    /// How the rate becomes a per-tick factor.
    pub interpolation: InterpolationPolicy,
    /// How observers follow the target rotation.
    pub rotation: RotationPolicy,
    /// When authorities emit updates.
    pub send: SendPolicy,
    /// Drop samples whose sequence is not newer than the last accepted one.
    pub discard_stale: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lerp_rate: DEFAULT_LERP_RATE,
            interpolation: InterpolationPolicy::PerTick,
            rotation: RotationPolicy::Snap,
            send: SendPolicy::EveryTick,
            discard_stale: true,
        }
    }
}

impl SyncConfig {
    /// Parses a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`SyncError::Decode`] for malformed JSON and
    /// [`SyncError::InvalidConfig`] when validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use anchor_sync::config::SyncConfig;
    /// use anchor_sync::policy::RotationPolicy;
    ///
    /// let config = SyncConfig::from_json_str(r#"{ "rotation": "slerp" }"#)
    ///     .expect("valid configuration");
    /// assert_eq!(config.rotation, RotationPolicy::Slerp);
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, SyncError> {
        let config: Self = serde_json::from_str(text).map_err(SyncError::Decode)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    /// Returns [`SyncError::Io`] when the file cannot be read, otherwise as
    /// [`SyncConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks that every numeric setting is usable.
    ///
    /// # Errors
    /// Returns [`SyncError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> Result<(), SyncError> {
        if !self.lerp_rate.is_finite() || self.lerp_rate < 0.0 {
            return Err(SyncError::InvalidConfig(format!(
                "lerp_rate must be a non-negative finite number, got {}",
                self.lerp_rate
            )));
        }
        if let InterpolationPolicy::TimeNormalized { tick_seconds } = self.interpolation {
            if !tick_seconds.is_finite() || tick_seconds <= 0.0 {
                return Err(SyncError::InvalidConfig(format!(
                    "tick_seconds must be positive, got {tick_seconds}"
                )));
            }
        }
        match self.send {
            SendPolicy::EveryNthTick { interval: 0 } => Err(SyncError::InvalidConfig(
                "send interval must be at least one tick".to_owned(),
            )),
            SendPolicy::OnChange {
                position_epsilon,
                rotation_epsilon,
                ..
            } if !(position_epsilon >= 0.0 && rotation_epsilon >= 0.0) => {
                Err(SyncError::InvalidConfig(
                    "change thresholds must be non-negative".to_owned(),
                ))
            }
            SendPolicy::OnChange {
                max_interval: 0, ..
            } => Err(SyncError::InvalidConfig(
                "keep-alive interval must be at least one tick".to_owned(),
            )),
            _ => Ok(()),
        }
    }

    /// Per-tick lerp factor implied by the rate and interpolation policy.
    #[must_use]
    pub fn lerp_factor(&self) -> f32 {
        self.interpolation.factor(self.lerp_rate)
    }
}
