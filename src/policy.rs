//! Send, interpolation and rotation policies.
//!
//! Each policy is a small serialisable enum with a pure decision function so
//! the engine stays free of branching on configuration details.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KEEP_ALIVE_TICKS, DEFAULT_POSITION_EPSILON, DEFAULT_ROTATION_EPSILON,
    DEFAULT_TICK_SECONDS,
};
use crate::message::Tick;
use crate::pose::Pose;

/// When an authority broadcasts its relative pose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SendPolicy {
    /// Send on every tick regardless of movement.
    #[default]
    EveryTick,
    /// Send when at least `interval` ticks have passed since the last send.
    EveryNthTick {
        /// Minimum tick distance between two sends.
        interval: u32,
    },
    /// Send when the pose moved beyond the given thresholds, and at least
    /// every `max_interval` ticks otherwise.
    ///
    /// The keep-alive repairs a lost update and reaches observers that join
    /// after the entity has come to rest.
    OnChange {
        /// Translation, in world units, that counts as movement.
        position_epsilon: f32,
        /// Rotation, in radians, that counts as movement.
        rotation_epsilon: f32,
        /// Longest silence, in ticks, before an unchanged pose is re-sent.
        #[serde(default = "default_keep_alive")]
        max_interval: u32,
    },
}

const fn default_keep_alive() -> u32 {
    DEFAULT_KEEP_ALIVE_TICKS
}

/// What the authority last put on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastSend {
    /// Tick the update was emitted on.
    pub tick: Tick,
    /// Relative pose that was sent.
    pub relative: Pose,
}

impl SendPolicy {
    /// On-change policy with the default thresholds.
    #[must_use]
    pub const fn on_change() -> Self {
        Self::OnChange {
            position_epsilon: DEFAULT_POSITION_EPSILON,
            rotation_epsilon: DEFAULT_ROTATION_EPSILON,
            max_interval: DEFAULT_KEEP_ALIVE_TICKS,
        }
    }

    /// Decides whether `relative` should be sent at `now`.
    ///
    /// The first update for an entity is always sent.
    #[must_use]
    pub fn should_send(&self, now: Tick, relative: &Pose, last: Option<&LastSend>) -> bool {
        let Some(last) = last else {
            return true;
        };
        match *self {
            Self::EveryTick => true,
            Self::EveryNthTick { interval } => {
                now.since(last.tick) >= u64::from(interval.max(1))
            }
            Self::OnChange {
                position_epsilon,
                rotation_epsilon,
                max_interval,
            } => {
                now.since(last.tick) >= u64::from(max_interval.max(1))
                    || relative.distance_to(&last.relative) > position_epsilon
                    || relative.angle_to(&last.relative) > rotation_epsilon
            }
        }
    }
}

/// How the per-tick lerp factor is derived from the configured rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterpolationPolicy {
    /// Use the rate directly as the lerp factor every tick. Convergence speed
    /// then depends on the tick rate.
    #[default]
    PerTick,
    /// Treat the rate as an exponential decay constant per second, so
    /// convergence is independent of the tick rate.
    TimeNormalized {
        /// Seconds simulated by one tick.
        tick_seconds: f32,
    },
}

impl InterpolationPolicy {
    /// Time-normalised policy at the default tick length.
    #[must_use]
    pub const fn time_normalized() -> Self {
        Self::TimeNormalized {
            tick_seconds: DEFAULT_TICK_SECONDS,
        }
    }

    /// Returns the lerp factor for one nominal tick, clamped into `[0, 1]`.
    ///
    /// Non-finite input yields `0.0` so the observer holds still.
    ///
    /// # Examples
    ///
    /// ```
    /// use anchor_sync::policy::InterpolationPolicy;
    ///
    /// assert_eq!(InterpolationPolicy::PerTick.factor(5.0), 1.0);
    /// assert_eq!(InterpolationPolicy::PerTick.factor(0.25), 0.25);
    /// ```
    #[must_use]
    pub fn factor(&self, lerp_rate: f32) -> f32 {
        match *self {
            Self::PerTick => self.factor_over(lerp_rate, 0.0),
            Self::TimeNormalized { tick_seconds } => self.factor_over(lerp_rate, tick_seconds),
        }
    }

    /// Returns the lerp factor for a tick that lasted `elapsed` seconds.
    ///
    /// `PerTick` ignores `elapsed`. `TimeNormalized` decays over the real
    /// elapsed time instead of its nominal tick length, so hosts with a
    /// variable frame length converge at the same wall-clock speed.
    #[must_use]
    pub fn factor_over(&self, lerp_rate: f32, elapsed: f32) -> f32 {
        let raw = match *self {
            Self::PerTick => lerp_rate,
            Self::TimeNormalized { .. } => 1.0 - (-lerp_rate * elapsed).exp(),
        };
        if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// How an observer's displayed rotation follows its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Assign the target rotation directly.
    #[default]
    Snap,
    /// Blend towards the target with the same factor as position.
    Slerp,
}

impl RotationPolicy {
    /// Returns the next displayed rotation.
    #[must_use]
    pub fn step(&self, current: Quat, target: Quat, factor: f32) -> Quat {
        match self {
            Self::Snap => target,
            Self::Slerp => current.slerp(target, factor).normalize(),
        }
    }
}

/// Moves `current` towards `target` by `factor`.
#[must_use]
pub fn step_position(current: Vec3, target: Vec3, factor: f32) -> Vec3 {
    if factor >= 1.0 {
        return target;
    }
    current.lerp(target, factor)
}
