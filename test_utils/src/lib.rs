//! Utility helpers for tests.
//!
//! Shared pose constructors and tolerance assertions for the integration
//! suites.

use anchor_sync::{EntityId, Pose, ReferenceFrameHandle, SyncConfig, TransformSyncEngine};
use glam::{Quat, Vec3};

/// Default tolerance for pose comparisons in tests.
pub const TOLERANCE: f32 = 1.0e-4;

/// Unrotated pose at `(x, y, z)`.
#[must_use]
pub fn pose_at(x: f32, y: f32, z: f32) -> Pose {
    Pose::from_position(Vec3::new(x, y, z))
}

/// Frame at `origin` turned `degrees` about the up axis.
#[must_use]
pub fn yawed(origin: Vec3, degrees: f32) -> Pose {
    Pose::new(origin, Quat::from_rotation_y(degrees.to_radians()))
}

/// Assert that two poses agree within `tolerance`.
///
/// # Panics
/// Panics with both poses when they differ.
pub fn assert_pose_close(actual: &Pose, expected: &Pose, tolerance: f32) {
    assert!(
        actual.approx_eq(expected, tolerance),
        "expected {expected:?}, got {actual:?}"
    );
}

/// Build an engine with `config` reading `frame`.
///
/// # Panics
/// Panics if `config` is invalid.
#[must_use]
pub fn engine_with(config: SyncConfig, frame: &ReferenceFrameHandle) -> TransformSyncEngine {
    TransformSyncEngine::new(config, frame.clone())
        .unwrap_or_else(|e| panic!("test configuration rejected: {e}"))
}

/// Build an engine observing `id`, initially displayed at `initial`.
///
/// # Panics
/// Panics if `config` is invalid.
#[must_use]
pub fn observer_of(
    id: EntityId,
    initial: Pose,
    config: SyncConfig,
    frame: &ReferenceFrameHandle,
) -> TransformSyncEngine {
    let mut engine = engine_with(config, frame);
    engine
        .register_observer(id, initial)
        .unwrap_or_else(|e| panic!("observer registration failed: {e}"));
    engine
}

/// Configuration easing position by `rate` per tick.
#[must_use]
pub fn eased(rate: f32) -> SyncConfig {
    SyncConfig {
        lerp_rate: rate,
        ..SyncConfig::default()
    }
}
