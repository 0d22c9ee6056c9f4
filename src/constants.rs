//! Synchronisation defaults shared by the engine, the plugin and the demo.

/// Per-tick lerp rate. Clamped into `[0, 1]` it saturates, so observers snap
/// onto each new sample unless a configuration lowers it.
pub const DEFAULT_LERP_RATE: f32 = 5.0;
/// Tick duration assumed by the time-normalised interpolation policy when a
/// configuration does not override it (sixty ticks per second).
pub const DEFAULT_TICK_SECONDS: f32 = 1.0 / 60.0;
/// Minimum translation, in world units, treated as a change by the
/// on-change send policy.
pub const DEFAULT_POSITION_EPSILON: f32 = 1.0e-4;
/// Minimum rotation, in radians, treated as a change by the on-change send
/// policy.
pub const DEFAULT_ROTATION_EPSILON: f32 = 1.0e-3;
/// Longest run of ticks the on-change send policy stays silent before it
/// re-sends an unchanged pose (one second at the default tick length).
pub const DEFAULT_KEEP_ALIVE_TICKS: u32 = 60;
/// Tolerance used when comparing poses for equality.
pub const POSE_TOLERANCE: f32 = 1.0e-5;
