//! # View Layer Constants
//!
//! Tuning values baked into the client binary.

/// Simulation ticks per second driven by the host runtime.
pub const TICK_RATE: u32 = 60;

/// Planar distance under which an entity counts as standing on a target.
pub const ARRIVAL_TOLERANCE: f32 = 1.0;

/// Seconds added to every predicted move duration.
///
/// Covers the start/stop latency the pure distance/speed estimate misses.
/// Overridable through `ViewConfig::predict_move_correction`.
pub const DEFAULT_PREDICT_MOVE_CORRECTION: f32 = 0.1;
