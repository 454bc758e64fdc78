//! Planar movement helpers used by gameplay logic next to the views.

use tether_shared::{Vec2, Vec3, ARRIVAL_TOLERANCE};

/// Read access to an entity's movement state.
pub trait MovementState {
    /// Position on the ground plane.
    fn position_2d(&self) -> Vec2;
    /// Current movement speed in units per second.
    fn move_speed(&self) -> f32;
}

/// Owned copy of the movement state the helpers need.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementSnapshot {
    /// World position.
    pub position: Vec3,
    /// Units per second.
    pub move_speed: f32,
}

impl MovementSnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub const fn new(position: Vec3, move_speed: f32) -> Self {
        Self {
            position,
            move_speed,
        }
    }
}

impl MovementState for MovementSnapshot {
    fn position_2d(&self) -> Vec2 {
        self.position.planar()
    }

    fn move_speed(&self) -> f32 {
        self.move_speed
    }
}

/// True iff the entity stands within [`ARRIVAL_TOLERANCE`] of `target`.
#[must_use]
pub fn is_at_position(entity: &impl MovementState, target: Vec2) -> bool {
    entity.position_2d().distance(target) < ARRIVAL_TOLERANCE
}

/// Estimated seconds for the entity to walk to `target`, plus `correction`.
///
/// A stationary entity (speed <= 0) never arrives unless it is already there.
#[must_use]
pub fn predict_move_duration(entity: &impl MovementState, target: Vec2, correction: f32) -> f32 {
    let distance = entity.position_2d().distance(target);
    let speed = entity.move_speed();
    if speed > 0.0 {
        distance / speed + correction
    } else if distance == 0.0 {
        correction
    } else {
        f32::INFINITY
    }
}
