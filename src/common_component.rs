use bevy_ecs::prelude::Component;
use nalgebra::{Point2, Vector2};

/// Position in world pixels.
#[derive(Clone, Copy, Debug, Component)]
pub struct Position(pub Point2<f32>);

#[derive(Clone, Debug, Component)]
pub struct Player;

/// Moves an entity around a circle. Stands in for input handling, which the
/// demo does not own.
#[derive(Clone, Debug, Component)]
pub struct ScriptedPath {
    pub center: Point2<f32>,
    pub radius: f32,
    pub angular_speed: f32,
}

impl ScriptedPath {
    pub fn position_at(&self, seconds: f32) -> Point2<f32> {
        let angle = seconds * self.angular_speed;
        self.center + Vector2::new(angle.cos(), angle.sin()) * self.radius
    }
}
