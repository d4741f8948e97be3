use glam::{Mat3, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::plane::Ray;

fn identity() -> Quat {
    Quat::IDENTITY
}

/// Pinhole camera looking down its local +Z with +Y up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    #[serde(default = "identity")]
    pub rotation: Quat,
    pub fov_y_deg: f32,
    /// Screen size in pixels.
    pub viewport: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y_deg: 60.0,
            viewport: Vec2::new(1080.0, 1920.0),
        }
    }
}

impl Camera {
    pub fn looking_at(position: Vec3, target: Vec3, fov_y_deg: f32, viewport: Vec2) -> Self {
        let forward = (target - position).try_normalize().unwrap_or(Vec3::Z);
        let right = Vec3::Y.cross(forward).try_normalize().unwrap_or(Vec3::X);
        let up = forward.cross(right);
        Self {
            position,
            rotation: Quat::from_mat3(&Mat3::from_cols(right, up, forward)),
            fov_y_deg,
            viewport,
        }
    }

    /// Ray through a screen point (pixels, origin bottom-left).
    pub fn screen_point_to_ray(&self, point: Vec2) -> Ray {
        let size = self.viewport.max(Vec2::ONE);
        let ndc = point / size * 2.0 - Vec2::ONE;
        let tan = (self.fov_y_deg.to_radians() * 0.5).tan();
        let aspect = size.x / size.y;
        let local = Vec3::new(ndc.x * tan * aspect, ndc.y * tan, 1.0);
        Ray::new(self.position, self.rotation * local)
    }

    pub fn center(&self) -> Vec2 {
        self.viewport * 0.5
    }
}
