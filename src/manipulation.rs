//! Drag, scale and yaw of the selected object.

use glam::{Quat, Vec3};
use log::debug;

use crate::config::ManipulationSettings;
use crate::events::{EventBus, InteractionEvent};
use crate::gestures::Pinch;
use crate::placement::PlacementEngine;
use crate::plane::{PlaneHitResolver, Raycaster, Ray};
use crate::policy::InteractionPolicy;

/// Swipe translated into two world rays.
#[derive(Debug, Clone, Copy)]
pub struct SwipeRays {
    pub origin: Ray,
    pub end: Ray,
}

/// Largest displacement allowed for one frame at the given mean hit distance.
pub fn move_cap(move_speed: f32, mean_distance: f32) -> f32 {
    if mean_distance > f32::EPSILON {
        move_speed / mean_distance
    } else {
        f32::INFINITY
    }
}

#[derive(Debug)]
pub struct ManipulationEngine {
    settings: ManipulationSettings,
}

impl ManipulationEngine {
    pub fn new(settings: ManipulationSettings) -> Self {
        Self { settings }
    }

    /// Drags the selected object along its plane. Returns the applied displacement.
    pub fn move_selected(
        &self,
        placement: &mut PlacementEngine,
        policy: &InteractionPolicy,
        long_press: bool,
        swipe: Option<&SwipeRays>,
        resolver: &mut PlaneHitResolver,
        raycaster: &dyn Raycaster,
        events: &mut EventBus,
    ) -> Option<Vec3> {
        if !policy.allows_move() {
            return None;
        }
        let obj = placement.selected_mut()?;

        if obj.animated && obj.floating != long_press {
            obj.floating = long_press;
            events.emit(InteractionEvent::FloatingChanged {
                id: obj.id,
                floating: long_press,
            });
        }

        let swipe = swipe?;
        let from = resolver.resolve(raycaster, &swipe.origin, Some(obj.plane))?;
        let to = resolver.resolve(raycaster, &swipe.end, None)?;

        let mut displacement = to.pose.position - from.pose.position;
        let cap = move_cap(self.settings.move_speed, (from.distance + to.distance) * 0.5);
        if to.plane == obj.plane && displacement.length() > cap {
            displacement = displacement.clamp_length_max(cap);
        }

        obj.transform.position += displacement;
        if obj.plane != to.plane {
            debug!("{} moved from {} to {}", obj.id, obj.plane, to.plane);
        }
        obj.plane = to.plane;
        events.emit(InteractionEvent::Transformed {
            id: obj.id,
            transform: obj.transform,
        });
        Some(displacement)
    }

    /// Applies a pinch: scale and yaw are gated independently. Returns true
    /// only when the transform actually changed.
    pub fn scale_rotate(
        &self,
        placement: &mut PlacementEngine,
        policy: &InteractionPolicy,
        pinch: Option<&Pinch>,
        events: &mut EventBus,
    ) -> bool {
        let Some(obj) = placement.selected_mut() else {
            return false;
        };
        let Some(pinch) = pinch else {
            return false;
        };

        let before = obj.transform;
        if policy.can_scale && pinch.scale_delta.is_finite() && pinch.scale_delta > 0.0 {
            obj.transform.scale *= pinch.scale_delta;
        }
        if policy.can_rotate && pinch.rotation_delta_deg != 0.0 {
            let yaw = Quat::from_rotation_y(pinch.rotation_delta_deg.to_radians());
            obj.transform.rotation = (obj.transform.rotation * yaw).normalize();
        }
        let changed = obj.transform != before;
        if changed {
            events.emit(InteractionEvent::Transformed {
                id: obj.id,
                transform: obj.transform,
            });
        }
        changed
    }
}
