//! In-memory stand-ins for the AR runtime: tracked planes and a model
//! factory. Used by the replay driver and in tests.

use std::collections::{BTreeMap, BTreeSet};

use glam::{Quat, Vec2, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::placement::{InstanceHandle, ModelFactory, ModelId, Transform};
use crate::plane::{HitTier, PlaneHit, PlaneId, Pose, Ray, Raycaster};

fn up() -> Vec3 {
    Vec3::Y
}

/// A planar surface as reported by tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedPlane {
    pub id: PlaneId,
    pub center: Vec3,
    #[serde(default = "up")]
    pub normal: Vec3,
    /// Boundary in plane-local `(x, z)` around `center`.
    #[serde(default)]
    pub polygon: Vec<Vec2>,
    /// Estimated planes carry no reliable boundary or infinite extent.
    #[serde(default)]
    pub estimated: bool,
}

impl TrackedPlane {
    /// Upward-facing rectangle centered on `center`.
    pub fn horizontal(id: u64, center: Vec3, half_extent: Vec2) -> Self {
        let (hx, hz) = (half_extent.x, half_extent.y);
        Self {
            id: PlaneId(id),
            center,
            normal: Vec3::Y,
            polygon: vec![
                Vec2::new(-hx, -hz),
                Vec2::new(hx, -hz),
                Vec2::new(hx, hz),
                Vec2::new(-hx, hz),
            ],
            estimated: false,
        }
    }

    pub fn rotation(&self) -> Quat {
        let n = self.normal.try_normalize().unwrap_or(Vec3::Y);
        Quat::from_rotation_arc(Vec3::Y, n)
    }

    /// Distance along the ray and world point where it crosses the infinite plane.
    pub fn intersect(&self, ray: &Ray) -> Option<(f32, Vec3)> {
        let n = self.normal.try_normalize()?;
        let denom = n.dot(ray.direction());
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = n.dot(self.center - ray.origin) / denom;
        (t > 0.0).then(|| (t, ray.at(t)))
    }

    /// Even-odd test of a world point (assumed on the plane) against the boundary.
    pub fn polygon_contains(&self, world: Vec3) -> bool {
        if self.polygon.len() < 3 {
            return false;
        }
        let local = self.rotation().inverse() * (world - self.center);
        let p = Vec2::new(local.x, local.z);
        let mut inside = false;
        let mut j = self.polygon.len() - 1;
        for i in 0..self.polygon.len() {
            let (a, b) = (self.polygon[i], self.polygon[j]);
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    fn matches(&self, tier: HitTier, point: Vec3) -> bool {
        match tier {
            HitTier::WithinPolygon => !self.estimated && self.polygon_contains(point),
            HitTier::WithinInfinity => !self.estimated,
            HitTier::Estimated => self.estimated,
        }
    }
}

/// Set of tracked planes answering ray casts per confidence tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaneScene {
    pub planes: Vec<TrackedPlane>,
}

impl PlaneScene {
    pub fn new(planes: Vec<TrackedPlane>) -> Self {
        Self { planes }
    }

    pub fn upsert(&mut self, plane: TrackedPlane) {
        match self.planes.iter_mut().find(|p| p.id == plane.id) {
            Some(existing) => *existing = plane,
            None => self.planes.push(plane),
        }
    }

    pub fn remove(&mut self, id: PlaneId) -> bool {
        let before = self.planes.len();
        self.planes.retain(|p| p.id != id);
        before != self.planes.len()
    }
}

impl Raycaster for PlaneScene {
    fn raycast(&self, ray: &Ray, tier: HitTier) -> Vec<PlaneHit> {
        let mut hits: Vec<PlaneHit> = self
            .planes
            .iter()
            .filter_map(|plane| {
                let (distance, point) = plane.intersect(ray)?;
                plane.matches(tier, point).then(|| PlaneHit {
                    plane: plane.id,
                    pose: Pose::new(point, plane.rotation()),
                    distance,
                    tier,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// Model factory that only keeps handles; nothing is rendered.
#[derive(Debug, Default)]
pub struct SceneModels {
    next: u64,
    live: BTreeMap<InstanceHandle, ModelId>,
    animated: BTreeSet<ModelId>,
}

impl SceneModels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `model` as carrying an animation controller.
    pub fn with_animated(mut self, model: ModelId) -> Self {
        self.animated.insert(model);
        self
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, instance: InstanceHandle) -> bool {
        self.live.contains_key(&instance)
    }
}

impl ModelFactory for SceneModels {
    fn instantiate(&mut self, model: ModelId, transform: &Transform) -> InstanceHandle {
        self.next += 1;
        let handle = InstanceHandle(self.next);
        debug!("instantiate {model} as {handle} at {}", transform.position);
        self.live.insert(handle, model);
        handle
    }

    fn release(&mut self, instance: InstanceHandle) {
        if self.live.remove(&instance).is_none() {
            debug!("release of unknown {instance}");
        }
    }

    fn has_animator(&self, instance: InstanceHandle) -> bool {
        self.live
            .get(&instance)
            .is_some_and(|model| self.animated.contains(model))
    }
}
