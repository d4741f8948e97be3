//! Plane hit resolution with sticky/forced plane preference.
//!
//! The polygon tier is the ground truth for "finger is over a visible
//! surface". The infinite and estimated tiers only keep an already chosen
//! plane under the finger when the visible boundary lags behind a fast
//! swipe, which is why the forced and sticky preferences apply to them alone.

use std::fmt;

use glam::{Quat, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaneId(pub u64);

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plane#{}", self.0)
    }
}

/// How confidently a ray struck a plane, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitTier {
    WithinPolygon,
    WithinInfinity,
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ray {
    pub origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// `direction` is normalized; a zero direction yields a ray that hits nothing.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaneHit {
    pub plane: PlaneId,
    pub pose: Pose,
    /// Distance from the ray origin to the hit.
    pub distance: f32,
    pub tier: HitTier,
}

/// Ray-casting service of the AR runtime.
pub trait Raycaster {
    /// Hits against planes in `tier`, nearest first.
    fn raycast(&self, ray: &Ray, tier: HitTier) -> Vec<PlaneHit>;
}

fn nearest(hits: &[PlaneHit]) -> Option<&PlaneHit> {
    hits.iter().min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Picks one hit per ray and remembers the last polygon-tier plane.
#[derive(Debug, Default)]
pub struct PlaneHitResolver {
    sticky: Option<PlaneId>,
}

impl PlaneHitResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sticky_plane(&self) -> Option<PlaneId> {
        self.sticky
    }

    pub fn reset(&mut self) {
        self.sticky = None;
    }

    pub fn resolve(
        &mut self,
        raycaster: &dyn Raycaster,
        ray: &Ray,
        force_plane: Option<PlaneId>,
    ) -> Option<PlaneHit> {
        if force_plane.is_none() {
            let hits = raycaster.raycast(ray, HitTier::WithinPolygon);
            if let Some(hit) = nearest(&hits) {
                debug!("polygon hit on {} at {:.3}", hit.plane, hit.distance);
                self.sticky = Some(hit.plane);
                return Some(*hit);
            }
        }

        let mut hits = raycaster.raycast(ray, HitTier::WithinInfinity);
        if hits.is_empty() {
            hits = raycaster.raycast(ray, HitTier::Estimated);
        }

        if let Some(forced) = force_plane {
            if let Some(hit) = hits.iter().find(|h| h.plane == forced) {
                return Some(*hit);
            }
        }
        if let Some(sticky) = self.sticky {
            if let Some(hit) = hits.iter().find(|h| h.plane == sticky) {
                return Some(*hit);
            }
        }
        nearest(&hits).copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Raycaster returning canned hit lists per tier.
    #[derive(Default)]
    pub(crate) struct CannedHits {
        pub(crate) tiers: HashMap<HitTier, Vec<PlaneHit>>,
    }

    impl CannedHits {
        pub(crate) fn with(mut self, tier: HitTier, hits: &[(u64, f32)]) -> Self {
            let list = hits
                .iter()
                .map(|&(id, d)| hit(id, d, tier))
                .collect();
            self.tiers.insert(tier, list);
            self
        }
    }

    impl Raycaster for CannedHits {
        fn raycast(&self, _ray: &Ray, tier: HitTier) -> Vec<PlaneHit> {
            self.tiers.get(&tier).cloned().unwrap_or_default()
        }
    }

    pub(crate) fn hit(id: u64, distance: f32, tier: HitTier) -> PlaneHit {
        PlaneHit {
            plane: PlaneId(id),
            pose: Pose::new(Vec3::new(0.0, 0.0, distance), Quat::IDENTITY),
            distance,
            tier,
        }
    }

    fn ray() -> Ray {
        Ray::new(Vec3::ZERO, Vec3::Z)
    }

    #[test]
    fn polygon_tier_returns_nearest_and_sets_sticky() {
        let rc = CannedHits::default().with(HitTier::WithinPolygon, &[(1, 3.0), (2, 1.0)]);
        let mut r = PlaneHitResolver::new();
        r.sticky = Some(PlaneId(1));
        let h = r.resolve(&rc, &ray(), None).unwrap();
        assert_eq!(h.plane, PlaneId(2));
        assert_eq!(r.sticky_plane(), Some(PlaneId(2)));
    }

    #[test]
    fn infinite_tier_prefers_sticky_plane() {
        let rc = CannedHits::default().with(HitTier::WithinInfinity, &[(9, 1.0), (4, 5.0)]);
        let mut r = PlaneHitResolver::new();
        r.sticky = Some(PlaneId(4));
        let h = r.resolve(&rc, &ray(), None).unwrap();
        assert_eq!(h.plane, PlaneId(4));
        assert_eq!(h.distance, 5.0);
    }

    #[test]
    fn forced_plane_beats_sticky_plane() {
        let rc = CannedHits::default()
            .with(HitTier::WithinPolygon, &[(4, 0.5)])
            .with(HitTier::WithinInfinity, &[(4, 1.0), (7, 2.0)]);
        let mut r = PlaneHitResolver::new();
        r.sticky = Some(PlaneId(4));
        let h = r.resolve(&rc, &ray(), Some(PlaneId(7))).unwrap();
        assert_eq!(h.plane, PlaneId(7));
        // polygon tier skipped entirely while forcing
        assert_eq!(r.sticky_plane(), Some(PlaneId(4)));
    }

    #[test]
    fn lower_tiers_fall_back_to_nearest_without_touching_sticky() {
        let rc = CannedHits::default().with(HitTier::Estimated, &[(3, 4.0), (5, 2.0)]);
        let mut r = PlaneHitResolver::new();
        r.sticky = Some(PlaneId(8));
        let h = r.resolve(&rc, &ray(), Some(PlaneId(6))).unwrap();
        assert_eq!(h.plane, PlaneId(5));
        assert_eq!(h.tier, HitTier::Estimated);
        assert_eq!(r.sticky_plane(), Some(PlaneId(8)));
    }

    #[test]
    fn estimated_tier_only_used_when_infinite_tier_is_empty() {
        let rc = CannedHits::default()
            .with(HitTier::WithinInfinity, &[(1, 9.0)])
            .with(HitTier::Estimated, &[(2, 1.0)]);
        let mut r = PlaneHitResolver::new();
        assert_eq!(r.resolve(&rc, &ray(), None).unwrap().plane, PlaneId(1));
    }

    #[test]
    fn no_hits_resolve_to_none() {
        let mut r = PlaneHitResolver::new();
        assert!(r.resolve(&CannedHits::default(), &ray(), None).is_none());
        assert!(r.sticky_plane().is_none());
    }
}
