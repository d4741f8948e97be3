//! Spawned object registry and tap-to-place.

use std::fmt;

use glam::{Mat3, Quat, Vec3};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::PlacementSettings;
use crate::error::PlacementError;
use crate::events::{EventBus, InteractionEvent};
use crate::feedback::HapticPreset;
use crate::plane::{PlaneHitResolver, PlaneId, Ray};
use crate::session::Services;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Index of a placeable model in the app's model picker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub u32);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model#{}", self.0)
    }
}

/// Opaque handle to a renderable instance owned by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceHandle(pub u64);

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Creates and releases renderable instances. The core never touches
/// rendering state beyond these calls.
pub trait ModelFactory {
    fn instantiate(&mut self, model: ModelId, transform: &Transform) -> InstanceHandle;
    fn release(&mut self, instance: InstanceHandle);
    /// Whether the instance exposes an animation controller.
    fn has_animator(&self, _instance: InstanceHandle) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedObject {
    pub id: ObjectId,
    pub instance: InstanceHandle,
    pub model: ModelId,
    pub transform: Transform,
    /// Plane the object currently rests on.
    pub plane: PlaneId,
    pub animated: bool,
    pub floating: bool,
}

/// Rotation whose forward axis points from `position` toward `observer`,
/// ignoring height. `None` when the observer is straight above or below.
pub fn facing_rotation(position: Vec3, observer: Vec3) -> Option<Quat> {
    let mut toward = observer - position;
    toward.y = 0.0;
    let forward = toward.try_normalize()?;
    let right = Vec3::Y.cross(forward);
    Some(Quat::from_mat3(&Mat3::from_cols(right, Vec3::Y, forward)))
}

#[derive(Debug)]
pub struct PlacementEngine {
    settings: PlacementSettings,
    model: ModelId,
    objects: Vec<PlacedObject>,
    next_id: u64,
    selected: Option<ObjectId>,
}

impl PlacementEngine {
    pub fn new(settings: PlacementSettings) -> Self {
        Self {
            model: settings.model,
            settings,
            objects: Vec::new(),
            next_id: 0,
            selected: None,
        }
    }

    pub fn count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_full(&self) -> bool {
        self.objects.len() >= self.settings.max_objects
    }

    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn last_spawned(&self) -> Option<&PlacedObject> {
        self.objects.last()
    }

    pub fn selected(&self) -> Option<&PlacedObject> {
        let id = self.selected?;
        self.get(id)
    }

    pub(crate) fn selected_mut(&mut self) -> Option<&mut PlacedObject> {
        let id = self.selected?;
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Model used by future spawns; existing objects are unaffected.
    pub fn set_model(&mut self, model: ModelId) {
        self.model = model;
    }

    /// Places the active model where `tap_ray` meets a plane. `None` when
    /// there was no tap, capacity is reached, or nothing was hit.
    pub fn try_spawn(
        &mut self,
        tap_ray: Option<&Ray>,
        facing_origin: Vec3,
        resolver: &mut PlaneHitResolver,
        services: &mut Services<'_>,
        events: &mut EventBus,
    ) -> Option<ObjectId> {
        if self.is_full() {
            return None;
        }
        let ray = tap_ray?;
        let hit = resolver.resolve(services.raycaster, ray, None)?;

        let position = hit.pose.position;
        let mut transform = Transform {
            position,
            rotation: facing_rotation(position, facing_origin).unwrap_or(hit.pose.rotation),
            scale: Vec3::ONE,
        };
        if self.settings.rescale_by_distance {
            transform.scale *= hit.distance * self.settings.distance_scale_factor;
        }

        let instance = services.factory.instantiate(self.model, &transform);
        let animated = services.factory.has_animator(instance);

        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.objects.push(PlacedObject {
            id,
            instance,
            model: self.model,
            transform,
            plane: hit.plane,
            animated,
            floating: false,
        });
        self.selected = Some(id);

        services.haptics.pulse(HapticPreset::LightImpact);
        info!(
            "spawned {id} ({}) on {} at {}",
            self.model, hit.plane, transform.position
        );
        events.emit(InteractionEvent::Spawned {
            id,
            model: self.model,
            plane: hit.plane,
        });
        Some(id)
    }

    fn release(obj: PlacedObject, factory: &mut dyn ModelFactory, events: &mut EventBus) {
        factory.release(obj.instance);
        debug!("released {} ({})", obj.id, obj.instance);
        events.emit(InteractionEvent::Destroyed { id: obj.id });
    }

    /// Removes every object and clears the selection. Returns how many went.
    pub fn destroy_all(&mut self, factory: &mut dyn ModelFactory, events: &mut EventBus) -> usize {
        let n = self.objects.len();
        for obj in self.objects.drain(..) {
            Self::release(obj, factory, events);
        }
        self.selected = None;
        if n > 0 {
            info!("destroyed all {n} placed objects");
        }
        n
    }

    /// Removes the most recently added object and clears the selection.
    pub fn destroy_last(
        &mut self,
        factory: &mut dyn ModelFactory,
        events: &mut EventBus,
    ) -> Result<ObjectId, PlacementError> {
        let obj = self.objects.pop().ok_or(PlacementError::NothingToDestroy)?;
        let id = obj.id;
        Self::release(obj, factory, events);
        self.selected = None;
        info!("destroyed last placed object {id}");
        Ok(id)
    }

    /// Removes one object; the selection is cleared only if it pointed at it.
    pub fn destroy(
        &mut self,
        id: ObjectId,
        factory: &mut dyn ModelFactory,
        events: &mut EventBus,
    ) -> Result<(), PlacementError> {
        let idx = self
            .objects
            .iter()
            .position(|o| o.id == id)
            .ok_or(PlacementError::UnknownObject(id))?;
        let obj = self.objects.remove(idx);
        Self::release(obj, factory, events);
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(())
    }
}
