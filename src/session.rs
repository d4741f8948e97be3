//! Composition root: owns every interaction component and advances them
//! once per frame.

use glam::Vec3;
use log::info;
use serde::Serialize;

use crate::camera::Camera;
use crate::config::{Profile, SessionSettings};
use crate::error::PlacementError;
use crate::events::{EventBus, InteractionEvent, SubscriptionId};
use crate::feedback::Haptics;
use crate::gestures::{GestureClassifier, GestureSample};
use crate::manipulation::{ManipulationEngine, SwipeRays};
use crate::placement::{ModelFactory, ModelId, ObjectId, PlacedObject, PlacementEngine};
use crate::plane::{PlaneHitResolver, PlaneId, Raycaster};
use crate::policy::InteractionPolicy;
use crate::touch::{TouchFrame, UiHitTest};

/// External collaborators the core calls into during a frame.
pub struct Services<'a> {
    pub raycaster: &'a dyn Raycaster,
    pub factory: &'a mut dyn ModelFactory,
    pub haptics: &'a mut dyn Haptics,
}

#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub touches: TouchFrame,
    /// Camera pose for this frame; also the observer new objects face.
    pub camera: Camera,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameOutput {
    pub gestures: GestureSample,
    pub spawned: Option<ObjectId>,
    pub moved: Option<Vec3>,
    pub pinched: bool,
    /// Everything emitted since the previous tick, oldest first.
    pub events: Vec<InteractionEvent>,
}

#[derive(Debug)]
pub struct InteractionSession {
    classifier: GestureClassifier,
    resolver: PlaneHitResolver,
    placement: PlacementEngine,
    manipulation: ManipulationEngine,
    policy: InteractionPolicy,
    events: EventBus,
    settings: SessionSettings,
    paused_at_ms: Option<u64>,
}

impl InteractionSession {
    pub fn new(profile: &Profile) -> Self {
        Self {
            classifier: GestureClassifier::new(),
            resolver: PlaneHitResolver::new(),
            placement: PlacementEngine::new(profile.placement.clone()),
            manipulation: ManipulationEngine::new(profile.manipulation.clone()),
            policy: profile.policy,
            events: EventBus::new(),
            settings: profile.session.clone(),
            paused_at_ms: None,
        }
    }

    /// Spawn, then move, then scale/rotate: the same order every frame.
    pub fn tick(
        &mut self,
        input: &FrameInput,
        ui: &dyn UiHitTest,
        services: &mut Services<'_>,
    ) -> FrameOutput {
        let camera = &input.camera;
        let gestures = self.classifier.classify(&input.touches, ui);

        let tap_ray = gestures.tap.map(|p| camera.screen_point_to_ray(p));
        let spawned = self.placement.try_spawn(
            tap_ray.as_ref(),
            camera.position,
            &mut self.resolver,
            services,
            &mut self.events,
        );

        let swipe = gestures.swipe.map(|(origin, end)| SwipeRays {
            origin: camera.screen_point_to_ray(origin),
            end: camera.screen_point_to_ray(end),
        });
        let moved = self.manipulation.move_selected(
            &mut self.placement,
            &self.policy,
            gestures.long_press,
            swipe.as_ref(),
            &mut self.resolver,
            services.raycaster,
            &mut self.events,
        );

        let pinched = self.manipulation.scale_rotate(
            &mut self.placement,
            &self.policy,
            gestures.pinch.as_ref(),
            &mut self.events,
        );

        FrameOutput {
            gestures,
            spawned,
            moved,
            pinched,
            events: self.events.drain(),
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&InteractionEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn destroy_all(&mut self, factory: &mut dyn ModelFactory) -> usize {
        self.placement.destroy_all(factory, &mut self.events)
    }

    pub fn destroy_last(
        &mut self,
        factory: &mut dyn ModelFactory,
    ) -> Result<ObjectId, PlacementError> {
        self.placement.destroy_last(factory, &mut self.events)
    }

    pub fn destroy(
        &mut self,
        id: ObjectId,
        factory: &mut dyn ModelFactory,
    ) -> Result<(), PlacementError> {
        self.placement.destroy(id, factory, &mut self.events)
    }

    pub fn count(&self) -> usize {
        self.placement.count()
    }

    pub fn last_spawned(&self) -> Option<&PlacedObject> {
        self.placement.last_spawned()
    }

    pub fn selected(&self) -> Option<&PlacedObject> {
        self.placement.selected()
    }

    pub fn placement(&self) -> &PlacementEngine {
        &self.placement
    }

    pub fn policy(&self) -> &InteractionPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: InteractionPolicy) {
        self.policy = policy;
    }

    pub fn set_can_move(&mut self, value: bool) {
        self.policy.set_can_move(value);
    }

    pub fn set_can_scale(&mut self, value: bool) {
        self.policy.set_can_scale(value);
    }

    pub fn set_can_rotate(&mut self, value: bool) {
        self.policy.set_can_rotate(value);
    }

    pub fn set_recording(&mut self, value: bool) {
        self.policy.set_recording(value);
    }

    pub fn set_model(&mut self, model: ModelId) {
        self.placement.set_model(model);
    }

    pub fn sticky_plane(&self) -> Option<PlaneId> {
        self.resolver.sticky_plane()
    }

    pub fn on_pause(&mut self, now_ms: u64) {
        if self.paused_at_ms.is_none() {
            info!("session paused");
            self.paused_at_ms = Some(now_ms);
        }
    }

    /// Returns true when the pause was long enough to restart tracking.
    pub fn on_resume(&mut self, now_ms: u64) -> bool {
        let Some(paused_at) = self.paused_at_ms.take() else {
            return false;
        };
        let paused_ms = now_ms.saturating_sub(paused_at);
        let limit_ms = self.settings.reset_after_pause_secs.saturating_mul(1000);
        if paused_ms <= limit_ms {
            info!("session resumed after {paused_ms}ms");
            return false;
        }
        info!("session resumed after {paused_ms}ms; resetting tracking");
        self.resolver.reset();
        self.classifier.reset();
        self.events.emit(InteractionEvent::SessionReset);
        true
    }
}
