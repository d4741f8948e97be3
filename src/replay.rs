//! Drives an [`InteractionSession`] from a recorded JSON script against an
//! in-memory plane scene.

use anyhow::{Result, anyhow};
use glam::Vec2;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::camera::Camera;
use crate::config::Profile;
use crate::events::InteractionEvent;
use crate::feedback::HapticSink;
use crate::placement::{ModelId, PlacedObject};
use crate::plane::PlaneId;
use crate::policy::InteractionPolicy;
use crate::scene::{PlaneScene, SceneModels, TrackedPlane};
use crate::session::{FrameInput, InteractionSession, Services};
use crate::touch::{TouchTracker, UiOverlay};

#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    pub id: i32,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    DestroyLast,
    DestroyAll,
    Pause,
    Resume,
    CancelTouches,
}

/// Capability switches; `recording` is driven separately.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PolicyOverride {
    pub can_move: Option<bool>,
    pub can_scale: Option<bool>,
    pub can_rotate: Option<bool>,
}

impl PolicyOverride {
    fn apply(&self, mut policy: InteractionPolicy) -> InteractionPolicy {
        if let Some(v) = self.can_move {
            policy.set_can_move(v);
        }
        if let Some(v) = self.can_scale {
            policy.set_can_scale(v);
        }
        if let Some(v) = self.can_rotate {
            policy.set_can_rotate(v);
        }
        policy
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptFrame {
    pub t_ms: u64,
    /// Contacts down during this frame; absent ids count as released.
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub camera: Option<Camera>,
    #[serde(default)]
    pub recording: Option<bool>,
    #[serde(default)]
    pub policy: Option<PolicyOverride>,
    #[serde(default)]
    pub model: Option<ModelId>,
    /// Planes added or refined by tracking before this frame.
    #[serde(default)]
    pub planes: Vec<TrackedPlane>,
    #[serde(default)]
    pub removed_planes: Vec<PlaneId>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub camera: Camera,
    #[serde(default)]
    pub planes: PlaneScene,
    #[serde(default)]
    pub ui: UiOverlay,
    #[serde(default)]
    pub animated_models: Vec<ModelId>,
    pub frames: Vec<ScriptFrame>,
}

impl Script {
    pub fn from_json(txt: &str) -> Result<Self> {
        Ok(serde_json::from_str(txt)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        Self::from_json(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaySummary {
    pub frames: usize,
    pub spawned: usize,
    pub destroyed: usize,
    pub moves: usize,
    pub pinches: usize,
    pub resets: usize,
    pub haptic_pulses: u64,
    pub sticky_plane: Option<PlaneId>,
    pub objects: Vec<PlacedObject>,
}

impl ReplaySummary {
    fn count(&mut self, events: &[InteractionEvent]) {
        for e in events {
            match e {
                InteractionEvent::Spawned { .. } => self.spawned += 1,
                InteractionEvent::Destroyed { .. } => self.destroyed += 1,
                InteractionEvent::SessionReset => self.resets += 1,
                InteractionEvent::Transformed { .. } | InteractionEvent::FloatingChanged { .. } => {}
            }
        }
    }
}

pub fn run_script(script: &Script, profile: &Profile) -> Result<ReplaySummary> {
    let mut scene = script.planes.clone();
    let mut models = script
        .animated_models
        .iter()
        .fold(SceneModels::new(), |m, id| m.with_animated(*id));
    let mut haptics = HapticSink::new();
    let mut tracker = TouchTracker::new();
    let mut session = InteractionSession::new(profile);
    let mut camera = script.camera;
    let mut summary = ReplaySummary::default();
    let mut last_t = 0u64;

    info!(
        "replay: {} frames, {} planes, profile '{}'",
        script.frames.len(),
        scene.planes.len(),
        profile.display_name()
    );

    for (i, frame) in script.frames.iter().enumerate() {
        if frame.t_ms < last_t {
            warn!("frame {i}: timestamp {} goes backwards", frame.t_ms);
        }
        last_t = frame.t_ms;

        if let Some(cam) = frame.camera {
            camera = cam;
        }
        for plane in &frame.planes {
            scene.upsert(plane.clone());
        }
        for id in &frame.removed_planes {
            if !scene.remove(*id) {
                debug!("frame {i}: {id} was not tracked");
            }
        }
        if let Some(rec) = frame.recording {
            session.set_recording(rec);
        }
        if let Some(ovr) = frame.policy {
            session.set_policy(ovr.apply(*session.policy()));
        }
        if let Some(model) = frame.model {
            session.set_model(model);
        }

        for action in &frame.actions {
            match action {
                Action::DestroyLast => {
                    session
                        .destroy_last(&mut models)
                        .map_err(|e| anyhow!("frame {i}: {e}"))?;
                }
                Action::DestroyAll => {
                    session.destroy_all(&mut models);
                }
                Action::Pause => session.on_pause(frame.t_ms),
                Action::Resume => {
                    session.on_resume(frame.t_ms);
                }
                Action::CancelTouches => tracker.cancel_all(),
            }
        }

        let alive: Vec<i32> = frame.contacts.iter().map(|c| c.id).collect();
        tracker.release_missing(&alive);
        for c in &frame.contacts {
            tracker.on_contact(c.id, c.pos);
        }
        let input = FrameInput {
            touches: tracker.on_frame_end(frame.t_ms),
            camera,
        };

        let mut services = Services {
            raycaster: &scene,
            factory: &mut models,
            haptics: &mut haptics,
        };
        let out = session.tick(&input, &script.ui, &mut services);

        summary.frames += 1;
        summary.moves += usize::from(out.moved.is_some());
        summary.pinches += usize::from(out.pinched);
        summary.count(&out.events);
    }

    summary.haptic_pulses = haptics.fired();
    summary.sticky_plane = session.sticky_plane();
    summary.objects = session.placement().objects().to_vec();
    info!(
        "replay done: {} objects left, {} spawned, {} destroyed",
        summary.objects.len(),
        summary.spawned,
        summary.destroyed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
        "camera": { "position": [0, 0, 0], "rotation": [0, 0, 0, 1], "fov_y_deg": 60, "viewport": [1000, 2000] },
        "planes": [
            { "id": 1, "center": [0, -1, 3], "polygon": [[-2, -2], [2, -2], [2, 2], [-2, 2]] }
        ],
        "ui": [ { "min": [0, 0], "max": [1000, 100] } ],
        "frames": [
            { "t_ms": 0, "contacts": [ { "id": 0, "pos": [500, 50] } ] },
            { "t_ms": 16 },
            { "t_ms": 32, "contacts": [ { "id": 0, "pos": [500, 600] } ] },
            { "t_ms": 48, "contacts": [ { "id": 0, "pos": [540, 600] } ] },
            { "t_ms": 64 },
            { "t_ms": 80, "contacts": [ { "id": 0, "pos": [400, 600] } ] },
            { "t_ms": 96, "actions": ["destroy_last"] }
        ]
    }"#;

    #[test]
    fn replay_spawns_moves_and_destroys() {
        let script = Script::from_json(SCRIPT).unwrap();
        let summary = run_script(&script, &Profile::default()).unwrap();
        assert_eq!(summary.frames, 7);
        // tap over the UI strip is ignored, the second tap spawns, the third hits capacity
        assert_eq!(summary.spawned, 1);
        assert_eq!(summary.moves, 1);
        assert_eq!(summary.destroyed, 1);
        assert_eq!(summary.haptic_pulses, 1);
        assert_eq!(summary.sticky_plane, Some(PlaneId(1)));
        assert!(summary.objects.is_empty());
    }

    #[test]
    fn canceled_touch_still_held_does_not_spawn_again() {
        let script = Script::from_json(
            r#"{
                "camera": { "position": [0, 0, 0], "fov_y_deg": 60, "viewport": [1000, 2000] },
                "planes": [
                    { "id": 1, "center": [0, -1, 3], "polygon": [[-2, -2], [2, -2], [2, 2], [-2, 2]] }
                ],
                "frames": [
                    { "t_ms": 0, "contacts": [ { "id": 0, "pos": [500, 600] } ] },
                    { "t_ms": 16, "contacts": [ { "id": 0, "pos": [500, 600] } ], "actions": ["cancel_touches"] },
                    { "t_ms": 32, "contacts": [ { "id": 0, "pos": [500, 600] } ] },
                    { "t_ms": 48, "contacts": [ { "id": 0, "pos": [500, 600] } ] }
                ]
            }"#,
        )
        .unwrap();
        let profile = Profile::from_toml_str("[placement]\nmax_objects = 3\n").unwrap();
        let summary = run_script(&script, &profile).unwrap();
        assert_eq!(summary.spawned, 1);
        assert_eq!(summary.objects.len(), 1);
    }

    #[test]
    fn scripted_destroy_on_empty_scene_fails() {
        let script = Script::from_json(r#"{ "frames": [ { "t_ms": 0, "actions": ["destroy_last"] } ] }"#)
            .unwrap();
        let err = run_script(&script, &Profile::default()).unwrap_err();
        assert!(err.to_string().contains("no placed objects"));
    }

    #[test]
    fn unknown_action_is_a_parse_error() {
        assert!(Script::from_json(r#"{ "frames": [ { "t_ms": 0, "actions": ["explode"] } ] }"#).is_err());
    }
}
