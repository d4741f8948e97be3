//! Per-contact touch tracking and frame snapshots.

use std::collections::BTreeSet;

use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

/// Maximum number of simultaneous contacts the tracker keeps slots for.
pub const MAX_CONTACTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Canceled,
}

/// One active touch as seen during a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub finger_id: i32,
    /// Screen position in pixels, origin bottom-left.
    pub position: Vec2,
    /// Movement since the previous frame.
    pub delta: Vec2,
    pub phase: TouchPhase,
}

impl Touch {
    pub fn new(finger_id: i32, position: Vec2, delta: Vec2, phase: TouchPhase) -> Self {
        Self {
            finger_id,
            position,
            delta,
            phase,
        }
    }
}

/// All touches delivered for one frame, in synthetic index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TouchFrame {
    pub timestamp_ms: u64,
    pub touches: Vec<Touch>,
}

impl TouchFrame {
    pub fn new(timestamp_ms: u64, touches: Vec<Touch>) -> Self {
        Self {
            timestamp_ms,
            touches,
        }
    }

    pub fn count(&self) -> usize {
        self.touches.len()
    }

    pub fn get(&self, index: usize) -> Option<&Touch> {
        self.touches.get(index)
    }
}

/// Answers whether a screen point lands on a UI overlay.
pub trait UiHitTest {
    fn is_over_ui(&self, point: Vec2) -> bool;
}

impl<F> UiHitTest for F
where
    F: Fn(Vec2) -> bool,
{
    fn is_over_ui(&self, point: Vec2) -> bool {
        self(point)
    }
}

/// Screen without any overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUi;

impl UiHitTest for NoUi {
    fn is_over_ui(&self, _point: Vec2) -> bool {
        false
    }
}

/// Axis-aligned overlay rectangle in screen pixels (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UiRegion {
    pub min: Vec2,
    pub max: Vec2,
}

impl UiRegion {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Set of overlay rectangles covering the screen's UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UiOverlay {
    pub regions: Vec<UiRegion>,
}

impl UiOverlay {
    pub fn new(regions: Vec<UiRegion>) -> Self {
        Self { regions }
    }
}

impl UiHitTest for UiOverlay {
    fn is_over_ui(&self, point: Vec2) -> bool {
        self.regions.iter().any(|r| r.contains(point))
    }
}

#[derive(Debug, Clone, Default)]
struct SlotState {
    finger_id: i32,
    position: Vec2,
    last_reported: Vec2,
    // reported at least once since the contact began
    reported: bool,
    active: bool,
    released: bool,
    canceled: bool,
}

/// Converts raw contact reports into [`TouchFrame`]s with phase and delta.
///
/// Feed `on_contact` / `on_release` for everything that happened since the
/// last frame, then call `on_frame_end` to get the snapshot.
#[derive(Debug)]
pub struct TouchTracker {
    slots: Vec<SlotState>,
    // canceled fingers still held down; ignored until they lift
    suppressed: BTreeSet<i32>,
}

impl Default for TouchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchTracker {
    pub fn new() -> Self {
        Self {
            slots: vec![SlotState::default(); MAX_CONTACTS],
            suppressed: BTreeSet::new(),
        }
    }

    fn slot_of(&self, finger_id: i32) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.active && s.finger_id == finger_id)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    pub fn on_contact(&mut self, finger_id: i32, position: Vec2) {
        if self.suppressed.contains(&finger_id) {
            return;
        }
        if let Some(i) = self.slot_of(finger_id) {
            let s = &mut self.slots[i];
            s.position = position;
            s.released = false;
            return;
        }
        let Some(free) = self.slots.iter().position(|s| !s.active) else {
            warn!("touch tracker full; dropping contact {finger_id}");
            return;
        };
        // new contact -> fresh baseline
        self.slots[free] = SlotState {
            finger_id,
            position,
            last_reported: position,
            reported: false,
            active: true,
            released: false,
            canceled: false,
        };
    }

    pub fn on_release(&mut self, finger_id: i32) {
        self.suppressed.remove(&finger_id);
        if let Some(i) = self.slot_of(finger_id) {
            self.slots[i].released = true;
        }
    }

    /// Releases every contact not present in `alive`.
    pub fn release_missing(&mut self, alive: &[i32]) {
        self.suppressed.retain(|id| alive.contains(id));
        for s in self.slots.iter_mut().filter(|s| s.active) {
            if !alive.contains(&s.finger_id) {
                s.released = true;
            }
        }
    }

    /// The platform took over every contact (system gesture, focus loss).
    /// Canceled fingers stay ignored until they are released.
    pub fn cancel_all(&mut self) {
        for s in self.slots.iter_mut().filter(|s| s.active) {
            s.canceled = true;
            self.suppressed.insert(s.finger_id);
        }
    }

    pub fn on_frame_end(&mut self, timestamp_ms: u64) -> TouchFrame {
        let mut touches = Vec::with_capacity(self.active_count());
        for s in self.slots.iter_mut().filter(|s| s.active) {
            let delta = if s.reported {
                s.position - s.last_reported
            } else {
                Vec2::ZERO
            };
            let phase = if s.canceled {
                TouchPhase::Canceled
            } else if s.released {
                TouchPhase::Ended
            } else if !s.reported {
                TouchPhase::Began
            } else if delta != Vec2::ZERO {
                TouchPhase::Moved
            } else {
                TouchPhase::Stationary
            };
            touches.push(Touch::new(s.finger_id, s.position, delta, phase));

            if s.released || s.canceled {
                *s = SlotState::default();
            } else {
                s.last_reported = s.position;
                s.reported = true;
            }
        }
        TouchFrame::new(timestamp_ms, touches)
    }
}
