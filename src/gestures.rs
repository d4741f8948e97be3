use glam::Vec2;
use serde::Serialize;

use crate::touch::{Touch, TouchFrame, TouchPhase, UiHitTest};

/// Incremental two-finger gesture relative to the previous frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pinch {
    pub p0: Vec2,
    pub p1: Vec2,
    /// Current separation / previous separation.
    pub scale_delta: f32,
    /// Signed yaw increment in degrees; negative when the fingers turn anticlockwise.
    pub rotation_delta_deg: f32,
}

/// Everything the detectors reported for one frame. Detectors are not
/// mutually exclusive; callers decide which results to honor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GestureSample {
    pub tap: Option<Vec2>,
    pub long_press: bool,
    pub swipe: Option<(Vec2, Vec2)>,
    pub pinch: Option<Pinch>,
}

#[derive(Debug, Default)]
pub struct GestureClassifier {
    // separation vector seen on the previous two-finger frame
    pinch_baseline: Option<Vec2>,
}

fn single<'a>(frame: &'a TouchFrame, ui: &dyn UiHitTest) -> Option<&'a Touch> {
    if frame.count() != 1 {
        return None;
    }
    frame.get(0).filter(|t| !ui.is_over_ui(t.position))
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every detector once. The pinch baseline advances as a side effect.
    pub fn classify(&mut self, frame: &TouchFrame, ui: &dyn UiHitTest) -> GestureSample {
        GestureSample {
            tap: self.detect_tap(frame, ui),
            long_press: self.detect_long_press(frame, ui),
            swipe: self.detect_swipe(frame, ui),
            pinch: self.detect_pinch(frame, ui),
        }
    }

    pub fn detect_tap(&self, frame: &TouchFrame, ui: &dyn UiHitTest) -> Option<Vec2> {
        single(frame, ui)
            .filter(|t| t.phase == TouchPhase::Began)
            .map(|t| t.position)
    }

    /// Sustained single contact: anything between began and ended.
    pub fn detect_long_press(&self, frame: &TouchFrame, ui: &dyn UiHitTest) -> bool {
        single(frame, ui)
            .is_some_and(|t| t.phase != TouchPhase::Began && t.phase != TouchPhase::Ended)
    }

    /// Returns `(origin, end)` where origin is end minus this frame's delta.
    pub fn detect_swipe(&self, frame: &TouchFrame, ui: &dyn UiHitTest) -> Option<(Vec2, Vec2)> {
        single(frame, ui)
            .filter(|t| t.phase == TouchPhase::Moved)
            .map(|t| (t.position - t.delta, t.position))
    }

    pub fn detect_pinch(&mut self, frame: &TouchFrame, ui: &dyn UiHitTest) -> Option<Pinch> {
        let (Some(t0), Some(t1), 2) = (frame.get(0), frame.get(1), frame.count()) else {
            self.pinch_baseline = None;
            return None;
        };
        if ui.is_over_ui(t0.position) || ui.is_over_ui(t1.position) {
            // still two fingers down: keep the baseline
            return None;
        }

        let current = t1.position - t0.position;
        let previous = self.pinch_baseline.replace(current).unwrap_or(current);

        let prev_len = previous.length();
        let scale_delta = if prev_len > f32::EPSILON {
            current.length() / prev_len
        } else {
            1.0
        };

        let cross_z = previous.perp_dot(current);
        let unsigned = cross_z.atan2(previous.dot(current)).abs().to_degrees();
        let rotation_delta_deg = if cross_z > 0.0 { -unsigned } else { unsigned };

        Some(Pinch {
            p0: t0.position,
            p1: t1.position,
            scale_delta,
            rotation_delta_deg,
        })
    }

    /// Exactly `fingers` touches down with at least one landing this frame.
    pub fn detect_multi_finger_tap(&self, frame: &TouchFrame, fingers: usize) -> bool {
        frame.count() == fingers && frame.touches.iter().any(|t| t.phase == TouchPhase::Began)
    }

    pub fn valid_touches(&self, frame: &TouchFrame, ui: &dyn UiHitTest) -> Vec<Touch> {
        frame
            .touches
            .iter()
            .filter(|t| !ui.is_over_ui(t.position))
            .copied()
            .collect()
    }

    pub fn reset(&mut self) {
        self.pinch_baseline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::{NoUi, UiOverlay, UiRegion};

    fn touch(id: i32, x: f32, y: f32, phase: TouchPhase) -> Touch {
        Touch::new(id, Vec2::new(x, y), Vec2::ZERO, phase)
    }

    fn frame(touches: Vec<Touch>) -> TouchFrame {
        TouchFrame::new(0, touches)
    }

    fn two(a: Vec2, b: Vec2) -> TouchFrame {
        frame(vec![
            Touch::new(0, a, Vec2::ZERO, TouchPhase::Moved),
            Touch::new(1, b, Vec2::ZERO, TouchPhase::Moved),
        ])
    }

    #[test]
    fn single_touch_detectors_need_exactly_one_touch() {
        let g = GestureClassifier::new();
        for n in [0usize, 2, 3] {
            let f = frame(
                (0..n as i32)
                    .map(|i| touch(i, 10.0, 10.0, TouchPhase::Began))
                    .collect(),
            );
            assert!(g.detect_tap(&f, &NoUi).is_none());
            assert!(!g.detect_long_press(&f, &NoUi));
            assert!(g.detect_swipe(&f, &NoUi).is_none());
        }
    }

    #[test]
    fn tap_long_press_and_swipe_follow_phase() {
        let g = GestureClassifier::new();
        let began = frame(vec![touch(0, 5.0, 6.0, TouchPhase::Began)]);
        assert_eq!(g.detect_tap(&began, &NoUi), Some(Vec2::new(5.0, 6.0)));
        assert!(!g.detect_long_press(&began, &NoUi));

        let held = frame(vec![touch(0, 5.0, 6.0, TouchPhase::Stationary)]);
        assert!(g.detect_tap(&held, &NoUi).is_none());
        assert!(g.detect_long_press(&held, &NoUi));
        assert!(g.detect_swipe(&held, &NoUi).is_none());

        let moved = frame(vec![Touch::new(
            0,
            Vec2::new(20.0, 30.0),
            Vec2::new(5.0, -5.0),
            TouchPhase::Moved,
        )]);
        assert!(g.detect_long_press(&moved, &NoUi));
        assert_eq!(
            g.detect_swipe(&moved, &NoUi),
            Some((Vec2::new(15.0, 35.0), Vec2::new(20.0, 30.0)))
        );

        let ended = frame(vec![touch(0, 5.0, 6.0, TouchPhase::Ended)]);
        assert!(!g.detect_long_press(&ended, &NoUi));
    }

    #[test]
    fn touches_over_ui_are_ignored() {
        let ui = UiOverlay::new(vec![UiRegion {
            min: Vec2::ZERO,
            max: Vec2::splat(50.0),
        }]);
        let mut g = GestureClassifier::new();
        let f = frame(vec![touch(0, 10.0, 10.0, TouchPhase::Began)]);
        assert!(g.detect_tap(&f, &ui).is_none());
        assert!(g.classify(&f, &ui) == GestureSample::default());

        let held = frame(vec![touch(0, 10.0, 10.0, TouchPhase::Stationary)]);
        assert!(g.detect_long_press(&held, &NoUi));
        assert!(!g.detect_long_press(&held, &ui));

        let dragged = frame(vec![Touch::new(
            0,
            Vec2::new(20.0, 20.0),
            Vec2::new(5.0, 5.0),
            TouchPhase::Moved,
        )]);
        assert!(g.detect_swipe(&dragged, &NoUi).is_some());
        assert!(g.detect_swipe(&dragged, &ui).is_none());
        assert!(!g.detect_long_press(&dragged, &ui));

        let p = two(Vec2::new(10.0, 10.0), Vec2::new(100.0, 100.0));
        assert!(g.detect_pinch(&p, &ui).is_none());
        assert_eq!(g.valid_touches(&p, &ui).len(), 1);
    }

    #[test]
    fn first_pinch_frame_is_neutral() {
        let mut g = GestureClassifier::new();
        let p = g
            .detect_pinch(&two(Vec2::ZERO, Vec2::new(10.0, 0.0)), &NoUi)
            .unwrap();
        assert_eq!(p.scale_delta, 1.0);
        assert_eq!(p.rotation_delta_deg, 0.0);
    }

    #[test]
    fn pinch_scale_is_relative_to_previous_frame() {
        let mut g = GestureClassifier::new();
        g.detect_pinch(&two(Vec2::ZERO, Vec2::new(10.0, 0.0)), &NoUi);
        let p = g
            .detect_pinch(&two(Vec2::ZERO, Vec2::new(20.0, 0.0)), &NoUi)
            .unwrap();
        assert!((p.scale_delta - 2.0).abs() < 1e-6);
        let p = g
            .detect_pinch(&two(Vec2::ZERO, Vec2::new(30.0, 0.0)), &NoUi)
            .unwrap();
        assert!((p.scale_delta - 1.5).abs() < 1e-6);
    }

    #[test]
    fn pinch_rotation_sign_follows_cross_product() {
        let mut g = GestureClassifier::new();
        g.detect_pinch(&two(Vec2::ZERO, Vec2::new(1.0, 0.0)), &NoUi);
        let p = g
            .detect_pinch(&two(Vec2::ZERO, Vec2::new(0.0, 1.0)), &NoUi)
            .unwrap();
        assert!((p.rotation_delta_deg + 90.0).abs() < 1e-4);

        let mut g = GestureClassifier::new();
        g.detect_pinch(&two(Vec2::ZERO, Vec2::new(0.0, 1.0)), &NoUi);
        let p = g
            .detect_pinch(&two(Vec2::ZERO, Vec2::new(1.0, 0.0)), &NoUi)
            .unwrap();
        assert!((p.rotation_delta_deg - 90.0).abs() < 1e-4);
    }

    #[test]
    fn pinch_baseline_resets_when_touch_count_changes() {
        let mut g = GestureClassifier::new();
        g.detect_pinch(&two(Vec2::ZERO, Vec2::new(10.0, 0.0)), &NoUi);
        let one = frame(vec![touch(0, 0.0, 0.0, TouchPhase::Stationary)]);
        assert!(g.detect_pinch(&one, &NoUi).is_none());

        let p = g
            .detect_pinch(&two(Vec2::ZERO, Vec2::new(0.0, 40.0)), &NoUi)
            .unwrap();
        assert_eq!(p.scale_delta, 1.0);
        assert_eq!(p.rotation_delta_deg, 0.0);
    }

    #[test]
    fn multi_finger_tap_needs_a_new_contact() {
        let g = GestureClassifier::new();
        let f = frame(vec![
            touch(0, 0.0, 0.0, TouchPhase::Stationary),
            touch(1, 1.0, 0.0, TouchPhase::Began),
            touch(2, 2.0, 0.0, TouchPhase::Stationary),
        ]);
        assert!(g.detect_multi_finger_tap(&f, 3));
        assert!(!g.detect_multi_finger_tap(&f, 2));
        let held = frame(vec![
            touch(0, 0.0, 0.0, TouchPhase::Stationary),
            touch(1, 1.0, 0.0, TouchPhase::Stationary),
        ]);
        assert!(!g.detect_multi_finger_tap(&held, 2));
    }
}
