use serde::{Deserialize, Serialize};

/// Capability gates read by every manipulation. Only external mode switches
/// (feature selection, capture workflow) write them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionPolicy {
    pub can_move: bool,
    pub can_scale: bool,
    pub can_rotate: bool,
    /// A photo or video capture is in progress.
    #[serde(skip)]
    pub recording: bool,
}

impl Default for InteractionPolicy {
    fn default() -> Self {
        Self {
            can_move: true,
            can_scale: true,
            can_rotate: true,
            recording: false,
        }
    }
}

impl InteractionPolicy {
    pub fn set_can_move(&mut self, value: bool) {
        self.can_move = value;
    }

    pub fn set_can_scale(&mut self, value: bool) {
        self.can_scale = value;
    }

    pub fn set_can_rotate(&mut self, value: bool) {
        self.can_rotate = value;
    }

    pub fn set_recording(&mut self, value: bool) {
        self.recording = value;
    }

    /// Dragging needs the move capability and no capture running.
    pub fn allows_move(&self) -> bool {
        self.can_move && !self.recording
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_blocks_move_only() {
        let mut p = InteractionPolicy::default();
        assert!(p.allows_move());
        p.set_recording(true);
        assert!(!p.allows_move());
        assert!(p.can_scale && p.can_rotate);
        p.set_recording(false);
        p.set_can_move(false);
        assert!(!p.allows_move());
    }

    #[test]
    fn missing_toml_keys_default_to_enabled() {
        let p: InteractionPolicy = toml::from_str("can_rotate = false").unwrap();
        assert!(p.can_move && p.can_scale);
        assert!(!p.can_rotate);
        assert!(!p.recording);
    }
}
