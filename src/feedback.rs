use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPreset {
    LightImpact,
}

/// Fire-and-forget haptic output. Failures are the backend's problem.
pub trait Haptics {
    fn pulse(&mut self, preset: HapticPreset);
}

/// Discards every pulse.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn pulse(&mut self, _preset: HapticPreset) {}
}

/// Logs pulses instead of vibrating; can be muted at runtime.
#[derive(Debug, Clone)]
pub struct HapticSink {
    enabled: bool,
    fired: u64,
}

impl Default for HapticSink {
    fn default() -> Self {
        Self::new()
    }
}

impl HapticSink {
    pub fn new() -> Self {
        Self {
            enabled: true,
            fired: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, en: bool) {
        self.enabled = en;
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl Haptics for HapticSink {
    fn pulse(&mut self, preset: HapticPreset) {
        if !self.enabled {
            return;
        }
        self.fired += 1;
        info!("haptic: {preset:?}");
    }
}
