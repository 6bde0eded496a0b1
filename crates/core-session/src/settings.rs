use core_config::Config;
use core_timing::{DEFAULT_FRAME_TARGETS, FrameTarget};
use std::time::Duration;

/// Knobs the state machine needs, derived from the effective config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub timeout: Duration,
    pub frame_targets: Vec<FrameTarget>,
    pub overlay_offset: u16,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(core_config::DEFAULT_TIMEOUT_MS),
            frame_targets: DEFAULT_FRAME_TARGETS.to_vec(),
            overlay_offset: core_config::DEFAULT_OVERLAY_OFFSET,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            timeout: cfg.effective.timeout,
            frame_targets: cfg
                .effective
                .frame_targets
                .iter()
                .copied()
                .map(FrameTarget)
                .collect(),
            overlay_offset: cfg.effective.overlay_offset,
        }
    }
}
