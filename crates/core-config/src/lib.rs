//! Configuration loading and parsing.
//!
//! Parses `tapwatch.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [timing]
//! timeout_ms = 2000
//!
//! [frames]
//! targets = [60, 120]
//!
//! [overlay]
//! offset = 1
//!
//! [page]
//! load_delay_ms = 350
//! ```
//!
//! Every field is optional. Unknown fields are ignored so older binaries keep
//! reading newer files. The raw parsed values are retained and `sanitize`
//! derives the effective ones (zero timeout or an empty / all-zero target list
//! fall back to defaults).

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const DEFAULT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_FRAME_TARGETS: [u32; 2] = [60, 120];
pub const DEFAULT_OVERLAY_OFFSET: u16 = 1;
pub const DEFAULT_LOAD_DELAY_MS: u64 = 350;

const FILE_NAME: &str = "tapwatch.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

impl TimingConfig {
    const fn default_timeout_ms() -> u64 {
        DEFAULT_TIMEOUT_MS
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FramesConfig {
    #[serde(default = "FramesConfig::default_targets")]
    pub targets: Vec<u32>,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            targets: Self::default_targets(),
        }
    }
}

impl FramesConfig {
    fn default_targets() -> Vec<u32> {
        DEFAULT_FRAME_TARGETS.to_vec()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    /// Cells between the pointer anchor and the overlay's near corner.
    #[serde(default = "OverlayConfig::default_offset")]
    pub offset: u16,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            offset: Self::default_offset(),
        }
    }
}

impl OverlayConfig {
    const fn default_offset() -> u16 {
        DEFAULT_OVERLAY_OFFSET
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PageConfig {
    #[serde(default = "PageConfig::default_load_delay_ms")]
    pub load_delay_ms: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            load_delay_ms: Self::default_load_delay_ms(),
        }
    }
}

impl PageConfig {
    const fn default_load_delay_ms() -> u64 {
        DEFAULT_LOAD_DELAY_MS
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub frames: FramesConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub page: PageConfig,
}

/// Values actually used at runtime after `sanitize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effective {
    pub timeout: Duration,
    pub frame_targets: Vec<u32>,
    pub overlay_offset: u16,
    pub load_delay: Duration,
}

impl Default for Effective {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            frame_targets: DEFAULT_FRAME_TARGETS.to_vec(),
            overlay_offset: DEFAULT_OVERLAY_OFFSET,
            load_delay: Duration::from_millis(DEFAULT_LOAD_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub effective: Effective,
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("tapwatch").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let mut cfg = if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Config {
                raw: Some(content),
                file,
                effective: Effective::default(),
            },
            Err(e) => {
                warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    cfg.sanitize();
    Ok(cfg)
}

impl Config {
    /// Recompute `effective` from `file`. Returns true when any raw value was replaced.
    pub fn sanitize(&mut self) -> bool {
        let mut adjusted = false;

        let raw_timeout = self.file.timing.timeout_ms;
        let timeout_ms = if raw_timeout == 0 {
            info!(target: "config", raw = raw_timeout, effective = DEFAULT_TIMEOUT_MS, "timeout_defaulted");
            adjusted = true;
            DEFAULT_TIMEOUT_MS
        } else {
            raw_timeout
        };

        let mut targets: Vec<u32> = self
            .file
            .frames
            .targets
            .iter()
            .copied()
            .filter(|hz| *hz > 0)
            .collect();
        if targets.len() != self.file.frames.targets.len() {
            adjusted = true;
        }
        if targets.is_empty() {
            info!(
                target: "config",
                raw_len = self.file.frames.targets.len(),
                "frame_targets_defaulted"
            );
            targets = DEFAULT_FRAME_TARGETS.to_vec();
            adjusted = true;
        }

        self.effective = Effective {
            timeout: Duration::from_millis(timeout_ms),
            frame_targets: targets,
            overlay_offset: self.file.overlay.offset,
            load_delay: Duration::from_millis(self.file.page.load_delay_ms),
        };
        adjusted
    }

    /// Apply a command-line timeout override (zero is ignored like in the file).
    pub fn override_timeout_ms(&mut self, ms: u64) {
        self.file.timing.timeout_ms = ms;
        self.sanitize();
    }
}
