//! Capture settings pushed to a session by the host.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::platform::Platform;

/// User-facing capture settings.
///
/// The host pushes updates as discrete events (a `watch` channel); a
/// session re-reads the whole value and re-arms its schedule on each
/// update, never partially applying a stale frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSettings {
    /// Whether the recurring capture schedule runs at all
    pub auto_capture_enabled: bool,

    /// Seconds between extraction passes
    pub capture_frequency_seconds: u64,

    /// Platforms capture is allowed on; empty means all
    #[serde(default)]
    pub enabled_platforms: Vec<Platform>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            auto_capture_enabled: true,
            capture_frequency_seconds: 60,
            enabled_platforms: Vec::new(),
        }
    }
}

impl CaptureSettings {
    /// Create settings with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable automatic capture.
    pub fn disabled() -> Self {
        Self {
            auto_capture_enabled: false,
            ..Self::default()
        }
    }

    /// Set the capture frequency in seconds.
    pub fn with_frequency_seconds(mut self, seconds: u64) -> Self {
        self.capture_frequency_seconds = seconds;
        self
    }

    /// Restrict capture to specific platforms.
    pub fn with_enabled_platforms(mut self, platforms: impl IntoIterator<Item = Platform>) -> Self {
        self.enabled_platforms = platforms.into_iter().collect();
        self
    }

    /// Whether capture is allowed on a platform.
    pub fn platform_enabled(&self, platform: Platform) -> bool {
        self.enabled_platforms.is_empty() || self.enabled_platforms.contains(&platform)
    }

    /// The polling period, clamped to at least one second.
    pub fn frequency(&self) -> Duration {
        Duration::from_secs(self.capture_frequency_seconds.max(1))
    }
}
