use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_MAX_HISTORY: usize = 200;
const DEFAULT_FAILURE_NOTICE_THRESHOLD: u32 = 3;

/// Timing and geometry knobs for one editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period after the last edit before autosave fires.
    pub autosave_delay_ms: u64,
    /// Settling delay before an external value is written into an idle field.
    pub external_sync_delay_ms: u64,
    /// How long a field ignores external echoes after a local write.
    pub just_saved_guard_ms: u64,
    pub toolbar_hide_delay_ms: u64,
    /// Gap between the toolbar and the top of the selection.
    pub toolbar_offset_px: f32,
    pub toolbar_width_px: f32,
    pub toolbar_height_px: f32,
    pub viewport_margin_px: f32,
    pub max_history: usize,
    /// Consecutive autosave failures before a notice is raised.
    pub failure_notice_threshold: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 3000,
            external_sync_delay_ms: 300,
            just_saved_guard_ms: 200,
            toolbar_hide_delay_ms: 100,
            toolbar_offset_px: 60.0,
            toolbar_width_px: 320.0,
            toolbar_height_px: 44.0,
            viewport_margin_px: 10.0,
            max_history: DEFAULT_MAX_HISTORY,
            failure_notice_threshold: DEFAULT_FAILURE_NOTICE_THRESHOLD,
        }
    }
}

impl EditorConfig {
    fn with_defaults(mut self) -> Self {
        if self.max_history == 0 {
            self.max_history = DEFAULT_MAX_HISTORY;
        }
        if self.failure_notice_threshold == 0 {
            self.failure_notice_threshold = DEFAULT_FAILURE_NOTICE_THRESHOLD;
        }
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(s)?;
        Ok(config.with_defaults())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Loads `path` when given, falling back to defaults on any failure.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, ?path, "failed to load editor config; using defaults");
                Self::default()
            }
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn external_sync_delay(&self) -> Duration {
        Duration::from_millis(self.external_sync_delay_ms)
    }

    pub fn just_saved_guard(&self) -> Duration {
        Duration::from_millis(self.just_saved_guard_ms)
    }

    pub fn toolbar_hide_delay(&self) -> Duration {
        Duration::from_millis(self.toolbar_hide_delay_ms)
    }
}
