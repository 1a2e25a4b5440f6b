//! Canvas configuration.
//!
//! Loaded once and handed to `Canvas::new` and `HttpBackend::new`. A JSON
//! file supplies values, environment variables override them.

use sc_core::VersionAnchor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_API_BASE_URL: &str = "SC_API_BASE_URL";
pub const ENV_AUTH_TOKEN: &str = "SC_AUTH_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Root of the backend API, e.g. `http://localhost:8000/api`.
    pub api_base_url: String,
    /// Bearer token sent with every request.
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Debounce window for group-bounds recomputation.
    pub reflow_window_ms: u64,
    pub version_placement: VersionPlacement,
}

/// Where a regenerated version is placed horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPlacement {
    /// Right of the most recently added screen on the canvas.
    #[default]
    AfterLatest,
    /// Right of the rightmost screen in the source's own lineage.
    AfterLineage,
}

impl VersionPlacement {
    pub fn anchor(self) -> VersionAnchor {
        match self {
            VersionPlacement::AfterLatest => VersionAnchor::Latest,
            VersionPlacement::AfterLineage => VersionAnchor::Lineage,
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            auth_token: None,
            request_timeout_secs: 120,
            reflow_window_ms: 100,
            version_placement: VersionPlacement::default(),
        }
    }
}

impl CanvasConfig {
    /// Read `path` (if any), fall back to defaults, then apply env overrides.
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = match path {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(text) => Self::from_json(&text).unwrap_or_else(|err| {
                    log::warn!("ignoring invalid config {}: {err}", path.display());
                    Self::default()
                }),
                Err(err) => {
                    log::warn!("could not read config {}: {err}", path.display());
                    Self::default()
                }
            },
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Apply overrides from `lookup` (the process environment in `load`).
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_BASE_URL).filter(|v| !v.is_empty()) {
            log::debug!("api base url overridden from environment");
            self.api_base_url = url;
        }
        if let Some(token) = lookup(ENV_AUTH_TOKEN).filter(|v| !v.is_empty()) {
            self.auth_token = Some(token);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reflow_window(&self) -> Duration {
        Duration::from_millis(self.reflow_window_ms)
    }
}
