// SPDX-License-Identifier: MIT OR Apache-2.0
//! Browser configuration.
//!
//! Stored as RON next to the host application:
//!
//! ```ron
//! (
//!     version: 1,
//!     renderer: OpenGl,
//!     frame_rate: 60.0,
//!     cascade: (max_route_visits: 1, max_pending_events: 65536),
//!     log_filter: "x3d_scene=info,x3d_browser=info",
//! )
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use x3d_scene::{CascadeConfig, Renderer};

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "x3d_scene=info,x3d_renderers=info,x3d_browser=info";

/// Settings for one browser instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Format version
    pub version: u32,
    /// Renderer the scene binds its nodes to
    pub renderer: Renderer,
    /// Ticks per second; `0` runs ticks back to back
    pub frame_rate: f64,
    /// Cascade tuning
    pub cascade: CascadeConfig,
    /// `tracing` filter directives
    pub log_filter: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            renderer: Renderer::default(),
            frame_rate: 60.0,
            cascade: CascadeConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BrowserConfig {
    /// Set the renderer
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Set the frame rate
    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the cascade tuning
    pub fn with_cascade(mut self, cascade: CascadeConfig) -> Self {
        self.cascade = cascade;
        self
    }

    /// Time between tick starts, or `None` when free-running
    pub fn frame_period(&self) -> Option<Duration> {
        (self.frame_rate > 0.0).then(|| Duration::from_secs_f64(1.0 / self.frame_rate))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        if !self.frame_rate.is_finite() || self.frame_rate < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "frame_rate must be a non-negative number, got {}",
                self.frame_rate
            )));
        }
        if self.cascade.max_route_visits == 0 {
            return Err(ConfigError::Invalid("cascade.max_route_visits must be at least 1".into()));
        }
        if self.cascade.max_pending_events == 0 {
            return Err(ConfigError::Invalid(
                "cascade.max_pending_events must be at least 1".into(),
            ));
        }
        if let Err(err) = EnvFilter::try_new(&self.log_filter) {
            return Err(ConfigError::Invalid(format!("log_filter '{}': {}", self.log_filter, err)));
        }
        Ok(())
    }

    /// Parse and validate RON text
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: BrowserConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Save to a configuration file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}

/// Error when reading or writing a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text is not valid RON for this structure
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failed
    #[error("Config serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}
