// Configuration for the visage pipeline and its runtime

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Render loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Renderer backend name, looked up in the backend registry
    pub backend: String,
    /// Target tick rate
    pub fps: u32,
    /// Upper bound on a single tick's delta, in seconds
    pub max_dt: f64,
    /// Optional style JSON path
    pub style_path: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            backend: "headless".to_string(),
            fps: 60,
            max_dt: 0.05,
            style_path: None,
        }
    }
}

impl RenderConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

/// Local-generation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimConfig {
    /// Exponential smoothing rate of the blender (per second)
    pub smoothing: f64,
    /// Sentiment sliding window capacity (text chunks)
    pub window_size: usize,
    /// Per-second affect decay base
    pub decay: f64,
    /// Seed of the idle overlay's blink schedule
    pub idle_seed: u64,
    /// Default decay rate for commanded expressions (weight/sec)
    pub expression_decay: f64,
    /// Decay rate of the sentiment layer (weight/sec)
    pub sentiment_decay: f64,
}

impl Default for AnimConfig {
    fn default() -> Self {
        Self {
            smoothing: 8.0,
            window_size: 200,
            decay: 0.92,
            idle_seed: 42,
            expression_decay: 0.15,
            sentiment_decay: 0.08,
        }
    }
}

/// Relay client tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Relay WebSocket URL; relay ingestion is off when unset
    pub url: Option<String>,
    pub initial_backoff_secs: f64,
    pub backoff_factor: f64,
    pub max_backoff_secs: f64,
    /// How often blocked tasks re-check the cancellation signal
    pub poll_interval_ms: u64,
    /// Connect timeout
    pub connect_timeout_secs: f64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: None,
            initial_backoff_secs: 1.0,
            backoff_factor: 1.5,
            max_backoff_secs: 5.0,
            poll_interval_ms: 100,
            connect_timeout_secs: 10.0,
        }
    }
}

/// Upper bound for every relay delay and timeout, in seconds
pub const MAX_RELAY_SECS: f64 = 3600.0;

/// Seconds to a `Duration`, saturating instead of panicking on NaN,
/// negative or oversized values
fn secs(value: f64) -> Duration {
    if value.is_nan() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(value.clamp(0.0, MAX_RELAY_SECS))
}

impl RelayConfig {
    pub fn initial_backoff(&self) -> Duration {
        secs(self.initial_backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        secs(self.max_backoff_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        secs(self.connect_timeout_secs)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisageConfig {
    pub render: RenderConfig,
    pub anim: AnimConfig,
    pub relay: RelayConfig,
    pub log_level: String,
}

impl Default for VisageConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            anim: AnimConfig::default(),
            relay: RelayConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl VisageConfig {
    /// Load configuration from a JSON or TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path, e)))?;
        Self::from_str(&content)
    }

    /// Load configuration from a string (JSON first, then TOML)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        if let Ok(config) = serde_json::from_str::<VisageConfig>(content) {
            return Ok(config);
        }

        toml::from_str::<VisageConfig>(content)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Defaults overlaid with `VISAGE_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Overlay environment values obtained through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("VISAGE_BACKEND") {
            self.render.backend = backend;
        }

        if let Some(width) = lookup("VISAGE_WIDTH").and_then(|v| v.parse().ok()) {
            self.render.width = width;
        }

        if let Some(height) = lookup("VISAGE_HEIGHT").and_then(|v| v.parse().ok()) {
            self.render.height = height;
        }

        if let Some(url) = lookup("VISAGE_RELAY_URL") {
            if !url.is_empty() {
                self.relay.url = Some(url);
            }
        }

        if let Some(level) = lookup("VISAGE_LOG_LEVEL") {
            self.log_level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.width == 0 || self.render.height == 0 {
            return Err(ConfigError::ValidationError(
                "render.width and render.height must be > 0".to_string(),
            ));
        }

        if self.render.fps == 0 || self.render.fps > 240 {
            return Err(ConfigError::ValidationError(
                "render.fps must be between 1 and 240".to_string(),
            ));
        }

        if !(self.render.max_dt > 0.0 && self.render.max_dt <= 1.0) {
            return Err(ConfigError::ValidationError(
                "render.max_dt must be in (0, 1]".to_string(),
            ));
        }

        if self.render.backend.is_empty() {
            return Err(ConfigError::ValidationError(
                "render.backend cannot be empty".to_string(),
            ));
        }

        if !(self.anim.smoothing > 0.0 && self.anim.smoothing.is_finite()) {
            return Err(ConfigError::ValidationError(
                "anim.smoothing must be a positive number".to_string(),
            ));
        }

        if self.anim.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "anim.window_size must be > 0".to_string(),
            ));
        }

        if !(self.anim.decay > 0.0 && self.anim.decay <= 1.0) {
            return Err(ConfigError::ValidationError(
                "anim.decay must be in (0, 1]".to_string(),
            ));
        }

        if self.anim.expression_decay < 0.0 || self.anim.sentiment_decay < 0.0 {
            return Err(ConfigError::ValidationError(
                "decay rates cannot be negative".to_string(),
            ));
        }

        let relay = &self.relay;
        for (name, value) in [
            ("relay.initial_backoff_secs", relay.initial_backoff_secs),
            ("relay.max_backoff_secs", relay.max_backoff_secs),
            ("relay.connect_timeout_secs", relay.connect_timeout_secs),
        ] {
            if !(value.is_finite() && value <= MAX_RELAY_SECS) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be a finite number of seconds <= {}",
                    name, MAX_RELAY_SECS
                )));
            }
        }

        if !(relay.initial_backoff_secs > 0.0 && relay.initial_backoff_secs <= relay.max_backoff_secs) {
            return Err(ConfigError::ValidationError(
                "relay.initial_backoff_secs must be > 0 and <= relay.max_backoff_secs".to_string(),
            ));
        }

        if relay.backoff_factor < 1.0 {
            return Err(ConfigError::ValidationError(
                "relay.backoff_factor must be >= 1.0".to_string(),
            ));
        }

        if relay.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "relay.poll_interval_ms must be > 0".to_string(),
            ));
        }

        if !(relay.connect_timeout_secs > 0.0) {
            return Err(ConfigError::ValidationError(
                "relay.connect_timeout_secs must be > 0".to_string(),
            ));
        }

        if let Some(ref url) = relay.url {
            if !url.starts_with("ws://") && !url.starts_with("wss://") {
                return Err(ConfigError::ValidationError(format!(
                    "relay.url must use ws:// or wss://, got '{}'",
                    url
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(err: ConfigError) -> Self {
        crate::error::Error::Configuration(err.to_string())
    }
}
