//! Configuration types for optimo.

use crate::error::{OptimoError, OptimoResult};
use crate::positioner::OverlayMetrics;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default attribute used to mark instrumented surfaces.
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-optimo-processed";

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period before a mutation-triggered rescan fires, in milliseconds.
    pub rescan_quiet_ms: u64,
    /// How long a status notice stays visible, in milliseconds.
    pub notice_ms: u64,
    /// Distance of the trigger from the anchor's top and right edges.
    pub trigger_inset: f64,
    /// Trigger width and height.
    pub trigger_size: f64,
    /// Vertical gap between the anchor's bottom edge and the panel.
    pub panel_gap: f64,
    /// Idempotency marker attribute set on attached surfaces.
    pub marker_attribute: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rescan_quiet_ms: 500,
            notice_ms: 3_000,
            trigger_inset: 8.0,
            trigger_size: 32.0,
            panel_gap: 8.0,
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON. Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> OptimoResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the rescan quiet period.
    pub fn with_rescan_quiet(mut self, quiet: Duration) -> Self {
        self.rescan_quiet_ms = quiet.as_millis() as u64;
        self
    }

    /// Set the notice duration.
    pub fn with_notice_duration(mut self, duration: Duration) -> Self {
        self.notice_ms = duration.as_millis() as u64;
        self
    }

    /// Set the trigger inset.
    pub fn with_trigger_inset(mut self, inset: f64) -> Self {
        self.trigger_inset = inset;
        self
    }

    /// Set the trigger size.
    pub fn with_trigger_size(mut self, size: f64) -> Self {
        self.trigger_size = size;
        self
    }

    /// Set the panel gap.
    pub fn with_panel_gap(mut self, gap: f64) -> Self {
        self.panel_gap = gap;
        self
    }

    /// Set the marker attribute.
    pub fn with_marker_attribute(mut self, name: impl Into<String>) -> Self {
        self.marker_attribute = name.into();
        self
    }

    /// Rescan quiet period.
    pub fn rescan_quiet(&self) -> Duration {
        Duration::from_millis(self.rescan_quiet_ms)
    }

    /// Notice duration.
    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }

    /// Overlay geometry derived from this config.
    pub fn metrics(&self) -> OverlayMetrics {
        OverlayMetrics {
            trigger_inset: self.trigger_inset,
            trigger_size: self.trigger_size,
            panel_gap: self.panel_gap,
        }
    }

    /// Check the values are usable.
    pub fn validate(&self) -> OptimoResult<()> {
        if self.marker_attribute.trim().is_empty() {
            return Err(OptimoError::InvalidConfig(
                "marker attribute must not be empty".into(),
            ));
        }
        if self.trigger_size < 0.0 || self.trigger_inset < 0.0 || self.panel_gap < 0.0 {
            return Err(OptimoError::InvalidConfig(
                "overlay metrics must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// LLM provider preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI.
    #[default]
    OpenAI,
    /// Anthropic, through its OpenAI-compatible endpoint.
    Anthropic,
    /// Google Gemini, through its OpenAI-compatible endpoint.
    Google,
    /// Any OpenAI-compatible endpoint supplied by the user.
    Custom,
}

impl Provider {
    /// Model used when none is configured.
    pub fn default_model(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("gpt-4"),
            Self::Anthropic => Some("claude-3-sonnet-20240229"),
            Self::Google => Some("gemini-2.5-flash"),
            Self::Custom => None,
        }
    }

    /// Chat completions endpoint for the preset.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("https://api.openai.com/v1/chat/completions"),
            Self::Anthropic => Some("https://api.anthropic.com/v1/chat/completions"),
            Self::Google => {
                Some("https://generativelanguage.googleapis.com/v1beta/openai/chat/completions")
            }
            Self::Custom => None,
        }
    }

    /// Provider name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Custom => "custom",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = OptimoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "google" | "gemini" => Ok(Self::Google),
            "custom" => Ok(Self::Custom),
            other => Err(OptimoError::InvalidConfig(format!(
                "unknown provider: {}",
                other
            ))),
        }
    }
}

/// Credentials and model selection for the optimization provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// Provider preset.
    #[serde(rename = "llmProvider")]
    pub provider: Provider,
    /// API key.
    pub api_key: String,
    /// Endpoint for the `custom` provider.
    pub custom_endpoint: Option<String>,
    /// Model name. Falls back to the preset's default.
    #[serde(rename = "modelName")]
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl ProviderConfig {
    /// Create a config for a provider with an API key.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set a custom endpoint.
    pub fn with_custom_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.custom_endpoint = Some(endpoint.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }

    /// Resolved endpoint.
    pub fn endpoint(&self) -> Option<&str> {
        match self.provider {
            Provider::Custom => self
                .custom_endpoint
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty()),
            preset => preset.default_endpoint(),
        }
    }

    /// Resolved model name.
    pub fn model_name(&self) -> Option<&str> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or_else(|| self.provider.default_model())
    }

    /// Validate the settings the same way the settings page does before saving.
    pub fn validate(&self) -> OptimoResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(OptimoError::InvalidConfig("Please enter an API key".into()));
        }
        if self.endpoint().is_none() {
            return Err(OptimoError::InvalidConfig(
                "Please enter a custom endpoint URL".into(),
            ));
        }
        if self.model_name().is_none() {
            return Err(OptimoError::InvalidConfig("Please enter a model name".into()));
        }
        Ok(())
    }
}
