//! The option set sent along with a prompt, and the capability gate over it.

use crate::entitlement::Tier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tones available on every tier.
pub const STANDARD_TONES: [&str; 9] = [
    "Professional",
    "Friendly",
    "Direct",
    "Creative",
    "Empathetic",
    "Authoritative",
    "Humorous",
    "Persuasive",
    "Analytical",
];

/// Tones that require the elevated tier.
pub const PREMIUM_TONES: [&str; 4] = ["Academic", "Journalistic", "Technical", "Legal"];

/// Length choices.
pub const LENGTHS: [&str; 3] = ["Concise", "Default", "Elaborate"];

/// Output format choices. Anything other than `Default` needs the elevated tier.
pub const FORMATS: [&str; 5] = ["Default", "JSON", "List", "Table", "Steps"];

/// Tone the selector falls back to when a gated tone is refused.
pub const DEFAULT_TONE: &str = "Professional";
const DEFAULT_LENGTH: &str = "Default";
const DEFAULT_FORMAT: &str = "Default";
const DEFAULT_PERSONA: &str = "Expert";
const DEFAULT_AUDIENCE: &str = "General";

/// Whether a tone needs the elevated tier.
pub fn is_premium_tone(tone: &str) -> bool {
    PREMIUM_TONES.contains(&tone)
}

/// A gated feature.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    /// Tones from [`PREMIUM_TONES`].
    PremiumTone,
    /// A non-default output format.
    OutputFormat,
    /// A non-empty negative prompt.
    NegativePrompting,
}

impl Capability {
    /// Name shown in the upgrade prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PremiumTone => "premium tone",
            Self::OutputFormat => "output format control",
            Self::NegativePrompting => "advanced negative prompting",
        }
    }

    /// Text of the upgrade prompt.
    pub fn upgrade_message(&self) -> String {
        format!(
            "{} is available in Premium. Get 50 daily optimizations, advanced tones, output formats, and more!",
            self.as_str()
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rewrite options chosen in the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionSet {
    /// Writing tone.
    pub tone: String,
    /// Target length.
    pub length: String,
    /// Output format.
    pub format: String,
    /// Who the rewritten prompt should address the model as.
    pub persona: String,
    /// Intended audience of the answer.
    pub audience: String,
    /// Things the answer should avoid.
    pub negative_prompt: String,
}

impl Default for OptionSet {
    fn default() -> Self {
        Self {
            tone: DEFAULT_TONE.into(),
            length: DEFAULT_LENGTH.into(),
            format: DEFAULT_FORMAT.into(),
            persona: DEFAULT_PERSONA.into(),
            audience: DEFAULT_AUDIENCE.into(),
            negative_prompt: String::new(),
        }
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

impl OptionSet {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tone.
    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    /// Set the length.
    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.length = length.into();
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Set the persona.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    /// Set the audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Set the negative prompt.
    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = negative.into();
        self
    }

    /// Trim every field and put defaults back into blank ones.
    pub fn normalized(&self) -> Self {
        Self {
            tone: or_default(&self.tone, DEFAULT_TONE),
            length: or_default(&self.length, DEFAULT_LENGTH),
            format: or_default(&self.format, DEFAULT_FORMAT),
            persona: or_default(&self.persona, DEFAULT_PERSONA),
            audience: or_default(&self.audience, DEFAULT_AUDIENCE),
            negative_prompt: self.negative_prompt.trim().to_string(),
        }
    }

    /// First capability these options use that `tier` does not grant.
    pub fn blocked_capability(&self, tier: Tier) -> Option<Capability> {
        if tier == Tier::Elevated {
            return None;
        }
        if is_premium_tone(&self.tone) {
            Some(Capability::PremiumTone)
        } else if self.format != DEFAULT_FORMAT {
            Some(Capability::OutputFormat)
        } else if !self.negative_prompt.is_empty() {
            Some(Capability::NegativePrompting)
        } else {
            None
        }
    }
}
