//! Google Gemini model names.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Google Gemini models.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
pub enum GoogleModel {
    #[strum(serialize = "gemini-2.5-pro")]
    Gemini25Pro,
    #[strum(serialize = "gemini-2.5-flash")]
    Gemini25Flash,
    #[strum(serialize = "gemini-2.0-flash")]
    Gemini20Flash,
    #[strum(serialize = "gemini-1.5-pro")]
    Gemini15Pro,
    #[strum(serialize = "gemini-1.5-flash")]
    Gemini15Flash,
    #[strum(serialize = "gemini-1.5-flash-latest")]
    Gemini15FlashLatest,
    /// Any other model id, passed through verbatim.
    #[strum(default)]
    Custom(String),
}

impl GoogleModel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Gemini25Pro => "gemini-2.5-pro",
            Self::Gemini25Flash => "gemini-2.5-flash",
            Self::Gemini20Flash => "gemini-2.0-flash",
            Self::Gemini15Pro => "gemini-1.5-pro",
            Self::Gemini15Flash => "gemini-1.5-flash",
            Self::Gemini15FlashLatest => "gemini-1.5-flash-latest",
            Self::Custom(s) => s,
        }
    }

    /// Parse a configured model name, tolerating a `models/` or `google:` prefix.
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        let bare = trimmed
            .strip_prefix("google:")
            .or_else(|| trimmed.strip_prefix("models/"))
            .unwrap_or(trimmed);
        bare.parse()
            .unwrap_or_else(|_| Self::Custom(bare.to_string()))
    }
}

impl Default for GoogleModel {
    fn default() -> Self {
        Self::Gemini15FlashLatest
    }
}
