//! Configuration (layered: defaults < TOML file < environment < caller overrides).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::AgentError;
use crate::models::google::DEFAULT_MODEL;
use crate::session::State;
use crate::tools::weather::{TemperatureUnit, UNIT_PREFERENCE_KEY};

pub const DEFAULT_APP_NAME: &str = "weather_tutorial_app";
pub const DEFAULT_USER_ID: &str = "user_state_demo";
pub const DEFAULT_SESSION_ID: &str = "session_state_demo_001";
pub const DEFAULT_MAX_LLM_CALLS: usize = 20;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "WEATHER_AGENT_CONFIG";

/// Resolved application configuration.
#[derive(Clone, PartialEq)]
pub struct AppConfig {
    pub google_api_key: Option<String>,
    pub google_base_url: Option<String>,
    pub weather_api_key: Option<String>,
    pub weather_base_url: Option<String>,
    pub model: String,
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub temperature_unit: TemperatureUnit,
    pub max_llm_calls: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("google_api_key", &self.google_api_key.as_ref().map(|_| ".."))
            .field("google_base_url", &self.google_base_url)
            .field("weather_api_key", &self.weather_api_key.as_ref().map(|_| ".."))
            .field("weather_base_url", &self.weather_base_url)
            .field("model", &self.model)
            .field("app_name", &self.app_name)
            .field("user_id", &self.user_id)
            .field("session_id", &self.session_id)
            .field("temperature_unit", &self.temperature_unit)
            .field("max_llm_calls", &self.max_llm_calls)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            google_base_url: None,
            weather_api_key: None,
            weather_base_url: None,
            model: DEFAULT_MODEL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            temperature_unit: TemperatureUnit::Celsius,
            max_llm_calls: DEFAULT_MAX_LLM_CALLS,
        }
    }
}

/// On-disk TOML settings. Secrets stay in the environment.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    pub app_name: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub temperature_unit: Option<TemperatureUnit>,
    pub weather_base_url: Option<String>,
    pub google_base_url: Option<String>,
    pub max_llm_calls: Option<usize>,
}

impl FileConfig {
    /// Parse a config file.
    pub fn from_path(path: &Path) -> Result<Self, AgentError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| {
            AgentError::Configuration(format!("Invalid config file {}: {e}", path.display()))
        })
    }
}

impl AppConfig {
    /// Load `.env`, the config file (if any) and the environment.
    pub fn load() -> Result<Self, AgentError> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();

        match std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from) {
            Some(path) => config.apply_file(FileConfig::from_path(&path)?),
            None => {
                let path = default_config_path();
                if path.is_file() {
                    config.apply_file(FileConfig::from_path(&path)?);
                }
            }
        }

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from a config file.
    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(app_name) = file.app_name {
            self.app_name = app_name;
        }
        if let Some(user_id) = file.user_id {
            self.user_id = user_id;
        }
        if let Some(session_id) = file.session_id {
            self.session_id = session_id;
        }
        if let Some(unit) = file.temperature_unit {
            self.temperature_unit = unit;
        }
        if file.weather_base_url.is_some() {
            self.weather_base_url = file.weather_base_url;
        }
        if file.google_base_url.is_some() {
            self.google_base_url = file.google_base_url;
        }
        if let Some(max) = file.max_llm_calls {
            self.max_llm_calls = max;
        }
    }

    /// Overlay values from environment variables.
    pub fn apply_env(&mut self) {
        self.google_api_key = env_non_empty("GOOGLE_API_KEY").or(self.google_api_key.take());

        self.weather_api_key = env_non_empty("WEATHER_API_KEY").or(self.weather_api_key.take());
        if self.weather_api_key.is_none() {
            warn!("WEATHER_API_KEY is not set; the weather tool will report an error when called");
        }

        match env_non_empty("MODEL_GEMINI_2_0_FLASH") {
            Some(model) => self.model = model,
            None => warn!(
                model = %self.model,
                "MODEL_GEMINI_2_0_FLASH is not set; using configured model"
            ),
        }

        if let Some(url) = env_non_empty("GOOGLE_BASE_URL") {
            self.google_base_url = Some(url);
        }
        if let Some(url) = env_non_empty("WEATHER_API_BASE_URL") {
            self.weather_base_url = Some(url);
        }
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.max_llm_calls == 0 {
            return Err(AgentError::Configuration(
                "max_llm_calls must be at least 1".into(),
            ));
        }
        for (field, value) in [
            ("app_name", &self.app_name),
            ("user_id", &self.user_id),
            ("session_id", &self.session_id),
            ("model", &self.model),
        ] {
            if value.trim().is_empty() {
                return Err(AgentError::Configuration(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// State a new session starts with.
    pub fn initial_state(&self) -> State {
        let mut state = State::new();
        state.set(
            UNIT_PREFERENCE_KEY,
            serde_json::Value::String(self.temperature_unit.to_string()),
        );
        state.take_delta();
        state
    }
}

/// `~/.weather-agent/config.toml`
pub fn default_config_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".weather-agent"))
        .unwrap_or_else(|| PathBuf::from(".weather-agent"))
        .join("config.toml")
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
