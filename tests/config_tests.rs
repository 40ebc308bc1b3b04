//! Tests for configuration loading.

use std::io::Write;
use std::sync::{Mutex, OnceLock};

use pretty_assertions::assert_eq;

use weather_agent::config::{AppConfig, CONFIG_PATH_ENV};
use weather_agent::error::AgentError;
use weather_agent::provider::create_provider;
use weather_agent::tools::TemperatureUnit;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 6] = [
    "GOOGLE_API_KEY",
    "WEATHER_API_KEY",
    "MODEL_GEMINI_2_0_FLASH",
    "GOOGLE_BASE_URL",
    "WEATHER_API_BASE_URL",
    CONFIG_PATH_ENV,
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clear_env() -> EnvGuard {
    let guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    guard
}

fn empty_config_file() -> tempfile::NamedTempFile {
    tempfile::NamedTempFile::new().unwrap()
}

#[test]
fn environment_overrides_file() {
    let _lock = env_lock_guard();
    let _env = clear_env();

    let mut file = empty_config_file();
    writeln!(
        file,
        "model = \"gemini-1.5-pro\"\ntemperature_unit = \"Fahrenheit\"\nuser_id = \"file_user\""
    )
    .unwrap();
    std::env::set_var(CONFIG_PATH_ENV, file.path());
    std::env::set_var("MODEL_GEMINI_2_0_FLASH", "gemini-2.0-flash");
    std::env::set_var("GOOGLE_API_KEY", "g-key");
    std::env::set_var("WEATHER_API_KEY", "w-key");
    std::env::set_var("WEATHER_API_BASE_URL", "http://localhost:9999");

    let config = AppConfig::load().unwrap();
    assert_eq!(config.model, "gemini-2.0-flash");
    assert_eq!(config.temperature_unit, TemperatureUnit::Fahrenheit);
    assert_eq!(config.user_id, "file_user");
    assert_eq!(config.google_api_key.as_deref(), Some("g-key"));
    assert_eq!(config.weather_api_key.as_deref(), Some("w-key"));
    assert_eq!(config.weather_base_url.as_deref(), Some("http://localhost:9999"));
}

#[test]
fn missing_keys_still_load() {
    let _lock = env_lock_guard();
    let _env = clear_env();
    let file = empty_config_file();
    std::env::set_var(CONFIG_PATH_ENV, file.path());

    let config = AppConfig::load().unwrap();
    assert_eq!(config.weather_api_key, None);
    assert_eq!(config.model, "gemini-1.5-flash-latest");
    assert_eq!(config.session_id, "session_state_demo_001");
}

#[test]
fn blank_env_values_are_ignored() {
    let _lock = env_lock_guard();
    let _env = clear_env();
    let file = empty_config_file();
    std::env::set_var(CONFIG_PATH_ENV, file.path());
    std::env::set_var("GOOGLE_API_KEY", "   ");

    let config = AppConfig::load().unwrap();
    assert_eq!(config.google_api_key, None);
}

#[test]
fn missing_config_file_is_an_error() {
    let _lock = env_lock_guard();
    let _env = clear_env();
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var(CONFIG_PATH_ENV, dir.path().join("absent.toml"));

    assert!(matches!(AppConfig::load(), Err(AgentError::Io(_))));
}

#[test]
fn invalid_file_value_is_a_configuration_error() {
    let _lock = env_lock_guard();
    let _env = clear_env();
    let mut file = empty_config_file();
    writeln!(file, "temperature_unit = \"Kelvin\"").unwrap();
    std::env::set_var(CONFIG_PATH_ENV, file.path());

    assert!(matches!(AppConfig::load(), Err(AgentError::Configuration(_))));
}

#[test]
fn provider_requires_google_key() {
    let config = AppConfig::default();
    let err = create_provider(&config).err().unwrap();
    assert!(matches!(err, AgentError::Authentication(_)));

    let config = AppConfig {
        google_api_key: Some("key".into()),
        model: "google:gemini-2.0-flash".into(),
        ..AppConfig::default()
    };
    let provider = create_provider(&config).unwrap();
    assert_eq!(provider.provider_name(), "google");
    assert_eq!(provider.model_id(), "gemini-2.0-flash");
}
