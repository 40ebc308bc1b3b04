//! Current-conditions lookup against WeatherAPI.com.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolContext};
use super::types::AgentToolParameters;
use crate::config::AppConfig;
use crate::error::AgentError;
use crate::provider::http::shared_client;

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// State key holding the user's preferred temperature unit.
pub const UNIT_PREFERENCE_KEY: &str = "user_preference_temperature_unit";
/// State key updated with the city of every successful lookup.
pub const LAST_CITY_KEY: &str = "last_city_checked";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const LOCATION_NOT_FOUND: i64 = 1006;

/// Unit system used in weather reports.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Interpret a stored preference. Only `"Fahrenheit"` selects imperial units.
    pub fn from_preference(value: Option<&str>) -> Self {
        match value {
            Some("Fahrenheit") => Self::Fahrenheit,
            _ => Self::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    fn wind(self) -> &'static str {
        match self {
            Self::Celsius => "kph",
            Self::Fahrenheit => "mph",
        }
    }

    fn pressure(self) -> &'static str {
        match self {
            Self::Celsius => "mb",
            Self::Fahrenheit => "inHg",
        }
    }

    fn precipitation(self) -> &'static str {
        match self {
            Self::Celsius => "mm",
            Self::Fahrenheit => "in",
        }
    }

    fn visibility(self) -> &'static str {
        match self {
            Self::Celsius => "km",
            Self::Fahrenheit => "miles",
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Option<CurrentConditions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Condition {
    pub text: Option<String>,
    /// `icon`, `code` and anything else the service sends.
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.other.is_empty()
    }
}

/// The `current` object of a WeatherAPI.com response.
#[derive(Debug, Default, Deserialize)]
pub struct CurrentConditions {
    pub condition: Option<Condition>,
    pub temp_c: Option<f64>,
    pub temp_f: Option<f64>,
    pub feelslike_c: Option<f64>,
    pub feelslike_f: Option<f64>,
    pub humidity: Option<Number>,
    pub wind_kph: Option<f64>,
    pub wind_mph: Option<f64>,
    pub wind_dir: Option<String>,
    pub uv: Option<Number>,
    pub pressure_mb: Option<f64>,
    pub pressure_in: Option<f64>,
    pub precip_mm: Option<f64>,
    pub precip_in: Option<f64>,
    pub vis_km: Option<f64>,
    pub vis_miles: Option<f64>,
    pub gust_kph: Option<f64>,
    pub gust_mph: Option<f64>,
    pub windchill_c: Option<f64>,
    pub windchill_f: Option<f64>,
    pub heatindex_c: Option<f64>,
    pub heatindex_f: Option<f64>,
    pub dewpoint_c: Option<f64>,
    pub dewpoint_f: Option<f64>,
    pub last_updated: Option<String>,
}

fn pick(unit: TemperatureUnit, metric: Option<f64>, imperial: Option<f64>) -> Option<f64> {
    match unit {
        TemperatureUnit::Celsius => metric,
        TemperatureUnit::Fahrenheit => imperial,
    }
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Render a readable report from current conditions in the requested units.
pub fn format_report(city: &str, current: &CurrentConditions, unit: TemperatureUnit) -> String {
    let sym = unit.symbol();
    let description = current
        .condition
        .as_ref()
        .and_then(|c| c.text.as_deref())
        .unwrap_or("N/A");

    let temp = pick(unit, current.temp_c, current.temp_f);
    let feels_like = pick(unit, current.feelslike_c, current.feelslike_f);
    let wind_speed = pick(unit, current.wind_kph, current.wind_mph);
    let pressure = pick(unit, current.pressure_mb, current.pressure_in);
    let precip = pick(unit, current.precip_mm, current.precip_in);
    let visibility = pick(unit, current.vis_km, current.vis_miles);
    let gust = pick(unit, current.gust_kph, current.gust_mph);
    let wind_chill = pick(unit, current.windchill_c, current.windchill_f);
    let heat_index = pick(unit, current.heatindex_c, current.heatindex_f);
    let dew_point = pick(unit, current.dewpoint_c, current.dewpoint_f);

    let mut parts = Vec::new();
    let city = capitalize(city);
    match temp {
        Some(t) => parts.push(format!(
            "The weather in {city} is {description} with a temperature of {t:.1}{sym}."
        )),
        None => {
            warn!(city = %city, "temperature missing from weather response");
            parts.push(format!("The weather in {city} is {description}."));
        }
    }
    if let Some(f) = feels_like {
        parts.push(format!("It feels like {f:.1}{sym}."));
    }
    if let Some(h) = &current.humidity {
        parts.push(format!("Humidity is at {h}%."));
    }
    let wind_dir = current.wind_dir.as_deref().filter(|d| !d.is_empty());
    match (wind_speed, wind_dir) {
        (Some(speed), Some(dir)) => parts.push(format!(
            "Wind is blowing from the {dir} at {speed:.1} {}.",
            unit.wind()
        )),
        (Some(speed), None) => parts.push(format!("Wind speed is {speed:.1} {}.", unit.wind())),
        _ => {}
    }
    if let Some(uv) = &current.uv {
        parts.push(format!("The UV index is {uv}."));
    }
    if let Some(p) = pressure {
        parts.push(format!("Pressure is {p:.2} {}.", unit.pressure()));
    }
    if let Some(p) = precip {
        parts.push(format!("Precipitation is {p:.2} {}.", unit.precipitation()));
    }
    if let Some(v) = visibility {
        parts.push(format!("Visibility is {v:.1} {}.", unit.visibility()));
    }
    if let Some(g) = gust {
        parts.push(format!("Wind gusts up to {g:.1} {}.", unit.wind()));
    }
    if let Some(d) = dew_point {
        parts.push(format!("Dew point is {d:.1}{sym}."));
    }
    if let (Some(wc), Some(f)) = (wind_chill, feels_like) {
        if wc < f - 1.0 {
            parts.push(format!("Wind chill makes it feel like {wc:.1}{sym}."));
        }
    }
    if let (Some(hi), Some(f)) = (heat_index, feels_like) {
        if hi > f + 1.0 {
            parts.push(format!("Heat index makes it feel like {hi:.1}{sym}."));
        }
    }
    if let Some(updated) = current.last_updated.as_deref().filter(|u| !u.is_empty()) {
        parts.push(format!("(Last updated: {updated})"));
    }

    parts.join(" ")
}

fn error_result(message: impl Into<String>) -> Value {
    json!({ "status": "error", "error_message": message.into() })
}

/// `get_weather`: current conditions for a city, in the user's preferred units.
pub struct WeatherTool {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    parameters: AgentToolParameters,
}

impl WeatherTool {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            parameters: AgentToolParameters::object()
                .string(
                    "city",
                    "The name of the city (e.g., \"New York\", \"London\", \"Tokyo\").",
                    true,
                )
                .build(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let tool = Self::new(config.weather_api_key.clone());
        match &config.weather_base_url {
            Some(url) => tool.with_base_url(url.clone()),
            None => tool,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Per-request timeout, 10 seconds unless set.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch and format a report. `Err` carries the message shown to the model.
    async fn lookup(&self, api_key: &str, city: &str, unit: TemperatureUnit) -> Result<String, String> {
        let url = format!("{}/current.json", self.base_url);
        info!(city, "calling weather service");

        let response = shared_client()
            .get(&url)
            .query(&[("q", city), ("key", api_key)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the API key.
                let e = e.without_url();
                warn!(city, error = %e, "weather request failed");
                if e.is_timeout() {
                    format!("The request to the weather service timed out for '{city}'.")
                } else if e.is_connect() {
                    format!("Could not connect to the weather service to get information for '{city}'.")
                } else {
                    format!("An error occurred while requesting weather data for '{city}'.")
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(city, status = status.as_u16(), "weather service returned an error");
            return Err(match status.as_u16() {
                400 => match serde_json::from_str::<Value>(&body) {
                    Ok(error_body) => {
                        let error = &error_body["error"];
                        if error["code"].as_i64() == Some(LOCATION_NOT_FOUND) {
                            format!("Sorry, I couldn't find weather information for '{city}'.")
                        } else {
                            let message = error["message"].as_str().unwrap_or("request issue");
                            format!("There was a problem with the weather request for '{city}': {message}")
                        }
                    }
                    Err(_) => format!(
                        "There was an unspecified problem with the weather request for '{city}'."
                    ),
                },
                401 | 403 => "There was an authentication issue with the weather service. Please check the API key."
                    .to_string(),
                code => format!(
                    "An HTTP error occurred while fetching weather for '{city}'. Status: {code}"
                ),
            });
        }

        let data: CurrentResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            warn!(city, error = %e, "undecodable weather response");
            format!("An unexpected error occurred while processing the weather request for '{city}'.")
        })?;

        match data.current {
            Some(current) if current.condition.as_ref().is_some_and(|c| !c.is_empty()) => {
                Ok(format_report(city, &current, unit))
            }
            _ => Err(format!("Received unexpected weather data format for '{city}'.")),
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Retrieves the current weather report for a specified city using WeatherAPI.com. \
         Reports temperature in the user's preferred unit stored in session state."
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<Value, AgentError> {
        let city = args.get_str("city")?;
        debug!(city, agent = ctx.agent_name(), "get_weather called");

        let Some(api_key) = self.api_key.as_deref() else {
            warn!("weather API key is not configured");
            return Ok(error_result("Weather API key is missing. Cannot fetch weather."));
        };

        let preference = ctx.state().get_str(UNIT_PREFERENCE_KEY);
        let unit = TemperatureUnit::from_preference(preference.as_deref());
        debug!(preference = ?preference, %unit, "read unit preference");

        match self.lookup(api_key, city, unit).await {
            Ok(report) => {
                ctx.state().set(LAST_CITY_KEY, city);
                Ok(json!({ "status": "success", "report": report }))
            }
            Err(message) => Ok(error_result(message)),
        }
    }
}
