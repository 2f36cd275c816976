use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::route::RoutePreference;

/// Two-hour forecast codes that call for cover.
pub const RAINY_FORECAST_CODES: [&str; 5] = ["TL", "RA", "SH", "DR", "TS"];

pub const HOT_DAY_THRESHOLD_C: f64 = 30.0;

/// The banner shown on the map uses a stricter heat threshold than the route
/// suggestion.
pub const HEAT_ALERT_THRESHOLD_C: f64 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionReason {
    Rain,
    Hot,
}

/// Whether to offer a sheltered route to someone currently asking for the
/// fastest one. Never changes the preference itself.
pub fn should_suggest_sheltered(
    forecast_code: &str,
    high_temp_c: Option<f64>,
    current: RoutePreference,
) -> bool {
    suggestion_reason(forecast_code, high_temp_c, current).is_some()
}

/// Rain wins over heat when both apply.
pub fn suggestion_reason(
    forecast_code: &str,
    high_temp_c: Option<f64>,
    current: RoutePreference,
) -> Option<SuggestionReason> {
    if current != RoutePreference::Fastest {
        return None;
    }
    if RAINY_FORECAST_CODES.contains(&forecast_code) {
        return Some(SuggestionReason::Rain);
    }
    match high_temp_c {
        Some(high) if high > HOT_DAY_THRESHOLD_C => Some(SuggestionReason::Hot),
        _ => None,
    }
}

pub fn needs_weather_alert(forecast_code: &str, high_temp_c: Option<f64>) -> bool {
    matches!(forecast_code, "TL" | "RA")
        || high_temp_c.is_some_and(|high| high >= HEAT_ALERT_THRESHOLD_C)
}

/// The fields of the nested weather record that drive advisories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub code: String,
    pub text: Option<String>,
    pub high_temp_c: Option<f64>,
    pub low_temp_c: Option<f64>,
    #[serde(default)]
    pub is_fallback_data: bool,
}

impl ForecastSummary {
    /// Reads `data.records[0].general` from a weather payload. Returns `None`
    /// when the forecast code is missing.
    pub fn from_weather_json(payload: &Value) -> Option<Self> {
        let general = payload.pointer("/data/records/0/general")?;
        let code = general.pointer("/forecast/code")?.as_str()?.to_string();

        Some(Self {
            code,
            text: general
                .pointer("/forecast/text")
                .and_then(Value::as_str)
                .map(str::to_string),
            high_temp_c: general.pointer("/temperature/high").and_then(Value::as_f64),
            low_temp_c: general.pointer("/temperature/low").and_then(Value::as_f64),
            is_fallback_data: payload
                .get("is_fallback_data")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    pub fn suggestion(&self, current: RoutePreference) -> Option<SuggestionReason> {
        suggestion_reason(&self.code, self.high_temp_c, current)
    }
}

/// Extracts the first apparent-temperature reading from the collaborator's
/// envelope. Only `code == 0` responses are trusted.
pub fn apparent_temperature(payload: &Value) -> Option<f64> {
    if payload.get("code").and_then(Value::as_i64) != Some(0) {
        return None;
    }
    payload
        .pointer("/data/readings/0/data/0/value")
        .and_then(Value::as_f64)
}
