//! Weather alerts derived from a single weather sample.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Title used for every weather alert notification.
pub const ALERT_TITLE: &str = "⚠️ 天气预警";

/// Current conditions as reported by a weather source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Human readable description, e.g. `"小雨"` or `"Light rain"`.
    pub description: String,
    /// Temperature in whole degrees Celsius.
    pub temperature_c: i32,
    /// Air quality index, when the source provides one.
    #[serde(default)]
    pub aqi: Option<u32>,
}

/// Which alerts are on and where their thresholds sit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherThresholds {
    pub rain_enabled: bool,
    pub heat_enabled: bool,
    pub cold_enabled: bool,
    pub smog_enabled: bool,
    /// Heat alert at or above this temperature.
    pub heat_c: i32,
    /// Cold alert at or below this temperature.
    pub cold_c: i32,
    /// Smog alert at or above this AQI.
    pub aqi: u32,
}

impl Default for WeatherThresholds {
    fn default() -> Self {
        Self {
            rain_enabled: true,
            heat_enabled: true,
            cold_enabled: true,
            smog_enabled: true,
            heat_c: 35,
            cold_c: 0,
            aqi: 150,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherAlertKind {
    Rain,
    Heat,
    Cold,
    Smog,
}

impl fmt::Display for WeatherAlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rain => f.write_str("rain"),
            Self::Heat => f.write_str("heat"),
            Self::Cold => f.write_str("cold"),
            Self::Smog => f.write_str("smog"),
        }
    }
}

/// One alert with the message to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub kind: WeatherAlertKind,
    pub message: String,
}

fn is_precipitation(description: &str) -> bool {
    let lower = description.to_lowercase();
    description.contains('雨')
        || description.contains('雪')
        || lower.contains("rain")
        || lower.contains("snow")
}

impl WeatherThresholds {
    /// Every enabled alert the sample crosses, in rain, heat, cold, smog order.
    #[must_use]
    pub fn evaluate(&self, sample: &WeatherSample) -> Vec<WeatherAlert> {
        let mut alerts = Vec::new();
        if self.rain_enabled && is_precipitation(&sample.description) {
            alerts.push(WeatherAlert {
                kind: WeatherAlertKind::Rain,
                message: format!("⚠️ 降雨预警：今天有{}，请携带雨具。", sample.description),
            });
        }
        let temp = sample.temperature_c;
        if self.heat_enabled && temp >= self.heat_c {
            alerts.push(WeatherAlert {
                kind: WeatherAlertKind::Heat,
                message: format!("🌡️ 高温预警：今天温度{temp}℃，注意防暑降温。"),
            });
        }
        if self.cold_enabled && temp <= self.cold_c {
            alerts.push(WeatherAlert {
                kind: WeatherAlertKind::Cold,
                message: format!("❄️ 低温预警：今天温度{temp}℃，注意保暖。"),
            });
        }
        if let Some(aqi) = sample.aqi.filter(|aqi| self.smog_enabled && *aqi >= self.aqi) {
            alerts.push(WeatherAlert {
                kind: WeatherAlertKind::Smog,
                message: format!("😷 雾霾预警：AQI {aqi}，减少户外活动。"),
            });
        }
        alerts
    }
}
