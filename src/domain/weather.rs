//! Normalized weather entities and condition-threshold alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alert::Alert;

/// Current conditions for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Condition text (e.g. "Partly cloudy").
    pub conditions: String,
    /// Condition icon URL.
    pub icon: String,
    /// Feels-like temperature in °C.
    pub feels_like: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// Upstream "last updated" string (local time of the station).
    pub last_updated: String,
    pub is_day: bool,
    /// "City, Country" as resolved by the provider.
    pub location: String,
    /// When this value was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// One hourly forecast or history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyData {
    /// Local time as `HH:MM`.
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
    pub condition: String,
    /// Chance of rain, else chance of snow, else 0 (%).
    pub precipitation_chance: f64,
}

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    /// Date as `YYYY-MM-DD`.
    pub date: String,
    pub avg_temperature: f64,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub avg_humidity: f64,
    pub condition: String,
    pub hourly_data: Vec<HourlyData>,
}

impl DailyForecast {
    /// Stand-in for a day the provider returned in an unusable shape.
    pub fn placeholder(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            avg_temperature: 0.0,
            max_temperature: 0.0,
            min_temperature: 0.0,
            avg_humidity: 0.0,
            condition: "Error".to_string(),
            hourly_data: Vec::new(),
        }
    }
}

/// Multi-day forecast for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub last_updated: DateTime<Utc>,
    pub days: Vec<DailyForecast>,
}

/// Observed hourly weather for a past day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDay {
    pub date: String,
    pub hourly_data: Vec<HourlyData>,
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Extract `HH:MM` from a provider time string such as `2024-01-01 13:00`.
pub fn clock_time(time: &str) -> Option<String> {
    let clock = time.split_whitespace().nth(1)?;
    Some(clock.chars().take(5).collect())
}

/// Temperature and humidity limits that raise weather alerts.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherThresholds {
    pub hot_celsius: f64,
    pub cold_celsius: f64,
    pub humidity_pct: f64,
}

impl Default for WeatherThresholds {
    fn default() -> Self {
        Self {
            hot_celsius: 35.0,
            cold_celsius: 0.0,
            humidity_pct: 80.0,
        }
    }
}

impl WeatherThresholds {
    /// Alerts for every threshold the given conditions cross.
    pub fn evaluate(&self, city: &str, weather: &CurrentWeather) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if weather.temperature >= self.hot_celsius {
            alerts.push(Alert::weather(format!(
                "Extreme heat in {city}: {:.1}°C",
                weather.temperature
            )));
        } else if weather.temperature <= self.cold_celsius {
            alerts.push(Alert::weather(format!(
                "Freezing temperature in {city}: {:.1}°C",
                weather.temperature
            )));
        }

        if weather.humidity >= self.humidity_pct {
            alerts.push(Alert::weather(format!(
                "High humidity in {city}: {:.0}%",
                weather.humidity
            )));
        }

        alerts
    }
}

#[cfg(test)]
pub(crate) fn sample_weather(temperature: f64, humidity: f64) -> CurrentWeather {
    CurrentWeather {
        temperature,
        humidity,
        conditions: "Sunny".to_string(),
        icon: String::new(),
        feels_like: temperature,
        wind_speed: 10.0,
        last_updated: "2024-06-01 12:00".to_string(),
        is_day: true,
        location: "Tokyo, Japan".to_string(),
        fetched_at: Utc::now(),
    }
}
