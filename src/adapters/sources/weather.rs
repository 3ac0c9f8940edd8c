//! WeatherAPI adapter - current conditions, forecast and history.

use async_trait::async_trait;
use chrono::{Days, Utc};
use tracing::{debug, instrument, warn};

use super::client::HttpClient;
use super::types::{CurrentResponse, ForecastDayResponse, HourResponse, WeatherApiResponse, WeatherLocation};
use crate::domain::weather::{
    clock_time, round1, CurrentWeather, DailyForecast, Forecast, HistoricalDay, HourlyData,
};
use crate::ports::sources::{SourceError, SourceResult, WeatherSource};

/// Hours kept from a historical day.
const HISTORY_HOURS: [u32; 8] = [0, 3, 6, 9, 12, 15, 18, 21];

/// `WeatherSource` backed by api.weatherapi.com.
pub struct WeatherApiClient {
    client: HttpClient,
    api_key: Option<String>,
}

impl WeatherApiClient {
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    fn key(&self) -> SourceResult<String> {
        self.api_key
            .clone()
            .ok_or(SourceError::MissingApiKey("Weather"))
    }
}

#[async_trait]
impl WeatherSource for WeatherApiClient {
    #[instrument(skip(self))]
    async fn current(&self, city: &str) -> SourceResult<CurrentWeather> {
        let query = [
            ("key", self.key()?),
            ("q", city.to_string()),
            ("aqi", "no".to_string()),
        ];
        let response: WeatherApiResponse = self
            .client
            .get_json("weather", "/current.json", &query)
            .await?;
        normalize_current(response)
    }

    #[instrument(skip(self))]
    async fn forecast(&self, city: &str, days: u32) -> SourceResult<Forecast> {
        let query = [
            ("key", self.key()?),
            ("q", city.to_string()),
            ("days", days.to_string()),
            ("aqi", "no".to_string()),
            ("alerts", "no".to_string()),
        ];
        let response: WeatherApiResponse = self
            .client
            .get_json("forecast", "/forecast.json", &query)
            .await?;
        normalize_forecast(response)
    }

    #[instrument(skip(self))]
    async fn history(&self, city: &str) -> SourceResult<HistoricalDay> {
        let yesterday = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| SourceError::NoData("date out of range".to_string()))?;
        let query = [
            ("key", self.key()?),
            ("q", city.to_string()),
            ("dt", yesterday.format("%Y-%m-%d").to_string()),
        ];
        let response: WeatherApiResponse = self
            .client
            .get_json("history", "/history.json", &query)
            .await?;
        normalize_history(response)
    }
}

/// Map a `current.json` response into `CurrentWeather`.
pub fn normalize_current(response: WeatherApiResponse) -> SourceResult<CurrentWeather> {
    let current: CurrentResponse = response
        .current
        .ok_or(SourceError::InvalidPayload("weather"))?;

    let location = response
        .location
        .map(|WeatherLocation { name, country }| {
            if country.is_empty() {
                name
            } else {
                format!("{name}, {country}")
            }
        })
        .unwrap_or_default();

    Ok(CurrentWeather {
        temperature: current.temp_c,
        humidity: current.humidity,
        conditions: current.condition.text,
        icon: current.condition.icon,
        feels_like: current.feelslike_c.unwrap_or(current.temp_c),
        wind_speed: current.wind_kph.unwrap_or_default(),
        last_updated: current.last_updated,
        is_day: current.is_day == 1,
        location,
        fetched_at: Utc::now(),
    })
}

/// Map a `forecast.json` response; malformed days become placeholders.
pub fn normalize_forecast(response: WeatherApiResponse) -> SourceResult<Forecast> {
    let block = response
        .forecast
        .ok_or_else(|| SourceError::NoData("No forecast data available".to_string()))?;

    let days = block
        .forecastday
        .into_iter()
        .map(|day| {
            let date = day.date.clone();
            normalize_day(day).unwrap_or_else(|| {
                warn!(date = %date, "Malformed forecast day, using placeholder");
                DailyForecast::placeholder(date)
            })
        })
        .collect();

    Ok(Forecast {
        last_updated: Utc::now(),
        days,
    })
}

/// Map a `history.json` response, keeping every third hour.
pub fn normalize_history(response: WeatherApiResponse) -> SourceResult<HistoricalDay> {
    let day = response
        .forecast
        .and_then(|f| f.forecastday.into_iter().next())
        .ok_or_else(|| SourceError::NoData("No historical data available".to_string()))?;

    let hourly_data = day
        .hour
        .into_iter()
        .filter_map(normalize_hour)
        .filter(|h| {
            h.time
                .get(..2)
                .and_then(|hh| hh.parse::<u32>().ok())
                .is_some_and(|hh| HISTORY_HOURS.contains(&hh))
        })
        .collect();

    Ok(HistoricalDay {
        date: day.date,
        hourly_data,
    })
}

fn normalize_day(day: ForecastDayResponse) -> Option<DailyForecast> {
    let aggregate = day.day?;

    let hourly_data = day
        .hour
        .into_iter()
        .map(normalize_hour)
        .collect::<Option<Vec<_>>>()?;

    Some(DailyForecast {
        date: day.date,
        avg_temperature: round1(aggregate.avgtemp_c?),
        max_temperature: aggregate.maxtemp_c?,
        min_temperature: aggregate.mintemp_c?,
        avg_humidity: round1(aggregate.avghumidity?),
        condition: aggregate.condition?.text,
        hourly_data,
    })
}

fn normalize_hour(raw: serde_json::Value) -> Option<HourlyData> {
    let hour: HourResponse = serde_json::from_value(raw)
        .map_err(|e| debug!(error = %e, "Unreadable hourly entry"))
        .ok()?;

    let precipitation_chance = hour
        .chance_of_rain
        .filter(|c| *c > 0.0)
        .or(hour.chance_of_snow.filter(|c| *c > 0.0))
        .unwrap_or(0.0);

    Some(HourlyData {
        time: clock_time(&hour.time)?,
        temperature: hour.temp_c,
        humidity: hour.humidity,
        condition: hour.condition.text,
        precipitation_chance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> WeatherApiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_normalize_current() {
        let response = parse(
            r#"{
                "location": {"name": "London", "region": "", "country": "United Kingdom"},
                "current": {
                    "temp_c": 12.5, "humidity": 81, "is_day": 1,
                    "condition": {"text": "Light rain", "icon": "//cdn/rain.png", "code": 1183},
                    "feelslike_c": 10.9, "wind_kph": 14.4, "last_updated": "2024-03-01 10:15"
                }
            }"#,
        );
        let weather = normalize_current(response).unwrap();
        assert_eq!(weather.temperature, 12.5);
        assert_eq!(weather.humidity, 81.0);
        assert_eq!(weather.conditions, "Light rain");
        assert_eq!(weather.location, "London, United Kingdom");
        assert!(weather.is_day);
    }

    #[test]
    fn test_missing_current_is_invalid_payload() {
        let err = normalize_current(parse(r#"{"location": null}"#)).unwrap_err();
        assert!(matches!(err, SourceError::InvalidPayload("weather")));
    }

    #[test]
    fn test_forecast_placeholder_for_bad_day() {
        let response = parse(
            r#"{"forecast": {"forecastday": [
                {"date": "2024-03-01",
                 "day": {"maxtemp_c": 14.0, "mintemp_c": 6.0, "avgtemp_c": 9.96,
                         "avghumidity": 77.04, "condition": {"text": "Cloudy", "icon": ""}},
                 "hour": [{"time": "2024-03-01 00:00", "temp_c": 7.0, "humidity": 80,
                           "condition": {"text": "Clear"}, "chance_of_rain": 0, "chance_of_snow": 12}]},
                {"date": "2024-03-02", "day": {"maxtemp_c": 11.0}, "hour": []}
            ]}}"#,
        );
        let forecast = normalize_forecast(response).unwrap();
        assert_eq!(forecast.days.len(), 2);

        let first = &forecast.days[0];
        assert_eq!(first.avg_temperature, 10.0);
        assert_eq!(first.avg_humidity, 77.0);
        assert_eq!(first.hourly_data[0].time, "00:00");
        assert_eq!(first.hourly_data[0].precipitation_chance, 12.0);

        assert_eq!(forecast.days[1], DailyForecast::placeholder("2024-03-02"));
    }

    #[test]
    fn test_history_keeps_three_hourly() {
        let hours: Vec<String> = (0..24)
            .map(|h| {
                format!(
                    r#"{{"time": "2024-02-29 {h:02}:00", "temp_c": {h}, "humidity": 50, "condition": {{"text": "Clear"}}}}"#
                )
            })
            .collect();
        let json = format!(
            r#"{{"forecast": {{"forecastday": [{{"date": "2024-02-29", "hour": [{}]}}]}}}}"#,
            hours.join(",")
        );
        let day = normalize_history(parse(&json)).unwrap();
        assert_eq!(day.date, "2024-02-29");
        let times: Vec<&str> = day.hourly_data.iter().map(|h| h.time.as_str()).collect();
        assert_eq!(
            times,
            vec!["00:00", "03:00", "06:00", "09:00", "12:00", "15:00", "18:00", "21:00"]
        );
    }

    #[test]
    fn test_history_without_days() {
        let err = normalize_history(parse(r#"{"forecast": {"forecastday": []}}"#)).unwrap_err();
        assert_eq!(err.to_string(), "No historical data available");
    }
}
