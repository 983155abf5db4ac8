//! Hourly weather reports.

use serde::Serialize;
use tracing::debug;

use crate::Result;
use crate::cache::LocationCache;
use crate::client::{AccuWeatherClient, HourlyForecast, Observation};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Temperature {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub temperature: Temperature,
    pub weather_text: String,
    pub relative_humidity: Option<f64>,
    pub precipitation: bool,
    pub observation_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyEntry {
    /// `+1 hour`, `+2 hours`, ...
    pub relative_time: String,
    pub temperature: Temperature,
    pub weather_text: String,
    pub precipitation_probability: Option<u32>,
    pub precipitation_type: Option<String>,
    pub precipitation_intensity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    /// Resolved place name, or the query text when the key came from cache.
    pub location: String,
    pub location_key: String,
    /// Only known when the location was resolved on this call.
    pub country: Option<String>,
    /// `None` when the API had no observation.
    pub current_conditions: Option<CurrentConditions>,
    pub hourly_forecast: Vec<HourlyEntry>,
}

pub struct WeatherService {
    client: AccuWeatherClient,
    cache: LocationCache,
}

impl WeatherService {
    pub fn new(client: AccuWeatherClient, cache: LocationCache) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    /// Current conditions and a 12-hour forecast for `location`.
    pub async fn hourly_weather(&self, location: &str) -> Result<WeatherReport> {
        let (location_name, location_key, country) = match self.cache.get(location) {
            Some(key) => {
                debug!(location, key = %key, "location key from cache");
                (location.to_string(), key, None)
            }
            None => {
                let found = self.client.search_location(location).await?;
                self.cache.put(location, &found.key);
                (
                    found.localized_name,
                    found.key,
                    Some(found.country.localized_name),
                )
            }
        };

        let observations = self.client.current_conditions(&location_key).await?;
        let forecast = self.client.hourly_forecast(&location_key).await?;

        Ok(WeatherReport {
            location: location_name,
            location_key,
            country,
            current_conditions: observations.into_iter().next().map(current_from),
            hourly_forecast: forecast
                .into_iter()
                .enumerate()
                .map(|(i, hour)| hourly_from(i + 1, hour))
                .collect(),
        })
    }
}

/// `+1 hour`, `+2 hours`, ...
pub fn relative_time(hours_ahead: usize) -> String {
    if hours_ahead == 1 {
        "+1 hour".to_string()
    } else {
        format!("+{hours_ahead} hours")
    }
}

fn current_from(observation: Observation) -> CurrentConditions {
    let metric = observation.temperature.metric;
    CurrentConditions {
        temperature: Temperature {
            value: metric.value,
            unit: metric.unit,
        },
        weather_text: observation.weather_text,
        relative_humidity: observation.relative_humidity,
        precipitation: observation.has_precipitation,
        observation_time: observation.local_observation_date_time,
    }
}

fn hourly_from(hours_ahead: usize, hour: HourlyForecast) -> HourlyEntry {
    HourlyEntry {
        relative_time: relative_time(hours_ahead),
        temperature: Temperature {
            value: hour.temperature.value,
            unit: hour.temperature.unit,
        },
        weather_text: hour.icon_phrase,
        precipitation_probability: hour.precipitation_probability,
        precipitation_type: hour.precipitation_type,
        precipitation_intensity: hour.precipitation_intensity,
    }
}
