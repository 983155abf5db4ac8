//! AccuWeather REST client.

use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{Error, Result};

pub const ACCUWEATHER_API_URL: &str = "http://dataservice.accuweather.com";

/// A place returned by the city search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Location {
    pub key: String,
    pub localized_name: String,
    pub country: Country,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Country {
    pub localized_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Measurement {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UnitMeasurements {
    pub metric: Measurement,
}

/// One observation from `currentconditions`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Observation {
    pub local_observation_date_time: String,
    pub weather_text: String,
    #[serde(default)]
    pub has_precipitation: bool,
    #[serde(default)]
    pub relative_humidity: Option<f64>,
    pub temperature: UnitMeasurements,
}

/// One hour from the 12-hour forecast.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HourlyForecast {
    pub temperature: Measurement,
    pub icon_phrase: String,
    #[serde(default)]
    pub precipitation_probability: Option<u32>,
    #[serde(default)]
    pub precipitation_type: Option<String>,
    #[serde(default)]
    pub precipitation_intensity: Option<String>,
}

pub struct AccuWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AccuWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(ACCUWEATHER_API_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build from `ACCUWEATHER_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ACCUWEATHER_API_KEY")
            .map_err(|_| Error::Config("ACCUWEATHER_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Best match for a free-text place name.
    pub async fn search_location(&self, query: &str) -> Result<Location> {
        let locations: Vec<Location> = self
            .get("/locations/v1/cities/search", &[("q", query)])
            .await?;
        locations
            .into_iter()
            .next()
            .ok_or_else(|| Error::LocationNotFound(query.to_string()))
    }

    pub async fn current_conditions(&self, location_key: &str) -> Result<Vec<Observation>> {
        self.get(&format!("/currentconditions/v1/{location_key}"), &[])
            .await
    }

    /// Next 12 hours, metric units.
    pub async fn hourly_forecast(&self, location_key: &str) -> Result<Vec<HourlyForecast>> {
        self.get(
            &format!("/forecasts/v1/hourly/12hour/{location_key}"),
            &[("metric", "true")],
        )
        .await
    }

    /// The key travels in the query string, so transport errors drop the URL.
    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = Url::parse_with_params(
            &format!("{}{path}", self.base_url),
            std::iter::once(("apikey", self.api_key.as_str())).chain(params.iter().copied()),
        )
        .map_err(|e| Error::Config(format!("invalid AccuWeather URL: {e}")))?;
        debug!(path, "AccuWeather request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.without_url().to_string()))?;
        if !status.is_success() {
            return Err(Error::Api(format!("{status}: {body}")));
        }

        serde_json::from_str(&body).map_err(|e| Error::Decode(format!("{path}: {e}")))
    }
}
