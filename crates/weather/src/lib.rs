//! Hourly weather tools backed by AccuWeather.
//!
//! [`WeatherService`] resolves a place name to a location key (remembered in
//! a [`LocationCache`]), then fetches current conditions and a 12-hour
//! forecast. [`WeatherTools`] serves it as the `get_hourly_weather` tool.

mod cache;
mod client;
mod error;
mod service;
mod tools;

pub use cache::LocationCache;
pub use client::{
    ACCUWEATHER_API_URL, AccuWeatherClient, Country, HourlyForecast, Location, Measurement,
    Observation, UnitMeasurements,
};
pub use error::{Error, Result};
pub use service::{
    CurrentConditions, HourlyEntry, Temperature, WeatherReport, WeatherService, relative_time,
};
pub use tools::WeatherTools;
