use curl::easy::Easy;
use serde_derive::Deserialize;

use crate::{
    data_types::{
        common::LatLng,
        workout::{Address, WeatherSnapshot},
    },
    errors::EnrichmentError,
    logvbln,
    util::settings::EnrichmentSettings,
};

use super::GeoLookup;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
    wind: WeatherWind,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherWind {
    speed: f64,
}

/// Reverse geocoding against a Nominatim endpoint and current weather against
/// an OpenWeather endpoint, both over blocking `curl`.
pub struct HttpLookup {
    user_agent: String,
    geocode_url: String,
    weather_url: String,
    weather_api_key: Option<String>,
}

impl HttpLookup {
    const CC: &'static str = "HttpLookup";

    pub fn new(settings: &EnrichmentSettings) -> Self {
        Self {
            user_agent: settings.user_agent.clone(),
            geocode_url: settings.geocode_url.clone(),
            weather_url: settings.weather_url.clone(),
            weather_api_key: settings.weather_api_key.clone(),
        }
    }

    fn get_request(&self, url: &str) -> Result<Vec<u8>, EnrichmentError> {
        let mut handle = Easy::new();

        handle.useragent(&self.user_agent)?;
        handle.get(true)?;
        handle.url(url)?;

        let mut buffer_response = Vec::new();
        {
            let mut transfer = handle.transfer();

            transfer.write_function(|data| {
                buffer_response.extend_from_slice(data);
                Ok(data.len())
            })?;

            transfer.perform()?;
        }

        let status = handle.response_code()?;
        if !(200..300).contains(&status) {
            return Err(EnrichmentError::Status(status));
        }

        logvbln!("GET {} -> {} bytes", url, buffer_response.len());

        Ok(buffer_response)
    }

    pub fn parse_address(body: &[u8]) -> Result<Address, EnrichmentError> {
        let response: GeocodeResponse = serde_json::from_slice(body)?;

        response.address.ok_or(EnrichmentError::Incomplete("address"))
    }

    pub fn parse_weather(body: &[u8]) -> Result<WeatherSnapshot, EnrichmentError> {
        let response: WeatherResponse = serde_json::from_slice(body)?;

        Ok(WeatherSnapshot {
            temperature_c: response.main.temp,
            wind_speed: response.wind.speed,
            humidity_pct: response.main.humidity,
        })
    }
}

impl GeoLookup for HttpLookup {
    fn reverse_geocode(&self, coords: LatLng) -> Result<Address, EnrichmentError> {
        let url = format!(
            "{}?format=jsonv2&lat={}&lon={}",
            self.geocode_url, coords[0], coords[1]
        );

        HttpLookup::parse_address(&self.get_request(&url)?)
    }

    fn current_weather(&self, coords: LatLng) -> Result<WeatherSnapshot, EnrichmentError> {
        let api_key = self
            .weather_api_key
            .as_deref()
            .ok_or(EnrichmentError::Incomplete("weather_api_key"))?;

        let url = format!(
            "{}?units=metric&lat={}&lon={}&appid={}",
            self.weather_url, coords[0], coords[1], api_key
        );

        HttpLookup::parse_weather(&self.get_request(&url)?)
    }
}
