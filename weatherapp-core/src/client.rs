use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt::Debug;
use tracing::debug;

use crate::{error::FetchError, model::WeatherResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/";
const CURRENT_WEATHER_PATH: &str = "data/2.5/weather";

/// Source of current weather for a city.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    async fn get_weather_by_city(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<WeatherResponse, FetchError>;
}

/// HTTP client for the OpenWeatherMap current-weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    endpoint: Url,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// `base_url` is the API root; a trailing slash is added when missing.
    pub fn with_base_url(base_url: &str, api_key: String) -> anyhow::Result<Self> {
        let root = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        let endpoint = Url::parse(&root)
            .and_then(|root| root.join(CURRENT_WEATHER_PATH))
            .with_context(|| format!("Invalid weather API base URL: {base_url}"))?;

        Ok(Self {
            http: Client::new(),
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch using the API key this client was configured with.
    pub async fn get_weather(&self, city: &str) -> Result<WeatherResponse, FetchError> {
        self.get_weather_by_city(city, &self.api_key).await
    }
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn get_weather_by_city(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<WeatherResponse, FetchError> {
        debug!(%city, url = %self.endpoint, "requesting current weather");

        let res = self
            .http
            .get(self.endpoint.clone())
            .query(&[("q", city), ("appid", api_key)])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.ok().filter(|b| !b.is_empty());
            return Err(FetchError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let body = res.text().await?;
        let parsed: WeatherResponse = serde_json::from_str(&body)?;

        Ok(parsed)
    }
}
