use std::sync::Arc;

use crate::{client::WeatherService, error::FetchError, model::WeatherResponse};

/// Facade the view model talks to; forwards to whichever service it was built with.
#[derive(Debug, Clone)]
pub struct WeatherRepository {
    service: Arc<dyn WeatherService>,
}

impl WeatherRepository {
    pub fn new(service: Arc<dyn WeatherService>) -> Self {
        Self { service }
    }

    pub async fn get_weather_by_city(
        &self,
        city: &str,
        api_key: &str,
    ) -> Result<WeatherResponse, FetchError> {
        self.service.get_weather_by_city(city, api_key).await
    }
}
