use serde::{Deserialize, Serialize};

/// Current-weather payload returned by `/data/2.5/weather`.
///
/// The same shape is used for the cached snapshot in preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub main: Main,
    pub weather: Vec<Weather>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Main {
    /// Kelvin.
    pub temp: f64,
    pub humidity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub icon: String,
    pub description: String,
}

impl WeatherResponse {
    /// The condition shown on screen (first entry).
    pub fn primary(&self) -> Option<&Weather> {
        self.weather.first()
    }
}
