use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

use crate::error::FetchError;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Image URL for an OpenWeatherMap icon id, e.g. `10d`.
pub fn icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}@2x.png")
}

/// Fetches icon images for the screen.
#[async_trait]
pub trait IconLoader: Send + Sync + Debug {
    async fn load(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpIconLoader {
    http: Client,
}

impl HttpIconLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IconLoader for HttpIconLoader {
    async fn load(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let res = self.http.get(url).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
                body: None,
            });
        }

        Ok(res.bytes().await?.to_vec())
    }
}
