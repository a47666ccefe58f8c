//! View state for the weather screen.
//!
//! Fetches run on the tokio runtime. Their outcomes are queued on a channel and
//! only applied to the observable slots when the owning task calls
//! [`WeatherViewModel::deliver_next`], so the slots have a single writer.

use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

use crate::{
    error::FetchError, model::WeatherResponse, observable::LiveData,
    repository::WeatherRepository,
};

pub type FetchOutcome = Result<WeatherResponse, FetchError>;

#[derive(Debug)]
pub struct WeatherViewModel {
    repository: WeatherRepository,
    api_key: String,
    weather_data: LiveData<WeatherResponse>,
    error_message: LiveData<String>,
    completions_tx: mpsc::UnboundedSender<FetchOutcome>,
    completions_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl WeatherViewModel {
    pub fn new(repository: WeatherRepository, api_key: String) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            repository,
            api_key,
            weather_data: LiveData::new(),
            error_message: LiveData::new(),
            completions_tx,
            completions_rx,
        }
    }

    pub fn weather_data(&self) -> Option<WeatherResponse> {
        self.weather_data.get()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error_message.get()
    }

    pub fn subscribe_weather_data(&self) -> watch::Receiver<Option<WeatherResponse>> {
        self.weather_data.subscribe()
    }

    pub fn subscribe_error_message(&self) -> watch::Receiver<Option<String>> {
        self.error_message.subscribe()
    }

    /// Start a fetch in the background. Must be called inside a tokio runtime.
    ///
    /// Earlier fetches are neither cancelled nor deduplicated.
    pub fn fetch_weather(&self, city: &str) {
        let repository = self.repository.clone();
        let api_key = self.api_key.clone();
        let city = city.to_string();
        let tx = self.completions_tx.clone();

        tokio::spawn(async move {
            let call = tokio::spawn(async move {
                repository.get_weather_by_city(&city, &api_key).await
            });

            let outcome = match call.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(FetchError::Other(Some(join_err.to_string()))),
            };

            // Receiver is gone only when the view model was dropped.
            let _ = tx.send(outcome);
        });
    }

    /// Wait for the next finished fetch, in arrival order.
    pub async fn next_completion(&mut self) -> Option<FetchOutcome> {
        self.completions_rx.recv().await
    }

    /// Publish a finished fetch to the observable slots.
    pub fn apply(&self, outcome: FetchOutcome) {
        match outcome {
            Ok(response) => {
                debug!(?response, "weather data received");
                self.weather_data.set(Some(response));
                self.error_message.set(None);
            }
            Err(err) => {
                error!(error = %err, status = ?err.status(), "error fetching weather data");
                if let FetchError::Http { body: Some(body), .. } = &err {
                    error!(%body, "HTTP error response");
                }
                self.error_message.set(Some(err.user_message()));
            }
        }
    }

    /// Wait for the next finished fetch and publish it.
    pub async fn deliver_next(&mut self) -> bool {
        match self.next_completion().await {
            Some(outcome) => {
                self.apply(outcome);
                true
            }
            None => false,
        }
    }
}
