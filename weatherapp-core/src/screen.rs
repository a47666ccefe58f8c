//! Presentation layer: turns view state into widget text and keeps the
//! offline copy of the last result.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::{
    error::FetchError,
    icon::{IconLoader, icon_url},
    model::WeatherResponse,
    permission::{Permission, PermissionGate},
    preferences::{KEY_CITY_NAME, KEY_WEATHER_RESPONSE, Preferences},
    view_model::WeatherViewModel,
};

const KELVIN_OFFSET: f64 = 273.15;

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Two decimals with a `°C` suffix, e.g. `26.85 °C`.
pub fn format_temperature(kelvin: f64) -> String {
    format!("{:.2} °C", kelvin_to_celsius(kelvin))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum IconView {
    #[default]
    Empty,
    Loading { url: String },
    Loaded { url: String, image: Vec<u8> },
    Failed { url: String },
}

impl IconView {
    pub fn url(&self) -> Option<&str> {
        match self {
            IconView::Empty => None,
            IconView::Loading { url } | IconView::Loaded { url, .. } | IconView::Failed { url } => {
                Some(url)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, IconView::Loading { .. })
    }
}

/// What the screen currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Widgets {
    pub city_input: String,
    pub temperature: String,
    pub description: String,
    pub icon: IconView,
}

/// Result of [`WeatherScreen::next_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    WeatherShown,
    ErrorShown(String),
    IconLoaded,
    IconFailed,
    /// Nothing visible changed (e.g. an icon arrived for a replaced URL).
    Unchanged,
}

type IconResult = (String, Result<Vec<u8>, FetchError>);

#[derive(Debug)]
pub struct WeatherScreen {
    view_model: WeatherViewModel,
    weather_rx: watch::Receiver<Option<WeatherResponse>>,
    error_rx: watch::Receiver<Option<String>>,
    preferences: Preferences,
    icons: Arc<dyn IconLoader>,
    icon_tx: mpsc::UnboundedSender<IconResult>,
    icon_rx: mpsc::UnboundedReceiver<IconResult>,
    widgets: Widgets,
}

impl WeatherScreen {
    /// Build the screen and show whatever was saved last time.
    ///
    /// Must be called inside a tokio runtime, since restoring may start an icon load.
    pub fn new(
        view_model: WeatherViewModel,
        preferences: Preferences,
        icons: Arc<dyn IconLoader>,
    ) -> Self {
        let (icon_tx, icon_rx) = mpsc::unbounded_channel();
        let mut screen = Self {
            weather_rx: view_model.subscribe_weather_data(),
            error_rx: view_model.subscribe_error_message(),
            view_model,
            preferences,
            icons,
            icon_tx,
            icon_rx,
            widgets: Widgets::default(),
        };
        screen.load_saved_weather();
        screen
    }

    pub fn widgets(&self) -> &Widgets {
        &self.widgets
    }

    #[cfg(test)]
    fn view_model(&self) -> &WeatherViewModel {
        &self.view_model
    }

    pub fn set_city_input(&mut self, text: impl Into<String>) {
        self.widgets.city_input = text.into();
    }

    /// Search button handler. Returns whether a fetch was started.
    ///
    /// The location permission only gates the fetch; the query always uses the
    /// typed city.
    pub async fn on_search_clicked(&mut self, permissions: &mut dyn PermissionGate) -> bool {
        let city = self.widgets.city_input.clone();
        debug!(%city, "fetching weather for city");

        if permissions.is_granted(Permission::FineLocation) {
            self.view_model.fetch_weather(&city);
            return true;
        }

        if permissions.request(Permission::FineLocation).await {
            let city = self.widgets.city_input.clone();
            self.view_model.fetch_weather(&city);
            true
        } else {
            debug!("location permission denied");
            false
        }
    }

    /// Wait for the next finished fetch or icon load and render it.
    pub async fn next_event(&mut self) -> Option<ScreenEvent> {
        tokio::select! {
            outcome = self.view_model.next_completion() => {
                self.view_model.apply(outcome?);
                Some(self.render_changes())
            }
            Some((url, result)) = self.icon_rx.recv() => {
                Some(self.on_icon_loaded(url, result))
            }
        }
    }

    fn render_changes(&mut self) -> ScreenEvent {
        let mut event = ScreenEvent::Unchanged;

        if self.weather_rx.has_changed().unwrap_or(false) {
            let data = self.weather_rx.borrow_and_update().clone();
            if let Some(response) = data {
                self.update_ui(&response);
                self.save_to_preferences(&response);
                event = ScreenEvent::WeatherShown;
            }
        }

        if self.error_rx.has_changed().unwrap_or(false) {
            let message = self.error_rx.borrow_and_update().clone();
            if let Some(message) = message {
                self.widgets.description = message.clone();
                self.widgets.temperature.clear();
                self.widgets.icon = IconView::Empty;
                event = ScreenEvent::ErrorShown(message);
            }
        }

        event
    }

    fn update_ui(&mut self, response: &WeatherResponse) {
        self.widgets.temperature = format_temperature(response.main.temp);

        match response.primary() {
            Some(weather) => {
                self.widgets.description = weather.description.clone();
                let url = icon_url(&weather.icon);
                debug!(%url, "weather icon URL");
                self.load_icon(url);
            }
            None => {
                warn!("weather response has no conditions");
                self.widgets.description.clear();
                self.widgets.icon = IconView::Empty;
            }
        }
    }

    fn load_icon(&mut self, url: String) {
        self.widgets.icon = IconView::Loading { url: url.clone() };

        let icons = Arc::clone(&self.icons);
        let tx = self.icon_tx.clone();
        tokio::spawn(async move {
            let result = icons.load(&url).await;
            let _ = tx.send((url, result));
        });
    }

    fn on_icon_loaded(&mut self, url: String, result: Result<Vec<u8>, FetchError>) -> ScreenEvent {
        if self.widgets.icon.url() != Some(url.as_str()) {
            debug!(%url, "dropping icon for replaced view");
            return ScreenEvent::Unchanged;
        }

        match result {
            Ok(image) => {
                self.widgets.icon = IconView::Loaded { url, image };
                ScreenEvent::IconLoaded
            }
            Err(err) => {
                warn!(%url, error = %err, "failed to load weather icon");
                self.widgets.icon = IconView::Failed { url };
                ScreenEvent::IconFailed
            }
        }
    }

    fn save_to_preferences(&mut self, response: &WeatherResponse) {
        let json = match serde_json::to_string(response) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to serialize weather response");
                return;
            }
        };

        let city = self.widgets.city_input.clone();
        if let Err(err) = self
            .preferences
            .edit()
            .put_string(KEY_CITY_NAME, city)
            .put_string(KEY_WEATHER_RESPONSE, json)
            .apply()
        {
            warn!(error = %err, "failed to save weather to preferences");
        }
    }

    fn load_saved_weather(&mut self) {
        let (Some(city), Some(json)) = (
            self.preferences.get_string(KEY_CITY_NAME),
            self.preferences.get_string(KEY_WEATHER_RESPONSE),
        ) else {
            return;
        };
        let city = city.to_string();

        match serde_json::from_str::<WeatherResponse>(json) {
            Ok(response) => {
                self.update_ui(&response);
                self.widgets.city_input = city;
            }
            Err(err) => warn!(error = %err, "ignoring unreadable cached weather"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Main, WeatherResponse},
        repository::WeatherRepository,
        view_model::tests::{ScriptedService, sample_response},
    };
    use async_trait::async_trait;
    use std::{path::Path, time::Duration};

    #[derive(Debug)]
    struct FakeIcons {
        fail: bool,
    }

    #[async_trait]
    impl IconLoader for FakeIcons {
        async fn load(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            if self.fail {
                Err(FetchError::Other(Some("connection refused".into())))
            } else {
                Ok(vec![1, 2, 3])
            }
        }
    }

    #[derive(Debug, Default)]
    struct FakePermissions {
        granted: bool,
        grant_on_request: bool,
        requests: usize,
    }

    impl FakePermissions {
        fn granted() -> Self {
            Self {
                granted: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl PermissionGate for FakePermissions {
        fn is_granted(&self, _permission: Permission) -> bool {
            self.granted
        }

        async fn request(&mut self, _permission: Permission) -> bool {
            self.requests += 1;
            self.granted = self.grant_on_request;
            self.granted
        }
    }

    fn screen_with(service: ScriptedService, prefs_path: &Path, icons_fail: bool) -> WeatherScreen {
        let repo = WeatherRepository::new(Arc::new(service));
        let vm = WeatherViewModel::new(repo, "KEY".into());
        let prefs = Preferences::open(prefs_path).unwrap();
        WeatherScreen::new(vm, prefs, Arc::new(FakeIcons { fail: icons_fail }))
    }

    fn paris_service() -> ScriptedService {
        ScriptedService::default().with("Paris", 0, sample_response(300.0, "clear sky", "10d"))
    }

    #[test]
    fn converts_kelvin_to_two_decimal_celsius() {
        assert_eq!(format_temperature(300.0), "26.85 °C");
        assert_eq!(format_temperature(273.15), "0.00 °C");
        assert_eq!(format_temperature(0.0), "-273.15 °C");
    }

    #[tokio::test]
    async fn successful_search_renders_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let prefs_path = dir.path().join("prefs.json");
        let mut screen = screen_with(paris_service(), &prefs_path, false);

        screen.set_city_input("Paris");
        assert!(screen.on_search_clicked(&mut FakePermissions::granted()).await);
        assert_eq!(screen.next_event().await, Some(ScreenEvent::WeatherShown));

        let widgets = screen.widgets();
        assert_eq!(widgets.temperature, "26.85 °C");
        assert_eq!(widgets.description, "clear sky");
        assert_eq!(widgets.icon.url(), Some("https://openweathermap.org/img/wn/10d@2x.png"));
        assert!(widgets.icon.is_loading());
        assert_eq!(screen.view_model().error_message(), None);

        assert_eq!(screen.next_event().await, Some(ScreenEvent::IconLoaded));
        match &screen.widgets().icon {
            IconView::Loaded { image, .. } => assert_eq!(image, &vec![1u8, 2, 3]),
            other => panic!("expected loaded icon, got {other:?}"),
        }

        let saved = Preferences::open(&prefs_path).unwrap();
        assert_eq!(saved.get_string(KEY_CITY_NAME), Some("Paris"));
        let cached: WeatherResponse =
            serde_json::from_str(saved.get_string(KEY_WEATHER_RESPONSE).unwrap()).unwrap();
        assert_eq!(cached, sample_response(300.0, "clear sky", "10d"));
    }

    #[tokio::test]
    async fn restart_without_network_restores_last_result() {
        let dir = tempfile::tempdir().unwrap();
        let prefs_path = dir.path().join("prefs.json");

        {
            let mut screen = screen_with(paris_service(), &prefs_path, false);
            screen.set_city_input("Paris");
            screen.on_search_clicked(&mut FakePermissions::granted()).await;
            screen.next_event().await;
        }

        // Offline: every lookup fails.
        let screen = screen_with(ScriptedService::default(), &prefs_path, true);
        let widgets = screen.widgets();

        assert_eq!(widgets.city_input, "Paris");
        assert_eq!(widgets.temperature, "26.85 °C");
        assert_eq!(widgets.description, "clear sky");
        assert_eq!(widgets.icon.url(), Some("https://openweathermap.org/img/wn/10d@2x.png"));
    }

    #[tokio::test]
    async fn error_clears_fields_but_not_cached_result() {
        let dir = tempfile::tempdir().unwrap();
        let prefs_path = dir.path().join("prefs.json");
        let mut screen = screen_with(paris_service(), &prefs_path, false);
        let mut perms = FakePermissions::granted();

        screen.set_city_input("Paris");
        screen.on_search_clicked(&mut perms).await;
        assert_eq!(screen.next_event().await, Some(ScreenEvent::WeatherShown));
        assert_eq!(screen.next_event().await, Some(ScreenEvent::IconLoaded));

        screen.set_city_input("Atlantis");
        screen.on_search_clicked(&mut perms).await;
        let event = screen.next_event().await;

        assert_eq!(event, Some(ScreenEvent::ErrorShown("Error 404: Not Found".into())));
        let widgets = screen.widgets();
        assert_eq!(widgets.description, "Error 404: Not Found");
        assert_eq!(widgets.temperature, "");
        assert_eq!(widgets.icon, IconView::Empty);
        assert!(screen.view_model().weather_data().is_some());

        let saved = Preferences::open(&prefs_path).unwrap();
        assert_eq!(saved.get_string(KEY_CITY_NAME), Some("Paris"));
    }

    #[tokio::test]
    async fn asks_for_permission_then_fetches_on_grant() {
        let dir = tempfile::tempdir().unwrap();
        let mut screen = screen_with(paris_service(), &dir.path().join("prefs.json"), false);
        let mut perms = FakePermissions {
            grant_on_request: true,
            ..FakePermissions::default()
        };

        screen.set_city_input("Paris");
        assert!(screen.on_search_clicked(&mut perms).await);
        assert_eq!(perms.requests, 1);
        assert_eq!(screen.next_event().await, Some(ScreenEvent::WeatherShown));

        // Already granted: no second prompt.
        assert!(screen.on_search_clicked(&mut perms).await);
        assert_eq!(perms.requests, 1);
    }

    #[tokio::test]
    async fn denied_permission_starts_no_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut screen = screen_with(paris_service(), &dir.path().join("prefs.json"), false);
        let mut perms = FakePermissions::default();

        screen.set_city_input("Paris");
        assert!(!screen.on_search_clicked(&mut perms).await);
        assert_eq!(perms.requests, 1);

        let waited = tokio::time::timeout(Duration::from_millis(50), screen.next_event()).await;
        assert!(waited.is_err());
        assert_eq!(screen.widgets().temperature, "");
    }

    #[tokio::test]
    async fn icon_failure_is_not_an_app_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut screen = screen_with(paris_service(), &dir.path().join("prefs.json"), true);

        screen.set_city_input("Paris");
        screen.on_search_clicked(&mut FakePermissions::granted()).await;
        screen.next_event().await;

        assert_eq!(screen.next_event().await, Some(ScreenEvent::IconFailed));
        assert_eq!(screen.widgets().description, "clear sky");
        assert_eq!(screen.view_model().error_message(), None);
    }

    #[tokio::test]
    async fn response_without_conditions_shows_temperature_only() {
        let dir = tempfile::tempdir().unwrap();
        let bare = WeatherResponse {
            main: Main {
                temp: 283.15,
                humidity: 70,
            },
            weather: vec![],
        };
        let mut screen = screen_with(
            ScriptedService::default().with("Nowhere", 0, bare),
            &dir.path().join("prefs.json"),
            false,
        );

        screen.set_city_input("Nowhere");
        screen.on_search_clicked(&mut FakePermissions::granted()).await;
        assert_eq!(screen.next_event().await, Some(ScreenEvent::WeatherShown));

        let widgets = screen.widgets();
        assert_eq!(widgets.temperature, "10.00 °C");
        assert_eq!(widgets.description, "");
        assert_eq!(widgets.icon, IconView::Empty);
    }

    #[tokio::test]
    async fn unreadable_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let prefs_path = dir.path().join("prefs.json");
        {
            let mut prefs = Preferences::open(&prefs_path).unwrap();
            prefs
                .edit()
                .put_string(KEY_CITY_NAME, "Paris")
                .put_string(KEY_WEATHER_RESPONSE, "garbage")
                .apply()
                .unwrap();
        }

        let screen = screen_with(ScriptedService::default(), &prefs_path, false);
        assert_eq!(screen.widgets(), &Widgets::default());
    }
}
