use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{sync::Arc, time::Duration};
use tracing::debug;
use weatherapp_core::{
    Config, HttpIconLoader, OpenWeatherClient, Preferences, ScreenEvent, WeatherRepository,
    WeatherScreen, WeatherViewModel,
};

use crate::{permissions::PromptPermissionGate, render::render};

/// How long to wait for the icon after the weather itself arrived.
const ICON_WAIT: Duration = Duration::from_secs(5);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for a city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key.
    Configure,

    /// Show the last saved weather, or fetch it for a city.
    Show {
        /// City name, e.g. "Paris". Without it only the saved result is shown.
        city: Option<String>,
    },

    /// Search cities one after another; an empty name quits.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city } => show(city).await,
            Command::Interactive => interactive().await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let api_key = api_key_for(&config, city.is_some())?;
    let mut screen = build_screen(&config, api_key)?;
    let mut permissions = PromptPermissionGate::new(config, Config::config_file_path()?);

    match city {
        Some(city) => {
            screen.set_city_input(city.trim());
            search(&mut screen, &mut permissions).await;
        }
        None => wait_for_icon(&mut screen).await,
    }

    render(screen.widgets());
    Ok(())
}

async fn interactive() -> Result<()> {
    let config = Config::load()?;
    let api_key = api_key_for(&config, true)?;
    let mut screen = build_screen(&config, api_key)?;
    let mut permissions = PromptPermissionGate::new(config, Config::config_file_path()?);

    wait_for_icon(&mut screen).await;
    render(screen.widgets());

    loop {
        let current = screen.widgets().city_input.clone();
        let city = tokio::task::spawn_blocking(move || {
            inquire::Text::new("City:")
                .with_initial_value(&current)
                .prompt_skippable()
        })
        .await?
        .context("Failed to read city name")?;

        let Some(city) = city.filter(|c| !c.trim().is_empty()) else {
            break;
        };

        screen.set_city_input(city.trim());
        search(&mut screen, &mut permissions).await;
        render(screen.widgets());
    }

    Ok(())
}

/// Showing the saved result works offline without a key; searching needs one.
fn api_key_for(config: &Config, will_search: bool) -> Result<String> {
    match config.api_key() {
        Ok(key) => Ok(key),
        Err(_) if !will_search => Ok(String::new()),
        Err(err) => Err(err),
    }
}

fn build_screen(config: &Config, api_key: String) -> Result<WeatherScreen> {
    let client = OpenWeatherClient::with_base_url(config.base_url(), api_key.clone())?;
    let repository = WeatherRepository::new(Arc::new(client));
    let view_model = WeatherViewModel::new(repository, api_key);
    let preferences = Preferences::open(Config::preferences_path()?)?;

    Ok(WeatherScreen::new(
        view_model,
        preferences,
        Arc::new(HttpIconLoader::new()),
    ))
}

/// Press search and block until the fetch has been rendered.
async fn search(screen: &mut WeatherScreen, permissions: &mut PromptPermissionGate) {
    if !screen.on_search_clicked(permissions).await {
        println!("Location permission denied; nothing fetched.");
        return;
    }

    while let Some(event) = screen.next_event().await {
        debug!(?event, "screen event");
        if matches!(event, ScreenEvent::WeatherShown | ScreenEvent::ErrorShown(_)) {
            break;
        }
    }

    wait_for_icon(screen).await;
}

async fn wait_for_icon(screen: &mut WeatherScreen) {
    while screen.widgets().icon.is_loading() {
        match tokio::time::timeout(ICON_WAIT, screen.next_event()).await {
            Ok(Some(event)) => debug!(?event, "screen event"),
            Ok(None) | Err(_) => break,
        }
    }
}
