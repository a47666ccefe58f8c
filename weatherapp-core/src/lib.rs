//! Core library for the `weather` client.
//!
//! This crate defines:
//! - The OpenWeatherMap current-weather client and a repository over it
//! - Observable view state fed by background fetches
//! - The weather screen: rendering, search/permission flow, offline cache
//! - Configuration & local preferences storage
//!
//! It is used by `weatherapp-cli`, but the screen only depends on traits, so
//! other front-ends can drive it too.

pub mod client;
pub mod config;
pub mod error;
pub mod icon;
pub mod model;
pub mod observable;
pub mod permission;
pub mod preferences;
pub mod repository;
pub mod screen;
pub mod view_model;

pub use client::{OpenWeatherClient, WeatherService};
pub use config::Config;
pub use error::FetchError;
pub use icon::{HttpIconLoader, IconLoader};
pub use model::{Main, Weather, WeatherResponse};
pub use permission::{Permission, PermissionGate};
pub use preferences::Preferences;
pub use repository::WeatherRepository;
pub use screen::{IconView, ScreenEvent, WeatherScreen, Widgets};
pub use view_model::WeatherViewModel;
