//! User-facing application settings.
//!
//! Settings live in a JSON file next to the data snapshot so they stay
//! human-editable. Missing or unreadable files fall back to defaults.

use std::path::PathBuf;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

const SETTINGS_PATH_ENV: &str = "TERRAWATCH_SETTINGS_PATH";
const DEFAULT_SETTINGS_FILE: &str = "terrawatch_settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapCenter {
    Us,
    Europe,
    Asia,
    Auto,
}

/// Per-module enable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleToggles {
    pub flood: bool,
    pub wildfire: bool,
    pub microplastic: bool,
    pub heat_island: bool,
    pub eco_route: bool,
}

impl Default for ModuleToggles {
    fn default() -> Self {
        Self {
            flood: true,
            wildfire: true,
            microplastic: true,
            heat_island: true,
            eco_route: true,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub units: Units,
    pub map_center: MapCenter,
    pub refresh_interval_secs: u32,
    pub show_wildfire_hotspots: bool,
    pub show_alert_markers: bool,
    pub modules: ModuleToggles,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            units: Units::Metric,
            map_center: MapCenter::Us,
            refresh_interval_secs: 30,
            show_wildfire_hotspots: true,
            show_alert_markers: true,
            modules: ModuleToggles::default(),
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct SettingsPath(pub PathBuf);

impl Default for SettingsPath {
    fn default() -> Self {
        let path = std::env::var(SETTINGS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_FILE));
        Self(path)
    }
}

/// Request the current settings be written to disk.
#[derive(Event, Debug, Clone, Default)]
pub struct SaveSettings;

fn load_settings_on_startup(path: Res<SettingsPath>, mut settings: ResMut<AppSettings>) {
    let bytes = match std::fs::read(&path.0) {
        Ok(bytes) => bytes,
        Err(_) => return,
    };
    match serde_json::from_slice::<AppSettings>(&bytes) {
        Ok(loaded) => {
            info!("loaded settings from {}", path.0.display());
            *settings = loaded;
        }
        Err(e) => warn!(
            "ignoring unreadable settings file {}: {e}",
            path.0.display()
        ),
    }
}

fn write_settings_on_request(
    mut requests: EventReader<SaveSettings>,
    path: Res<SettingsPath>,
    settings: Res<AppSettings>,
) {
    if requests.read().next().is_none() {
        return;
    }
    let json = match serde_json::to_vec_pretty(&*settings) {
        Ok(json) => json,
        Err(e) => {
            warn!("failed to serialize settings: {e}");
            return;
        }
    };
    match store::atomic_write::atomic_write(&path.0, &json) {
        Ok(()) => info!("settings written to {}", path.0.display()),
        Err(e) => warn!("failed to write settings {}: {e}", path.0.display()),
    }
}

pub struct SettingsPlugin;

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppSettings>()
            .init_resource::<SettingsPath>()
            .add_event::<SaveSettings>()
            .add_systems(Startup, load_settings_on_startup)
            .add_systems(Update, write_settings_on_request);
    }
}
