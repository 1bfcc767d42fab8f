pub mod actions;
mod defaults;
pub mod key;
pub mod keybindings;
pub mod loader;
pub mod resolver;

use std::path::PathBuf;

pub use actions::*;
use keybindings::KeybindingsConfig;
pub use loader::{data_dir, load};
pub use resolver::KeyResolver;
use serde::{Deserialize, Serialize};

use crate::theme::ThemePreference;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Where the initial light/dark choice comes from.
    pub preference: ThemePreference,
    /// Palette used in dark mode.
    pub dark: String,
    /// Palette used in light mode.
    pub light: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            preference: ThemePreference::System,
            dark: "Catppuccin Mocha".to_string(),
            light: "Catppuccin Latte".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Session file location. Defaults to the user's local data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub theme: ThemeConfig,
    pub storage: StorageConfig,
    pub keybindings: KeybindingsConfig,
}

impl AppConfig {
    pub fn session_path(&self) -> PathBuf {
        self.storage.path.clone().unwrap_or_else(|| {
            data_dir().map_or_else(|| PathBuf::from("session.toml"), |d| d.join("session.toml"))
        })
    }
}
