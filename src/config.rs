use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use egui::Color32;
use serde::Deserialize;

use crate::colors::{self, BACKGROUND, CROSSHAIR};
use crate::store::DEFAULT_CAPACITY;

/// User settings read from `settings.json` in the platform config
/// directory. Every field may be left out.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where autonamed drawings and exports go. The working directory
    /// when unset.
    pub save_dir: Option<PathBuf>,
    pub capacity: usize,
    pub background: [u8; 4],
    pub crosshair: [u8; 4],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_dir: None,
            capacity: DEFAULT_CAPACITY,
            background: BACKGROUND.to_array(),
            crosshair: CROSSHAIR.to_array(),
        }
    }
}

impl Settings {
    fn file_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("org", "freehand", "freehand")?;
        Some(dirs.config_dir().join("settings.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("malformed settings")
    }

    /// Falls back to the defaults when there is no usable settings file.
    pub fn load_or_default() -> Self {
        let exists = Self::file_path().is_some_and(|path| path.exists());
        match Self::load() {
            Ok(settings) => settings,
            Err(err) if exists => {
                log::warn!("{err:#}, using default settings");
                Self::default()
            }
            Err(err) => {
                log::debug!("{err:#}, using default settings");
                Self::default()
            }
        }
    }

    pub fn save_dir(&self) -> PathBuf {
        self.save_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn background_color(&self) -> Color32 {
        colors::from_channels(self.background)
    }

    pub fn crosshair_color(&self) -> Color32 {
        colors::from_channels(self.crosshair)
    }
}
