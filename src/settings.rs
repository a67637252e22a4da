//! Player preferences: palette and dots per color
//!
//! Persisted as JSON in LocalStorage (web) or a settings file (native).
//! The engine only sees the applied values; drafts and forms belong to the UI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clamp_dots_per_color;
use crate::consts::DEFAULT_DOTS_PER_COLOR;

/// Built-in palette: yellow, cyan, fuchsia, white
pub const DEFAULT_COLORS: [&str; 4] = ["#FACC15", "#22D3EE", "#E879F9", "#FFFFFF"];

/// Used when a player removes every color
pub const FALLBACK_COLOR: &str = "#FFFFFF";

/// Errors from parsing or persisting settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A palette entry is not `#RRGGBB` / `#RGB`
    #[error("invalid color {0:?}")]
    InvalidColor(String),
    /// Stored settings could not be (de)serialized
    #[error("serde error: {0}")]
    Json(#[from] serde_json::Error),
    /// Settings file could not be read or written
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 8-bit sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FromStr for Rgb {
    type Err = SettingsError;

    /// Parse `#RRGGBB` or `#RGB` (leading `#` optional, case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SettingsError::InvalidColor(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize, len: usize| u8::from_str_radix(&hex[i..i + len], 16);
        match hex.len() {
            6 => Ok(Rgb {
                r: channel(0, 2).map_err(|_| invalid())?,
                g: channel(2, 2).map_err(|_| invalid())?,
                b: channel(4, 2).map_err(|_| invalid())?,
            }),
            3 => {
                let short = |i| channel(i, 1).map(|v| v * 17).map_err(|_| invalid());
                Ok(Rgb {
                    r: short(0)?,
                    g: short(1)?,
                    b: short(2)?,
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Parsed palette, indexed by `ColorKey`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(pub Vec<Rgb>);

impl Palette {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Color for a dot's key; out-of-range keys render gray
    pub fn color_for(&self, key: crate::sim::ColorKey) -> Rgb {
        self.0.get(key.index()).copied().unwrap_or(Rgb {
            r: 0x9C,
            g: 0xA3,
            b: 0xAF,
        })
    }
}

/// Persisted puzzle preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Palette as hex strings, in color-key order
    pub colors: Vec<String>,
    /// Dots spawned for each color
    pub dots_per_color: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
            dots_per_color: DEFAULT_DOTS_PER_COLOR,
        }
    }
}

impl Settings {
    /// Values a session should actually start with
    ///
    /// An empty palette falls back to a single white color and the dot count
    /// is clamped.
    pub fn applied(&self) -> Self {
        let colors = if self.colors.is_empty() {
            vec![FALLBACK_COLOR.to_string()]
        } else {
            self.colors.clone()
        };
        Self {
            colors,
            dots_per_color: clamp_dots_per_color(self.dots_per_color as i64),
        }
    }

    /// Parse every palette entry
    pub fn palette(&self) -> Result<Palette, SettingsError> {
        self.colors
            .iter()
            .map(|c| c.parse())
            .collect::<Result<Vec<Rgb>, _>>()
            .map(Palette)
    }

    /// Append a color (the settings form adds white)
    pub fn add_color(&mut self, color: Rgb) {
        self.colors.push(color.to_string());
    }

    /// Replace the color at `index`; out-of-range indices are ignored
    pub fn replace_color(&mut self, index: usize, color: Rgb) {
        if let Some(slot) = self.colors.get_mut(index) {
            *slot = color.to_string();
        }
    }

    /// Remove the color at `index`, always keeping at least one
    pub fn remove_color(&mut self, index: usize) -> bool {
        if self.colors.len() <= 1 || index >= self.colors.len() {
            return false;
        }
        self.colors.remove(index);
        true
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "color_cluster_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Load settings from a JSON file, falling back to defaults if it is missing
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write settings as JSON
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
