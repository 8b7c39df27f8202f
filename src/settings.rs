use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_THEME: &str = "dark_blue";

/// A selectable color theme: sidebar primary plus accent secondary
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThemePalette {
    pub name: &'static str,
    pub label: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
}

pub const THEMES: &[ThemePalette] = &[
    ThemePalette {
        name: "dark_blue",
        label: "Dark Blue (Default)",
        primary: "#191970",
        secondary: "#1E3A8A",
    },
    ThemePalette {
        name: "midnight_purple",
        label: "Midnight Purple",
        primary: "#2D1B69",
        secondary: "#4B0082",
    },
    ThemePalette {
        name: "dark_red",
        label: "Dark Red",
        primary: "#8B0000",
        secondary: "#A52A2A",
    },
    ThemePalette {
        name: "forest_dark",
        label: "Forest Dark",
        primary: "#2F4F4F",
        secondary: "#3B5323",
    },
    ThemePalette {
        name: "ocean_dark",
        label: "Ocean Dark",
        primary: "#1A3C40",
        secondary: "#204E4A",
    },
];

pub fn theme_by_name(name: &str) -> Option<&'static ThemePalette> {
    THEMES.iter().find(|theme| theme.name == name)
}

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub theme: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl AppSettings {
    /// Load settings from disk; a missing or unreadable file falls back to
    /// defaults so a broken settings file can never block startup
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error loading settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_dark_blue() {
        let settings = AppSettings::default();
        assert_eq!(settings.theme, "dark_blue");
        assert!(theme_by_name(&settings.theme).is_some());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let settings = AppSettings {
            theme: "ocean_dark".to_string(),
        };
        settings.save(&path).unwrap();

        assert_eq!(AppSettings::load(&path), settings);
    }

    #[test]
    fn missing_or_garbled_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            AppSettings::load(&dir.path().join("absent.json")),
            AppSettings::default()
        );

        let garbled = dir.path().join("settings.json");
        fs::write(&garbled, "{not json").unwrap();
        assert_eq!(AppSettings::load(&garbled), AppSettings::default());
    }

    #[test]
    fn every_theme_is_resolvable_by_name() {
        assert_eq!(THEMES.len(), 5);
        for theme in THEMES {
            assert_eq!(theme_by_name(theme.name).unwrap().label, theme.label);
            assert!(theme.primary.starts_with('#'));
            assert!(theme.secondary.starts_with('#'));
        }
        assert!(theme_by_name("solarized").is_none());
    }
}
