use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FuelError, Result};
use crate::present::LayoutKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Spreadsheet opened when a command is given no file.
    #[serde(default)]
    pub default_file: Option<String>,
    #[serde(default)]
    pub layout: LayoutKind,
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("fuelboard")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring malformed {}: {e}", path.display());
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| FuelError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn settings_location() -> PathBuf {
    settings_path()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

/// Explicit argument first, then the configured default file.
pub fn resolve_file(arg: Option<&str>, settings: &Settings) -> Result<PathBuf> {
    arg.map(str::to_string)
        .or_else(|| settings.default_file.clone())
        .map(PathBuf::from)
        .ok_or_else(|| {
            FuelError::Other(
                "No spreadsheet given. Pass a FILE or set one with `fuelboard config --file`."
                    .into(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            default_file: Some("/tmp/abastecimentos.xlsx".to_string()),
            layout: LayoutKind::Compact,
        };
        save_settings_to(&settings, &path).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("absent.json"));
        assert_eq!(s.default_file, None);
        assert_eq!(s.layout, LayoutKind::Wide);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"default_file": "/data/fuel.xlsx"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.layout, LayoutKind::Wide);
        assert_eq!(s.default_file.as_deref(), Some("/data/fuel.xlsx"));
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn test_resolve_file_prefers_argument() {
        let settings = Settings {
            default_file: Some("configured.xlsx".into()),
            ..Settings::default()
        };
        assert_eq!(
            resolve_file(Some("given.csv"), &settings).unwrap(),
            PathBuf::from("given.csv")
        );
        assert_eq!(
            resolve_file(None, &settings).unwrap(),
            PathBuf::from("configured.xlsx")
        );
        assert!(resolve_file(None, &Settings::default()).is_err());
    }
}
