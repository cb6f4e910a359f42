use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const EXPORT_FILE_NAME: &str = "sales_dashboard_export.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_fragment_path")]
    pub fragment_path: String,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_show_editor")]
    pub show_editor: bool,
}

fn default_credentials_path() -> String {
    config_dir().join("credentials.json").to_string_lossy().to_string()
}

fn default_fragment_path() -> String {
    config_dir().join("partial.html").to_string_lossy().to_string()
}

fn default_export_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("salesdash")
        .to_string_lossy()
        .to_string()
}

fn default_accent_color() -> String {
    "#2E86C1".to_string()
}

fn default_top_n() -> usize {
    5
}

fn default_show_editor() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            fragment_path: default_fragment_path(),
            export_dir: default_export_dir(),
            accent_color: default_accent_color(),
            top_n: default_top_n(),
            show_editor: default_show_editor(),
        }
    }
}

impl Settings {
    pub fn credentials_path(&self) -> PathBuf {
        PathBuf::from(expand_path(&self.credentials_path))
    }

    pub fn fragment_path(&self) -> PathBuf {
        PathBuf::from(expand_path(&self.fragment_path))
    }

    pub fn export_path(&self) -> PathBuf {
        PathBuf::from(expand_path(&self.export_dir)).join(EXPORT_FILE_NAME)
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("salesdash")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("ignoring unreadable settings at {}: {e}", path.display());
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

/// Expand a leading `~` to the home directory.
pub fn expand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}
