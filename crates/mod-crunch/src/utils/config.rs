//! Application configuration management utilities.

use camino::Utf8PathBuf;
use directories_next::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::Path;

/// Application-wide configuration stored in config.toml.
///
/// Command line flags override these per run.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_root: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_root: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_root: Option<Utf8PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_root_name: Option<String>,
    pub nomunge: bool,
    pub thumbnails: bool,
}

impl AppConfig {
    /// Output root to use when neither the flag nor the file sets one.
    pub fn resolved_output_root(&self) -> Utf8PathBuf {
        self.output_root
            .clone()
            .or_else(default_output_root)
            .unwrap_or_else(|| Utf8PathBuf::from("crunch-index"))
    }

    /// Game documents directory, from the file or the user's documents folder.
    pub fn resolved_documents_root(&self) -> Option<Utf8PathBuf> {
        self.documents_root.clone().or_else(|| {
            let user_dirs = UserDirs::new()?;
            let documents = user_dirs.document_dir()?;
            let documents = Utf8PathBuf::from_path_buf(documents.to_path_buf()).ok()?;
            Some(crunch_core::game_documents_root(&documents))
        })
    }
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns a config file path located next to the executable.
pub fn config_path(file_name: &str) -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join(file_name))
}

/// Returns the default configuration file path (config.toml).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    config_path("config.toml")
}

/// Per-user data directory for the index when none is configured.
pub fn default_output_root() -> Option<Utf8PathBuf> {
    let dirs = ProjectDirs::from("", "", "mod-crunch")?;
    let data_dir = Utf8PathBuf::from_path_buf(dirs.data_dir().to_path_buf()).ok()?;
    Some(data_dir.join("index"))
}

/// Loads the application configuration from config.toml.
/// Returns default configuration if file doesn't exist or cannot be parsed.
pub fn load_config() -> AppConfig {
    if let Some(path) = default_config_path() {
        if Path::new(path.as_str()).exists() {
            if let Ok(content) = fs::read_to_string(path.as_str()) {
                match toml::from_str(&content) {
                    Ok(cfg) => return cfg,
                    Err(e) => tracing::warn!("Ignoring unreadable {}: {}", path, e),
                }
            }
        }
    }
    AppConfig::default()
}

/// Saves the application configuration to config.toml.
pub fn save_config(cfg: &AppConfig) -> io::Result<()> {
    if let Some(path) = default_config_path() {
        let content = toml::to_string_pretty(cfg).map_err(io::Error::other)?;
        fs::write(path.as_str(), content)
    } else {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine config path",
        ))
    }
}
