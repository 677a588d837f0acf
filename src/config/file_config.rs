//! Configuration file discovery and creation.
//!
//! Files are looked up in this order:
//!
//! 1. `./scholar-lens.toml`
//! 2. `<config dir>/scholar-lens/config.toml` (`$XDG_CONFIG_HOME` on Linux)
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000"
//! timeout_seconds = 15
//! connect_timeout_seconds = 5
//!
//! [search]
//! page_radius = 2
//!
//! [classifier]
//! debounce_ms = 800
//! sample_categories = ["business", "health", "politics"]
//!
//! [retry]
//! max_attempts = 2
//! initial_delay_ms = 250
//! max_delay_ms = 2000
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use std::path::{Path, PathBuf};

use super::Config;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "scholar-lens.toml";

/// File name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

const APP_DIR: &str = "scholar-lens";

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Config file already exists: {0}")]
    Exists(PathBuf),

    #[error("Could not determine a config directory")]
    NoConfigDir,
}

/// Per-user config file location, whether or not it exists
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// First existing config file in the standard locations
pub fn find_config_file() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_in(&cwd, dirs::config_dir().as_deref())
}

/// First existing config file under `cwd` or `config_dir`
pub fn find_config_file_in(cwd: &Path, config_dir: Option<&Path>) -> Option<PathBuf> {
    let local = cwd.join(LOCAL_CONFIG_FILE_NAME);
    let user = config_dir.map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME));

    std::iter::once(local)
        .chain(user)
        .find(|candidate| candidate.is_file())
}

/// Write the default configuration to `path`, or the per-user location
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_default_config(path: Option<&Path>, force: bool) -> Result<PathBuf, ConfigFileError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path().ok_or(ConfigFileError::NoConfigDir)?,
    };

    if path.exists() && !force {
        return Err(ConfigFileError::Exists(path));
    }

    let content = Config::default()
        .to_toml()
        .map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }
    std::fs::write(&path, content).map_err(|e| ConfigFileError::Io(e.to_string()))?;

    tracing::info!("Wrote default configuration to {}", path.display());
    Ok(path)
}
