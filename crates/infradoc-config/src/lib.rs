pub mod error;
pub mod preferences;
pub mod settings;

pub use error::*;
pub use preferences::Preferences;
pub use settings::Settings;

use std::path::PathBuf;

pub const CONFIG_PATH_ENV: &str = "INFRADOC_CONFIG_PATH";
pub const CONFIG_DIR_ENV: &str = "INFRADOC_CONFIG_DIR";

const CANDIDATES: [&str; 2] = ["infradoc.local.yaml", "infradoc.yaml"];

/// infradoc's per-user configuration directory, created on first use.
///
/// `INFRADOC_CONFIG_DIR` replaces `~/.config/infradoc`.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::config_dir()
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join("infradoc"),
    };

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Locate the settings file
///
/// Search order:
/// 1. `INFRADOC_CONFIG_PATH` (direct path)
/// 2. current directory: infradoc.local.yaml, infradoc.yaml
/// 3. `./.infradoc/`, same order
/// 4. the user configuration directory
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points to a missing file: {}", CONFIG_PATH_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(".infradoc");
    if project_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    let global = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) => Some(PathBuf::from(dir)),
        None => dirs::config_dir().map(|d| d.join("infradoc")),
    };
    if let Some(dir) = global {
        let path = dir.join("infradoc.yaml");
        if path.exists() {
            return Ok(path);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}
