//! Persisted user preference

use crate::error::Result;
use crate::get_config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const PREFERENCES_FILE: &str = "preferences.yaml";

/// The one value kept between sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Preferences {
    pub fn path() -> Result<PathBuf> {
        Ok(get_config_dir()?.join(PREFERENCES_FILE))
    }

    /// Load from the user configuration directory; missing means empty
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        tracing::debug!("Saved preferences to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CONFIG_DIR_ENV;
    use serial_test::serial;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load_from(&temp_dir.path().join("nope.yaml")).unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sub").join(PREFERENCES_FILE);

        let prefs = Preferences {
            language: Some("en".to_string()),
        };
        prefs.save_to(&path).unwrap();
        assert_eq!(Preferences::load_from(&path).unwrap(), prefs);
    }

    #[test]
    #[serial]
    fn test_default_location_follows_config_dir() {
        let temp_dir = tempfile::tempdir().unwrap();

        temp_env::with_var(CONFIG_DIR_ENV, Some(temp_dir.path()), || {
            let path = Preferences {
                language: Some("pt".to_string()),
            }
            .save()
            .unwrap();
            assert_eq!(path, temp_dir.path().join(PREFERENCES_FILE));
            assert_eq!(Preferences::load().unwrap().language.as_deref(), Some("pt"));
        });
    }
}
