//! Persistence for [`AlembicSettings`] through confy.

use std::path::Path;

use alembic_types::AlembicSettings;

use crate::error::Result;

/// confy application name; the file lands in the platform config dir.
pub const APP_NAME: &str = "alembic";

pub trait SettingsStore: Sized {
    /// Load from the default location, falling back to defaults on any error.
    fn load() -> Self;
    fn save(&self) -> Result<()>;
    fn load_path(path: &Path) -> Result<Self>;
    fn save_path(&self, path: &Path) -> Result<()>;
}

impl SettingsStore for AlembicSettings {
    fn load() -> Self {
        match confy::load(APP_NAME, None) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load settings, using defaults");
                Self::default()
            }
        }
    }

    fn save(&self) -> Result<()> {
        confy::store(APP_NAME, None, self)?;
        tracing::debug!(
            versatile_vials = self.versatile_vials,
            daily_preparations = self.daily_preparations,
            "Saved settings"
        );
        Ok(())
    }

    fn load_path(path: &Path) -> Result<Self> {
        Ok(confy::load_path(path)?)
    }

    fn save_path(&self, path: &Path) -> Result<()> {
        confy::store_path(path, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("alembic-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn save_then_load_path() {
        let path = scratch("roundtrip.toml");
        let settings = AlembicSettings {
            versatile_vials: 6,
            daily_preparations: 0,
        };
        settings.save_path(&path).unwrap();
        assert_eq!(AlembicSettings::load_path(&path).unwrap(), settings);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = scratch("fresh.toml");
        let _ = std::fs::remove_file(&path);
        assert_eq!(
            AlembicSettings::load_path(&path).unwrap(),
            AlembicSettings::default()
        );
        assert!(path.exists());
    }
}
