mod settings_store;

pub use settings_store::{APP_NAME, SettingsStore};
