use log::warn;

use crate::config::SETTINGS_KEY;
use crate::errors::CoreError;
use crate::models::settings::BacktestSettings;

use super::traits::PreferenceStore;

/// Reads and writes the `BacktestSettings` document through a preference store.
pub struct SettingsManager;

impl SettingsManager {
    /// Serialize settings to the JSON stored under [`SETTINGS_KEY`].
    pub fn to_json(settings: &BacktestSettings) -> Result<String, CoreError> {
        serde_json::to_string(settings)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize settings: {e}")))
    }

    pub fn from_json(json: &str) -> Result<BacktestSettings, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize settings: {e}")))
    }

    /// Stored settings, or defaults when nothing usable is stored.
    pub fn load(store: &dyn PreferenceStore) -> BacktestSettings {
        let Some(json) = store.load(SETTINGS_KEY) else {
            return BacktestSettings::default();
        };
        Self::from_json(&json).unwrap_or_else(|e| {
            warn!("ignoring stored settings: {e}");
            BacktestSettings::default()
        })
    }

    pub fn save(store: &dyn PreferenceStore, settings: &BacktestSettings) -> Result<(), CoreError> {
        let json = Self::to_json(settings)?;
        store.save(SETTINGS_KEY, &json)
    }
}
