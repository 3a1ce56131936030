use crate::errors::CoreError;

/// Key-value capability for user preferences.
///
/// Implementations live outside the engine (browser local storage, a file,
/// memory). Loading never fails, it just yields `None`; a failed save is
/// reported but the session only logs it, so preferences are best-effort.
pub trait PreferenceStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;

    fn save(&self, key: &str, value: &str) -> Result<(), CoreError>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for std::sync::Arc<T> {
    fn load(&self, key: &str) -> Option<String> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), CoreError> {
        (**self).save(key, value)
    }
}
