//! Configuration structs and their persistence.
//!
//! Every owner constructs its own [`ModuleConfig`] and loads or saves it
//! explicitly against a [`KeyValueStore`].
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::projection::Viewport;

pub const APP_VERSION_KEY: &str = "app-version";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError>;
    fn remove(&mut self, key: &str) -> Result<(), ConfigError>;
    fn clear(&mut self) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ConfigError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ConfigError> {
        self.entries.clear();
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ConfigError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, ConfigError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(ConfigError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let path = self.path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let path = self.path(key)?;
        fs::write(&path, value).map_err(|source| ConfigError::Io { path, source })
    }

    fn remove(&mut self, key: &str) -> Result<(), ConfigError> {
        let path = self.path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    fn clear(&mut self) -> Result<(), ConfigError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ConfigError::Io {
            path: self.dir.clone(),
            source,
        })?;
        for entry in entries {
            let path = entry
                .map_err(|source| ConfigError::Io {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

/// A config value with its initial state and optional storage key.
/// Without a key it lives in memory only.
#[derive(Debug, Clone)]
pub struct ModuleConfig<T> {
    pub data: T,
    initial: T,
    storage_key: Option<String>,
}

impl<T: Serialize + DeserializeOwned + Clone> ModuleConfig<T> {
    pub fn new(initial: T, storage_key: Option<&str>) -> Self {
        Self {
            data: initial.clone(),
            initial,
            storage_key: storage_key.filter(|key| !key.is_empty()).map(str::to_owned),
        }
    }

    /// Creates the config and loads any stored value.
    pub fn load_from(initial: T, storage_key: Option<&str>, store: &dyn KeyValueStore) -> Self {
        let mut config = Self::new(initial, storage_key);
        config.load(store);
        config
    }

    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    pub fn is_persistable(&self) -> bool {
        self.storage_key.is_some()
    }

    /// Replaces `data` with the stored value. Returns false, keeping `data`
    /// as is, when nothing usable is stored.
    pub fn load(&mut self, store: &dyn KeyValueStore) -> bool {
        let Some(key) = &self.storage_key else {
            return false;
        };
        let raw = match store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::info!("no configuration {key} stored");
                return false;
            }
            Err(e) => {
                log::error!("loading configuration {key} failed: {e}");
                return false;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(data) => {
                self.data = data;
                log::info!("configuration {key} loaded");
                true
            }
            Err(e) => {
                log::error!("configuration {key} is not readable: {e}");
                false
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), ConfigError> {
        let Some(key) = &self.storage_key else {
            log::debug!("configuration not persistable, not saved");
            return Ok(());
        };
        let raw = serde_json::to_string(&self.data).map_err(|source| ConfigError::Serialize {
            key: key.clone(),
            source,
        })?;
        store.set(key, &raw)?;
        log::info!("configuration {key} saved");
        Ok(())
    }

    pub fn reset(&mut self) {
        self.data = self.initial.clone();
    }

    /// Removes the stored value. `data` is left untouched.
    pub fn clear(&self, store: &mut dyn KeyValueStore) -> Result<(), ConfigError> {
        match &self.storage_key {
            Some(key) => store.remove(key),
            None => Ok(()),
        }
    }
}

/// Wipes `store` when it was written by another application version.
/// Returns whether it was cleared.
pub fn check_app_version(
    store: &mut dyn KeyValueStore,
    version: &str,
) -> Result<bool, ConfigError> {
    let stored = store.get(APP_VERSION_KEY)?;
    if stored.as_deref() == Some(version) {
        return Ok(false);
    }
    log::info!(
        "stored version {stored:?} does not match app version {version}, clearing configuration"
    );
    store.clear()?;
    store.set(APP_VERSION_KEY, version)?;
    Ok(true)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MainConfig {
    pub current_world_id: u32,
    pub world_tick_ms: u64,
    pub switch_delay_ms: u64,
}

impl MainConfig {
    pub const STORAGE_KEY: &'static str = "mainConfig";
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            current_world_id: 1,
            world_tick_ms: 40,
            switch_delay_ms: 100,
        }
    }
}

/// Size class of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageMode {
    Default,
    Small,
    Immersive { width: f64, height: f64 },
}

impl StageMode {
    const SMALL_BELOW_WIDTH: f64 = 1300.0;

    /// Immersive when the window fills the screen, small on narrow windows.
    pub fn evaluate(window: Viewport, screen: Viewport) -> Self {
        if window == screen {
            Self::Immersive {
                width: window.width,
                height: window.height,
            }
        } else if window.width < Self::SMALL_BELOW_WIDTH {
            Self::Small
        } else {
            Self::Default
        }
    }

    pub fn viewport(&self) -> Viewport {
        match *self {
            Self::Default => Viewport::new(1280.0, 720.0),
            Self::Small => Viewport::new(800.0, 450.0),
            Self::Immersive { width, height } => Viewport::new(width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        speed: u32,
    }

    #[test]
    fn test_save_load_reset() {
        let mut store = MemoryStore::new();
        let mut config = ModuleConfig::new(Sample { speed: 1 }, Some("sample"));
        assert!(!config.load(&store));

        config.data.speed = 7;
        config.save(&mut store).unwrap();

        let loaded = ModuleConfig::load_from(Sample { speed: 1 }, Some("sample"), &store);
        assert_eq!(loaded.data, Sample { speed: 7 });

        config.reset();
        assert_eq!(config.data, Sample { speed: 1 });

        config.clear(&mut store).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_unparsable_value_keeps_initial() {
        let mut store = MemoryStore::new();
        store.set("sample", "{not json").unwrap();
        let config = ModuleConfig::load_from(Sample { speed: 3 }, Some("sample"), &store);
        assert_eq!(config.data, Sample { speed: 3 });
    }

    #[test]
    fn test_without_key_nothing_is_stored() {
        let mut store = MemoryStore::new();
        let config = ModuleConfig::new(Sample { speed: 2 }, None);
        assert!(!config.is_persistable());
        config.save(&mut store).unwrap();
        assert!(store.is_empty());
        assert!(!ModuleConfig::new(Sample { speed: 2 }, Some("")).is_persistable());
    }

    #[test]
    fn test_version_check_clears_on_change() {
        let mut store = MemoryStore::new();
        assert!(check_app_version(&mut store, "1.0.0").unwrap());
        store.set("mainConfig", "{}").unwrap();
        assert!(!check_app_version(&mut store, "1.0.0").unwrap());
        assert_eq!(store.len(), 2);

        assert!(check_app_version(&mut store, "1.1.0").unwrap());
        assert_eq!(store.get("mainConfig").unwrap(), None);
        assert_eq!(store.get(APP_VERSION_KEY).unwrap().as_deref(), Some("1.1.0"));
    }

    #[test]
    fn test_main_config_defaults_and_partial_json() {
        let config: MainConfig = serde_json::from_str(r#"{"currentWorldId": 2}"#).unwrap();
        assert_eq!(config.current_world_id, 2);
        assert_eq!(config.world_tick_ms, 40);
        assert_eq!(config.switch_delay_ms, 100);
    }

    #[test]
    fn test_stage_mode() {
        let screen = Viewport::new(1920.0, 1080.0);
        assert_eq!(
            StageMode::evaluate(screen, screen),
            StageMode::Immersive {
                width: 1920.0,
                height: 1080.0
            }
        );
        assert_eq!(StageMode::evaluate(Viewport::new(1200.0, 900.0), screen), StageMode::Small);
        assert_eq!(StageMode::evaluate(Viewport::new(1400.0, 900.0), screen), StageMode::Default);
        assert_eq!(StageMode::Small.viewport(), Viewport::new(800.0, 450.0));
    }

    #[test]
    fn test_file_store() {
        let dir = std::env::temp_dir().join(format!("zeta-store-{}", std::process::id()));
        let mut store = FileStore::open(&dir).unwrap();
        assert_eq!(store.get("mainConfig").unwrap(), None);

        store.set("mainConfig", r#"{"currentWorldId":3}"#).unwrap();
        assert_eq!(store.get("mainConfig").unwrap().as_deref(), Some(r#"{"currentWorldId":3}"#));
        assert!(matches!(store.set("../escape", "x"), Err(ConfigError::InvalidKey(_))));

        store.clear().unwrap();
        assert_eq!(store.get("mainConfig").unwrap(), None);
        store.remove("mainConfig").unwrap();
        let _ = fs::remove_dir_all(&dir);
    }
}
