/// Browser localStorage as a config store
use web_sys::Storage;
use zeta_core::config::{ConfigError, KeyValueStore};

fn unavailable(e: wasm_bindgen::JsValue) -> ConfigError {
    ConfigError::Unavailable(format!("{e:?}"))
}

pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn open() -> Result<Self, ConfigError> {
        let window = web_sys::window().ok_or_else(|| ConfigError::Unavailable("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(unavailable)?
            .ok_or_else(|| ConfigError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        self.storage.get_item(key).map_err(unavailable)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.storage.set_item(key, value).map_err(unavailable)
    }

    fn remove(&mut self, key: &str) -> Result<(), ConfigError> {
        self.storage.remove_item(key).map_err(unavailable)
    }

    fn clear(&mut self) -> Result<(), ConfigError> {
        self.storage.clear().map_err(unavailable)
    }
}
