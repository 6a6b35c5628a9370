//! World contract and the wrapper the runtime drives.
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, Perspective};
use crate::channel::{Observable, Watch};
use crate::config::{ConfigError, KeyValueStore, ModuleConfig};
use crate::scene::WorldState;

/// Producer of world-space snapshots. How a snapshot comes about is up to
/// the implementation.
pub trait WorldContent {
    fn name(&self) -> &str;

    fn background_color(&self) -> Option<&str> {
        Some("#fff")
    }

    fn default_perspective(&self) -> Perspective {
        Perspective::default()
    }

    /// Key the world config is persisted under. `None` keeps it in memory.
    fn storage_key(&self) -> Option<&str> {
        None
    }

    /// State at tick `t`. Called with `t = 0` once on creation, then with
    /// increasing `t`.
    fn snapshot_at(&mut self, t: u64) -> WorldState;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldConfig {
    pub camera_perspective: Perspective,
}

pub struct World {
    content: Box<dyn WorldContent>,
    t: u64,
    state: Observable<WorldState>,
    config: ModuleConfig<WorldConfig>,
    camera: Option<Watch<Perspective>>,
}

impl World {
    pub fn new(mut content: Box<dyn WorldContent>, store: &dyn KeyValueStore) -> Self {
        let initial = WorldConfig {
            camera_perspective: content.default_perspective(),
        };
        let config = ModuleConfig::load_from(initial, content.storage_key(), store);
        let state = Observable::new(content.snapshot_at(0));
        log::info!("world {} created", content.name());
        Self {
            content,
            t: 0,
            state,
            config,
            camera: None,
        }
    }

    pub fn name(&self) -> &str {
        self.content.name()
    }

    pub fn background_color(&self) -> Option<&str> {
        self.content.background_color()
    }

    pub fn t(&self) -> u64 {
        self.t
    }

    /// Replaying snapshot stream. Equal consecutive snapshots are not
    /// published again.
    pub fn subscribe(&self) -> Watch<WorldState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WorldState {
        self.state.latest()
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config.data
    }

    /// Advances to the next tick.
    pub fn tick(&mut self) {
        self.persist_camera();
        self.t += 1;
        let next = self.content.snapshot_at(self.t);
        self.state.modify_if(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Puts the saved pose on `camera` and keeps following its changes.
    pub fn mount_camera(&mut self, camera: &Camera) {
        camera.mount(&self.config.data.camera_perspective);
        let mut watch = camera.subscribe();
        // the mounted pose is already known
        watch.poll_with(|_| ());
        self.camera = Some(watch);
    }

    pub fn reset_config(&mut self) {
        self.config.reset();
    }

    /// Saves the config and stops following the camera.
    pub fn on_destroy(&mut self, store: &mut dyn KeyValueStore) -> Result<(), ConfigError> {
        self.persist_camera();
        self.camera = None;
        log::info!("world {} destroyed at t = {}", self.name(), self.t);
        self.config.save(store)
    }

    fn persist_camera(&mut self) {
        if let Some(perspective) = self.camera.as_mut().and_then(Watch::poll) {
            self.config.data.camera_perspective = perspective;
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("name", &self.content.name())
            .field("t", &self.t)
            .field("config", &self.config)
            .finish()
    }
}
