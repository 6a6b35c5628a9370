//! Tick scheduling and world switching.
//!
//! Everything is driven from [`Director::advance`] with a monotonic
//! timestamp, so the same code runs under a terminal loop and a browser
//! animation frame.
use std::time::Duration;

use crate::camera::{Camera, CameraKey, Perspective};
use crate::channel::Watch;
use crate::config::{KeyValueStore, MainConfig, ModuleConfig};
use crate::projection::{Projector, ProjectorConfig, Viewport};
use crate::scene::WorldState;
use crate::shape::CollectionId;
use crate::stage::{BackendError, RenderBackend, Stage, StageConfig};
use crate::world::{World, WorldContent};
use crate::worlds::WORLDS;

pub type WorldFactory = fn(u32) -> Box<dyn WorldContent>;

/// Fires at most once per interval. Missed intervals are dropped, not
/// caught up.
#[derive(Debug, Clone)]
pub struct TickClock {
    interval: Duration,
    next: Option<Duration>,
}

impl TickClock {
    pub fn new(interval: Duration) -> Self {
        Self { interval, next: None }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The first poll starts the clock; it fires one interval later.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.next {
            None => {
                self.next = Some(now + self.interval);
                false
            }
            Some(next) if now >= next => {
                self.next = Some(now + self.interval);
                true
            }
            Some(_) => false,
        }
    }

    pub fn reset(&mut self) {
        self.next = None;
    }
}

#[derive(Debug, Clone)]
pub struct DirectorOptions {
    pub viewport: Viewport,
    pub projector: ProjectorConfig,
    pub stage: StageConfig,
    /// Overrides the stored current world
    pub world: Option<u32>,
    /// Overrides the stored tick interval
    pub tick: Option<Duration>,
    /// Ids the factory knows. Requests for other ids are ignored.
    pub world_ids: Vec<u32>,
}

impl Default for DirectorOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            projector: ProjectorConfig::default(),
            stage: StageConfig::default(),
            world: None,
            tick: None,
            world_ids: WORLDS.iter().map(|&(id, _)| id).collect(),
        }
    }
}

/// A world bound to the camera and its registered collection
#[derive(Debug)]
struct Activation {
    world_id: u32,
    world: World,
    projector: Projector,
    collection: CollectionId,
    world_watch: Watch<WorldState>,
    camera_watch: Watch<Perspective>,
}

#[derive(Debug, Clone, Copy)]
struct PendingSwitch {
    world_id: u32,
    due: Option<Duration>,
}

pub struct Director<B: RenderBackend> {
    camera: Camera,
    stage: Stage<B>,
    store: Box<dyn KeyValueStore>,
    config: ModuleConfig<MainConfig>,
    viewport: Viewport,
    projector_config: ProjectorConfig,
    factory: WorldFactory,
    world_ids: Vec<u32>,
    clock: TickClock,
    activation: Option<Activation>,
    pending: Option<PendingSwitch>,
}

impl<B: RenderBackend> Director<B> {
    /// Loads the main config and activates the current world.
    pub fn new(
        backend: B,
        store: Box<dyn KeyValueStore>,
        factory: WorldFactory,
        options: DirectorOptions,
    ) -> Self {
        let mut config = ModuleConfig::load_from(
            MainConfig::default(),
            Some(MainConfig::STORAGE_KEY),
            store.as_ref(),
        );
        if let Some(world) = options.world {
            config.data.current_world_id = world;
        }
        if !options.world_ids.contains(&config.data.current_world_id) {
            let fallback = options
                .world_ids
                .first()
                .copied()
                .unwrap_or(config.data.current_world_id);
            log::warn!("unknown world {}, starting with {fallback}", config.data.current_world_id);
            config.data.current_world_id = fallback;
        }
        if let Some(tick) = options.tick {
            config.data.world_tick_ms = tick.as_millis().try_into().unwrap_or(u64::MAX);
        }
        let clock = TickClock::new(Duration::from_millis(config.data.world_tick_ms.max(1)));
        let mut director = Self {
            camera: Camera::default(),
            stage: Stage::new(backend, options.stage),
            store,
            config,
            viewport: options.viewport,
            projector_config: options.projector,
            factory,
            world_ids: options.world_ids,
            clock,
            activation: None,
            pending: None,
        };
        director.activate(director.config.data.current_world_id);
        director
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn stage(&self) -> &Stage<B> {
        &self.stage
    }

    pub fn backend(&self) -> &B {
        self.stage.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.stage.backend_mut()
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &MainConfig {
        &self.config.data
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn world_id(&self) -> Option<u32> {
        self.activation.as_ref().map(|a| a.world_id)
    }

    pub fn world_name(&self) -> Option<&str> {
        self.activation.as_ref().map(|a| a.world.name())
    }

    pub fn collection(&self) -> Option<CollectionId> {
        self.activation.as_ref().map(|a| a.collection)
    }

    pub fn is_switching(&self) -> bool {
        self.pending.is_some()
    }

    /// Runs whatever is due at `now`: a pending world switch or a tick.
    /// Returns whether a frame ran.
    pub fn advance(&mut self, now: Duration) -> Result<bool, BackendError> {
        if let Some(pending) = self.pending.as_mut() {
            let delay = Duration::from_millis(self.config.data.switch_delay_ms);
            let due = *pending.due.get_or_insert(now + delay);
            if now < due {
                return Ok(false);
            }
            let world_id = pending.world_id;
            self.pending = None;
            self.deactivate();
            self.activate(world_id);
            self.clock.reset();
            self.clock.poll(now);
            return self.stage.render().map(|_| true);
        }

        if !self.clock.poll(now) {
            return Ok(false);
        }
        self.tick();
        self.stage.render().map(|_| true)
    }

    /// Stops ticking and switches to `world_id` once the settle delay has
    /// passed. Only the last request of a burst is honoured.
    pub fn request_world(&mut self, world_id: u32) {
        if !self.world_ids.contains(&world_id) {
            log::warn!("ignoring request for unknown world {world_id}");
            return;
        }
        log::info!("switching to world {world_id}");
        match self.pending.as_mut() {
            Some(pending) => pending.world_id = world_id,
            None => {
                self.pending = Some(PendingSwitch { world_id, due: None });
            }
        }
    }

    /// Puts the camera back to the world's default pose.
    pub fn reset_camera(&mut self) {
        if let Some(activation) = self.activation.as_mut() {
            activation.world.reset_config();
            activation.world.mount_camera(&self.camera);
        }
    }

    /// Re-activates the current world for a new surface size.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        if let Some(world_id) = self.world_id() {
            self.request_world(world_id);
        }
    }

    /// Camera keys move the camera, digits switch worlds and `Escape`
    /// resets the camera. Returns false for keys it does not handle.
    pub fn handle_key(&mut self, key: &str) -> bool {
        if let Some(binding) = CameraKey::from_key(key) {
            binding.apply(&self.camera);
            return true;
        }
        if key == "Escape" {
            self.reset_camera();
            return true;
        }
        match key.parse::<u32>() {
            Ok(world_id) if self.world_ids.contains(&world_id) => {
                self.request_world(world_id);
                true
            }
            _ => false,
        }
    }

    /// Saves every config and removes the current world's nodes.
    pub fn shutdown(&mut self) {
        self.pending = None;
        self.deactivate();
        if let Err(e) = self.config.save(self.store.as_mut()) {
            log::error!("saving main config failed: {e}");
        }
    }

    fn tick(&mut self) {
        let Some(activation) = self.activation.as_mut() else {
            return;
        };
        activation.world.tick();

        let world_changed = activation.world_watch.poll_with(|_| ()).is_some();
        let camera_changed = activation.camera_watch.poll_with(|_| ()).is_some();
        if !world_changed && !camera_changed {
            return;
        }
        let perspective = activation.camera_watch.latest();
        let projector = &activation.projector;
        if let Err(e) = activation
            .world_watch
            .peek(|state| projector.update(state, &perspective))
        {
            log::warn!("frame skipped: {e}");
        }
    }

    fn activate(&mut self, world_id: u32) {
        let mut world = World::new((self.factory)(world_id), self.store.as_ref());
        world.mount_camera(&self.camera);

        let mut world_watch = world.subscribe();
        let mut camera_watch = self.camera.subscribe();
        let perspective = camera_watch.poll().unwrap_or_else(|| self.camera.perspective());
        let state = world_watch.poll().unwrap_or_default();
        let mut projector = Projector::new(self.viewport, self.projector_config);
        let shapes = projector.activate(&state, &perspective);
        let collection = shapes.id();
        if let Err(e) = self.stage.register(shapes, world.background_color()) {
            log::error!("registering world {} failed: {e}", world.name());
        }

        log::info!("world {world_id} ({}) active as {collection}", world.name());
        self.config.data.current_world_id = world_id;
        if let Err(e) = self.config.save(self.store.as_mut()) {
            log::error!("saving main config failed: {e}");
        }
        self.activation = Some(Activation {
            world_id,
            world,
            projector,
            collection,
            world_watch,
            camera_watch,
        });
    }

    fn deactivate(&mut self) {
        let Some(mut activation) = self.activation.take() else {
            return;
        };
        if let Err(e) = activation.world.on_destroy(self.store.as_mut()) {
            log::error!("saving world {} failed: {e}", activation.world.name());
        }
        if let Err(e) = self.stage.unregister(activation.collection) {
            log::error!("removing nodes of {} failed: {e}", activation.collection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use crate::retained::RetainedSurface;
    use crate::scene::Circle3d;
    use nalgebra::Vector3;

    struct Dots {
        count: usize,
        key: &'static str,
    }

    impl WorldContent for Dots {
        fn name(&self) -> &str {
            self.key
        }

        fn storage_key(&self) -> Option<&str> {
            Some(self.key)
        }

        fn snapshot_at(&mut self, t: u64) -> WorldState {
            WorldState {
                circles: (0..self.count)
                    .map(|i| Circle3d::new(Vector3::new(i as f64, (t % 10) as f64 * 0.1, 0.0)))
                    .collect(),
                ..WorldState::default()
            }
        }
    }

    fn dots(world_id: u32) -> Box<dyn WorldContent> {
        match world_id {
            2 => Box::new(Dots { count: 5, key: "dotsTwo" }),
            _ => Box::new(Dots { count: 3, key: "dotsOne" }),
        }
    }

    fn director() -> Director<RetainedSurface> {
        Director::new(
            RetainedSurface::default(),
            Box::new(MemoryStore::new()),
            dots,
            DirectorOptions::default(),
        )
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_tick_clock_cadence() {
        let mut clock = TickClock::new(ms(40));
        assert!(!clock.poll(ms(0)));
        assert!(!clock.poll(ms(39)));
        assert!(clock.poll(ms(40)));
        assert!(!clock.poll(ms(41)));
        // a long stall fires once, without catch-up
        assert!(clock.poll(ms(500)));
        assert!(!clock.poll(ms(520)));
        assert!(clock.poll(ms(540)));
    }

    #[test]
    fn test_first_render_creates_nodes() {
        let mut director = director();
        assert_eq!(director.world_id(), Some(1));
        assert!(!director.advance(ms(0)).unwrap());
        assert!(director.advance(ms(40)).unwrap());

        let collection = director.collection().unwrap();
        assert_eq!(director.backend().nodes_in_collection(collection), 3);
        assert_eq!(director.backend().background(), Some("#fff"));
    }

    #[test]
    fn test_camera_input_applies_on_next_tick() {
        let mut director = director();
        director.advance(ms(0)).unwrap();
        director.advance(ms(40)).unwrap();
        let writes = director.backend().stats().attribute_writes;

        assert!(director.handle_key("d"));
        assert_eq!(director.backend().stats().attribute_writes, writes);
        director.advance(ms(80)).unwrap();
        assert!(director.backend().stats().attribute_writes > writes);
    }

    #[test]
    fn test_world_switch_tears_down_old_collection() {
        let mut director = director();
        director.advance(ms(0)).unwrap();
        director.advance(ms(40)).unwrap();
        let old = director.collection().unwrap();
        director.handle_key("a");

        director.request_world(1);
        director.request_world(2);
        assert!(director.is_switching());
        // ticking is cancelled while the switch settles
        assert!(!director.advance(ms(80)).unwrap());
        assert!(!director.advance(ms(170)).unwrap());
        assert!(director.advance(ms(180)).unwrap());

        let new = director.collection().unwrap();
        assert_ne!(old, new);
        assert_eq!(director.world_id(), Some(2));
        assert_eq!(director.backend().nodes_in_collection(old), 0);
        assert_eq!(director.backend().nodes_in_collection(new), 5);
        assert_eq!(director.config().current_world_id, 2);

        // the old world saved its camera on the way out
        let saved = director.store().get("dotsOne").unwrap().unwrap();
        assert!(saved.contains("cameraPerspective"));
    }

    #[test]
    fn test_unknown_worlds_are_ignored() {
        let mut director = director();
        assert!(!director.handle_key("7"));
        director.request_world(42);
        assert!(!director.is_switching());
        assert!(director.handle_key("3"));
        assert!(director.is_switching());

        let director = Director::new(
            RetainedSurface::default(),
            Box::new(MemoryStore::new()),
            dots,
            DirectorOptions {
                world: Some(9),
                ..DirectorOptions::default()
            },
        );
        assert_eq!(director.world_id(), Some(1));
        assert_eq!(director.config().current_world_id, 1);
    }

    #[test]
    fn test_reset_camera() {
        let mut director = director();
        director.handle_key("w");
        assert_ne!(director.camera().perspective(), Perspective::default());
        assert!(director.handle_key("Escape"));
        assert_eq!(director.camera().perspective(), Perspective::default());
        assert!(!director.handle_key("x"));
    }

    #[test]
    fn test_shutdown_removes_nodes() {
        let mut director = director();
        director.advance(ms(0)).unwrap();
        director.advance(ms(40)).unwrap();
        director.shutdown();
        assert!(director.backend().is_empty());
        assert!(director.store().get(MainConfig::STORAGE_KEY).unwrap().is_some());
    }
}
