//! Zeta Core Library - projection and differential rendering of 3D worlds
//!
//! This library turns world-space snapshots seen through a movable camera
//! into screen-space shapes, and keeps a retained render backend in sync
//! with them by stable shape identity.

pub mod camera;
pub mod channel;
pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod logging;
pub mod path_data;
pub mod projection;
pub mod retained;
pub mod runtime;
pub mod scene;
pub mod shape;
pub mod stage;
pub mod transform;
pub mod world;
pub mod worlds;

// Re-export commonly used types
pub use camera::{Camera, CameraKey, Perspective};
pub use config::{KeyValueStore, MainConfig, MemoryStore, ModuleConfig};
pub use projection::{Projector, ProjectorConfig, Viewport};
pub use retained::RetainedSurface;
pub use runtime::{Director, DirectorOptions, TickClock};
pub use scene::WorldState;
pub use shape::{Collection, Shapes};
pub use stage::{Attributes, BackendError, RenderBackend, Stage, StageConfig};
pub use transform::{Axis, Transform};
pub use world::{World, WorldContent};
