//! Zeta Web - projected 3D worlds rendered into an SVG element
//!
//! Hosts call `WebApp::frame` from `requestAnimationFrame` and forward
//! `keydown` names to `WebApp::key`.

use std::time::Duration;

use wasm_bindgen::prelude::*;
use zeta_core::config::{check_app_version, StageMode};
use zeta_core::worlds::create_world;
use zeta_core::{Director, DirectorOptions, KeyValueStore, MemoryStore, Viewport};

pub mod dom;
pub mod storage;

pub use dom::SvgDomBackend;
pub use storage::LocalStorageStore;

/// Forwards `log` records to the browser console
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

#[wasm_bindgen(start)]
pub fn start() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn window_viewport(window: &web_sys::Window) -> Result<StageMode, JsValue> {
    let dimension = |value: Result<JsValue, JsValue>| value.map(|v| v.as_f64().unwrap_or(0.0));
    let inner = Viewport::new(dimension(window.inner_width())?, dimension(window.inner_height())?);
    let screen = window.screen()?;
    let screen = Viewport::new(f64::from(screen.width()?), f64::from(screen.height()?));
    Ok(StageMode::evaluate(inner, screen))
}

fn open_store() -> Box<dyn KeyValueStore> {
    match LocalStorageStore::open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("falling back to in-memory config: {e}");
            Box::new(MemoryStore::new())
        }
    }
}

/// Browser front-end driving the runtime against an `<svg>` element
#[wasm_bindgen]
pub struct WebApp {
    director: Director<SvgDomBackend>,
}

#[wasm_bindgen]
impl WebApp {
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str) -> Result<WebApp, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;

        let mode = window_viewport(&window)?;
        let viewport = mode.viewport();
        log::info!("stage mode {mode:?}");

        let backend = SvgDomBackend::new(document, container_id).map_err(js_error)?;
        backend.set_size(viewport.width, viewport.height).map_err(js_error)?;

        let mut store = open_store();
        if check_app_version(store.as_mut(), env!("CARGO_PKG_VERSION")).map_err(js_error)? {
            log::info!("configuration reset for version {}", env!("CARGO_PKG_VERSION"));
        }

        let director = Director::new(
            backend,
            store,
            create_world,
            DirectorOptions {
                viewport,
                ..DirectorOptions::default()
            },
        );
        Ok(WebApp { director })
    }

    /// Advances the runtime to `ms` milliseconds since start. Returns
    /// whether the SVG changed.
    pub fn frame(&mut self, ms: f64) -> Result<bool, JsValue> {
        let now = Duration::from_secs_f64(ms.max(0.0) / 1000.0);
        self.director.advance(now).map_err(js_error)
    }

    /// Handles a `KeyboardEvent.key` name. Returns false when unbound.
    pub fn key(&mut self, name: &str) -> bool {
        self.director.handle_key(name)
    }

    #[wasm_bindgen(js_name = worldName)]
    pub fn world_name(&self) -> Option<String> {
        self.director.world_name().map(str::to_owned)
    }

    pub fn perspective(&self) -> String {
        self.director.camera().perspective().to_string()
    }

    pub fn shutdown(&mut self) {
        self.director.shutdown();
    }
}
