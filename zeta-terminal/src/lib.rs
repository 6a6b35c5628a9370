/// Terminal front-end: drives the zeta runtime and draws its retained surface
use anyhow::Context;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::fs;
use std::io::{self, stdout, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use zeta_core::config::{check_app_version, FileStore};
use zeta_core::worlds::create_world;
use zeta_core::{Director, DirectorOptions};

pub mod renderer;

pub use renderer::TerminalSurface;

/// Rows reserved at the top for the status line
const STATUS_ROWS: u16 = 1;

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub world: Option<u32>,
    pub tick: Option<Duration>,
    pub config_dir: PathBuf,
    /// Receives the last frame as SVG markup on exit
    pub dump_svg: Option<PathBuf>,
}

/// Main application struct for the terminal front-end
pub struct TerminalApp {
    director: Director<TerminalSurface>,
    dump_svg: Option<PathBuf>,
    running: bool,
    started: Instant,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(options: AppOptions) -> anyhow::Result<Self> {
        let (width, height) = terminal::size().context("reading terminal size")?;
        let surface =
            TerminalSurface::new(width as usize, height.saturating_sub(STATUS_ROWS) as usize);

        let mut store = FileStore::open(&options.config_dir)
            .with_context(|| format!("opening config dir {}", options.config_dir.display()))?;
        if check_app_version(&mut store, env!("CARGO_PKG_VERSION"))? {
            log::info!("configuration reset for version {}", env!("CARGO_PKG_VERSION"));
        }

        let viewport = surface.viewport();
        let director = Director::new(
            surface,
            Box::new(store),
            create_world,
            DirectorOptions {
                viewport,
                world: options.world,
                tick: options.tick,
                ..DirectorOptions::default()
            },
        );

        Ok(Self {
            director,
            dump_svg: options.dump_svg,
            running: true,
            started: Instant::now(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();
        if let Some(path) = &self.dump_svg {
            match write_svg(self.director.backend(), path) {
                Ok(()) => log::info!("last frame written to {}", path.display()),
                Err(e) => log::error!("writing {} failed: {e}", path.display()),
            }
        }

        // Cleanup
        self.director.shutdown();
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> anyhow::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 60);

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Tick and render
            match self.director.advance(self.started.elapsed()) {
                Ok(true) => self.render()?,
                Ok(false) => {}
                Err(e) => log::error!("render failed: {e}"),
            }

            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                if code == KeyCode::Char('q') {
                    self.running = false;
                    return;
                }
                if let Some(name) = key_name(code) {
                    if !self.director.handle_key(&name) {
                        log::debug!("unbound key {name}");
                    }
                }
            }
            Event::Resize(width, height) => {
                let rows = height.saturating_sub(STATUS_ROWS) as usize;
                self.director.backend_mut().resize(width as usize, rows);
                self.director.resize(TerminalSurface::viewport_for(width as usize, rows));
            }
            _ => {}
        }
    }

    fn render(&mut self) -> io::Result<()> {
        self.director.backend_mut().rasterize();

        let mut stdout = stdout();
        self.director.backend().draw(&mut stdout, STATUS_ROWS)?;

        // Draw UI overlay
        self.frame_count += 1;
        let now = Instant::now();
        if (now - self.last_frame).as_secs() >= 1 {
            self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
            self.frame_count = 0;
            self.last_frame = now;
        }
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(status_line(
                self.director.world_name().unwrap_or("-"),
                self.fps,
                &self.director.camera().perspective().to_string(),
            )),
            ResetColor
        )?;

        stdout.flush()
    }
}

/// Maps a terminal key to the key names the runtime understands
pub fn key_name(code: KeyCode) -> Option<String> {
    Some(match code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Up => "ArrowUp".into(),
        KeyCode::Down => "ArrowDown".into(),
        KeyCode::Left => "ArrowLeft".into(),
        KeyCode::Right => "ArrowRight".into(),
        KeyCode::Esc => "Escape".into(),
        _ => return None,
    })
}

/// Serializes the retained scene behind `surface` to `path`
fn write_svg(surface: &TerminalSurface, path: &Path) -> io::Result<()> {
    fs::write(path, surface.surface().to_svg())
}

fn status_line(world: &str, fps: f32, perspective: &str) -> String {
    format!(
        "World: {world} | FPS: {fps:.1} | {perspective} | \
         WASD/RF=Move Arrows/,.=Rotate 1-3=World Esc=Reset Q=Quit"
    )
}
