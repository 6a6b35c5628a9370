//! Zeta Terminal - projected 3D worlds in the terminal
//!
//! Controls:
//!   - W/S, A/D, R/F: Move the camera
//!   - Arrow keys, `,`/`.`: Rotate the camera
//!   - 1-3: Switch world
//!   - Esc: Reset the camera
//!   - Q: Quit

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use zeta_core::logging::{init_logging, LoggingConfig};
use zeta_core::worlds::WORLDS;
use zeta_terminal::{AppOptions, TerminalApp};

/// Projected 3D worlds rendered into the terminal
#[derive(Parser, Debug)]
#[command(name = "zeta-terminal")]
#[command(version)]
struct Args {
    /// World to start with (defaults to the last one shown)
    #[arg(short, long)]
    world: Option<u32>,

    /// Milliseconds between world ticks
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Directory for persisted configuration
    #[arg(long, default_value = ".zeta")]
    config_dir: PathBuf,

    /// File receiving the log output
    #[arg(long, default_value = "zeta-terminal.log")]
    log_file: PathBuf,

    /// Log filter in env_logger syntax
    #[arg(long)]
    log_filter: Option<String>,

    /// Write the last frame as SVG to this file on exit
    #[arg(long)]
    dump_svg: Option<PathBuf>,

    /// List the available worlds and exit
    #[arg(long)]
    list_worlds: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_worlds {
        for (id, name) in WORLDS {
            println!("{id}: {name}");
        }
        return Ok(());
    }

    init_logging(LoggingConfig {
        env_filter: args.log_filter.clone(),
        log_file: Some(args.log_file.clone()),
        ..LoggingConfig::default()
    })?;

    log::info!("Starting Zeta Terminal");

    let mut app = TerminalApp::new(AppOptions {
        world: args.world,
        tick: args.tick_ms.map(Duration::from_millis),
        config_dir: args.config_dir,
        dump_svg: args.dump_svg,
    })?;
    app.run()
}
