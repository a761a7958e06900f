//! Command-line arguments and environment settings.

use clap::Parser;
use log::warn;

use crate::grid::GridDims;

pub const DEFAULT_RENDER_FPS: u64 = 60;
pub const DEFAULT_VOLUME: u8 = 100;

#[derive(Debug, Clone, Parser)]
#[command(name = "memory-maze", version)]
#[command(about = "Walk a shifting maze and decide which memories to face")]
pub struct Args {
    /// Seed for maze generation and mutation (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maze width in cells (defaults to what fits the terminal)
    #[arg(long)]
    pub cols: Option<usize>,

    /// Maze height in cells (defaults to what fits the terminal)
    #[arg(long)]
    pub rows: Option<usize>,
}

impl Args {
    /// Grid dimensions, preferring explicit flags over the measured viewport.
    pub fn dims(&self, viewport_cols: usize, viewport_rows: usize) -> GridDims {
        GridDims::from_viewport(
            self.cols.unwrap_or(viewport_cols),
            self.rows.unwrap_or(viewport_rows),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub render_fps: u64,
    pub volume: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            render_fps: DEFAULT_RENDER_FPS,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl Settings {
    /// Read `MAZE_FPS` and `MAZE_VOLUME`. Bad values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("MAZE_FPS").ok().as_deref(),
            std::env::var("MAZE_VOLUME").ok().as_deref(),
        )
    }

    fn from_values(fps: Option<&str>, volume: Option<&str>) -> Self {
        let render_fps = parse_setting("MAZE_FPS", fps, |v: &u64| *v > 0)
            .unwrap_or(DEFAULT_RENDER_FPS);
        let volume =
            parse_setting("MAZE_VOLUME", volume, |v: &u8| *v <= 100).unwrap_or(DEFAULT_VOLUME);
        Self { render_fps, volume }
    }
}

fn parse_setting<T: std::str::FromStr>(
    name: &str,
    raw: Option<&str>,
    valid: impl Fn(&T) -> bool,
) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse::<T>() {
        Ok(v) if valid(&v) => Some(v),
        _ => {
            warn!("ignoring invalid {name}={raw:?}");
            None
        }
    }
}
