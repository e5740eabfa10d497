//! Command-line configuration

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::simulation::scheduler::{INTERVAL_DEFAULT, INTERVAL_MAX, INTERVAL_MIN};
use crate::simulation::DEFAULT_ENTRY_POINT;

#[derive(Parser, Debug, Clone)]
#[command(name = "automata")]
#[command(about = "GPU cellular automaton viewer with pan, zoom and timing controls")]
pub struct AppConfig {
    /// Seed image; any format the decoder understands. A random soup is used when absent.
    #[arg(short, long)]
    pub seed: Option<PathBuf>,

    /// Size of the generated random seed, as WIDTHxHEIGHT.
    #[arg(long, default_value = "256x256", value_parser = parse_size)]
    pub seed_size: (u32, u32),

    /// Probability that a generated cell starts alive.
    #[arg(long, default_value_t = 0.3)]
    pub seed_density: f64,

    /// WGSL kernel run once per step.
    #[arg(short, long, default_value = "kernels/automata.wgsl")]
    pub kernel: PathBuf,

    /// Kernel entry point.
    #[arg(long, default_value = DEFAULT_ENTRY_POINT)]
    pub entry_point: String,

    /// Seconds between steps.
    #[arg(short, long, default_value_t = INTERVAL_DEFAULT)]
    pub interval: f32,

    /// Start paused.
    #[arg(long)]
    pub paused: bool,

    /// Wrap panning around the simulation edges (`--wrap false` for free pan).
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub wrap: bool,

    /// Directory screenshots are written to.
    #[arg(long, default_value = "screenshots")]
    pub screenshot_dir: PathBuf,

    /// Initial window width.
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Initial window height.
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Synchronize presentation with the display refresh.
    #[arg(long)]
    pub vsync: bool,
}

impl AppConfig {
    /// Initial interval, clamped to the scheduler's bounds
    pub fn interval(&self) -> f32 {
        self.interval.clamp(INTERVAL_MIN, INTERVAL_MAX)
    }
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = width.trim().parse().map_err(|e| format!("width: {e}"))?;
    let height: u32 = height.trim().parse().map_err(|e| format!("height: {e}"))?;
    if width == 0 || height == 0 {
        return Err("dimensions must be non-zero".to_string());
    }
    Ok((width, height))
}
