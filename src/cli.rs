use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::spectrum::settings::FilterMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Bar graph drawn in the terminal
    Terminal,
    /// One JSON object per tick
    Jsonl,
    /// Run the pipeline without drawing
    None,
}

#[derive(Parser, Debug)]
#[command(name = "auvi", about = "Real-time audio spectrum visualizer")]
pub struct Cli {
    /// Audio file to visualize (WAV, MP3, FLAC, OGG). Captures live input when omitted.
    pub input: Option<PathBuf>,

    /// Config file (defaults to ./auvi.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Capture device index, as printed by --list-devices
    #[arg(short, long, default_value_t = 1)]
    pub device: usize,

    /// List capture devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Capture sample rate in Hz
    #[arg(long, default_value_t = 10_000)]
    pub sample_rate: u32,

    /// Samples per tick (power of two)
    #[arg(short = 'n', long, default_value_t = 256)]
    pub block_size: usize,

    /// Input gain
    #[arg(short, long, default_value_t = 5000)]
    pub amp_scalar: u32,

    /// Percent of a falling bar kept per tick (0-100)
    #[arg(long, default_value_t = 80, allow_negative_numbers = true)]
    pub decay: i32,

    /// Smoothing filter
    #[arg(short, long, value_enum, default_value_t = FilterMode::DoubleBoxFilter)]
    pub mode: FilterMode,

    /// Block size or half-width of the smoothing filter
    #[arg(short, long, default_value_t = 8)]
    pub range: u32,

    /// Exponential filter coefficient (0-1]
    #[arg(long, default_value_t = 0.2)]
    pub alpha: f32,

    /// Where frames go
    #[arg(short, long, value_enum, default_value_t = OutputMode::Terminal)]
    pub output: OutputMode,

    /// JSON-lines destination (stdout when omitted)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Process file input as fast as possible instead of in real time
    #[arg(long)]
    pub fast: bool,

    /// Show the settings overlay under the bars
    #[arg(long)]
    pub debug: bool,

    /// Bar area width in columns (terminal width when omitted)
    #[arg(long)]
    pub width: Option<u16>,

    /// Bar area height in rows (terminal height when omitted)
    #[arg(long)]
    pub height: Option<u16>,
}

impl Cli {
    /// Fixed bar area, if either dimension was given.
    pub fn terminal_size(&self) -> Option<(u16, u16)> {
        match (self.width, self.height) {
            (None, None) => None,
            (w, h) => Some((w.unwrap_or(80), h.unwrap_or(24))),
        }
    }
}
