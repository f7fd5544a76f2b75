use clap::Parser;
use std::path::PathBuf;

use crate::config::BeatPolicy;

#[derive(Parser, Debug)]
#[command(name = "beatglow", about = "Audio-reactive LED panel visualizer, rendered to video")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Output video file
    #[arg(short, long, default_value = "output.mp4")]
    pub output: PathBuf,

    /// Config file (default: ./beatglow.toml or ~/.config/beatglow/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Panel width in pixels
    #[arg(long, default_value_t = 64)]
    pub width: usize,

    /// Panel height in pixels
    #[arg(long, default_value_t = 32)]
    pub height: usize,

    /// Upscale factor applied to each panel pixel in the video
    #[arg(long, default_value_t = 8)]
    pub scale: usize,

    /// Number of spectrum bands
    #[arg(long, default_value_t = 32)]
    pub bands: usize,

    /// Disable automatic gain control
    #[arg(long)]
    pub no_agc: bool,

    /// Beat detection policy
    #[arg(long, value_enum)]
    pub beat_policy: Option<BeatPolicy>,

    /// Write a JSON report of beats and band layout
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Analyze only; skip rendering and encoding
    #[arg(long)]
    pub no_video: bool,

    /// H.264 CRF quality (0-51, lower = better)
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// FFmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// List available effect kinds and exit
    #[arg(long)]
    pub list_effects: bool,
}
