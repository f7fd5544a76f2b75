use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::bands::BandLayout;
use crate::error::ConfigError;
use crate::render::effects::{
    Axis, Brightness, Effect, Fill, MoveFromCenter, RotateZoomBlit, Routing, Saturation,
    SpectrumDraw, SpectrumMode,
};
use crate::render::Pixel;

/// Upper bound on bands, far beyond any panel width we drive.
pub const MAX_BANDS: usize = 256;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub beat: BeatConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub effects: Vec<EffectConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Samples per analysis window; one window is one tick.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    /// Replaced by the decoded file's rate at startup.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BandingPolicy {
    /// Fractional cursor, boundary bins split by overlap.
    Fractional,
    /// Integer bin counts per band.
    Truncate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpectrumConfig {
    #[serde(default = "default_bands")]
    pub bands: usize,
    #[serde(default = "default_spectrum_max_hz")]
    pub max_hz: f32,
    #[serde(default = "default_noise_db")]
    pub noise_db: f32,
    #[serde(default = "default_max_db")]
    pub max_db: f32,
    #[serde(default = "default_true")]
    pub agc: bool,
    #[serde(default = "default_banding")]
    pub banding: BandingPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BeatPolicy {
    /// Magnitude change x variance x recency.
    Heuristic,
    /// Two IIR bandpass outputs summed, hard lockout.
    Bandpass,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeatConfig {
    #[serde(default = "default_beat_policy")]
    pub policy: BeatPolicy,
    /// Falls back to the policy's own threshold when unset.
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default = "default_beat_max_hz")]
    pub max_hz: f32,
    #[serde(default = "default_min_gap_ms")]
    pub min_gap_ms: u64,
    #[serde(default = "default_avg_beat_ms")]
    pub avg_beat_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_scale")]
    pub scale: usize,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
}

/// One `[[effects]]` table. Order in the file is execution order.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectConfig {
    Fill {
        #[serde(default)]
        color: [f32; 3],
        #[serde(default)]
        routing: Option<Routing>,
    },
    Brightness {
        amount: f32,
        #[serde(default)]
        routing: Option<Routing>,
    },
    Saturation {
        amount: f32,
        #[serde(default)]
        routing: Option<Routing>,
    },
    Move {
        #[serde(default = "default_move_dist")]
        dist: f32,
        #[serde(default)]
        axis: Axis,
        #[serde(default)]
        routing: Option<Routing>,
    },
    RotateZoom {
        #[serde(default)]
        angle: f32,
        #[serde(default = "default_zoom")]
        zoom: f32,
        #[serde(default)]
        position: Option<[f32; 2]>,
        #[serde(default)]
        additive: bool,
        #[serde(default)]
        spin: f32,
        #[serde(default)]
        routing: Option<Routing>,
    },
    Spectrum {
        #[serde(default)]
        mode: SpectrumMode,
        #[serde(default = "default_true")]
        rotate: bool,
        #[serde(default)]
        routing: Option<Routing>,
    },
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_count: default_sample_count(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            max_hz: default_spectrum_max_hz(),
            noise_db: default_noise_db(),
            max_db: default_max_db(),
            agc: true,
            banding: default_banding(),
        }
    }
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            policy: default_beat_policy(),
            threshold: None,
            max_hz: default_beat_max_hz(),
            min_gap_ms: default_min_gap_ms(),
            avg_beat_ms: default_avg_beat_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            scale: default_scale(),
            crf: default_crf(),
            codec: default_codec(),
        }
    }
}

impl AudioConfig {
    /// Width of one bin in Hz.
    pub fn bin_hz(&self) -> f32 {
        self.sample_rate as f32 / self.sample_count as f32
    }

    /// Nearest bin for a frequency, clamped to the usable range.
    pub fn bin_for(&self, hz: f32) -> usize {
        let bin = (hz / self.bin_hz()).round().max(1.0) as usize;
        bin.min(self.sample_count - 1)
    }

    /// Real-time length of one tick in milliseconds.
    pub fn tick_ms(&self) -> f64 {
        self.sample_count as f64 * 1000.0 / self.sample_rate as f64
    }

    pub fn tick_hz(&self) -> f64 {
        self.sample_rate as f64 / self.sample_count as f64
    }
}

impl BeatConfig {
    pub fn effective_threshold(&self) -> f32 {
        self.threshold.unwrap_or(match self.policy {
            BeatPolicy::Heuristic => 0.5,
            BeatPolicy::Bandpass => 0.2,
        })
    }
}

impl EffectConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            EffectConfig::Fill { .. } => "fill",
            EffectConfig::Brightness { .. } => "brightness",
            EffectConfig::Saturation { .. } => "saturation",
            EffectConfig::Move { .. } => "move",
            EffectConfig::RotateZoom { .. } => "rotate_zoom",
            EffectConfig::Spectrum { .. } => "spectrum",
        }
    }

    fn routing_override(&self) -> Option<Routing> {
        match self {
            EffectConfig::Fill { routing, .. }
            | EffectConfig::Brightness { routing, .. }
            | EffectConfig::Saturation { routing, .. }
            | EffectConfig::Move { routing, .. }
            | EffectConfig::RotateZoom { routing, .. }
            | EffectConfig::Spectrum { routing, .. } => *routing,
        }
    }

    /// Instantiate the effect for a `width`x`height` pipeline.
    pub fn build(
        &self,
        index: usize,
        width: usize,
        height: usize,
    ) -> Result<(Effect, Routing), ConfigError> {
        let param_error = |reason: String| ConfigError::EffectParameter {
            index,
            kind: self.kind(),
            reason,
        };

        let effect = match *self {
            EffectConfig::Fill { color, .. } => {
                Effect::Fill(Fill::new(Pixel::new(color[0], color[1], color[2])))
            }
            EffectConfig::Brightness { amount, .. } => {
                if !(-1.0..=1.0).contains(&amount) {
                    return Err(param_error(format!("amount {} outside [-1, 1]", amount)));
                }
                Effect::Brightness(Brightness::new(amount))
            }
            EffectConfig::Saturation { amount, .. } => {
                if !(-1.0..=1.0).contains(&amount) {
                    return Err(param_error(format!("amount {} outside [-1, 1]", amount)));
                }
                Effect::Saturation(Saturation::new(amount))
            }
            EffectConfig::Move { dist, axis, .. } => {
                if !dist.is_finite() {
                    return Err(param_error("dist must be finite".into()));
                }
                Effect::Move(MoveFromCenter::new(axis, dist))
            }
            EffectConfig::RotateZoom {
                angle,
                zoom,
                position,
                additive,
                spin,
                ..
            } => {
                if !(zoom > 0.0) {
                    return Err(param_error(format!("zoom {} must be positive", zoom)));
                }
                let position =
                    position.unwrap_or([width as f32 / 2.0, height as f32 / 2.0]);
                let mut blit = RotateZoomBlit::new(position, angle, zoom, additive);
                blit.set_spin(spin);
                Effect::RotateZoom(blit)
            }
            EffectConfig::Spectrum { mode, rotate, .. } => {
                Effect::Spectrum(SpectrumDraw::new(mode, rotate))
            }
        };

        let routing = self
            .routing_override()
            .unwrap_or_else(|| effect.default_routing());
        if effect.reads_source() && !routing.provides_source() {
            return Err(ConfigError::EffectRouting {
                index,
                kind: self.kind(),
                routing: routing.name(),
            });
        }
        Ok((effect, routing))
    }
}

impl Config {
    /// Bounds are checked here once; the tick path never re-validates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let audio = &self.audio;
        if audio.sample_count < 4 || audio.sample_count % 2 != 0 {
            return Err(ConfigError::SampleCount(audio.sample_count));
        }
        if audio.sample_rate == 0 {
            return Err(ConfigError::SampleRate(audio.sample_rate));
        }

        let spectrum = &self.spectrum;
        if spectrum.bands == 0 || spectrum.bands > MAX_BANDS {
            return Err(ConfigError::BandCount {
                got: spectrum.bands,
                max: MAX_BANDS,
            });
        }
        let nyquist = audio.sample_rate as f32 / 2.0;
        for max_hz in [spectrum.max_hz, self.beat.max_hz] {
            if !(max_hz >= audio.bin_hz()) || max_hz > nyquist {
                return Err(ConfigError::MaxFrequency {
                    max_hz,
                    bin_hz: audio.bin_hz(),
                });
            }
        }
        if !(spectrum.max_db > spectrum.noise_db) {
            return Err(ConfigError::DecibelRange {
                noise_db: spectrum.noise_db,
                max_db: spectrum.max_db,
            });
        }
        BandLayout::new(audio, spectrum)?;

        let threshold = self.beat.effective_threshold();
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::BeatThreshold(threshold));
        }
        if self.beat.avg_beat_ms >= self.beat.min_gap_ms {
            return Err(ConfigError::BeatGap {
                min_gap: self.beat.min_gap_ms,
                avg: self.beat.avg_beat_ms,
            });
        }

        if self.output.width == 0 || self.output.height == 0 || self.output.scale == 0 {
            return Err(ConfigError::FrameSize {
                width: self.output.width,
                height: self.output.height,
            });
        }

        for (index, effect) in self.effects.iter().enumerate() {
            effect.build(index, self.output.width, self.output.height)?;
        }
        Ok(())
    }

    /// Configured effect chain, or the default feedback chain when empty.
    pub fn effect_chain(&self) -> Vec<EffectConfig> {
        if self.effects.is_empty() {
            default_effects()
        } else {
            self.effects.clone()
        }
    }
}

/// Black clear, additive zoom of last frame, fade, bars on top.
pub fn default_effects() -> Vec<EffectConfig> {
    vec![
        EffectConfig::Fill {
            color: [0.0, 0.0, 0.0],
            routing: None,
        },
        EffectConfig::RotateZoom {
            angle: 0.0,
            zoom: 1.04,
            position: None,
            additive: true,
            spin: 0.0,
            routing: None,
        },
        EffectConfig::Brightness {
            amount: -0.2,
            routing: None,
        },
        EffectConfig::Spectrum {
            mode: SpectrumMode::Bars,
            rotate: true,
            routing: None,
        },
    ]
}

fn default_sample_count() -> usize { 512 }
fn default_sample_rate() -> u32 { 48_000 }
fn default_bands() -> usize { 32 }
fn default_spectrum_max_hz() -> f32 { 8000.0 }
fn default_noise_db() -> f32 { 33.0 }
fn default_max_db() -> f32 { 120.0 }
fn default_true() -> bool { true }
fn default_banding() -> BandingPolicy { BandingPolicy::Fractional }
fn default_beat_policy() -> BeatPolicy { BeatPolicy::Heuristic }
fn default_beat_max_hz() -> f32 { 4000.0 }
fn default_min_gap_ms() -> u64 { 333 }
fn default_avg_beat_ms() -> u64 { 100 }
fn default_width() -> usize { 64 }
fn default_height() -> usize { 32 }
fn default_scale() -> usize { 8 }
fn default_crf() -> u32 { 18 }
fn default_codec() -> String { "libx264".into() }
fn default_move_dist() -> f32 { 0.5 }
fn default_zoom() -> f32 { 1.0 }

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Explicit path, else `beatglow.toml` in the working directory, else the
/// per-user config directory.
pub fn locate_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    let local = PathBuf::from("beatglow.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("beatglow").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("beatglow").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
