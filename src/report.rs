use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::audio::analysis::Analyzer;
use crate::audio::features::BeatEvent;
use crate::config::{BandingPolicy, BeatPolicy, Config};

#[derive(Debug, Serialize)]
pub struct BandRange {
    pub start_bin: usize,
    pub end_bin: usize,
    pub low_hz: f32,
    pub high_hz: f32,
}

/// Summary of one run, written as JSON with `--report`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub input: String,
    pub sample_rate: u32,
    pub sample_count: usize,
    pub ticks: u64,
    pub duration_secs: f64,
    pub banding: BandingPolicy,
    pub beat_policy: BeatPolicy,
    pub bands: Vec<BandRange>,
    pub beats: Vec<BeatEvent>,
}

impl RunReport {
    pub fn new(input: &Path, config: &Config, analyzer: &Analyzer) -> Self {
        let bin_hz = config.audio.bin_hz();
        let layout = analyzer.spectrum().layout();
        let bands = layout
            .bands()
            .iter()
            .map(|band| BandRange {
                start_bin: band.start,
                end_bin: band.end,
                low_hz: band.lower * bin_hz,
                high_hz: band.upper * bin_hz,
            })
            .collect();

        Self {
            input: input.display().to_string(),
            sample_rate: config.audio.sample_rate,
            sample_count: config.audio.sample_count,
            ticks: 0,
            duration_secs: 0.0,
            banding: layout.policy(),
            beat_policy: analyzer.beat_detector().policy(),
            bands,
            beats: Vec::new(),
        }
    }

    pub fn record_beat(&mut self, event: BeatEvent) {
        self.beats.push(event);
    }

    pub fn finish(&mut self, ticks: u64, tick_secs: f64) {
        self.ticks = ticks;
        self.duration_secs = ticks as f64 * tick_secs;
    }

    /// Mean beats per minute over the run, if any beats were found.
    pub fn beats_per_minute(&self) -> Option<f64> {
        if self.beats.is_empty() || self.duration_secs <= 0.0 {
            return None;
        }
        Some(self.beats.len() as f64 * 60.0 / self.duration_secs)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }
}
