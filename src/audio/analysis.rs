use std::time::Instant;

use crate::config::Config;
use crate::error::ConfigError;

use super::beat::{BeatDetector, BeatOutput};
use super::decibel::DecibelFn;
use super::features::AudioFrame;
use super::spectrum::Spectrum;

/// Spectrum and beat detection driven by the same magnitudes each tick.
pub struct Analyzer {
    spectrum: Spectrum,
    beat: BeatDetector,
}

impl Analyzer {
    pub fn new(config: &Config, to_db: DecibelFn, start: Instant) -> Result<Self, ConfigError> {
        let spectrum = Spectrum::new(&config.audio, &config.spectrum, to_db)?;
        let beat = BeatDetector::new(&config.audio, &config.beat, spectrum.range_db(), start);
        Ok(Self { spectrum, beat })
    }

    pub fn update(&mut self, magnitudes: &[f32], now: Instant) -> BeatOutput {
        self.spectrum.update(magnitudes);
        self.beat.update(self.spectrum.bin_levels(), now)
    }

    /// What effects see for the tick last passed to `update`.
    pub fn frame(&self) -> AudioFrame<'_> {
        AudioFrame {
            levels: self.spectrum.levels(),
            peaks: self.spectrum.peaks(),
            beat: self.beat.last().beat,
        }
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn beat_detector(&self) -> &BeatDetector {
        &self.beat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decibel;
    use std::time::Duration;

    #[test]
    fn frame_reflects_last_update() {
        let config = Config::default();
        let start = Instant::now();
        let mut analyzer = Analyzer::new(&config, decibel::full_scale(512, 120.0), start).unwrap();
        let frame = analyzer.frame();
        assert_eq!(frame.levels.len(), 32);
        assert!(!frame.beat);

        let mut magnitudes = vec![0.0; 512];
        magnitudes[10] = 50.0;
        analyzer.update(&magnitudes, start + Duration::from_millis(11));
        let frame = analyzer.frame();
        assert!(frame.levels.iter().any(|v| *v > 0.0));
        assert_eq!(frame.peaks.len(), 32);
    }

    #[test]
    fn invalid_bands_rejected() {
        let mut config = Config::default();
        config.spectrum.bands = 0;
        assert!(Analyzer::new(&config, Box::new(|m: f32| m), Instant::now()).is_err());
    }
}
