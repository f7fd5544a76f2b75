//! Magnitudes to display levels: dB above the noise floor, banding, AGC,
//! clamping, smoothing and peak hold, in that order, once per tick.

use crate::config::{AudioConfig, SpectrumConfig};
use crate::error::ConfigError;

use super::agc::Agc;
use super::bands::BandLayout;
use super::decibel::DecibelFn;
use super::levels::LevelTracker;

/// The floor subtracted from every bin sits slightly above the configured
/// noise level.
const NOISE_FLOOR_FACTOR: f32 = 1.05;

pub struct Spectrum {
    layout: BandLayout,
    agc: Agc,
    agc_enabled: bool,
    tracker: LevelTracker,
    to_db: DecibelFn,
    floor_db: f32,
    /// Per-bin dB above the floor, bin 0 always 0.
    bin_levels: Vec<f32>,
    /// This tick's band values after AGC and clamping.
    raw: Vec<f32>,
}

impl Spectrum {
    pub fn new(
        audio: &AudioConfig,
        config: &SpectrumConfig,
        to_db: DecibelFn,
    ) -> Result<Self, ConfigError> {
        if !(config.max_db > config.noise_db) {
            return Err(ConfigError::DecibelRange {
                noise_db: config.noise_db,
                max_db: config.max_db,
            });
        }
        let layout = BandLayout::new(audio, config)?;
        let bands = layout.len();
        log::debug!(
            "Spectrum: {} bands over bins 1..={} ({:.1} Hz per bin, {:?})",
            bands,
            layout.max_bin(),
            audio.bin_hz(),
            layout.policy()
        );

        Ok(Self {
            layout,
            agc: Agc::new(config.noise_db, config.max_db),
            agc_enabled: config.agc,
            tracker: LevelTracker::new(bands, audio.tick_ms() as f32 / 1000.0),
            to_db,
            floor_db: NOISE_FLOOR_FACTOR * config.noise_db,
            bin_levels: vec![0.0; audio.sample_count],
            raw: vec![0.0; bands],
        })
    }

    /// Feed one tick of linear magnitudes. Short or non-finite input reads
    /// as silence in the affected bins.
    pub fn update(&mut self, magnitudes: &[f32]) {
        for (bin, level) in self.bin_levels.iter_mut().enumerate().skip(1) {
            let magnitude = magnitudes.get(bin).copied().unwrap_or(0.0);
            let magnitude = if magnitude.is_finite() { magnitude } else { 0.0 };
            *level = ((self.to_db)(magnitude) - self.floor_db).max(0.0);
        }

        self.layout.aggregate(&self.bin_levels, &mut self.raw);
        self.agc.apply(&mut self.raw, self.agc_enabled);
        for value in self.raw.iter_mut() {
            *value = value.clamp(0.0, 1.0);
        }
        self.tracker.update(&self.raw);
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub fn bin_levels(&self) -> &[f32] {
        &self.bin_levels
    }

    pub fn raw(&self) -> &[f32] {
        &self.raw
    }

    pub fn levels(&self) -> &[f32] {
        self.tracker.levels()
    }

    pub fn peaks(&self) -> &[f32] {
        self.tracker.peaks()
    }

    pub fn running_level(&self) -> f32 {
        self.agc.running_level()
    }

    /// dB span that maps onto the [0, 1] level range.
    pub fn range_db(&self) -> f32 {
        self.agc.range_db()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decibel;
    use approx::assert_abs_diff_eq;

    fn spectrum(config: SpectrumConfig, to_db: DecibelFn) -> Spectrum {
        Spectrum::new(&AudioConfig::default(), &config, to_db).unwrap()
    }

    #[test]
    fn single_bin_lights_one_band() {
        let config = SpectrumConfig::default();
        let mut spectrum = spectrum(config, decibel::full_scale(512, 120.0));
        let mut magnitudes = vec![0.0; 512];
        magnitudes[5] = 1.0;
        spectrum.update(&magnitudes);

        let lit: Vec<usize> = (0..32).filter(|&i| spectrum.raw()[i] > 0.0).collect();
        assert_eq!(lit.len(), 1, "{:?}", spectrum.raw());
        let band = spectrum.layout().bands()[lit[0]];
        assert!((band.start..=band.end).contains(&5));
    }

    #[test]
    fn silence_decays_to_zero() {
        let mut spectrum = spectrum(SpectrumConfig::default(), decibel::full_scale(512, 120.0));
        let loud = vec![20.0; 512];
        for _ in 0..50 {
            spectrum.update(&loud);
        }
        assert!(spectrum.running_level() > 0.0);
        let silence = vec![0.0; 512];
        let mut previous = spectrum.running_level();
        for _ in 0..2000 {
            spectrum.update(&silence);
            assert!(spectrum.running_level() <= previous);
            previous = spectrum.running_level();
            assert!(spectrum.levels().iter().all(|v| *v >= 0.0));
        }
        assert!(spectrum.running_level() < 1e-3);
        assert!(spectrum.levels().iter().all(|v| *v < 1e-6));
        assert!(spectrum.peaks().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn constant_input_running_level_settles_geometrically() {
        let mut spectrum = spectrum(SpectrumConfig::default(), decibel::full_scale(512, 120.0));
        let magnitudes = vec![0.5; 512];
        spectrum.update(&magnitudes);
        // every bin reads the same, so the AGC fuzz is that bin's level
        let fuzz = spectrum.bin_levels()[1];
        assert!(fuzz > 30.0, "fuzz {}", fuzz);
        assert_abs_diff_eq!(spectrum.running_level(), 0.01 * fuzz, epsilon = 1e-4);

        let mut previous = spectrum.running_level();
        let mut previous_delta = previous;
        for _ in 1..200 {
            spectrum.update(&magnitudes);
            let delta = spectrum.running_level() - previous;
            assert!(delta > 0.0);
            assert_abs_diff_eq!(delta / previous_delta, 0.99, epsilon = 2e-3);
            previous_delta = delta;
            previous = spectrum.running_level();
        }
        let expected = fuzz * (1.0 - 0.99f32.powi(200));
        assert_abs_diff_eq!(spectrum.running_level(), expected, epsilon = 1e-2);

        for _ in 0..3000 {
            spectrum.update(&magnitudes);
        }
        assert_abs_diff_eq!(spectrum.running_level(), fuzz, epsilon = 1e-2);
        let settled = spectrum.levels().to_vec();
        spectrum.update(&magnitudes);
        for (now, before) in spectrum.levels().iter().zip(&settled) {
            assert!((now - before).abs() < 1e-4);
            assert!(*now < 1e-3);
        }
    }

    #[test]
    fn outputs_stay_in_unit_range() {
        let mut spectrum = spectrum(SpectrumConfig::default(), decibel::full_scale(512, 120.0));
        let mut seed = 7u32;
        for _ in 0..300 {
            let magnitudes: Vec<f32> = (0..512)
                .map(|_| {
                    seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    (seed >> 8) as f32 / (1 << 24) as f32 * 500.0
                })
                .collect();
            spectrum.update(&magnitudes);
            for value in spectrum.raw().iter().chain(spectrum.levels()).chain(spectrum.peaks()) {
                assert!((0.0..=1.0).contains(value));
            }
        }
    }

    #[test]
    fn tolerates_short_and_bad_input() {
        let mut spectrum = spectrum(SpectrumConfig::default(), decibel::full_scale(512, 120.0));
        spectrum.update(&[]);
        spectrum.update(&[f32::NAN, f32::INFINITY, 3.0]);
        assert!(spectrum.levels().iter().all(|v| v.is_finite()));
        assert_eq!(spectrum.bin_levels()[0], 0.0);
    }

    #[test]
    fn agc_off_keeps_running_level() {
        let config = SpectrumConfig {
            agc: false,
            ..SpectrumConfig::default()
        };
        let mut spectrum = spectrum(config, decibel::full_scale(512, 120.0));
        spectrum.update(&vec![50.0; 512]);
        assert_eq!(spectrum.running_level(), 0.0);
        assert!(spectrum.raw().iter().any(|v| *v > 0.0));
    }

    #[test]
    fn rejects_inverted_db_range() {
        let config = SpectrumConfig {
            noise_db: 90.0,
            max_db: 60.0,
            ..SpectrumConfig::default()
        };
        assert!(Spectrum::new(&AudioConfig::default(), &config, Box::new(|m: f32| m)).is_err());
    }
}
