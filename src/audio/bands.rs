//! Log-spaced grouping of FFT bins into display bands.
//!
//! Bin `k` occupies `[k, k + 1)` on the bin axis. Bin 0 (DC) is never
//! used; bands cover `[1, max_bin + 1)` exactly once.

use crate::config::{AudioConfig, BandingPolicy, SpectrumConfig};
use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencyBand {
    /// First bin touched, inclusive.
    pub start: usize,
    /// Last bin touched, inclusive.
    pub end: usize,
    /// Exact lower edge on the bin axis.
    pub lower: f32,
    /// Exact upper edge on the bin axis.
    pub upper: f32,
}

impl FrequencyBand {
    pub fn width(&self) -> f32 {
        self.upper - self.lower
    }

    /// Share of `bin` that falls inside this band, in [0, 1].
    pub fn weight(&self, bin: usize) -> f32 {
        let lo = self.lower.max(bin as f32);
        let hi = self.upper.min(bin as f32 + 1.0);
        (hi - lo).max(0.0)
    }
}

#[derive(Clone, Debug)]
pub struct BandLayout {
    bands: Vec<FrequencyBand>,
    policy: BandingPolicy,
    max_bin: usize,
}

impl BandLayout {
    pub fn new(audio: &AudioConfig, spectrum: &SpectrumConfig) -> Result<Self, ConfigError> {
        if audio.sample_count < 4 || audio.sample_count % 2 != 0 {
            return Err(ConfigError::SampleCount(audio.sample_count));
        }
        if audio.sample_rate == 0 {
            return Err(ConfigError::SampleRate(audio.sample_rate));
        }
        let exact_max = spectrum.max_hz / audio.bin_hz();
        if !(exact_max >= 1.0) {
            return Err(ConfigError::MaxFrequency {
                max_hz: spectrum.max_hz,
                bin_hz: audio.bin_hz(),
            });
        }
        let max_bin = (exact_max.round() as usize).clamp(1, audio.sample_count - 1);
        if spectrum.bands == 0 || spectrum.bands > max_bin {
            return Err(ConfigError::BandCount {
                got: spectrum.bands,
                max: max_bin,
            });
        }

        let bands = match spectrum.banding {
            BandingPolicy::Fractional => fractional_bands(spectrum.bands, max_bin),
            BandingPolicy::Truncate => truncated_bands(spectrum.bands, max_bin),
        };

        Ok(Self {
            bands,
            policy: spectrum.banding,
            max_bin,
        })
    }

    pub fn bands(&self) -> &[FrequencyBand] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn max_bin(&self) -> usize {
        self.max_bin
    }

    pub fn policy(&self) -> BandingPolicy {
        self.policy
    }

    /// Weighted mean of `values` per band. Missing bins read as 0.
    pub fn aggregate(&self, values: &[f32], out: &mut [f32]) {
        for (band, slot) in self.bands.iter().zip(out.iter_mut()) {
            let mut sum = 0.0;
            for bin in band.start..=band.end {
                let value = values.get(bin).copied().unwrap_or(0.0);
                sum += band.weight(bin) * value;
            }
            *slot = sum / band.width();
        }
    }
}

/// Walks a fractional cursor from bin 1. Each band takes the log-spaced
/// share of what is left, but never less than one bin and never so much
/// that a later band would get less than one bin.
fn fractional_bands(count: usize, max_bin: usize) -> Vec<FrequencyBand> {
    let end = (max_bin + 1) as f32;
    let mut bands = Vec::with_capacity(count);
    let mut cursor = 1.0f32;

    for i in 0..count {
        let remaining = count - i;
        let upper = if remaining == 1 {
            end
        } else {
            let log_step = cursor * (end / cursor).powf(1.0 / remaining as f32);
            let reserve = end - (remaining - 1) as f32;
            log_step.max(cursor + 1.0).min(reserve)
        };
        bands.push(FrequencyBand {
            start: cursor.floor() as usize,
            end: (upper.ceil() as usize - 1).min(max_bin),
            lower: cursor,
            upper,
        });
        cursor = upper;
    }
    bands
}

/// Integer bin counts from plain log edges, raised to one bin where the
/// edge spacing is below a bin.
fn truncated_bands(count: usize, max_bin: usize) -> Vec<FrequencyBand> {
    let log_end = ((max_bin + 1) as f32).log10();
    let edge = |i: usize| 10f32.powf(log_end * i as f32 / count as f32);
    let mut bands = Vec::with_capacity(count);
    let mut cursor = 1usize;

    for i in 0..count {
        let remaining_after = count - i - 1;
        let width = (edge(i + 1).trunc() as usize).saturating_sub(edge(i).trunc() as usize);
        let last = if remaining_after == 0 {
            max_bin
        } else {
            (cursor + width.max(1) - 1).min(max_bin - remaining_after)
        };
        bands.push(FrequencyBand {
            start: cursor,
            end: last,
            lower: cursor as f32,
            upper: (last + 1) as f32,
        });
        cursor = last + 1;
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(bands: usize, policy: BandingPolicy) -> BandLayout {
        let audio = AudioConfig {
            sample_count: 512,
            sample_rate: 48_000,
        };
        let spectrum = SpectrumConfig {
            bands,
            banding: policy,
            ..SpectrumConfig::default()
        };
        BandLayout::new(&audio, &spectrum).unwrap()
    }

    fn assert_covers_once(layout: &BandLayout) {
        let bands = layout.bands();
        assert_eq!(bands[0].start, 1);
        assert_eq!(bands[0].lower, 1.0);
        assert_eq!(bands.last().unwrap().end, layout.max_bin());
        for pair in bands.windows(2) {
            assert_eq!(pair[0].upper, pair[1].lower);
            assert!(pair[0].start <= pair[1].start);
        }
        for band in bands {
            assert!(band.width() >= 1.0 - 1e-4, "{:?}", band);
        }
        let total: f32 = bands.iter().map(FrequencyBand::width).sum();
        assert!((total - layout.max_bin() as f32).abs() < 1e-3);
        for bin in 0..=layout.max_bin() + 1 {
            let weight: f32 = bands.iter().map(|b| b.weight(bin)).sum();
            let expected = if (1..=layout.max_bin()).contains(&bin) { 1.0 } else { 0.0 };
            assert!((weight - expected).abs() < 1e-4, "bin {} weight {}", bin, weight);
        }
    }

    #[test]
    fn fractional_layout_covers_range() {
        for count in [1, 8, 32, 64, 85] {
            let layout = layout(count, BandingPolicy::Fractional);
            assert_eq!(layout.len(), count);
            assert_eq!(layout.max_bin(), 85);
            assert_covers_once(&layout);
        }
    }

    #[test]
    fn truncated_layout_covers_range() {
        for count in [1, 8, 32, 85] {
            let layout = layout(count, BandingPolicy::Truncate);
            assert_eq!(layout.len(), count);
            assert_covers_once(&layout);
            for pair in layout.bands().windows(2) {
                assert_eq!(pair[0].end + 1, pair[1].start);
            }
        }
    }

    #[test]
    fn low_bands_are_narrow() {
        let layout = layout(32, BandingPolicy::Fractional);
        let bands = layout.bands();
        assert!(bands[0].width() < bands[31].width());
        assert_eq!((bands[4].start, bands[4].end), (5, 5));
    }

    #[test]
    fn single_bin_lands_in_one_band() {
        let layout = layout(32, BandingPolicy::Fractional);
        let mut values = vec![0.0; 512];
        values[5] = 1.0;
        let mut out = vec![0.0; 32];
        layout.aggregate(&values, &mut out);
        let lit: Vec<usize> = (0..32).filter(|&i| out[i] > 0.0).collect();
        assert_eq!(lit.len(), 1);
        let band = layout.bands()[lit[0]];
        assert!((band.start..=band.end).contains(&5));
    }

    #[test]
    fn flat_input_gives_flat_bands() {
        for policy in [BandingPolicy::Fractional, BandingPolicy::Truncate] {
            let layout = layout(32, policy);
            let values = vec![0.5; 512];
            let mut out = vec![0.0; 32];
            layout.aggregate(&values, &mut out);
            assert!(out.iter().all(|v| (v - 0.5).abs() < 1e-4), "{:?}", out);
        }
    }

    #[test]
    fn short_input_reads_as_silence() {
        let layout = layout(16, BandingPolicy::Fractional);
        let mut out = vec![1.0; 16];
        layout.aggregate(&[0.0, 1.0], &mut out);
        assert!(out[0] > 0.0);
        assert!(out[15] == 0.0);
    }

    #[test]
    fn rejects_more_bands_than_bins() {
        let audio = AudioConfig::default();
        let spectrum = SpectrumConfig {
            bands: 200,
            ..SpectrumConfig::default()
        };
        assert!(matches!(
            BandLayout::new(&audio, &spectrum),
            Err(ConfigError::BandCount { got: 200, max: 85 })
        ));
    }
}
