//! Beat detection over the lowest spectrum bins.
//!
//! Input each tick is the per-bin dB above the noise floor. Two policies:
//! the heuristic fuses a magnitude jump, recent variance and time since the
//! last beat into one probability; the bandpass policy runs a 1-3 Hz IIR
//! filter (at a 60 Hz tick rate) over two narrow bands and sums the outputs.

use std::time::Instant;

use crate::config::{AudioConfig, BeatConfig, BeatPolicy};

/// Ticks of history per band for the running average and variance.
const HISTORY_LEN: usize = 10;
const IIR_ORDER: usize = 4;
/// Feed-forward coefficients, 2nd order bandpass 1-3 Hz at 60 Hz.
const IIR_A: [f32; IIR_ORDER + 1] = [0.010118566, 0.0, -0.020237132, 0.0, 0.010118566];
/// Feedback coefficients for the same filter.
const IIR_B: [f32; IIR_ORDER + 1] = [1.0, -3.6445421, 5.0421156, -3.1402937, 0.7436552];
/// Update rate the coefficients were designed for.
const IIR_DESIGN_RATE_HZ: f32 = 60.0;
/// Passband edges at the design rate.
const IIR_PASSBAND_HZ: (f32, f32) = (1.0, 3.0);
/// An overall-band jump counts one tenth as much as a narrow-band jump.
const OVERALL_RATIO_SCALE: f32 = 10.0;
const VARIANCE_OFFSET: f32 = 50.0;
const VARIANCE_SCALE: f32 = 20.0;
/// Averages below this are treated as this, so silence followed by a hit
/// reads as a large jump instead of a division by zero.
const MIN_AVERAGE: f32 = 1e-3;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BeatOutput {
    pub beat: bool,
    /// In [0, 1].
    pub probability: f32,
}

/// Ring buffer of recent band levels.
#[derive(Clone, Debug, Default)]
struct BandHistory {
    values: [f32; HISTORY_LEN],
    next: usize,
    filled: usize,
}

impl BandHistory {
    fn push(&mut self, value: f32) {
        self.values[self.next] = value;
        self.next = (self.next + 1) % HISTORY_LEN;
        self.filled = (self.filled + 1).min(HISTORY_LEN);
    }

    fn recent(&self) -> &[f32] {
        &self.values[..self.filled]
    }

    fn mean(&self) -> Option<f32> {
        let recent = self.recent();
        if recent.is_empty() {
            return None;
        }
        Some(recent.iter().sum::<f32>() / recent.len() as f32)
    }

    /// Population variance.
    fn variance(&self) -> f32 {
        let Some(mean) = self.mean() else {
            return 0.0;
        };
        let recent = self.recent();
        recent.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / recent.len() as f32
    }
}

/// Effective passband of the fixed coefficients at `tick_hz` updates per second.
fn passband_hz(tick_hz: f32) -> (f32, f32) {
    let scale = tick_hz / IIR_DESIGN_RATE_HZ;
    (IIR_PASSBAND_HZ.0 * scale, IIR_PASSBAND_HZ.1 * scale)
}

/// Direct form I state; index 0 is the newest sample.
#[derive(Clone, Debug, Default)]
struct IirState {
    x: [f32; IIR_ORDER + 1],
    y: [f32; IIR_ORDER + 1],
}

impl IirState {
    fn step(&mut self, sample: f32) -> f32 {
        self.x.copy_within(0..IIR_ORDER, 1);
        self.y.copy_within(0..IIR_ORDER, 1);
        self.x[0] = sample;
        let mut out = IIR_A[0] * self.x[0];
        for n in 1..=IIR_ORDER {
            out += IIR_A[n] * self.x[n] - IIR_B[n] * self.y[n];
        }
        self.y[0] = out;
        out
    }
}

#[derive(Clone, Debug)]
pub struct BeatBand {
    pub start: usize,
    pub end: usize,
    history: BandHistory,
    filter: IirState,
}

impl BeatBand {
    fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
            history: BandHistory::default(),
            filter: IirState::default(),
        }
    }

    fn level(&self, bins: &[f32]) -> f32 {
        let sum: f32 = (self.start..=self.end)
            .map(|bin| bins.get(bin).copied().unwrap_or(0.0))
            .sum();
        sum / (self.end - self.start + 1) as f32
    }
}

pub struct BeatDetector {
    policy: BeatPolicy,
    /// Heuristic: overall, narrow-low, narrow-lower. Bandpass: the two narrow bands.
    bands: Vec<BeatBand>,
    threshold: f32,
    min_gap_ms: f32,
    avg_beat_ms: f32,
    /// Per-bin values are divided by this before filtering.
    range_db: f32,
    last_beat: Instant,
    last: BeatOutput,
}

impl BeatDetector {
    /// `range_db` is the dB span that maps onto level 1; `now` counts as
    /// the time of the last beat.
    pub fn new(audio: &AudioConfig, config: &BeatConfig, range_db: f32, now: Instant) -> Self {
        let narrow_low = BeatBand::new(2, 2);
        let narrow_lower = BeatBand::new(1, 1);
        let bands = match config.policy {
            BeatPolicy::Heuristic => {
                let overall = BeatBand::new(1, audio.bin_for(config.max_hz));
                vec![overall, narrow_low, narrow_lower]
            }
            BeatPolicy::Bandpass => {
                let tick_hz = audio.tick_hz() as f32;
                if (tick_hz - IIR_DESIGN_RATE_HZ).abs() > 0.5 {
                    let (low, high) = passband_hz(tick_hz);
                    log::warn!(
                        "Bandpass beat filter is tuned for {} Hz ticks; at {:.2} Hz it passes {:.2}-{:.2} Hz",
                        IIR_DESIGN_RATE_HZ,
                        tick_hz,
                        low,
                        high
                    );
                }
                vec![narrow_lower, narrow_low]
            }
        };
        for band in &bands {
            log::debug!("Beat band: bins {}..={}", band.start, band.end);
        }

        Self {
            policy: config.policy,
            bands,
            threshold: config.effective_threshold(),
            min_gap_ms: config.min_gap_ms as f32,
            avg_beat_ms: config.avg_beat_ms as f32,
            range_db,
            last_beat: now,
            last: BeatOutput::default(),
        }
    }

    pub fn update(&mut self, bins: &[f32], now: Instant) -> BeatOutput {
        let since_ms = self.time_since_last_beat_ms(now);
        let output = match self.policy {
            BeatPolicy::Heuristic => self.heuristic(bins, since_ms),
            BeatPolicy::Bandpass => self.bandpass(bins, since_ms),
        };
        if output.beat {
            self.last_beat = now;
        }
        self.last = output;
        output
    }

    pub fn time_since_last_beat_ms(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.last_beat).as_secs_f32() * 1000.0
    }

    pub fn last(&self) -> BeatOutput {
        self.last
    }

    #[cfg(test)]
    pub fn bands(&self) -> &[BeatBand] {
        &self.bands
    }

    pub fn policy(&self) -> BeatPolicy {
        self.policy
    }

    fn heuristic(&mut self, bins: &[f32], since_ms: f32) -> BeatOutput {
        let mut ratios = [1.0f32; 3];
        let mut variances = [0.0f32; 3];
        for (i, band) in self.bands.iter_mut().enumerate() {
            let current = band.level(bins);
            // compare against history before this tick joins it
            ratios[i] = match band.history.mean() {
                Some(average) => current / average.max(MIN_AVERAGE),
                None => 1.0,
            };
            band.history.push(current);
            variances[i] = band.history.variance();
        }

        let change = change_factor(ratios[0], [ratios[1], ratios[2]]);
        let variance = variance_factor(variances[1]).max(variance_factor(variances[2]));
        let recency = recency_factor(since_ms, self.min_gap_ms, self.avg_beat_ms);
        let probability = (change * variance * recency).clamp(0.0, 1.0);

        BeatOutput {
            beat: probability >= self.threshold,
            probability,
        }
    }

    fn bandpass(&mut self, bins: &[f32], since_ms: f32) -> BeatOutput {
        let mut sum = 0.0;
        for band in &mut self.bands {
            let level = band.level(bins) / self.range_db;
            sum += band.filter.step(level);
        }
        let probability = if sum.is_finite() { sum.clamp(0.0, 1.0) } else { 0.0 };

        BeatOutput {
            beat: probability >= self.threshold && since_ms > self.min_gap_ms,
            probability,
        }
    }
}

/// Narrow bands dominate; a broadband jump only counts when no narrow band
/// spikes on its own.
fn change_factor(overall_ratio: f32, narrow_ratios: [f32; 2]) -> f32 {
    let narrow = narrow_ratios
        .iter()
        .map(|r| (r - 1.0).clamp(0.0, 1.0))
        .fold(0.0, f32::max);
    let overall = ((overall_ratio - 1.0) / OVERALL_RATIO_SCALE).clamp(0.0, 1.0);
    if narrow < 0.5 && overall > 0.5 {
        narrow.max(overall)
    } else {
        narrow
    }
}

fn variance_factor(variance: f32) -> f32 {
    ((variance - VARIANCE_OFFSET) / VARIANCE_SCALE - 1.0).clamp(0.0, 1.0)
}

fn recency_factor(since_ms: f32, min_gap_ms: f32, avg_beat_ms: f32) -> f32 {
    if since_ms <= 0.0 {
        return 0.0;
    }
    (1.0 - (min_gap_ms - avg_beat_ms) / since_ms).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(10);

    fn detector(policy: BeatPolicy, start: Instant) -> BeatDetector {
        let config = BeatConfig {
            policy,
            ..BeatConfig::default()
        };
        BeatDetector::new(&AudioConfig::default(), &config, 87.0, start)
    }

    /// Kick on bins 1 and 2 every other tick.
    fn pulse(tick: u32) -> Vec<f32> {
        let mut bins = vec![0.0; 512];
        if tick % 2 == 1 {
            bins[1] = 80.0;
            bins[2] = 80.0;
        }
        bins
    }

    #[test]
    fn history_stats() {
        let mut history = BandHistory::default();
        assert_eq!(history.mean(), None);
        for v in [0.0, 10.0, 0.0, 10.0] {
            history.push(v);
        }
        assert_abs_diff_eq!(history.mean().unwrap(), 5.0);
        assert_abs_diff_eq!(history.variance(), 25.0);
        for _ in 0..HISTORY_LEN {
            history.push(3.0);
        }
        assert_eq!(history.recent().len(), HISTORY_LEN);
        assert_abs_diff_eq!(history.variance(), 0.0);
    }

    #[test]
    fn factor_shapes() {
        assert_abs_diff_eq!(change_factor(1.0, [1.6, 1.2]), 0.6, epsilon = 1e-6);
        // weak narrow jump lets a strong broadband jump through
        assert_abs_diff_eq!(change_factor(9.0, [1.2, 1.0]), 0.8, epsilon = 1e-6);
        // strong narrow jump is not raised by the overall band
        assert_abs_diff_eq!(change_factor(11.0, [1.6, 1.0]), 0.6, epsilon = 1e-6);
        assert_eq!(change_factor(5.0, [0.5, 0.9]), 0.0);

        assert_eq!(variance_factor(60.0), 0.0);
        assert_abs_diff_eq!(variance_factor(80.0), 0.5);
        assert_eq!(variance_factor(500.0), 1.0);

        assert_eq!(recency_factor(0.0, 333.0, 100.0), 0.0);
        assert_eq!(recency_factor(200.0, 333.0, 100.0), 0.0);
        assert_abs_diff_eq!(recency_factor(466.0, 333.0, 100.0), 0.5);
        assert!(recency_factor(1e6, 333.0, 100.0) > 0.99);
    }

    #[test]
    fn silence_never_beats() {
        let start = Instant::now();
        let mut detector = detector(BeatPolicy::Heuristic, start);
        let silence = vec![0.0; 512];
        for tick in 1..500 {
            let out = detector.update(&silence, start + TICK * tick);
            assert!(!out.beat);
            assert_eq!(out.probability, 0.0);
        }
    }

    #[test]
    fn pulses_fire_with_minimum_gap() {
        let start = Instant::now();
        let mut detector = detector(BeatPolicy::Heuristic, start);
        let mut beats = Vec::new();
        for tick in 1..400 {
            let now = start + TICK * tick;
            let out = detector.update(&pulse(tick), now);
            assert!((0.0..=1.0).contains(&out.probability));
            if out.beat {
                assert_eq!(detector.time_since_last_beat_ms(now), 0.0);
                beats.push(tick);
            }
        }
        assert!(beats.len() >= 3, "{:?}", beats);
        for pair in beats.windows(2) {
            let gap_ms = (pair[1] - pair[0]) * 10;
            assert!(gap_ms >= 333 - 100, "gap {} ms", gap_ms);
        }
    }

    #[test]
    fn heuristic_layout() {
        let detector = detector(BeatPolicy::Heuristic, Instant::now());
        let ranges: Vec<_> = detector.bands().iter().map(|b| (b.start, b.end)).collect();
        // 4 kHz at 93.75 Hz per bin
        assert_eq!(ranges, [(1, 43), (2, 2), (1, 1)]);
    }

    #[test]
    fn bandpass_respects_lockout() {
        let start = Instant::now();
        let mut detector = detector(BeatPolicy::Bandpass, start);
        assert_eq!(detector.bands().len(), 2);
        let mut last_beat: Option<u32> = None;
        let mut beats = 0;
        // 2 Hz square wave at a 60 Hz tick rate
        let tick = Duration::from_micros(16_667);
        for i in 1..600u32 {
            let mut bins = vec![0.0; 512];
            if (i / 15) % 2 == 0 {
                bins[1] = 87.0;
                bins[2] = 87.0;
            }
            let out = detector.update(&bins, start + tick * i);
            assert!((0.0..=1.0).contains(&out.probability));
            if out.beat {
                if let Some(previous) = last_beat {
                    assert!((i - previous) as f32 * 16.667 > 333.0);
                }
                last_beat = Some(i);
                beats += 1;
            }
        }
        assert!(beats > 0);
    }

    #[test]
    fn iir_settles_on_constant_input() {
        let mut state = IirState::default();
        let mut out = 0.0;
        for _ in 0..2000 {
            out = state.step(1.0);
        }
        // bandpass: no response at DC
        assert!(out.abs() < 1e-3);
    }

    #[test]
    fn passband_scales_with_tick_rate() {
        assert_eq!(passband_hz(60.0), (1.0, 3.0));
        let tick_hz = AudioConfig::default().tick_hz() as f32;
        assert_abs_diff_eq!(tick_hz, 93.75);
        let (low, high) = passband_hz(tick_hz);
        assert_abs_diff_eq!(low, 1.5625, epsilon = 1e-5);
        assert_abs_diff_eq!(high, 4.6875, epsilon = 1e-5);
    }
}
