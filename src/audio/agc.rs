//! Automatic gain control over band levels in dB above the noise floor.
//!
//! Tracks a slow running level from the bands' mean and minimum, subtracts
//! it, and applies a gain that grows with it. Finally scales into [0, 1]
//! by the configured dB range.

/// Weight of the current frame in the running level.
const SPEED: f32 = 0.01;
/// Gain per dB of running level.
const GAIN_PER_DB: f32 = 0.033333;

#[derive(Clone, Debug)]
pub struct Agc {
    running: f32,
    /// `max_db - noise_db`.
    range_db: f32,
}

impl Agc {
    pub fn new(noise_db: f32, max_db: f32) -> Self {
        Self {
            running: 0.0,
            range_db: max_db - noise_db,
        }
    }

    /// Normalize `bands` in place. With `enabled == false` only the range
    /// scaling runs and the running level is left untouched.
    pub fn apply(&mut self, bands: &mut [f32], enabled: bool) {
        if !enabled {
            for value in bands.iter_mut() {
                *value /= self.range_db;
            }
            return;
        }

        // band 0 sits on the steep low end; leave it out of the statistics
        let stats = if bands.len() > 1 { &bands[1..] } else { &bands[..] };
        if stats.is_empty() {
            return;
        }
        let mean = stats.iter().sum::<f32>() / stats.len() as f32;
        let min = stats.iter().copied().fold(f32::INFINITY, f32::min);
        let fuzz = 0.5 * mean + 0.5 * min;

        self.running = SPEED * fuzz + (1.0 - SPEED) * self.running;
        let gain = GAIN_PER_DB * self.running + 1.0;

        for value in bands.iter_mut() {
            *value = (*value - self.running).max(0.0) * gain / self.range_db;
        }
    }

    pub fn running_level(&self) -> f32 {
        self.running
    }

    pub fn range_db(&self) -> f32 {
        self.range_db
    }
}
