/// Weight of the new raw value in the smoothed level.
const ATTACK: f32 = 0.75;
/// Peak fall per second, in level units.
const PEAK_FALL_PER_SEC: f32 = 0.2;

/// Per-band smoothing with a slowly falling peak hold.
#[derive(Clone, Debug)]
pub struct LevelTracker {
    smoothed: Vec<f32>,
    peaks: Vec<f32>,
    peak_decay: f32,
}

impl LevelTracker {
    /// `tick_secs` is the real-time length of one update.
    pub fn new(bands: usize, tick_secs: f32) -> Self {
        Self {
            smoothed: vec![0.0; bands],
            peaks: vec![0.0; bands],
            peak_decay: PEAK_FALL_PER_SEC * tick_secs,
        }
    }

    pub fn update(&mut self, raw: &[f32]) {
        let bands = self.smoothed.iter_mut().zip(self.peaks.iter_mut());
        for ((level, peak), &value) in bands.zip(raw) {
            *level = (1.0 - ATTACK) * *level + ATTACK * value;
            if *level > *peak {
                *peak = *level;
            } else {
                *peak = (*peak - self.peak_decay).max(0.0);
            }
        }
    }

    pub fn levels(&self) -> &[f32] {
        &self.smoothed
    }

    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }
}
