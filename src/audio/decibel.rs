/// Coherent gain of the Blackman-Harris window (its mean value).
pub const BLACKMAN_HARRIS_GAIN: f32 = 0.35875;

/// Maps a linear FFT magnitude to dB. Must be non-negative and monotonic.
pub type DecibelFn = Box<dyn Fn(f32) -> f32 + Send>;

/// Full-scale mapping: a windowed full-scale sine in one bin reads `max_db`,
/// zero and below-range magnitudes read 0.
pub fn full_scale(sample_count: usize, max_db: f32) -> DecibelFn {
    let reference = BLACKMAN_HARRIS_GAIN * sample_count as f32 / 2.0;
    Box::new(move |magnitude: f32| {
        if magnitude > 0.0 {
            (max_db + 20.0 * (magnitude / reference).log10()).max(0.0)
        } else {
            0.0
        }
    })
}
