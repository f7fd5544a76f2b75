use thiserror::Error;

/// Invalid static configuration, detected once at startup.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("sample_count must be an even number >= 4, got {0}")]
    SampleCount(usize),

    #[error("sample_rate must be positive, got {0}")]
    SampleRate(u32),

    #[error("band count must be between 1 and {max}, got {got}")]
    BandCount { got: usize, max: usize },

    #[error("max_hz {max_hz} must cover at least one bin ({bin_hz:.1} Hz) below Nyquist")]
    MaxFrequency { max_hz: f32, bin_hz: f32 },

    #[error("max_db ({max_db}) must be greater than noise_db ({noise_db})")]
    DecibelRange { noise_db: f32, max_db: f32 },

    #[error("beat threshold must lie in [0, 1], got {0}")]
    BeatThreshold(f32),

    #[error("avg_beat_ms ({avg}) must be smaller than min_gap_ms ({min_gap})")]
    BeatGap { min_gap: u64, avg: u64 },

    #[error("frame size must be non-zero, got {width}x{height}")]
    FrameSize { width: usize, height: usize },

    #[error("effect #{index} ({kind}) reads a source buffer but routing {routing} provides none")]
    EffectRouting {
        index: usize,
        kind: &'static str,
        routing: &'static str,
    },

    #[error("effect #{index} ({kind}): {reason}")]
    EffectParameter {
        index: usize,
        kind: &'static str,
        reason: String,
    },
}
