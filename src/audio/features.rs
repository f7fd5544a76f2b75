use serde::Serialize;

/// Read-only view of one tick's analysis, handed to every effect.
#[derive(Clone, Copy, Debug)]
pub struct AudioFrame<'a> {
    /// Smoothed band levels in [0, 1].
    pub levels: &'a [f32],
    /// Per-band peak hold in [0, 1].
    pub peaks: &'a [f32],
    pub beat: bool,
}

/// One detected beat, as written to the run report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BeatEvent {
    pub tick: u64,
    /// Seconds from the start of the input.
    pub time: f64,
    pub probability: f32,
}
