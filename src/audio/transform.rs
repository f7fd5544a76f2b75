use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::TAU;
use std::sync::Arc;

/// Windowed forward FFT producing one linear magnitude per bin.
///
/// The output has `sample_count` entries aligned with the input window;
/// bin 0 (DC) is always zero.
pub struct Transform {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl Transform {
    pub fn new(sample_count: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            fft: planner.plan_fft_forward(sample_count),
            window: blackman_harris(sample_count),
            buffer: vec![Complex::new(0.0, 0.0); sample_count],
            magnitudes: vec![0.0; sample_count],
        }
    }

    /// Short input is zero-padded, extra input ignored.
    pub fn process(&mut self, samples: &[f32]) -> &[f32] {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);
        for (magnitude, c) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *magnitude = c.norm();
        }
        self.magnitudes[0] = 0.0;
        &self.magnitudes
    }
}

/// 4-term Blackman-Harris window.
fn blackman_harris(size: usize) -> Vec<f32> {
    const A: [f32; 4] = [0.35875, 0.48829, 0.14128, 0.01168];
    (0..size)
        .map(|i| {
            let x = TAU * i as f32 / size as f32;
            A[0] - A[1] * x.cos() + A[2] * (2.0 * x).cos() - A[3] * (3.0 * x).cos()
        })
        .collect()
}
