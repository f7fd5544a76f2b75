//! In-place color adjustments on the destination buffer.
//!
//! Channels are treated as stored, without gamma correction.

use crate::render::color::Pixel;
use crate::render::frame::FrameBuffer;

/// Fade toward black (`amount < 0`) or brighten (`amount > 0`).
#[derive(Clone, Debug)]
pub struct Brightness {
    amount: f32,
}

impl Brightness {
    pub fn new(amount: f32) -> Self {
        Self {
            amount: amount.clamp(-1.0, 1.0),
        }
    }

    pub fn render(&self, dest: &mut FrameBuffer) {
        let factor = 1.0 + self.amount;
        for pixel in dest.pixels_mut() {
            *pixel = Pixel::new(pixel.r * factor, pixel.g * factor, pixel.b * factor).clamped();
        }
    }
}

/// Desaturate (`amount < 0`) or oversaturate (`amount > 0`) around luma.
#[derive(Clone, Debug)]
pub struct Saturation {
    amount: f32,
}

impl Saturation {
    pub fn new(amount: f32) -> Self {
        Self {
            amount: amount.clamp(-1.0, 1.0),
        }
    }

    pub fn render(&self, dest: &mut FrameBuffer) {
        let t = self.amount;
        for pixel in dest.pixels_mut() {
            let y = pixel.luma();
            *pixel = Pixel::new(
                pixel.r + t * (pixel.r - y),
                pixel.g + t * (pixel.g - y),
                pixel.b + t * (pixel.b - y),
            )
            .clamped();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn brightness_minus_one_blacks_out() {
        let mut frame = FrameBuffer::new(4, 4);
        frame.fill(Pixel::WHITE);
        Brightness::new(-1.0).render(&mut frame);
        assert!(frame.pixels().iter().all(|p| *p == Pixel::BLACK));
    }

    #[test]
    fn brightness_boost_clamps() {
        let mut frame = FrameBuffer::new(1, 1);
        frame.set(0, 0, Pixel::new(0.8, 0.25, 0.0));
        Brightness::new(1.0).render(&mut frame);
        assert_eq!(frame.get(0, 0), Pixel::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn full_desaturation_is_gray() {
        let mut frame = FrameBuffer::new(1, 1);
        let color = Pixel::new(0.9, 0.2, 0.4);
        frame.set(0, 0, color);
        Saturation::new(-1.0).render(&mut frame);
        let out = frame.get(0, 0);
        assert_abs_diff_eq!(out.r, color.luma(), epsilon = 1e-6);
        assert_abs_diff_eq!(out.g, color.luma(), epsilon = 1e-6);
        assert_abs_diff_eq!(out.b, color.luma(), epsilon = 1e-6);
    }

    #[test]
    fn gray_is_unchanged_by_saturation() {
        let mut frame = FrameBuffer::new(2, 1);
        frame.fill(Pixel::new(0.5, 0.5, 0.5));
        Saturation::new(1.0).render(&mut frame);
        let out = frame.get(1, 0);
        assert_abs_diff_eq!(out.r, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out.b, 0.5, epsilon = 1e-6);
    }
}
