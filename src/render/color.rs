/// Linear-ish float color, each channel in [0,1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pixel {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Hue, saturation and value, each in [0,1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::new(0.0, 0.0, 0.0);
    pub const WHITE: Pixel = Pixel::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }

    /// Per-channel sum, clamped to [0,1].
    pub fn saturating_add(self, other: Pixel) -> Self {
        Pixel::new(self.r + other.r, self.g + other.g, self.b + other.b).clamped()
    }

    /// Rec. 709 luma.
    pub fn luma(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let c = self.clamped();
        [
            (255.0 * c.r) as u8,
            (255.0 * c.g) as u8,
            (255.0 * c.b) as u8,
        ]
    }
}

impl From<Hsv> for Pixel {
    fn from(hsv: Hsv) -> Self {
        let c = hsv.v * hsv.s;
        let x = c * (1.0 - ((6.0 * hsv.h) % 2.0 - 1.0).abs());
        let m = hsv.v - c;
        let (r, g, b) = if hsv.h < 1.0 / 6.0 {
            (c, x, 0.0)
        } else if hsv.h < 2.0 / 6.0 {
            (x, c, 0.0)
        } else if hsv.h < 3.0 / 6.0 {
            (0.0, c, x)
        } else if hsv.h < 4.0 / 6.0 {
            (0.0, x, c)
        } else if hsv.h < 5.0 / 6.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };
        Pixel::new(r + m, g + m, b + m)
    }
}

impl From<Pixel> for Hsv {
    fn from(rgb: Pixel) -> Self {
        let max = rgb.r.max(rgb.g).max(rgb.b);
        let min = rgb.r.min(rgb.g).min(rgb.b);
        let delta = max - min;
        let h = if delta == 0.0 {
            0.0
        } else if max == rgb.r {
            (((rgb.g - rgb.b) / delta).rem_euclid(6.0)) / 6.0
        } else if max == rgb.g {
            ((rgb.b - rgb.r) / delta + 2.0) / 6.0
        } else {
            ((rgb.r - rgb.g) / delta + 4.0) / 6.0
        };
        let s = if max == 0.0 { 0.0 } else { delta / max };
        Hsv { h, s, v: max }
    }
}

impl Hsv {
    pub const fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_pixel(a: Pixel, b: Pixel) {
        assert_abs_diff_eq!(a.r, b.r, epsilon = 1e-5);
        assert_abs_diff_eq!(a.g, b.g, epsilon = 1e-5);
        assert_abs_diff_eq!(a.b, b.b, epsilon = 1e-5);
    }

    #[test]
    fn hsv_primaries() {
        assert_pixel(Hsv::new(0.0, 1.0, 1.0).into(), Pixel::new(1.0, 0.0, 0.0));
        assert_pixel(Hsv::new(1.0 / 3.0, 1.0, 1.0).into(), Pixel::new(0.0, 1.0, 0.0));
        assert_pixel(Hsv::new(2.0 / 3.0, 1.0, 1.0).into(), Pixel::new(0.0, 0.0, 1.0));
        assert_pixel(Hsv::new(0.5, 0.0, 0.4).into(), Pixel::new(0.4, 0.4, 0.4));
    }

    #[test]
    fn hsv_round_trip() {
        for &color in &[
            Pixel::new(1.0, 0.5, 0.0),
            Pixel::new(0.2, 0.3, 0.9),
            Pixel::new(0.7, 0.1, 0.6),
        ] {
            let hsv = Hsv::from(color);
            assert_pixel(Pixel::from(hsv), color);
        }
    }

    #[test]
    fn luma_and_add() {
        assert_abs_diff_eq!(Pixel::WHITE.luma(), 1.0, epsilon = 1e-6);
        let sum = Pixel::new(0.8, 0.5, 0.0).saturating_add(Pixel::new(0.5, 0.2, 0.1));
        assert_pixel(sum, Pixel::new(1.0, 0.7, 0.1));
        assert_eq!(Pixel::new(1.2, -0.1, 0.5).to_rgb8(), [255, 0, 127]);
    }
}
