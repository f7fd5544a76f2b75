use super::color::Pixel;

/// Row-major float frame, allocated once and reused every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[cfg(test)]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    pub fn fill(&mut self, color: Pixel) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, color: Pixel) {
        self.pixels[y * self.width + x] = color;
    }

    /// Write a pixel if it lies inside the frame; off-frame writes are dropped.
    pub fn put(&mut self, x: i32, y: i32, color: Pixel) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.set(x as usize, y as usize, color);
        }
    }

    /// Sample with wrap-around on both axes.
    pub fn sample_wrapped(&self, u: f32, v: f32) -> Pixel {
        let x = wrap_index(u, self.width);
        let y = wrap_index(v, self.height);
        self.get(x, y)
    }

    /// RGBA8 frame for the display side, each pixel repeated `scale`
    /// times in both directions.
    pub fn to_rgba8(&self, scale: usize) -> Vec<u8> {
        let scale = scale.max(1);
        let out_width = self.width * scale;
        let mut out = Vec::with_capacity(out_width * self.height * scale * 4);
        let mut row = Vec::with_capacity(out_width * 4);
        for y in 0..self.height {
            row.clear();
            for x in 0..self.width {
                let [r, g, b] = self.get(x, y).to_rgb8();
                for _ in 0..scale {
                    row.extend_from_slice(&[r, g, b, 255]);
                }
            }
            for _ in 0..scale {
                out.extend_from_slice(&row);
            }
        }
        out
    }
}

/// Euclidean wrap of a fractional coordinate into `0..len`.
pub fn wrap_index(coord: f32, len: usize) -> usize {
    let wrapped = coord.rem_euclid(len as f32) as usize;
    // rem_euclid can round up to exactly `len` for tiny negative inputs
    wrapped.min(len - 1)
}
