//! Geometric feedback effects: read the source buffer, write a warped copy.
//!
//! Both effects inverse-map destination pixels to source coordinates and
//! wrap out-of-range coordinates around the source edges.

use serde::Deserialize;

use crate::render::frame::{wrap_index, FrameBuffer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

/// Stretches the source away from the center line.
///
/// Destination row `k` steps from the center samples the source row
/// `k * dist` steps from the center, so `dist < 1` pushes content outward
/// each tick and `dist == 1` is a plain copy.
#[derive(Clone, Debug)]
pub struct MoveFromCenter {
    axis: Axis,
    dist: f32,
}

impl MoveFromCenter {
    pub fn new(axis: Axis, dist: f32) -> Self {
        Self { axis, dist }
    }

    pub fn render(&self, dest: &mut FrameBuffer, src: &FrameBuffer) {
        match self.axis {
            Axis::Vertical => self.vertical(dest, src),
            Axis::Horizontal => self.horizontal(dest, src),
        }
    }

    fn vertical(&self, dest: &mut FrameBuffer, src: &FrameBuffer) {
        let height = dest.height();
        let half = height / 2;
        for x in 0..dest.width() {
            let sx = x.min(src.width() - 1);
            let mut v = half as f32 - 1.0;
            for y in (0..half).rev() {
                dest.set(x, y, src.get(sx, wrap_index(v, src.height())));
                v -= self.dist;
            }
            let mut v = half as f32;
            for y in half..height {
                dest.set(x, y, src.get(sx, wrap_index(v, src.height())));
                v += self.dist;
            }
        }
    }

    fn horizontal(&self, dest: &mut FrameBuffer, src: &FrameBuffer) {
        let width = dest.width();
        let half = width / 2;
        for y in 0..dest.height() {
            let sy = y.min(src.height() - 1);
            let mut u = half as f32 - 1.0;
            for x in (0..half).rev() {
                dest.set(x, y, src.get(wrap_index(u, src.width()), sy));
                u -= self.dist;
            }
            let mut u = half as f32;
            for x in half..width {
                dest.set(x, y, src.get(wrap_index(u, src.width()), sy));
                u += self.dist;
            }
        }
    }
}

/// Rotate + zoom + blit around `position`.
///
/// The cross terms are scaled by the frame's aspect ratio so a rotation
/// on a non-square panel stays a rotation in normalized coordinates.
#[derive(Clone, Debug)]
pub struct RotateZoomBlit {
    position: [f32; 2],
    angle: f32,
    zoom: f32,
    additive: bool,
    spin: f32,
}

impl RotateZoomBlit {
    /// `zoom` must be > 0; values above 1 magnify.
    pub fn new(position: [f32; 2], angle: f32, zoom: f32, additive: bool) -> Self {
        Self {
            position,
            angle,
            zoom,
            additive,
            spin: 0.0,
        }
    }

    /// Radians added to the angle after every render.
    pub fn set_spin(&mut self, spin: f32) {
        self.spin = spin;
    }

    #[cfg(test)]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn render(&mut self, dest: &mut FrameBuffer, src: &FrameBuffer) {
        let aspect = dest.height() as f32 / dest.width() as f32;
        let (sa, ca) = self.angle.sin_cos();
        let inv_zoom = 1.0 / self.zoom;

        let du_dx = ca * inv_zoom;
        let dv_dx = sa * aspect * inv_zoom;
        let du_dy = -sa * inv_zoom / aspect;
        let dv_dy = ca * inv_zoom;

        // start at the center of pixel (0, 0)
        let [cx, cy] = self.position;
        let mut u_row = cx + du_dx * (0.5 - cx) + du_dy * (0.5 - cy);
        let mut v_row = cy + dv_dx * (0.5 - cx) + dv_dy * (0.5 - cy);

        for y in 0..dest.height() {
            let (mut u, mut v) = (u_row, v_row);
            for x in 0..dest.width() {
                let sample = src.sample_wrapped(u, v);
                if self.additive {
                    let out = dest.get(x, y).saturating_add(sample);
                    dest.set(x, y, out);
                } else {
                    dest.set(x, y, sample);
                }
                u += du_dx;
                v += dv_dx;
            }
            u_row += du_dy;
            v_row += dv_dy;
        }

        self.angle = (self.angle + self.spin) % std::f32::consts::TAU;
    }
}
