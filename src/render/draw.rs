//! Rasterization helpers used by the spectrum effect.

use super::color::Pixel;
use super::frame::FrameBuffer;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

pub fn polar_to_cartesian(radius: f32, angle: f32) -> Point {
    Point::new(radius * angle.cos(), radius * angle.sin())
}

/// DDA line, endpoints inclusive.
pub fn line(frame: &mut FrameBuffer, a: Point, b: Point, color: Pixel) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let steps = dx.abs().max(dy.abs()).ceil() as i32;
    if steps == 0 {
        frame.put(a.x.round() as i32, a.y.round() as i32, color);
        return;
    }
    let sx = dx / steps as f32;
    let sy = dy / steps as f32;
    let (mut x, mut y) = (a.x, a.y);
    for _ in 0..=steps {
        frame.put(x.round() as i32, y.round() as i32, color);
        x += sx;
        y += sy;
    }
}

/// Filled triangle; a pixel is covered when its center lies inside.
pub fn fill_triangle(frame: &mut FrameBuffer, a: Point, b: Point, c: Point, color: Pixel) {
    let area = edge(a, b, c);
    if area.abs() < f32::EPSILON {
        line(frame, a, b, color);
        line(frame, b, c, color);
        return;
    }
    let max_x = frame.width() as f32 - 1.0;
    let max_y = frame.height() as f32 - 1.0;
    let x0 = a.x.min(b.x).min(c.x).floor().max(0.0) as i32;
    let x1 = a.x.max(b.x).max(c.x).ceil().min(max_x) as i32;
    let y0 = a.y.min(b.y).min(c.y).floor().max(0.0) as i32;
    let y1 = a.y.max(b.y).max(c.y).ceil().min(max_y) as i32;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b, c, p) / area;
            let w1 = edge(c, a, p) / area;
            let w2 = edge(a, b, p) / area;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                frame.put(x, y, color);
            }
        }
    }
}

fn edge(a: Point, b: Point, p: Point) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}
