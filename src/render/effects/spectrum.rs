use serde::Deserialize;
use std::f32::consts::TAU;

use crate::audio::features::AudioFrame;
use crate::render::color::{Hsv, Pixel};
use crate::render::draw::{self, Point};
use crate::render::frame::FrameBuffer;

/// Bars reach half the frame height at level 1 (mirrored, so full height).
const BAR_SCALE: f32 = 0.5;
/// Ray radius at level 1, in frame heights.
const RAY_SCALE: f32 = 1.5;
/// Phase advance per tick when rotating, in radians.
const RAY_ROTATION_STEP: f32 = 0.01;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumMode {
    /// Bars mirrored around the horizontal center line.
    #[default]
    Bars,
    /// Wedges radiating from the frame center.
    Rays,
}

#[derive(Clone, Debug)]
pub struct SpectrumDraw {
    mode: SpectrumMode,
    rotate: bool,
    phase: f32,
}

impl SpectrumDraw {
    pub fn new(mode: SpectrumMode, rotate: bool) -> Self {
        Self {
            mode,
            rotate,
            phase: 0.0,
        }
    }

    pub fn render(&mut self, dest: &mut FrameBuffer, audio: &AudioFrame) {
        let bands = audio.levels.len().min(audio.peaks.len());
        if bands == 0 {
            return;
        }
        match self.mode {
            SpectrumMode::Bars => {
                let y0 = (dest.height() / 2) as i32;
                for band in 0..bands {
                    let (level, peak) = (audio.levels[band], audio.peaks[band]);
                    draw_bar(dest, band, bands, level, peak, y0, true);
                    draw_bar(dest, band, bands, level, peak, y0, false);
                }
            }
            SpectrumMode::Rays => {
                draw_rays(dest, audio, bands, self.phase);
                if self.rotate {
                    self.phase = (self.phase + RAY_ROTATION_STEP) % TAU;
                }
            }
        }
        if audio.beat {
            dest.put(0, 0, Pixel::WHITE);
        }
    }
}

fn band_hue(band: usize, bands: usize) -> f32 {
    if bands > 1 {
        band as f32 / (bands - 1) as f32
    } else {
        0.0
    }
}

fn draw_bar(
    dest: &mut FrameBuffer,
    band: usize,
    bands: usize,
    level: f32,
    peak: f32,
    y0: i32,
    upward: bool,
) {
    let bar_width = (dest.width() / bands).max(1);
    let x_start = band * bar_width;
    if x_start >= dest.width() {
        return;
    }
    let x_end = (x_start + bar_width).min(dest.width());
    let max_y = dest.height() as i32 - 1;
    let hue = band_hue(band, bands);
    let color = Pixel::from(Hsv::new(hue, 1.0, 1.0));

    let bar_height_f = max_y as f32 * level.clamp(0.0, 1.0) * BAR_SCALE;
    let bar_height = bar_height_f.trunc() as i32;
    let rest = bar_height_f - bar_height as f32;
    let rest_color = Pixel::from(Hsv::new(hue, 1.0, rest));

    for x in x_start..x_end {
        let x = x as i32;
        if upward {
            let y_min = (y0 - bar_height).max(0);
            for y in (y_min + 1..=y0).rev() {
                dest.put(x, y, color);
            }
            if y_min > 0 && rest > 0.0 {
                dest.put(x, y_min, rest_color);
            }
        } else {
            let y_max = (y0 + bar_height).min(max_y);
            for y in y0..y_max {
                dest.put(x, y, color);
            }
            if y_max < max_y && rest > 0.0 {
                dest.put(x, y_max, rest_color);
            }
        }
    }

    if peak > 0.5 / dest.height() as f32 {
        let peak_color = Pixel::from(Hsv::new(hue, 0.4, 0.2));
        let peak_y = (max_y as f32 * peak.clamp(0.0, 1.0) * BAR_SCALE) as i32;
        let y = if upward {
            (y0 - peak_y).max(0)
        } else {
            (y0 + peak_y).min(max_y)
        };
        for x in x_start..x_end {
            dest.put(x as i32, y, peak_color);
        }
    }
}

fn draw_rays(dest: &mut FrameBuffer, audio: &AudioFrame, bands: usize, phase: f32) {
    let center = Point::new(dest.width() as f32 / 2.0, dest.height() as f32 / 2.0);
    let height = dest.height() as f32;
    let delta = TAU / bands as f32;

    for band in 0..bands {
        let a0 = phase + band as f32 * delta;
        let a1 = a0 + delta;
        let hue = band_hue(band, bands);

        let level_radius = RAY_SCALE * height * audio.levels[band].clamp(0.0, 1.0);
        if level_radius > 0.5 {
            let color = Pixel::from(Hsv::new(hue, 1.0, 1.0));
            let p1 = center.offset(draw::polar_to_cartesian(level_radius, a0));
            let p2 = center.offset(draw::polar_to_cartesian(level_radius, a1));
            draw::fill_triangle(dest, center, p1, p2, color);
        }

        let peak_radius = RAY_SCALE * height * audio.peaks[band].clamp(0.0, 1.0);
        if peak_radius > 0.5 {
            let color = Pixel::from(Hsv::new(hue, 0.4, 0.2));
            let p1 = center.offset(draw::polar_to_cartesian(peak_radius, a0));
            let p2 = center.offset(draw::polar_to_cartesian(peak_radius, a1));
            draw::line(dest, p1, p2, color);
        }
    }
}
