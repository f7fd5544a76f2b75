//! Effects that draw into or transform the pipeline's frame buffers.

mod adjust;
mod fill;
mod spectrum;
mod warp;

use serde::Deserialize;

use crate::audio::features::AudioFrame;
use super::frame::FrameBuffer;

pub use adjust::{Brightness, Saturation};
pub use fill::Fill;
pub use spectrum::{SpectrumDraw, SpectrumMode};
pub use warp::{Axis, MoveFromCenter, RotateZoomBlit};

/// Which of the two pipeline buffers an effect sees as `dest` and `src`.
///
/// | routing               | dest          | src           |
/// |-----------------------|---------------|---------------|
/// | `ToDestination`       | output        | none          |
/// | `ToSource`            | input         | none          |
/// | `DestinationToSource` | input         | output (read) |
/// | `SourceToDestination` | output        | input (read)  |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Routing {
    ToDestination,
    ToSource,
    DestinationToSource,
    #[default]
    SourceToDestination,
}

impl Routing {
    pub fn provides_source(self) -> bool {
        matches!(
            self,
            Routing::DestinationToSource | Routing::SourceToDestination
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Routing::ToDestination => "to_destination",
            Routing::ToSource => "to_source",
            Routing::DestinationToSource => "destination_to_source",
            Routing::SourceToDestination => "source_to_destination",
        }
    }
}

#[derive(Clone, Debug)]
pub enum Effect {
    Fill(Fill),
    Brightness(Brightness),
    Saturation(Saturation),
    Move(MoveFromCenter),
    RotateZoom(RotateZoomBlit),
    Spectrum(SpectrumDraw),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Fill(_) => "fill",
            Effect::Brightness(_) => "brightness",
            Effect::Saturation(_) => "saturation",
            Effect::Move(_) => "move",
            Effect::RotateZoom(_) => "rotate_zoom",
            Effect::Spectrum(_) => "spectrum",
        }
    }

    pub fn default_routing(&self) -> Routing {
        match self {
            Effect::Fill(_) => Routing::ToDestination,
            _ => Routing::SourceToDestination,
        }
    }

    /// True for effects that produce nothing without a `src` buffer.
    pub fn reads_source(&self) -> bool {
        matches!(self, Effect::Move(_) | Effect::RotateZoom(_))
    }

    pub fn render(&mut self, dest: &mut FrameBuffer, src: Option<&FrameBuffer>, audio: &AudioFrame) {
        match self {
            Effect::Fill(e) => e.render(dest),
            Effect::Brightness(e) => e.render(dest),
            Effect::Saturation(e) => e.render(dest),
            Effect::Move(e) => {
                if let Some(src) = src {
                    e.render(dest, src);
                }
            }
            Effect::RotateZoom(e) => {
                if let Some(src) = src {
                    e.render(dest, src);
                }
            }
            Effect::Spectrum(e) => e.render(dest, audio),
        }
    }
}

/// Names accepted as `kind` in `[[effects]]` tables.
pub const EFFECT_KINDS: &[(&str, &str)] = &[
    ("fill", "Fill the frame with a constant color"),
    ("brightness", "Scale every channel by (1 + amount)"),
    ("saturation", "Push channels away from (or toward) luma"),
    ("move", "Stretch the previous frame outward from the center"),
    ("rotate_zoom", "Rotate and zoom the previous frame, optionally additive"),
    ("spectrum", "Draw band levels as mirrored bars or radial rays"),
];
