pub mod color;
pub mod draw;
pub mod effects;
pub mod frame;
pub mod pipeline;

pub use color::Pixel;
pub use frame::FrameBuffer;
pub use pipeline::EffectPipeline;
