use crate::render::color::Pixel;
use crate::render::frame::FrameBuffer;

#[derive(Clone, Debug)]
pub struct Fill {
    color: Pixel,
}

impl Fill {
    pub fn new(color: Pixel) -> Self {
        Self {
            color: color.clamped(),
        }
    }

    pub fn render(&self, dest: &mut FrameBuffer) {
        dest.fill(self.color);
    }
}
