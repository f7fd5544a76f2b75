use crate::audio::features::AudioFrame;

use super::effects::{Effect, Routing};
use super::frame::FrameBuffer;

struct Stage {
    effect: Effect,
    routing: Routing,
}

/// Ordered effect chain over two ping-pong frame buffers.
///
/// Each `render` swaps the buffer roles first, so the previous output is
/// this tick's input, then runs every stage in insertion order.
pub struct EffectPipeline {
    stages: Vec<Stage>,
    buffers: [FrameBuffer; 2],
    /// Index of the buffer currently acting as output.
    front: usize,
}

impl EffectPipeline {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            stages: Vec::new(),
            buffers: [FrameBuffer::new(width, height), FrameBuffer::new(width, height)],
            front: 0,
        }
    }

    pub fn push_routed(&mut self, effect: Effect, routing: Routing) {
        log::debug!("Pipeline stage {}: {} ({})", self.stages.len(), effect.name(), routing.name());
        self.stages.push(Stage { effect, routing });
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn render(&mut self, audio: &AudioFrame) {
        self.front ^= 1;
        let (output, input) = split_roles(&mut self.buffers, self.front);

        for stage in &mut self.stages {
            match stage.routing {
                Routing::ToDestination => stage.effect.render(output, None, audio),
                Routing::ToSource => stage.effect.render(input, None, audio),
                Routing::DestinationToSource => stage.effect.render(input, Some(&*output), audio),
                Routing::SourceToDestination => stage.effect.render(output, Some(&*input), audio),
            }
        }
    }

    /// The frame produced by the last `render`.
    pub fn output(&self) -> &FrameBuffer {
        &self.buffers[self.front]
    }
}

/// Borrow both buffers as (output, input). The two borrows come from
/// disjoint halves of the array, so they can never alias.
fn split_roles(buffers: &mut [FrameBuffer; 2], front: usize) -> (&mut FrameBuffer, &mut FrameBuffer) {
    let (first, second) = buffers.split_at_mut(1);
    if front == 0 {
        (&mut first[0], &mut second[0])
    } else {
        (&mut second[0], &mut first[0])
    }
}
