//! Frame graph executor

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::error::{FrameGraphError, FrameGraphResult};
use crate::render_graph::compiler::CompiledPass;
use crate::render_graph::pass::Pass;

/// Records compiled passes into a command recorder.
///
/// Only issues the barriers the compiler computed; it does no synchronization
/// reasoning of its own.
pub(crate) struct PassExecutor<'a, C> {
    recorder: &'a mut C,
    depth_range: (f32, f32),
}

impl<'a, C: CommandRecorder> PassExecutor<'a, C> {
    pub fn new(recorder: &'a mut C, depth_range: (f32, f32)) -> Self {
        Self {
            recorder,
            depth_range,
        }
    }

    pub fn execute_pass(
        &mut self,
        pass: &mut Pass<C>,
        compiled: &CompiledPass,
        frame_index: u32,
    ) -> FrameGraphResult<()> {
        let (render_pass, framebuffer, dimensions) = pass
            .physical()
            .and_then(|physical| {
                physical
                    .framebuffer(frame_index)
                    .map(|framebuffer| (physical.render_pass, framebuffer, physical.dimensions))
            })
            .ok_or_else(|| FrameGraphError::NotBuilt(pass.name().to_string()))?;

        compiled.pre_barrier.record(self.recorder);

        let clear_values: Vec<ClearValue> = compiled
            .attachments
            .iter()
            .map(|attachment| attachment.clear_value)
            .collect();
        let area = ScissorRect::from_dimensions(dimensions.x, dimensions.y);
        let (min_depth, max_depth) = self.depth_range;

        self.recorder
            .begin_render_pass(render_pass, framebuffer, area, &clear_values);
        self.recorder.set_viewport(
            Viewport::from_dimensions(dimensions.x, dimensions.y).with_depth_range(min_depth, max_depth),
        );
        self.recorder.set_scissor(area);

        pass.run_executor(self.recorder, frame_index);

        self.recorder.end_render_pass();
        compiled.post_barrier.record(self.recorder);

        Ok(())
    }
}
