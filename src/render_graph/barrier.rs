//! Barriers recorded around a pass

use crate::backend::types::*;
use crate::backend::CommandRecorder;

/// Synchronization recorded before or after a pass.
///
/// A barrier is only recorded when `enabled` is set. Stage masks accumulate
/// over every dependency folded into the barrier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassBarrier {
    pub enabled: bool,
    pub src_stage: PipelineStage,
    pub dst_stage: PipelineStage,
    pub memory_barriers: Vec<MemoryBarrier>,
    pub image_barriers: Vec<ImageBarrier>,
}

impl PassBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layout transition and widen the stage masks. Enables the barrier.
    pub fn add_image_barrier(
        &mut self,
        barrier: ImageBarrier,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
    ) {
        self.enabled = true;
        self.src_stage |= src_stage;
        self.dst_stage |= dst_stage;
        self.image_barriers.push(barrier);
    }

    /// Add a memory dependency and widen the stage masks. Enables the barrier.
    pub fn add_memory_barrier(
        &mut self,
        barrier: MemoryBarrier,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
    ) {
        self.enabled = true;
        self.src_stage |= src_stage;
        self.dst_stage |= dst_stage;
        self.memory_barriers.push(barrier);
    }

    pub fn record<C: CommandRecorder>(&self, recorder: &mut C) {
        if !self.enabled {
            return;
        }

        recorder.pipeline_barrier(
            self.src_stage,
            self.dst_stage,
            &self.memory_barriers,
            &self.image_barriers,
        );
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::backend::dummy::{DummyCommandRecorder, RecordedCommand};
    use crate::backend::TextureHandle;

    #[test]
    fn test_memory_barrier_enables() {
        let mut barrier = PassBarrier::new();
        barrier.add_memory_barrier(
            MemoryBarrier {
                src_access: Access::COLOR_ATTACHMENT_WRITE,
                dst_access: Access::COLOR_ATTACHMENT_WRITE | Access::COLOR_ATTACHMENT_READ,
            },
            PipelineStage::COLOR_ATTACHMENT_OUTPUT,
            PipelineStage::COLOR_ATTACHMENT_OUTPUT,
        );
        assert!(barrier.enabled);
        assert_eq!(barrier.src_stage, PipelineStage::COLOR_ATTACHMENT_OUTPUT);

        let mut recorder = DummyCommandRecorder::new();
        barrier.record(&mut recorder);
        assert!(matches!(
            recorder.commands(),
            [RecordedCommand::PipelineBarrier { memory_barriers, image_barriers, .. }]
                if memory_barriers.len() == 1 && image_barriers.is_empty()
        ));

        let mut recorder = DummyCommandRecorder::new();
        PassBarrier::new().record(&mut recorder);
        assert!(recorder.commands().is_empty());
    }

    #[test]
    fn test_stages_accumulate() {
        let texture = TextureHandle::from_raw(1);
        let image = ImageBarrier {
            texture,
            src_layout: ImageLayout::ColorAttachment,
            dst_layout: ImageLayout::ShaderReadOnly,
            src_access: Access::COLOR_ATTACHMENT_WRITE,
            dst_access: Access::SHADER_READ,
        };

        let mut barrier = PassBarrier::new();
        barrier.add_image_barrier(
            image,
            PipelineStage::COLOR_ATTACHMENT_OUTPUT,
            PipelineStage::FRAGMENT_SHADER,
        );
        barrier.add_image_barrier(
            image,
            PipelineStage::EARLY_FRAGMENT_TESTS,
            PipelineStage::FRAGMENT_SHADER,
        );
        assert!(barrier.enabled);
        assert_eq!(
            barrier.src_stage,
            PipelineStage::COLOR_ATTACHMENT_OUTPUT | PipelineStage::EARLY_FRAGMENT_TESTS
        );

        let mut recorder = DummyCommandRecorder::new();
        barrier.record(&mut recorder);
        assert!(matches!(
            recorder.commands(),
            [RecordedCommand::PipelineBarrier { image_barriers, .. }] if image_barriers.len() == 2
        ));
    }
}
