//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations. It keeps every object the
//! frame graph creates so tests can inspect descriptions and leaks, and it
//! records commands instead of submitting them.

use std::collections::HashMap;

use crate::backend::traits::*;
use crate::backend::types::*;

/// Object kind whose creation the dummy device can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DummyFailure {
    RenderPass,
    Framebuffer,
    Pipeline,
}

/// Dummy device: a texture registry plus bookkeeping for render passes,
/// framebuffers and pipelines.
#[derive(Debug, Default)]
pub struct DummyDevice {
    textures: HashMap<TextureHandle, TextureDescription>,
    render_passes: HashMap<RenderPassHandle, RenderPassDescription>,
    framebuffers: HashMap<FramebufferHandle, FramebufferDescription>,
    pipelines: HashMap<PipelineHandle, (PipelineDescription, RenderPassHandle)>,
    failure: Option<DummyFailure>,
    next_id: u64,
}

impl DummyDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Register a texture and return its handle.
    pub fn create_texture(&mut self, desc: TextureDescription) -> TextureHandle {
        let handle = TextureHandle(self.allocate_id());
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{}x{}, {:?})",
            handle,
            desc.width,
            desc.height,
            desc.layers,
            desc.size_mode
        );
        self.textures.insert(handle, desc);
        handle
    }

    /// Replace the description of a registered texture, e.g. after a swapchain resize.
    pub fn update_texture(&mut self, texture: TextureHandle, desc: TextureDescription) -> bool {
        match self.textures.get_mut(&texture) {
            Some(existing) => {
                *existing = desc;
                true
            }
            None => false,
        }
    }

    pub fn destroy_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_none() {
            log::warn!("DummyBackend: destroying unknown texture {:?}", texture);
        }
    }

    /// Make every following creation of `kind` fail until cleared with `None`.
    pub fn set_failure(&mut self, failure: Option<DummyFailure>) {
        self.failure = failure;
    }

    pub fn render_pass(&self, render_pass: RenderPassHandle) -> Option<&RenderPassDescription> {
        self.render_passes.get(&render_pass)
    }

    pub fn framebuffer(&self, framebuffer: FramebufferHandle) -> Option<&FramebufferDescription> {
        self.framebuffers.get(&framebuffer)
    }

    /// Pipeline description and the render pass it was created against.
    pub fn pipeline(&self, pipeline: PipelineHandle) -> Option<(&PipelineDescription, RenderPassHandle)> {
        self.pipelines
            .get(&pipeline)
            .map(|(desc, render_pass)| (desc, *render_pass))
    }

    pub fn live_render_passes(&self) -> usize {
        self.render_passes.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn live_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    fn check_failure(&self, kind: DummyFailure) -> bool {
        self.failure == Some(kind)
    }
}

impl TextureRegistry for DummyDevice {
    fn texture_description(&self, texture: TextureHandle) -> Option<TextureDescription> {
        self.textures.get(&texture).copied()
    }
}

impl RenderDevice for DummyDevice {
    fn create_render_pass(&mut self, desc: &RenderPassDescription) -> BackendResult<RenderPassHandle> {
        if self.check_failure(DummyFailure::RenderPass) {
            return Err(BackendError::RenderPassCreationFailed(format!(
                "injected failure for `{}`",
                desc.label
            )));
        }
        if let Some(missing) = desc
            .attachments
            .iter()
            .find(|attachment| !self.textures.contains_key(&attachment.texture))
        {
            return Err(BackendError::UnknownTexture(missing.texture));
        }

        let handle = RenderPassHandle(self.allocate_id());
        log::trace!(
            "DummyBackend: creating render pass {:?} `{}` ({} attachments)",
            handle,
            desc.label,
            desc.attachments.len()
        );
        self.render_passes.insert(handle, desc.clone());
        Ok(handle)
    }

    fn destroy_render_pass(&mut self, render_pass: RenderPassHandle) {
        if self.render_passes.remove(&render_pass).is_none() {
            log::warn!("DummyBackend: destroying unknown render pass {:?}", render_pass);
        }
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDescription) -> BackendResult<FramebufferHandle> {
        if self.check_failure(DummyFailure::Framebuffer) {
            return Err(BackendError::FramebufferCreationFailed(format!(
                "injected failure for `{}`",
                desc.label
            )));
        }
        if !self.render_passes.contains_key(&desc.render_pass) {
            return Err(BackendError::UnknownRenderPass(desc.render_pass));
        }
        for attachment in &desc.attachments {
            let texture = self
                .textures
                .get(&attachment.texture)
                .ok_or(BackendError::UnknownTexture(attachment.texture))?;
            if attachment.buffer_index >= texture.buffer_count {
                return Err(BackendError::FramebufferCreationFailed(format!(
                    "buffer {} out of range for {:?} with {} buffers",
                    attachment.buffer_index, attachment.texture, texture.buffer_count
                )));
            }
        }

        let handle = FramebufferHandle(self.allocate_id());
        log::trace!(
            "DummyBackend: creating framebuffer {:?} `{}` ({}x{}x{})",
            handle,
            desc.label,
            desc.width,
            desc.height,
            desc.layers
        );
        self.framebuffers.insert(handle, desc.clone());
        Ok(handle)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if self.framebuffers.remove(&framebuffer).is_none() {
            log::warn!("DummyBackend: destroying unknown framebuffer {:?}", framebuffer);
        }
    }

    fn create_pipeline(
        &mut self,
        desc: &PipelineDescription,
        render_pass: RenderPassHandle,
    ) -> BackendResult<PipelineHandle> {
        if self.check_failure(DummyFailure::Pipeline) {
            return Err(BackendError::PipelineCreationFailed(format!(
                "injected failure for `{}`",
                desc.label
            )));
        }
        if !self.render_passes.contains_key(&render_pass) {
            return Err(BackendError::UnknownRenderPass(render_pass));
        }

        let handle = PipelineHandle(self.allocate_id());
        log::trace!(
            "DummyBackend: creating pipeline {:?} `{}` for {:?}",
            handle,
            desc.label,
            render_pass
        );
        self.pipelines.insert(handle, (desc.clone(), render_pass));
        Ok(handle)
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        if self.pipelines.remove(&pipeline).is_none() {
            log::warn!("DummyBackend: destroying unknown pipeline {:?}", pipeline);
        }
    }
}

/// A command captured by [`DummyCommandRecorder`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    PipelineBarrier {
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
        memory_barriers: Vec<MemoryBarrier>,
        image_barriers: Vec<ImageBarrier>,
    },
    BeginRenderPass {
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        render_area: ScissorRect,
        clear_values: Vec<ClearValue>,
    },
    EndRenderPass,
    SetViewport(Viewport),
    SetScissor(ScissorRect),
    BindPipeline(PipelineHandle),
    Draw {
        vertex_count: u32,
        instance_count: u32,
    },
}

/// Command recorder that stores commands in a list
#[derive(Debug, Default)]
pub struct DummyCommandRecorder {
    commands: Vec<RecordedCommand>,
}

impl DummyCommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        self.commands.push(RecordedCommand::BindPipeline(pipeline));
    }

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32) {
        self.commands.push(RecordedCommand::Draw {
            vertex_count,
            instance_count,
        });
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RecordedCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl CommandRecorder for DummyCommandRecorder {
    fn pipeline_barrier(
        &mut self,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
        memory_barriers: &[MemoryBarrier],
        image_barriers: &[ImageBarrier],
    ) {
        self.commands.push(RecordedCommand::PipelineBarrier {
            src_stage,
            dst_stage,
            memory_barriers: memory_barriers.to_vec(),
            image_barriers: image_barriers.to_vec(),
        });
    }

    fn begin_render_pass(
        &mut self,
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        render_area: ScissorRect,
        clear_values: &[ClearValue],
    ) {
        self.commands.push(RecordedCommand::BeginRenderPass {
            render_pass,
            framebuffer,
            render_area,
            clear_values: clear_values.to_vec(),
        });
    }

    fn end_render_pass(&mut self) {
        self.commands.push(RecordedCommand::EndRenderPass);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(RecordedCommand::SetViewport(viewport));
    }

    fn set_scissor(&mut self, scissor: ScissorRect) {
        self.commands.push(RecordedCommand::SetScissor(scissor));
    }
}
