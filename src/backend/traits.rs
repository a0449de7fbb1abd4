//! Core backend abstraction traits
//!
//! These traits define what the frame graph needs from a GPU backend: texture
//! descriptions at compile time, object creation at build time and command
//! recording at execute time.

use crate::backend::types::*;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to create render pass: {0}")]
    RenderPassCreationFailed(String),
    #[error("Failed to create framebuffer: {0}")]
    FramebufferCreationFailed(String),
    #[error("Failed to create pipeline: {0}")]
    PipelineCreationFailed(String),
    #[error("Failed to create shader: {0}")]
    ShaderCreationFailed(String),
    #[error("Unknown texture: {0:?}")]
    UnknownTexture(TextureHandle),
    #[error("Unknown render pass: {0:?}")]
    UnknownRenderPass(RenderPassHandle),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a texture owned by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub(crate) u64);

/// Handle to a render pass object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPassHandle(pub(crate) u64);

/// Handle to a framebuffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferHandle(pub(crate) u64);

/// Handle to a graphics pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineHandle(pub(crate) u64);

macro_rules! impl_raw_handle {
    ($($handle:ident),*) => {
        $(
            impl $handle {
                /// Wrap a backend-specific id.
                pub const fn from_raw(raw: u64) -> Self {
                    Self(raw)
                }

                pub const fn raw(self) -> u64 {
                    self.0
                }
            }
        )*
    };
}

impl_raw_handle!(TextureHandle, RenderPassHandle, FramebufferHandle, PipelineHandle);

/// Read-only view of the textures a frame graph may reference
pub trait TextureRegistry {
    /// Description of a registered texture, or `None` if the handle is unknown.
    fn texture_description(&self, texture: TextureHandle) -> Option<TextureDescription>;
}

/// Creates and destroys the physical objects owned by frame graph passes
pub trait RenderDevice: TextureRegistry {
    fn create_render_pass(&mut self, desc: &RenderPassDescription) -> BackendResult<RenderPassHandle>;
    fn destroy_render_pass(&mut self, render_pass: RenderPassHandle);

    fn create_framebuffer(&mut self, desc: &FramebufferDescription) -> BackendResult<FramebufferHandle>;
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Create a pipeline compatible with `render_pass`.
    fn create_pipeline(
        &mut self,
        desc: &PipelineDescription,
        render_pass: RenderPassHandle,
    ) -> BackendResult<PipelineHandle>;
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);
}

/// Command recording interface used by the frame graph executor
pub trait CommandRecorder {
    fn pipeline_barrier(
        &mut self,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
        memory_barriers: &[MemoryBarrier],
        image_barriers: &[ImageBarrier],
    );

    fn begin_render_pass(
        &mut self,
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        render_area: ScissorRect,
        clear_values: &[ClearValue],
    );
    fn end_render_pass(&mut self);

    fn set_viewport(&mut self, viewport: Viewport);
    fn set_scissor(&mut self, scissor: ScissorRect);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_handles() {
        let texture = TextureHandle::from_raw(7);
        assert_eq!(texture.raw(), 7);
        assert_eq!(texture, TextureHandle(7));
        assert!(RenderPassHandle::from_raw(1) < RenderPassHandle::from_raw(2));
    }

    #[test]
    fn test_backend_error_messages() {
        let err = BackendError::PipelineCreationFailed("no shader `fullscreen`".into());
        assert_eq!(err.to_string(), "Failed to create pipeline: no shader `fullscreen`");
        assert_eq!(
            BackendError::UnknownTexture(TextureHandle(3)).to_string(),
            "Unknown texture: TextureHandle(3)"
        );
    }
}
