//! Stage, access and layout rules for the ways a pass can touch a texture.

use crate::backend::types::*;

/// How a pass accesses a texture within a render pass.
///
/// Each access mode corresponds to the image layout the texture must be in
/// and the stages and memory accesses that touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureAccess {
    /// Written as color attachment.
    ColorWrite,
    /// Written as depth/stencil attachment.
    DepthStencilWrite,
    /// Sampled in the fragment shader.
    ShaderRead,
}

impl TextureAccess {
    /// Attachment access for a written texture. Color wins over depth when a
    /// texture declares both usages; `None` if it has neither.
    pub fn from_write_usage(usage: TextureUsage) -> Option<Self> {
        if usage.contains(TextureUsage::COLOR_ATTACHMENT) {
            Some(Self::ColorWrite)
        } else if usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT) {
            Some(Self::DepthStencilWrite)
        } else {
            None
        }
    }

    pub fn layout(self) -> ImageLayout {
        match self {
            Self::ColorWrite => ImageLayout::ColorAttachment,
            Self::DepthStencilWrite => ImageLayout::DepthStencilAttachment,
            Self::ShaderRead => ImageLayout::ShaderReadOnly,
        }
    }

    pub fn stage(self) -> PipelineStage {
        match self {
            Self::ColorWrite => PipelineStage::COLOR_ATTACHMENT_OUTPUT,
            Self::DepthStencilWrite => {
                PipelineStage::EARLY_FRAGMENT_TESTS | PipelineStage::LATE_FRAGMENT_TESTS
            }
            Self::ShaderRead => PipelineStage::FRAGMENT_SHADER,
        }
    }

    /// Accesses that must be made available when this access comes first.
    pub fn src_access(self) -> Access {
        match self {
            Self::ColorWrite => Access::COLOR_ATTACHMENT_WRITE,
            Self::DepthStencilWrite => Access::DEPTH_STENCIL_ATTACHMENT_WRITE,
            Self::ShaderRead => Access::SHADER_READ,
        }
    }

    /// Accesses that must wait when this access comes second.
    pub fn dst_access(self) -> Access {
        match self {
            Self::ColorWrite => Access::COLOR_ATTACHMENT_WRITE | Access::COLOR_ATTACHMENT_READ,
            Self::DepthStencilWrite => {
                Access::DEPTH_STENCIL_ATTACHMENT_WRITE | Access::DEPTH_STENCIL_ATTACHMENT_READ
            }
            Self::ShaderRead => Access::SHADER_READ,
        }
    }
}

/// Stages and accesses of the writer that left a texture in `layout`.
///
/// Only attachment layouts have a writer inside the graph; every other layout
/// yields empty masks.
pub fn producer_scope(layout: ImageLayout) -> (PipelineStage, Access) {
    match layout {
        ImageLayout::ColorAttachment => (
            TextureAccess::ColorWrite.stage(),
            TextureAccess::ColorWrite.src_access(),
        ),
        ImageLayout::DepthStencilAttachment => (
            TextureAccess::DepthStencilWrite.stage(),
            TextureAccess::DepthStencilWrite.src_access(),
        ),
        _ => (PipelineStage::empty(), Access::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_preferred_over_depth() {
        let usage = TextureUsage::COLOR_ATTACHMENT | TextureUsage::DEPTH_STENCIL_ATTACHMENT;
        assert_eq!(TextureAccess::from_write_usage(usage), Some(TextureAccess::ColorWrite));
        assert_eq!(
            TextureAccess::from_write_usage(TextureUsage::DEPTH_STENCIL_ATTACHMENT),
            Some(TextureAccess::DepthStencilWrite)
        );
        assert_eq!(
            TextureAccess::from_write_usage(TextureUsage::SAMPLED | TextureUsage::STORAGE),
            None
        );
    }

    #[test]
    fn test_producer_scope() {
        assert_eq!(
            producer_scope(ImageLayout::DepthStencilAttachment),
            (
                PipelineStage::EARLY_FRAGMENT_TESTS | PipelineStage::LATE_FRAGMENT_TESTS,
                Access::DEPTH_STENCIL_ATTACHMENT_WRITE
            )
        );
        assert_eq!(
            producer_scope(ImageLayout::ColorAttachment),
            (PipelineStage::COLOR_ATTACHMENT_OUTPUT, Access::COLOR_ATTACHMENT_WRITE)
        );
        assert_eq!(
            producer_scope(ImageLayout::ShaderReadOnly),
            (PipelineStage::empty(), Access::empty())
        );
    }
}
