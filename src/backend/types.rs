//! Common types shared between backends

use bitflags::bitflags;
use glam::Vec4;

use crate::backend::traits::{RenderPassHandle, TextureHandle};

// ============================================================================
// Textures
// ============================================================================

/// Texture format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    #[default]
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Float,
    Rgba32Float,
    R32Float,
    Rg16Float,
    Depth32Float,
    Depth24PlusStencil8,
}

impl TextureFormat {
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth32Float | TextureFormat::Depth24PlusStencil8
        )
    }

    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::Depth24PlusStencil8)
    }
}

bitflags! {
    /// Usage flags for textures.
    ///
    /// Only `COLOR_ATTACHMENT` and `DEPTH_STENCIL_ATTACHMENT` matter when a texture is
    /// written by a pass; the rest describe how the owner uses the texture elsewhere.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be rendered to as a color attachment.
        const COLOR_ATTACHMENT = 1 << 0;
        /// Texture can be rendered to as a depth/stencil attachment.
        const DEPTH_STENCIL_ATTACHMENT = 1 << 1;
        /// Texture can be sampled in a shader.
        const SAMPLED = 1 << 2;
        /// Texture can be used as a storage image.
        const STORAGE = 1 << 3;
        /// Texture can be copied from.
        const COPY_SRC = 1 << 4;
        /// Texture can be copied to.
        const COPY_DST = 1 << 5;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::COLOR_ATTACHMENT | Self::SAMPLED
    }
}

/// How the width and height of a texture description are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizeMode {
    /// Width and height are in pixels
    #[default]
    Fixed,
    /// Width and height are percentages of the frame graph's framebuffer extent
    FramebufferRelative,
}

/// Description of a texture known to a [`TextureRegistry`](crate::backend::TextureRegistry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDescription {
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub size_mode: SizeMode,
    /// Number of backing images. Greater than one only for presentation targets.
    pub buffer_count: u32,
    /// The texture is a swapchain image set and must follow the framebuffer extent.
    pub presentation: bool,
}

impl TextureDescription {
    /// Fixed-size, single-layer texture. Usage is derived from the format.
    pub fn new(format: TextureFormat, width: u32, height: u32) -> Self {
        let usage = if format.is_depth() {
            TextureUsage::DEPTH_STENCIL_ATTACHMENT | TextureUsage::SAMPLED
        } else {
            TextureUsage::COLOR_ATTACHMENT | TextureUsage::SAMPLED
        };

        Self {
            format,
            usage,
            width,
            height,
            layers: 1,
            size_mode: SizeMode::Fixed,
            buffer_count: 1,
            presentation: false,
        }
    }

    /// Texture sized as a percentage of the framebuffer extent.
    pub fn framebuffer_relative(format: TextureFormat, width_percent: u32, height_percent: u32) -> Self {
        Self {
            size_mode: SizeMode::FramebufferRelative,
            ..Self::new(format, width_percent, height_percent)
        }
    }

    /// Swapchain image set covering the whole framebuffer extent.
    pub fn presentation(format: TextureFormat, buffer_count: u32) -> Self {
        Self {
            usage: TextureUsage::COLOR_ATTACHMENT,
            buffer_count: buffer_count.max(1),
            presentation: true,
            ..Self::framebuffer_relative(format, 100, 100)
        }
    }

    pub fn with_usage(mut self, usage: TextureUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    /// Whether the texture's size depends on the framebuffer extent
    pub fn follows_framebuffer(&self) -> bool {
        self.presentation || self.size_mode == SizeMode::FramebufferRelative
    }
}

// ============================================================================
// Synchronization
// ============================================================================

/// Image layout an attachment or sampled texture is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageLayout {
    #[default]
    Undefined,
    General,
    ColorAttachment,
    DepthStencilAttachment,
    DepthStencilReadOnly,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    PresentSrc,
}

bitflags! {
    /// Pipeline stages used as barrier scopes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PipelineStage: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const DRAW_INDIRECT = 1 << 1;
        const VERTEX_INPUT = 1 << 2;
        const VERTEX_SHADER = 1 << 3;
        const FRAGMENT_SHADER = 1 << 4;
        const EARLY_FRAGMENT_TESTS = 1 << 5;
        const LATE_FRAGMENT_TESTS = 1 << 6;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 7;
        const COMPUTE_SHADER = 1 << 8;
        const TRANSFER = 1 << 9;
        const BOTTOM_OF_PIPE = 1 << 10;
    }
}

bitflags! {
    /// Memory access types used in barriers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Access: u32 {
        const COLOR_ATTACHMENT_READ = 1 << 0;
        const COLOR_ATTACHMENT_WRITE = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 3;
        const SHADER_READ = 1 << 4;
        const SHADER_WRITE = 1 << 5;
        const TRANSFER_READ = 1 << 6;
        const TRANSFER_WRITE = 1 << 7;
    }
}

/// Global memory dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryBarrier {
    pub src_access: Access,
    pub dst_access: Access,
}

/// Layout transition and memory dependency for a single texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageBarrier {
    pub texture: TextureHandle,
    pub src_layout: ImageLayout,
    pub dst_layout: ImageLayout,
    pub src_access: Access,
    pub dst_access: Access,
}

// ============================================================================
// Attachments
// ============================================================================

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color(Vec4),
    DepthStencil { depth: f32, stencil: u32 },
}

impl ClearValue {
    pub fn color(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::Color(Vec4::new(r, g, b, a))
    }

    pub fn depth(depth: f32) -> Self {
        Self::DepthStencil { depth, stencil: 0 }
    }

    pub fn depth_stencil(depth: f32, stencil: u32) -> Self {
        Self::DepthStencil { depth, stencil }
    }
}

impl Default for ClearValue {
    fn default() -> Self {
        Self::Color(Vec4::ZERO)
    }
}

/// What happens to attachment contents at the start of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadOp {
    Load,
    #[default]
    Clear,
    DontCare,
}

/// What happens to attachment contents at the end of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreOp {
    #[default]
    Store,
    DontCare,
}

/// One attachment of a render pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassAttachment {
    pub texture: TextureHandle,
    pub format: TextureFormat,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
    pub clear_value: ClearValue,
}

/// Render pass descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDescription {
    pub label: String,
    /// Attachments in declaration order. Depth attachments are identified by format.
    pub attachments: Vec<RenderPassAttachment>,
}

/// One image bound to a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferAttachment {
    pub texture: TextureHandle,
    /// Which of the texture's backing images to bind
    pub buffer_index: u32,
}

/// Framebuffer descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferDescription {
    pub label: String,
    pub render_pass: RenderPassHandle,
    pub attachments: Vec<FramebufferAttachment>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

// ============================================================================
// Pipelines
// ============================================================================

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    #[default]
    None,
    Front,
    Back,
}

/// Graphics pipeline descriptor.
///
/// The render pass is not part of the description; it is supplied by the frame graph
/// each time the owning pass is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PipelineDescription {
    pub label: String,
    pub vertex_shader: String,
    pub fragment_shader: Option<String>,
    pub topology: PrimitiveTopology,
    pub cull_mode: CullMode,
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: bool,
}

impl PipelineDescription {
    pub fn new(label: impl Into<String>, vertex_shader: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            vertex_shader: vertex_shader.into(),
            ..Default::default()
        }
    }

    pub fn with_fragment_shader(mut self, shader: impl Into<String>) -> Self {
        self.fragment_shader = Some(shader.into());
        self
    }

    pub fn with_depth(mut self, test: bool, write: bool) -> Self {
        self.depth_test = test;
        self.depth_write = write;
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    pub fn with_blend(mut self, blend: bool) -> Self {
        self.blend = blend;
        self
    }
}

// ============================================================================
// Viewport and scissor
// ============================================================================

/// Viewport configuration for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// Create a viewport from dimensions with origin at (0, 0).
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    pub fn with_depth_range(mut self, min_depth: f32, max_depth: f32) -> Self {
        self.min_depth = min_depth;
        self.max_depth = max_depth;
        self
    }
}

/// Scissor rectangle, also used as render area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_usage_follows_format() {
        let color = TextureDescription::new(TextureFormat::Rgba16Float, 64, 64);
        assert!(color.usage.contains(TextureUsage::COLOR_ATTACHMENT));
        assert!(!color.follows_framebuffer());

        let depth = TextureDescription::new(TextureFormat::Depth32Float, 64, 64);
        assert!(depth.usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT));
        assert!(!depth.usage.contains(TextureUsage::COLOR_ATTACHMENT));
    }

    #[test]
    fn test_presentation_description() {
        let desc = TextureDescription::presentation(TextureFormat::Bgra8UnormSrgb, 0);
        assert_eq!(desc.buffer_count, 1);
        assert_eq!(desc.size_mode, SizeMode::FramebufferRelative);
        assert_eq!((desc.width, desc.height), (100, 100));
        assert!(desc.follows_framebuffer());
    }

    #[test]
    fn test_viewport_depth_range() {
        let viewport = Viewport::from_dimensions(800, 600).with_depth_range(1.0, 0.0);
        assert_eq!(viewport.width, 800.0);
        assert_eq!(viewport.min_depth, 1.0);
        assert_eq!(viewport.max_depth, 0.0);
    }
}
