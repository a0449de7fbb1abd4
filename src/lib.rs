//! # RedLilium Frame Graph
//!
//! Per-frame declarative scheduler for GPU render passes.
//!
//! ## Overview
//!
//! Passes declare the textures they render to and the textures they sample.
//! From that the frame graph derives:
//! - an execution order where every producer runs before its consumers,
//! - the layout transitions and memory barriers around every pass,
//! - the render passes, framebuffers and pipelines each pass renders with,
//!   rebuilt only when a resize can have changed them.
//!
//! The graph never owns texture memory. Textures are described by a
//! [`TextureRegistry`], device objects come from a [`RenderDevice`] and
//! commands go to a [`CommandRecorder`]. A recording [`backend::dummy`] backend
//! and an `ash` based Vulkan backend (feature `vulkan-backend`) are included.
//!
//! ## Example
//!
//! ```ignore
//! use redlilium_framegraph::backend::dummy::{DummyCommandRecorder, DummyDevice};
//! use redlilium_framegraph::{ClearValue, FrameGraph, TextureDescription, TextureFormat};
//!
//! let mut device = DummyDevice::new();
//! let hdr = device.create_texture(TextureDescription::framebuffer_relative(
//!     TextureFormat::Rgba16Float, 100, 100,
//! ));
//! let swapchain = device.create_texture(TextureDescription::presentation(
//!     TextureFormat::Bgra8UnormSrgb, 3,
//! ));
//!
//! let mut graph = FrameGraph::<DummyCommandRecorder>::new();
//! graph.add_pass("Opaque").write(hdr, ClearValue::color(0.0, 0.0, 0.0, 1.0));
//! graph.add_pass("Tonemap").read(hdr).write(swapchain, ClearValue::default());
//!
//! graph.compile(&device)?;
//! graph.build(&mut device, false)?;
//! graph.execute(&mut DummyCommandRecorder::new(), 0)?;
//! graph.destroy(&mut device);
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod render_graph;

// Re-export main types for convenience
pub use backend::{
    BackendError, BackendResult, ClearValue, CommandRecorder, FramebufferHandle, ImageLayout,
    LoadOp, PipelineDescription, PipelineHandle, RenderDevice, RenderPassHandle, SizeMode,
    StoreOp, TextureDescription, TextureFormat, TextureHandle, TextureRegistry, TextureUsage,
};
pub use config::FrameGraphConfig;
pub use error::{ErrorKind, FrameGraphError, FrameGraphResult};
pub use render_graph::{
    CompiledGraph, CompiledPass, Diagnostic, DiagnosticLevel, FrameGraph, Pass, PassBarrier,
    PassId, PipelineRegistry, VirtualPipelineHandle,
};

/// Frame graph library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version. Optional; the frame graph needs no global setup.
pub fn init() {
    log::info!("RedLilium Frame Graph v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_frame_graph_creation() {
        let graph: FrameGraph<()> = FrameGraph::default();
        assert!(graph.passes().is_empty());
        assert!(graph.compiled_passes().is_empty());
    }
}
