//! Frame graph configuration

use glam::UVec2;

/// Configuration for a [`FrameGraph`](crate::render_graph::FrameGraph)
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGraphConfig {
    /// Name used in log messages and object labels
    pub label: String,
    /// Initial framebuffer extent, normally the swapchain size
    pub framebuffer_extent: UVec2,
    /// Depth range of the viewport set for every pass
    pub depth_range: (f32, f32),
}

impl Default for FrameGraphConfig {
    fn default() -> Self {
        Self {
            label: "frame graph".to_string(),
            framebuffer_extent: UVec2::new(1280, 720),
            depth_range: (0.0, 1.0),
        }
    }
}

impl FrameGraphConfig {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_framebuffer_extent(mut self, width: u32, height: u32) -> Self {
        self.framebuffer_extent = UVec2::new(width, height);
        self
    }

    /// Reverse-Z setups pass `(1.0, 0.0)`.
    pub fn with_depth_range(mut self, min_depth: f32, max_depth: f32) -> Self {
        self.depth_range = (min_depth, max_depth);
        self
    }
}
