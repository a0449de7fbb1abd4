//! Shared fixtures for frame graph integration tests.

#![allow(dead_code)]

use redlilium_framegraph::backend::dummy::{DummyCommandRecorder, DummyDevice};
use redlilium_framegraph::{
    ClearValue, FrameGraph, FrameGraphConfig, PassId, PipelineDescription, TextureDescription,
    TextureFormat, TextureHandle, VirtualPipelineHandle,
};

pub type TestGraph = FrameGraph<DummyCommandRecorder>;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

/// Route `log` output to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn new_graph() -> TestGraph {
    FrameGraph::with_config(
        FrameGraphConfig::default()
            .with_label("test graph")
            .with_framebuffer_extent(WIDTH, HEIGHT),
    )
}

pub fn color_target(device: &mut DummyDevice) -> TextureHandle {
    device.create_texture(TextureDescription::framebuffer_relative(
        TextureFormat::Rgba16Float,
        100,
        100,
    ))
}

pub fn depth_target(device: &mut DummyDevice) -> TextureHandle {
    device.create_texture(TextureDescription::framebuffer_relative(
        TextureFormat::Depth32Float,
        100,
        100,
    ))
}

/// Shadow -> Opaque -> Post, with a fixed-size shadow map, screen-sized HDR and
/// depth targets and a multi-buffered swapchain.
pub struct ForwardScene {
    pub device: DummyDevice,
    pub graph: TestGraph,
    pub shadow_map: TextureHandle,
    pub hdr: TextureHandle,
    pub depth: TextureHandle,
    pub swapchain: TextureHandle,
    pub shadow: PassId,
    pub opaque: PassId,
    pub post: PassId,
    pub pbr: VirtualPipelineHandle,
    pub tonemap: VirtualPipelineHandle,
}

impl ForwardScene {
    pub fn new(swapchain_images: u32) -> Self {
        init_logging();

        let mut device = DummyDevice::new();
        let shadow_map =
            device.create_texture(TextureDescription::new(TextureFormat::Depth32Float, 1024, 1024));
        let hdr = color_target(&mut device);
        let depth = depth_target(&mut device);
        let swapchain = device.create_texture(TextureDescription::presentation(
            TextureFormat::Bgra8UnormSrgb,
            swapchain_images,
        ));

        let mut graph = new_graph();
        let shadow = graph
            .add_pass("Shadow")
            .write(shadow_map, ClearValue::depth(1.0))
            .id();

        let opaque_pass = graph.add_pass("Opaque");
        opaque_pass
            .read(shadow_map)
            .write(hdr, ClearValue::color(0.0, 0.0, 0.0, 1.0))
            .write(depth, ClearValue::depth(1.0));
        let pbr = opaque_pass.add_pipeline(
            PipelineDescription::new("pbr", "pbr.vert")
                .with_fragment_shader("pbr.frag")
                .with_depth(true, true),
        );
        let opaque = opaque_pass.id();

        let post_pass = graph.add_pass("Post");
        let tonemap = post_pass.add_pipeline(
            PipelineDescription::new("tonemap", "fullscreen.vert").with_fragment_shader("tonemap.frag"),
        );
        post_pass
            .read(hdr)
            .write(swapchain, ClearValue::default())
            .set_executor(move |recorder, pipelines, _| {
                if let Some(pipeline) = pipelines.get(tonemap) {
                    recorder.bind_pipeline(pipeline);
                }
                recorder.draw(3, 1);
            });
        let post = post_pass.id();

        Self {
            device,
            graph,
            shadow_map,
            hdr,
            depth,
            swapchain,
            shadow,
            opaque,
            post,
            pbr,
            tonemap,
        }
    }

    pub fn compile_and_build(&mut self, force: bool) -> usize {
        self.graph.compile(&self.device).expect("compile");
        self.graph.build(&mut self.device, force).expect("build")
    }
}

impl Drop for ForwardScene {
    fn drop(&mut self) {
        self.graph.destroy(&mut self.device);
    }
}
