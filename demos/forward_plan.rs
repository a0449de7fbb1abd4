//! Forward rendering plan example.
//!
//! Declares a small forward renderer (shadow map, opaque, transparent, tonemap
//! into the swapchain), compiles it against the dummy backend and prints the
//! execution order, barriers and device objects. Then resizes the framebuffer
//! and shows which passes a forced rebuild recreates.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example forward_plan -- --width 1920 --height 1080 --swapchain-images 3
//!
//! # Show the per-object trace of the dummy backend
//! RUST_LOG=trace cargo run --example forward_plan
//! ```

use clap::Parser;

use redlilium_framegraph::backend::dummy::{DummyCommandRecorder, DummyDevice, RecordedCommand};
use redlilium_framegraph::{
    ClearValue, FrameGraph, FrameGraphConfig, FrameGraphResult, PassBarrier, PipelineDescription,
    TextureDescription, TextureFormat,
};

/// Print the compiled plan of a forward renderer.
#[derive(Parser, Debug)]
#[command(name = "forward_plan", about = "Print the compiled plan of a forward renderer", version)]
struct Args {
    /// Framebuffer width in pixels.
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Framebuffer height in pixels.
    #[arg(long, default_value = "720")]
    height: u32,

    /// Number of swapchain images.
    #[arg(long, default_value = "3")]
    swapchain_images: u32,

    /// Framebuffer size to resize to after the first build, as WIDTHxHEIGHT.
    #[arg(long, default_value = "1920x1080", value_parser = parse_extent)]
    resize: (u32, u32),

    /// Number of frames to record.
    #[arg(long, default_value = "2")]
    frames: u32,
}

fn parse_extent(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width = width.parse().map_err(|e| format!("invalid width: {e}"))?;
    let height = height.parse().map_err(|e| format!("invalid height: {e}"))?;
    Ok((width, height))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    redlilium_framegraph::init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> FrameGraphResult<()> {
    let mut device = DummyDevice::new();

    let shadow_map = device.create_texture(TextureDescription::new(TextureFormat::Depth32Float, 2048, 2048));
    let hdr = device.create_texture(TextureDescription::framebuffer_relative(
        TextureFormat::Rgba16Float,
        100,
        100,
    ));
    let depth = device.create_texture(TextureDescription::framebuffer_relative(
        TextureFormat::Depth32Float,
        100,
        100,
    ));
    let swapchain = device.create_texture(TextureDescription::presentation(
        TextureFormat::Bgra8UnormSrgb,
        args.swapchain_images,
    ));

    let mut graph: FrameGraph<DummyCommandRecorder> = FrameGraph::with_config(
        FrameGraphConfig::default()
            .with_label("forward")
            .with_framebuffer_extent(args.width, args.height),
    );

    // Declared back to front; compile sorts them.
    let tonemap = graph.add_pass("Tonemap");
    let tonemap_pipeline = tonemap.add_pipeline(
        PipelineDescription::new("tonemap", "fullscreen.vert").with_fragment_shader("tonemap.frag"),
    );
    tonemap
        .read(hdr)
        .write(swapchain, ClearValue::default())
        .set_executor(move |recorder, pipelines, _| {
            if let Some(pipeline) = pipelines.get(tonemap_pipeline) {
                recorder.bind_pipeline(pipeline);
            }
            recorder.draw(3, 1);
        });

    let transparent = graph.add_pass("Transparent");
    transparent.add_pipeline(
        PipelineDescription::new("particles", "particles.vert")
            .with_fragment_shader("particles.frag")
            .with_depth(true, false)
            .with_blend(true),
    );
    transparent
        .read(hdr)
        .read(depth)
        .write(hdr, ClearValue::default());

    graph
        .add_pass("Opaque")
        .read(shadow_map)
        .write(hdr, ClearValue::color(0.0, 0.0, 0.0, 1.0))
        .write(depth, ClearValue::depth(1.0))
        .add_pipeline(
            PipelineDescription::new("pbr", "pbr.vert")
                .with_fragment_shader("pbr.frag")
                .with_depth(true, true),
        );

    graph
        .add_pass("Shadow")
        .write(shadow_map, ClearValue::depth(1.0));

    // Never scheduled: no inputs or outputs.
    graph.add_pass("Debug Overlay");

    graph.compile(&device)?;
    let built = graph.build(&mut device, false)?;
    println!("== {} ({}x{}) ==", graph.config().label, args.width, args.height);
    print_plan(&graph, &device);
    println!("built {built} passes");

    for diagnostic in graph.diagnostics() {
        println!("note: {}", diagnostic.message);
    }

    let mut recorder = DummyCommandRecorder::new();
    for frame in 0..args.frames {
        graph.execute(&mut recorder, frame)?;
        let commands = recorder.take_commands();
        let barriers = commands
            .iter()
            .filter(|command| matches!(command, RecordedCommand::PipelineBarrier { .. }))
            .count();
        let draws = commands
            .iter()
            .filter(|command| matches!(command, RecordedCommand::Draw { .. }))
            .count();
        println!(
            "frame {frame}: {} commands, {barriers} barriers, {draws} draws",
            commands.len()
        );
    }

    let (width, height) = args.resize;
    graph.set_framebuffer_extent(width, height);
    graph.compile(&device)?;
    let rebuilt = graph.build(&mut device, true)?;
    println!("\n== resized to {width}x{height}: rebuilt {rebuilt} passes ==");
    print_plan(&graph, &device);

    graph.destroy(&mut device);
    Ok(())
}

fn print_plan(graph: &FrameGraph<DummyCommandRecorder>, device: &DummyDevice) {
    for (position, compiled) in graph.compiled_passes().iter().enumerate() {
        let Some(pass) = graph.pass(compiled.pass) else {
            continue;
        };
        println!("{position}. {}", pass.name());

        print_barrier("pre", &compiled.pre_barrier);
        for (target, attachment) in compiled.outputs.iter().zip(&compiled.attachments) {
            println!(
                "   write {:?}: {:?} -> {:?}, {:?}/{:?}",
                target.texture, target.src_layout, target.dst_layout, attachment.load_op, attachment.store_op
            );
        }
        print_barrier("post", &compiled.post_barrier);

        if let Some(dimensions) = pass.dimensions() {
            println!(
                "   {}x{}x{}, {} framebuffer(s), {} pipeline(s)",
                dimensions.x,
                dimensions.y,
                dimensions.z,
                pass.framebuffers().len(),
                pass.pipelines().len()
            );
        }
        for &framebuffer in pass.framebuffers() {
            if let Some(description) = device.framebuffer(framebuffer) {
                let buffers: Vec<u32> = description
                    .attachments
                    .iter()
                    .map(|attachment| attachment.buffer_index)
                    .collect();
                println!("   {:?} buffers {:?}", framebuffer, buffers);
            }
        }
    }
}

fn print_barrier(label: &str, barrier: &PassBarrier) {
    if !barrier.enabled {
        return;
    }
    println!("   {label}-barrier {:?} -> {:?}", barrier.src_stage, barrier.dst_stage);
    for image in &barrier.image_barriers {
        println!(
            "     {:?}: {:?} -> {:?}",
            image.texture, image.src_layout, image.dst_layout
        );
    }
}
