use criterion::{Criterion, black_box, criterion_group, criterion_main};

use redlilium_framegraph::backend::dummy::{DummyCommandRecorder, DummyDevice};
use redlilium_framegraph::{
    ClearValue, FrameGraph, PipelineDescription, TextureDescription, TextureFormat, TextureHandle,
};

type BenchGraph = FrameGraph<DummyCommandRecorder>;

fn relative_target(device: &mut DummyDevice, format: TextureFormat) -> TextureHandle {
    device.create_texture(TextureDescription::framebuffer_relative(format, 100, 100))
}

/// Linear chain of `count` passes, each sampling the previous pass' output.
/// Declared in reverse so the sort has work to do.
fn chain_graph(device: &mut DummyDevice, count: usize) -> BenchGraph {
    let targets: Vec<_> = (0..count)
        .map(|_| relative_target(device, TextureFormat::Rgba16Float))
        .collect();

    let mut graph = BenchGraph::new();
    for i in (0..count).rev() {
        let pass = graph.add_pass(format!("pass_{i}"));
        if i > 0 {
            pass.read(targets[i - 1]);
        }
        pass.write(targets[i], ClearValue::default());
        pass.add_pipeline(PipelineDescription::new(format!("pipeline_{i}"), "fullscreen.vert"));
    }
    graph
}

/// Shadow cascades, gbuffer, lighting, a blur chain and a tonemap into a
/// triple-buffered swapchain.
fn deferred_graph(device: &mut DummyDevice) -> BenchGraph {
    let swapchain = device.create_texture(TextureDescription::presentation(TextureFormat::Bgra8UnormSrgb, 3));
    let depth = relative_target(device, TextureFormat::Depth32Float);
    let albedo = relative_target(device, TextureFormat::Rgba8Unorm);
    let normals = relative_target(device, TextureFormat::Rg16Float);
    let hdr = relative_target(device, TextureFormat::Rgba16Float);

    let mut graph = BenchGraph::new();
    let cascades: Vec<_> = (0..4)
        .map(|i| {
            let cascade = device.create_texture(TextureDescription::new(TextureFormat::Depth32Float, 2048, 2048));
            graph
                .add_pass(format!("shadow_{i}"))
                .write(cascade, ClearValue::depth(1.0));
            cascade
        })
        .collect();

    graph
        .add_pass("gbuffer")
        .write(albedo, ClearValue::default())
        .write(normals, ClearValue::default())
        .write(depth, ClearValue::depth(1.0));

    let lighting = graph.add_pass("lighting");
    lighting.read(albedo).read(normals).read(depth);
    for &cascade in &cascades {
        lighting.read(cascade);
    }
    lighting.write(hdr, ClearValue::default());

    let mut source = hdr;
    for i in 0..6 {
        let target = device.create_texture(TextureDescription::framebuffer_relative(
            TextureFormat::Rgba16Float,
            50,
            50,
        ));
        graph
            .add_pass(format!("blur_{i}"))
            .read(source)
            .write(target, ClearValue::default());
        source = target;
    }

    graph
        .add_pass("tonemap")
        .read(hdr)
        .read(source)
        .write(swapchain, ClearValue::default());
    graph
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

fn bench_compile_chain(c: &mut Criterion) {
    let mut device = DummyDevice::new();
    let mut graph = chain_graph(&mut device, 64);

    c.bench_function("frame_graph_compile_64_pass_chain", |b| {
        b.iter(|| {
            // an extent change forces a full recompile
            graph.set_framebuffer_extent(1920, 1080);
            graph.compile(&device).unwrap();
            black_box(graph.compiled_passes().len());
        });
    });
}

fn bench_compile_deferred(c: &mut Criterion) {
    let mut device = DummyDevice::new();
    let mut graph = deferred_graph(&mut device);

    c.bench_function("frame_graph_compile_deferred", |b| {
        b.iter(|| {
            graph.set_framebuffer_extent(1920, 1080);
            graph.compile(&device).unwrap();
            black_box(graph.compiled_passes().len());
        });
    });
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

fn bench_forced_rebuild(c: &mut Criterion) {
    let mut device = DummyDevice::new();
    let mut graph = deferred_graph(&mut device);
    graph.compile(&device).unwrap();
    graph.build(&mut device, false).unwrap();

    c.bench_function("frame_graph_forced_rebuild_deferred", |b| {
        b.iter(|| black_box(graph.build(&mut device, true).unwrap()));
    });

    graph.destroy(&mut device);
}

fn bench_lazy_build(c: &mut Criterion) {
    let mut device = DummyDevice::new();
    let mut graph = chain_graph(&mut device, 64);
    graph.compile(&device).unwrap();
    graph.build(&mut device, false).unwrap();

    c.bench_function("frame_graph_lazy_build_64_pass_chain", |b| {
        b.iter(|| black_box(graph.build(&mut device, false).unwrap()));
    });

    graph.destroy(&mut device);
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

fn bench_execute(c: &mut Criterion) {
    let mut device = DummyDevice::new();
    let mut graph = deferred_graph(&mut device);
    graph.compile(&device).unwrap();
    graph.build(&mut device, false).unwrap();

    let mut recorder = DummyCommandRecorder::new();
    let mut frame = 0u32;
    c.bench_function("frame_graph_execute_deferred", |b| {
        b.iter(|| {
            graph.execute(&mut recorder, frame).unwrap();
            frame = frame.wrapping_add(1);
            black_box(recorder.take_commands());
        });
    });

    graph.destroy(&mut device);
}

criterion_group!(
    benches,
    bench_compile_chain,
    bench_compile_deferred,
    bench_forced_rebuild,
    bench_lazy_build,
    bench_execute,
);
criterion_main!(benches);
