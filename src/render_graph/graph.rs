//! Frame graph definition, compilation, building and execution

use glam::UVec2;

use crate::backend::traits::*;
use crate::config::FrameGraphConfig;
use crate::error::{FrameGraphError, FrameGraphResult};
use crate::render_graph::builder::{release, ResourceBuilder};
use crate::render_graph::compiler::{self, CompiledGraph, CompiledPass, Diagnostic};
use crate::render_graph::executor::PassExecutor;
use crate::render_graph::pass::*;

/// The main frame graph structure.
///
/// Passes are stored in declaration order and addressed by [`PassId`]; the
/// compiled list refers to them by id, so adding passes never invalidates it.
/// `C` is the command recorder handed to pass executors.
pub struct FrameGraph<C> {
    passes: Vec<Pass<C>>,
    config: FrameGraphConfig,
    framebuffer_extent: UVec2,
    compiled: CompiledGraph,
    dirty: bool,
}

impl<C> FrameGraph<C> {
    pub fn new() -> Self {
        Self::with_config(FrameGraphConfig::default())
    }

    pub fn with_config(config: FrameGraphConfig) -> Self {
        Self {
            passes: Vec::new(),
            framebuffer_extent: config.framebuffer_extent,
            config,
            compiled: CompiledGraph::default(),
            dirty: true,
        }
    }

    /// Add a pass. Name collisions are reported by [`compile`](Self::compile).
    pub fn add_pass(&mut self, name: impl Into<String>) -> &mut Pass<C> {
        let id = PassId(self.passes.len() as u32);
        self.passes.push(Pass::new(id, name.into()));
        self.dirty = true;
        &mut self.passes[id.index()]
    }

    /// Update the reference size of framebuffer-relative textures.
    pub fn set_framebuffer_extent(&mut self, width: u32, height: u32) {
        self.framebuffer_extent = UVec2::new(width, height);
        self.dirty = true;
    }

    pub fn framebuffer_extent(&self) -> UVec2 {
        self.framebuffer_extent
    }

    pub fn config(&self) -> &FrameGraphConfig {
        &self.config
    }

    /// Whether the graph or any pass declaration changed since the last compile.
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.passes.iter().any(|pass| pass.declarations_changed)
    }

    /// Get all passes in declaration order
    pub fn passes(&self) -> &[Pass<C>] {
        &self.passes
    }

    pub fn pass(&self, id: PassId) -> Option<&Pass<C>> {
        self.passes.get(id.index())
    }

    /// Mutable access to a declared pass. Declaring inputs or outputs through it
    /// requires a new compile; adding pipelines or replacing the executor does not.
    pub fn pass_mut(&mut self, id: PassId) -> Option<&mut Pass<C>> {
        self.passes.get_mut(id.index())
    }

    pub fn find_pass(&self, name: &str) -> Option<&Pass<C>> {
        self.passes.iter().find(|pass| pass.name() == name)
    }

    pub fn compiled(&self) -> &CompiledGraph {
        &self.compiled
    }

    /// Compiled passes in execution order
    pub fn compiled_passes(&self) -> &[CompiledPass] {
        &self.compiled.passes
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.compiled.diagnostics
    }

    /// Sort passes and derive their barriers. Does nothing when the graph has
    /// not changed since the last successful compile.
    pub fn compile<R>(&mut self, registry: &R) -> FrameGraphResult<()>
    where
        R: TextureRegistry + ?Sized,
    {
        if !self.is_dirty() {
            return Ok(());
        }

        match compiler::compile(&self.passes, registry) {
            Ok(compiled) => {
                log::debug!(
                    "{}: compiled {} passes ({} diagnostics)",
                    self.config.label,
                    compiled.passes.len(),
                    compiled.diagnostics.len()
                );
                self.compiled = compiled;
                self.dirty = false;
                for pass in &mut self.passes {
                    pass.declarations_changed = false;
                }
                Ok(())
            }
            Err(err) => {
                self.compiled = CompiledGraph::default();
                Err(err)
            }
        }
    }

    /// Create device objects for compiled passes that lack them. With `force`,
    /// passes with framebuffer-relative or presentation outputs are recreated;
    /// the caller must make sure the device no longer uses their old objects.
    ///
    /// Returns the number of passes that were (re)built.
    pub fn build<D: RenderDevice>(&mut self, device: &mut D, force: bool) -> FrameGraphResult<usize> {
        if self.is_dirty() {
            return Err(FrameGraphError::NotCompiled);
        }

        let Self {
            passes,
            compiled,
            framebuffer_extent,
            config,
            ..
        } = self;

        let mut builder = ResourceBuilder::new(device, *framebuffer_extent);
        let mut rebuilt = 0;
        for compiled_pass in &compiled.passes {
            let pass = &mut passes[compiled_pass.pass.index()];
            if builder.build_pass(pass, compiled_pass, force)? {
                rebuilt += 1;
            }
        }

        if rebuilt > 0 {
            log::debug!("{}: built {} passes (force: {})", config.label, rebuilt, force);
        }
        Ok(rebuilt)
    }

    /// Destroy every device object created by [`build`](Self::build).
    pub fn destroy<D: RenderDevice>(&mut self, device: &mut D) {
        for pass in &mut self.passes {
            release(device, pass);
        }
    }
}

impl<C: CommandRecorder> FrameGraph<C> {
    /// Record one frame: barriers, render pass and executor of every compiled pass.
    pub fn execute(&mut self, recorder: &mut C, frame_index: u32) -> FrameGraphResult<()> {
        if self.is_dirty() {
            return Err(FrameGraphError::NotCompiled);
        }

        let Self {
            passes,
            compiled,
            config,
            ..
        } = self;

        // fail before recording anything
        if let Some(unbuilt) = compiled
            .passes
            .iter()
            .map(|compiled_pass| &passes[compiled_pass.pass.index()])
            .find(|pass| pass.physical().is_none())
        {
            return Err(FrameGraphError::NotBuilt(unbuilt.name().to_string()));
        }

        let mut executor = PassExecutor::new(recorder, config.depth_range);
        for compiled_pass in &compiled.passes {
            let pass = &mut passes[compiled_pass.pass.index()];
            executor.execute_pass(pass, compiled_pass, frame_index)?;
        }
        Ok(())
    }
}

impl<C> Default for FrameGraph<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Drop for FrameGraph<C> {
    fn drop(&mut self) {
        let leaked = self
            .passes
            .iter()
            .filter(|pass| pass.has_device_objects())
            .count();
        if leaked > 0 {
            log::warn!(
                "{} dropped with device objects for {} passes; call destroy() first",
                self.config.label,
                leaked
            );
        }
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::backend::dummy::{DummyCommandRecorder, DummyDevice};
    use crate::backend::types::*;

    fn color(device: &mut DummyDevice) -> TextureHandle {
        device.create_texture(TextureDescription::new(TextureFormat::Rgba8Unorm, 32, 32))
    }

    #[test]
    fn test_add_pass() {
        let mut graph: FrameGraph<DummyCommandRecorder> = FrameGraph::new();
        let id = graph.add_pass("Test").id();
        assert_eq!(graph.pass(id).map(|pass| pass.name()), Some("Test"));
        assert_eq!(graph.passes()[0].name(), "Test");
        assert!(graph.is_dirty());
    }

    #[test]
    fn test_compile_clears_dirty_flag() {
        let mut device = DummyDevice::new();
        let texture = color(&mut device);
        let mut graph: FrameGraph<DummyCommandRecorder> = FrameGraph::new();
        graph.add_pass("A").write(texture, ClearValue::default());

        graph.compile(&device).unwrap();
        assert!(!graph.is_dirty());

        graph.set_framebuffer_extent(640, 480);
        assert!(graph.is_dirty());
        assert_eq!(graph.framebuffer_extent(), UVec2::new(640, 480));
    }

    #[test]
    fn test_pass_mut_dirties_only_on_declarations() {
        let mut device = DummyDevice::new();
        let texture = color(&mut device);
        let extra = color(&mut device);
        let mut graph: FrameGraph<DummyCommandRecorder> = FrameGraph::new();
        let id = graph.add_pass("A").write(texture, ClearValue::default()).id();
        graph.compile(&device).unwrap();

        assert_eq!(graph.pass_mut(id).map(|pass| pass.outputs().len()), Some(1));
        if let Some(pass) = graph.pass_mut(id) {
            pass.add_pipeline(PipelineDescription::new("tri", "tri.vert"));
            pass.set_executor(|_, _, _| {});
        }
        assert!(!graph.is_dirty());

        if let Some(pass) = graph.pass_mut(id) {
            pass.write(extra, ClearValue::default());
        }
        assert!(graph.is_dirty());
        assert_eq!(graph.build(&mut device, false), Err(FrameGraphError::NotCompiled));

        graph.compile(&device).unwrap();
        assert!(!graph.is_dirty());
        assert_eq!(graph.compiled_passes()[0].outputs.len(), 2);
    }

    #[test]
    fn test_failed_compile_stays_dirty() {
        let mut device = DummyDevice::new();
        let texture = color(&mut device);
        let mut graph: FrameGraph<DummyCommandRecorder> = FrameGraph::new();
        graph.add_pass("Main").write(texture, ClearValue::default());
        graph.add_pass("Main").read(texture);

        assert_eq!(
            graph.compile(&device),
            Err(FrameGraphError::DuplicatePassName("Main".into()))
        );
        assert!(graph.is_dirty());
        assert!(graph.compiled_passes().is_empty());
        assert_eq!(graph.build(&mut device, false), Err(FrameGraphError::NotCompiled));
    }

    #[test]
    fn test_execute_requires_build() {
        let mut device = DummyDevice::new();
        let texture = color(&mut device);
        let mut graph: FrameGraph<DummyCommandRecorder> = FrameGraph::new();
        graph.add_pass("A").write(texture, ClearValue::default());
        graph.compile(&device).unwrap();

        let mut recorder = DummyCommandRecorder::new();
        assert_eq!(
            graph.execute(&mut recorder, 0),
            Err(FrameGraphError::NotBuilt("A".into()))
        );
        assert!(recorder.commands().is_empty());
    }

    #[test]
    fn test_destroy_releases_everything() {
        let mut device = DummyDevice::new();
        let texture = color(&mut device);
        let mut graph: FrameGraph<DummyCommandRecorder> = FrameGraph::new();
        let pass = graph.add_pass("A");
        pass.write(texture, ClearValue::default());
        pass.add_pipeline(PipelineDescription::new("tri", "tri.vert"));

        graph.compile(&device).unwrap();
        assert_eq!(graph.build(&mut device, false), Ok(1));
        assert_eq!(device.live_render_passes(), 1);
        assert_eq!(device.live_pipelines(), 1);

        graph.destroy(&mut device);
        assert_eq!(device.live_render_passes(), 0);
        assert_eq!(device.live_framebuffers(), 0);
        assert_eq!(device.live_pipelines(), 0);
        assert!(graph.passes()[0].physical().is_none());
    }
}
