//! Render pass definitions for the frame graph

use std::fmt;

use glam::UVec3;

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::render_graph::resource::*;

/// Unique identifier for a pass: its position in the graph's pass list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(pub(crate) u32);

impl PassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a pipeline declared on a pass. Stable across rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualPipelineHandle(pub(crate) u32);

/// Executor callback: records the pass's draw commands.
///
/// Receives the command recorder, the pass's pipelines and the frame index.
pub type ExecutorFn<C> = Box<dyn FnMut(&mut C, &PipelineRegistry, u32) + Send>;

#[derive(Debug)]
struct PipelineEntry {
    description: PipelineDescription,
    handle: Option<PipelineHandle>,
}

/// Pipelines owned by a pass, resolved from virtual to physical handles
#[derive(Debug, Default)]
pub struct PipelineRegistry {
    entries: Vec<PipelineEntry>,
}

impl PipelineRegistry {
    /// Physical pipeline, or `None` before the owning pass is built.
    pub fn get(&self, handle: VirtualPipelineHandle) -> Option<PipelineHandle> {
        self.entries.get(handle.0 as usize).and_then(|entry| entry.handle)
    }

    pub fn description(&self, handle: VirtualPipelineHandle) -> Option<&PipelineDescription> {
        self.entries.get(handle.0 as usize).map(|entry| &entry.description)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn add(&mut self, description: PipelineDescription) -> VirtualPipelineHandle {
        let handle = VirtualPipelineHandle(self.entries.len() as u32);
        self.entries.push(PipelineEntry {
            description,
            handle: None,
        });
        handle
    }

    /// Recreate every pipeline against `render_pass`.
    pub(crate) fn rebuild<D: RenderDevice>(
        &mut self,
        device: &mut D,
        render_pass: RenderPassHandle,
    ) -> BackendResult<()> {
        self.destroy(device);
        self.create_missing(device, render_pass)
    }

    /// Create pipelines declared since the last build.
    pub(crate) fn create_missing<D: RenderDevice>(
        &mut self,
        device: &mut D,
        render_pass: RenderPassHandle,
    ) -> BackendResult<()> {
        for entry in self.entries.iter_mut().filter(|entry| entry.handle.is_none()) {
            entry.handle = Some(device.create_pipeline(&entry.description, render_pass)?);
        }
        Ok(())
    }

    pub(crate) fn destroy<D: RenderDevice>(&mut self, device: &mut D) {
        for entry in &mut self.entries {
            if let Some(handle) = entry.handle.take() {
                device.destroy_pipeline(handle);
            }
        }
    }

    pub(crate) fn has_live_pipelines(&self) -> bool {
        self.entries.iter().any(|entry| entry.handle.is_some())
    }
}

/// Device objects a pass owns once built
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalPass {
    pub render_pass: RenderPassHandle,
    /// One framebuffer per backing image of the pass's presentation output, or one
    pub framebuffers: Vec<FramebufferHandle>,
    pub dimensions: UVec3,
    /// Compiled outputs the render pass was created from
    pub outputs: Vec<RenderTarget>,
    pub attachments: Vec<AttachmentDescriptor>,
}

impl PhysicalPass {
    /// Whether the render pass still describes `outputs` and `attachments`.
    pub fn matches(&self, outputs: &[RenderTarget], attachments: &[AttachmentDescriptor]) -> bool {
        self.outputs == outputs && self.attachments == attachments
    }

    /// Framebuffer recorded for `frame_index`.
    pub fn framebuffer(&self, frame_index: u32) -> Option<FramebufferHandle> {
        if self.framebuffers.is_empty() {
            return None;
        }
        let index = frame_index as usize % self.framebuffers.len();
        Some(self.framebuffers[index])
    }
}

/// A node of the frame graph: the textures it writes and reads, its executor
/// and the device objects built for it.
pub struct Pass<C> {
    id: PassId,
    name: String,
    outputs: Vec<PassOutput>,
    inputs: Vec<TextureHandle>,
    executor: Option<ExecutorFn<C>>,
    /// Inputs or outputs changed since the last successful compile
    pub(crate) declarations_changed: bool,
    pub(crate) pipelines: PipelineRegistry,
    pub(crate) physical: Option<PhysicalPass>,
}

impl<C> Pass<C> {
    pub(crate) fn new(id: PassId, name: String) -> Self {
        Self {
            id,
            name,
            outputs: Vec::new(),
            inputs: Vec::new(),
            executor: None,
            declarations_changed: true,
            pipelines: PipelineRegistry::default(),
            physical: None,
        }
    }

    pub fn id(&self) -> PassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a texture this pass renders to.
    pub fn write(&mut self, texture: TextureHandle, clear_value: ClearValue) -> &mut Self {
        self.outputs.push(PassOutput {
            texture,
            clear_value,
        });
        self.declarations_changed = true;
        self
    }

    /// Declare a texture this pass samples.
    pub fn read(&mut self, texture: TextureHandle) -> &mut Self {
        self.inputs.push(texture);
        self.declarations_changed = true;
        self
    }

    pub fn set_executor<F>(&mut self, executor: F) -> &mut Self
    where
        F: FnMut(&mut C, &PipelineRegistry, u32) + Send + 'static,
    {
        self.executor = Some(Box::new(executor));
        self
    }

    /// Declare a pipeline used by this pass. It is created against the pass's
    /// render pass whenever the pass is built.
    pub fn add_pipeline(&mut self, description: PipelineDescription) -> VirtualPipelineHandle {
        self.pipelines.add(description)
    }

    pub fn outputs(&self) -> &[PassOutput] {
        &self.outputs
    }

    pub fn inputs(&self) -> &[TextureHandle] {
        &self.inputs
    }

    pub fn writes(&self, texture: TextureHandle) -> bool {
        self.outputs.iter().any(|output| output.texture == texture)
    }

    pub fn reads(&self, texture: TextureHandle) -> bool {
        self.inputs.contains(&texture)
    }

    pub fn pipelines(&self) -> &PipelineRegistry {
        &self.pipelines
    }

    pub fn physical(&self) -> Option<&PhysicalPass> {
        self.physical.as_ref()
    }

    pub fn render_pass(&self) -> Option<RenderPassHandle> {
        self.physical.as_ref().map(|physical| physical.render_pass)
    }

    pub fn framebuffers(&self) -> &[FramebufferHandle] {
        self.physical
            .as_ref()
            .map_or(&[], |physical| physical.framebuffers.as_slice())
    }

    pub fn dimensions(&self) -> Option<UVec3> {
        self.physical.as_ref().map(|physical| physical.dimensions)
    }

    pub(crate) fn has_device_objects(&self) -> bool {
        self.physical.is_some() || self.pipelines.has_live_pipelines()
    }

    /// Run the executor, if any.
    pub(crate) fn run_executor(&mut self, recorder: &mut C, frame_index: u32) {
        if let Some(executor) = self.executor.as_mut() {
            executor(recorder, &self.pipelines, frame_index);
        }
    }
}

impl<C> fmt::Debug for Pass<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pass")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("outputs", &self.outputs)
            .field("inputs", &self.inputs)
            .field("has_executor", &self.executor.is_some())
            .field("pipelines", &self.pipelines.len())
            .field("physical", &self.physical)
            .finish()
    }
}
