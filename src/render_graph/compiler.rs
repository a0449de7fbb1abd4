//! Frame graph compilation
//!
//! Turns the declared passes into an execution order and annotates every
//! surviving pass with its attachment load/store operations and the barriers
//! recorded around it. Compilation never touches device objects.

use std::collections::{HashMap, HashSet};

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::error::{FrameGraphError, FrameGraphResult};
use crate::render_graph::barrier::PassBarrier;
use crate::render_graph::pass::{Pass, PassId};
use crate::render_graph::resource::*;
use crate::render_graph::sync::{producer_scope, TextureAccess};

/// Severity of a compiler diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticLevel {
    Debug,
    Warning,
}

/// Non-fatal finding reported alongside a successful compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub pass: Option<PassId>,
    pub message: String,
}

/// A pass in execution order, with everything the builder and executor need
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPass {
    pub pass: PassId,
    /// One entry per declared input, in declaration order
    pub inputs: Vec<RenderTarget>,
    /// One entry per declared output, in declaration order
    pub outputs: Vec<RenderTarget>,
    /// Parallel to `outputs`
    pub attachments: Vec<AttachmentDescriptor>,
    pub pre_barrier: PassBarrier,
    pub post_barrier: PassBarrier,
}

/// Result of compiling a frame graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledGraph {
    pub passes: Vec<CompiledPass>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledGraph {
    /// Pass ids in execution order
    pub fn order(&self) -> Vec<PassId> {
        self.passes.iter().map(|compiled| compiled.pass).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Compile `passes` against the textures known to `registry`.
pub fn compile<C, R>(passes: &[Pass<C>], registry: &R) -> FrameGraphResult<CompiledGraph>
where
    R: TextureRegistry + ?Sized,
{
    check_unique_names(passes)?;

    let mut diagnostics = Vec::new();
    let surviving = prune(passes, &mut diagnostics);

    let adjacency = build_adjacency(passes, &surviving);
    let order = sort(passes, &surviving, &adjacency)?;

    let mut layouts: HashMap<TextureHandle, ImageLayout> = HashMap::new();
    let mut compiled = Vec::with_capacity(order.len());
    for id in order {
        compiled.push(resolve_pass(&passes[id.index()], registry, &mut layouts)?);
    }

    log::debug!(
        "Compiled frame graph: {} of {} passes scheduled",
        compiled.len(),
        passes.len()
    );

    Ok(CompiledGraph {
        passes: compiled,
        diagnostics,
    })
}

fn check_unique_names<C>(passes: &[Pass<C>]) -> FrameGraphResult<()> {
    let mut names = HashSet::with_capacity(passes.len());
    for pass in passes {
        if !names.insert(pass.name()) {
            log::error!("Frame graph has more than one pass named `{}`", pass.name());
            return Err(FrameGraphError::DuplicatePassName(pass.name().to_string()));
        }
    }
    Ok(())
}

/// Arena indices of passes that declare at least one input or output.
fn prune<C>(passes: &[Pass<C>], diagnostics: &mut Vec<Diagnostic>) -> Vec<usize> {
    let mut surviving = Vec::with_capacity(passes.len());
    for (index, pass) in passes.iter().enumerate() {
        if pass.inputs().is_empty() && pass.outputs().is_empty() {
            log::debug!("Pass `{}` has no inputs or outputs and is skipped", pass.name());
            diagnostics.push(Diagnostic {
                level: DiagnosticLevel::Debug,
                pass: Some(pass.id()),
                message: format!("pass `{}` has no inputs or outputs and was skipped", pass.name()),
            });
            continue;
        }
        surviving.push(index);
    }
    surviving
}

/// Edges writer -> reader between surviving passes, indexed by position in `surviving`.
fn build_adjacency<C>(passes: &[Pass<C>], surviving: &[usize]) -> Vec<Vec<usize>> {
    let mut readers: HashMap<TextureHandle, Vec<usize>> = HashMap::new();
    for (node, &index) in surviving.iter().enumerate() {
        for &texture in passes[index].inputs() {
            readers.entry(texture).or_default().push(node);
        }
    }

    surviving
        .iter()
        .enumerate()
        .map(|(node, &index)| {
            passes[index]
                .outputs()
                .iter()
                .filter_map(|output| readers.get(&output.texture))
                .flatten()
                .copied()
                // reading and writing the same texture is not a dependency on itself
                .filter(|&reader| reader != node)
                .collect()
        })
        .collect()
}

/// Depth-first topological sort. Traversal starts at the last surviving pass
/// and the post-order is reversed, so independent passes keep declaration order.
fn sort<C>(passes: &[Pass<C>], surviving: &[usize], adjacency: &[Vec<usize>]) -> FrameGraphResult<Vec<PassId>> {
    let mut marks = vec![Mark::Unvisited; surviving.len()];
    let mut post_order = Vec::with_capacity(surviving.len());

    for node in (0..surviving.len()).rev() {
        if marks[node] == Mark::Unvisited {
            visit(node, adjacency, &mut marks, &mut post_order).map_err(|node| {
                let name = passes[surviving[node]].name().to_string();
                log::error!("Frame graph has a cycle through pass `{}`", name);
                FrameGraphError::CyclicDependency(name)
            })?;
        }
    }

    Ok(post_order
        .into_iter()
        .rev()
        .map(|node| passes[surviving[node]].id())
        .collect())
}

/// Returns the node closing a cycle on failure.
fn visit(
    node: usize,
    adjacency: &[Vec<usize>],
    marks: &mut [Mark],
    post_order: &mut Vec<usize>,
) -> Result<(), usize> {
    marks[node] = Mark::InProgress;
    for &child in &adjacency[node] {
        match marks[child] {
            Mark::Done => {}
            Mark::InProgress => return Err(child),
            Mark::Unvisited => visit(child, adjacency, marks, post_order)?,
        }
    }
    marks[node] = Mark::Done;
    post_order.push(node);
    Ok(())
}

/// Derive barriers and attachment operations for one pass, advancing the
/// per-texture layout state.
fn resolve_pass<C, R>(
    pass: &Pass<C>,
    registry: &R,
    layouts: &mut HashMap<TextureHandle, ImageLayout>,
) -> FrameGraphResult<CompiledPass>
where
    R: TextureRegistry + ?Sized,
{
    let mut pre_barrier = PassBarrier::new();
    let mut post_barrier = PassBarrier::new();
    let mut inputs = Vec::with_capacity(pass.inputs().len());
    let mut outputs = Vec::with_capacity(pass.outputs().len());
    let mut attachments = Vec::with_capacity(pass.outputs().len());

    let shader_read = TextureAccess::ShaderRead;

    for &texture in pass.inputs() {
        let src_layout = *layouts
            .get(&texture)
            .ok_or_else(|| FrameGraphError::UnresolvedRead {
                pass: pass.name().to_string(),
                texture,
            })?;
        let (other_stage, other_access) = producer_scope(src_layout);

        pre_barrier.add_image_barrier(
            ImageBarrier {
                texture,
                src_layout,
                dst_layout: shader_read.layout(),
                src_access: other_access,
                dst_access: shader_read.src_access(),
            },
            other_stage,
            shader_read.stage(),
        );
        post_barrier.add_image_barrier(
            ImageBarrier {
                texture,
                src_layout: shader_read.layout(),
                dst_layout: src_layout,
                src_access: shader_read.src_access(),
                dst_access: other_access,
            },
            shader_read.stage(),
            other_stage,
        );

        inputs.push(RenderTarget {
            texture,
            src_layout,
            dst_layout: shader_read.layout(),
        });
    }

    for output in pass.outputs() {
        let texture = output.texture;
        let description = registry
            .texture_description(texture)
            .ok_or_else(|| FrameGraphError::UnknownTexture {
                pass: pass.name().to_string(),
                texture,
            })?;
        let access = TextureAccess::from_write_usage(description.usage).ok_or_else(|| {
            FrameGraphError::InvalidAttachmentUsage {
                pass: pass.name().to_string(),
                texture,
            }
        })?;

        let (src_layout, attachment) = match layouts.get(&texture) {
            Some(&layout) => (layout, AttachmentDescriptor::loaded(output.clear_value)),
            None => (
                ImageLayout::Undefined,
                AttachmentDescriptor::cleared(output.clear_value),
            ),
        };

        post_barrier.add_memory_barrier(
            MemoryBarrier {
                src_access: access.src_access(),
                dst_access: access.dst_access(),
            },
            access.stage(),
            access.stage(),
        );

        outputs.push(RenderTarget {
            texture,
            src_layout,
            dst_layout: access.layout(),
        });
        attachments.push(attachment);
        layouts.insert(texture, access.layout());
    }

    Ok(CompiledPass {
        pass: pass.id(),
        inputs,
        outputs,
        attachments,
        pre_barrier,
        post_barrier,
    })
}
