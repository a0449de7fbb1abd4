//! Resource builder: creates render passes, framebuffers and pipelines for
//! compiled passes, and rebuilds them only when their size can have changed.

use glam::{UVec2, UVec3};

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::error::{FrameGraphError, FrameGraphResult};
use crate::render_graph::compiler::CompiledPass;
use crate::render_graph::pass::{Pass, PhysicalPass};

/// Framebuffer-relative sizes are percentages.
const HUNDRED_PERCENT: u64 = 100;

/// Physical size of a texture for the given framebuffer extent.
pub fn resolve_size(description: &TextureDescription, extent: UVec2) -> UVec2 {
    match description.size_mode {
        SizeMode::Fixed => UVec2::new(description.width, description.height),
        SizeMode::FramebufferRelative => UVec2::new(
            scale_percent(description.width, extent.x),
            scale_percent(description.height, extent.y),
        ),
    }
}

/// `percent` of `size`, saturating at `u32::MAX`.
fn scale_percent(percent: u32, size: u32) -> u32 {
    u32::try_from(percent as u64 * size as u64 / HUNDRED_PERCENT).unwrap_or(u32::MAX)
}

/// Builds device objects for compiled passes
pub(crate) struct ResourceBuilder<'a, D> {
    device: &'a mut D,
    extent: UVec2,
}

impl<'a, D: RenderDevice> ResourceBuilder<'a, D> {
    pub fn new(device: &'a mut D, extent: UVec2) -> Self {
        Self { device, extent }
    }

    /// Build `pass` if it has no render pass yet, or if `force` is set and one
    /// of its outputs follows the framebuffer extent. Returns whether it was rebuilt.
    pub fn build_pass<C>(
        &mut self,
        pass: &mut Pass<C>,
        compiled: &CompiledPass,
        force: bool,
    ) -> FrameGraphResult<bool> {
        if !self.needs_rebuild(pass, compiled, force) {
            if let Some(render_pass) = pass.render_pass() {
                pass.pipelines
                    .create_missing(self.device, render_pass)
                    .map_err(|source| build_error(pass.name(), source))?;
            }
            return Ok(false);
        }

        if compiled.outputs.is_empty() {
            return Err(FrameGraphError::MissingAttachments(pass.name().to_string()));
        }

        release(self.device, pass);
        match self.create_physical(pass.name(), compiled) {
            Ok(physical) => {
                log::trace!(
                    "Built pass `{}`: {}x{}x{}, {} framebuffer(s)",
                    pass.name(),
                    physical.dimensions.x,
                    physical.dimensions.y,
                    physical.dimensions.z,
                    physical.framebuffers.len()
                );
                let render_pass = physical.render_pass;
                pass.physical = Some(physical);

                if let Err(source) = pass.pipelines.rebuild(self.device, render_pass) {
                    release(self.device, pass);
                    return Err(build_error(pass.name(), source));
                }
                Ok(true)
            }
            Err(source) => Err(build_error(pass.name(), source)),
        }
    }

    fn needs_rebuild<C>(&self, pass: &Pass<C>, compiled: &CompiledPass, force: bool) -> bool {
        let Some(physical) = pass.physical.as_ref() else {
            return true;
        };

        // a recompile can change load ops, layouts or the attachment list itself
        if !physical.matches(&compiled.outputs, &compiled.attachments) {
            log::debug!("Pass `{}` changed since it was built", pass.name());
            return true;
        }

        force
            && compiled.outputs.iter().any(|output| {
                self.device
                    .texture_description(output.texture)
                    .is_some_and(|description| description.follows_framebuffer())
            })
    }

    fn create_physical(&mut self, name: &str, compiled: &CompiledPass) -> BackendResult<PhysicalPass> {
        let mut attachments = Vec::with_capacity(compiled.outputs.len());
        let mut buffer_counts = Vec::with_capacity(compiled.outputs.len());
        let mut dimensions: Option<UVec3> = None;

        for (target, attachment) in compiled.outputs.iter().zip(&compiled.attachments) {
            let description = self
                .device
                .texture_description(target.texture)
                .ok_or(BackendError::UnknownTexture(target.texture))?;

            let size = resolve_size(&description, self.extent);
            let size = UVec3::new(size.x, size.y, description.layers);
            if let Some(previous) = dimensions.filter(|previous| *previous != size) {
                log::warn!(
                    "Pass `{}` has attachments of different sizes ({} and {}); using the last one",
                    name,
                    previous,
                    size
                );
            }
            dimensions = Some(size);

            attachments.push(RenderPassAttachment {
                texture: target.texture,
                format: description.format,
                load_op: attachment.load_op,
                store_op: attachment.store_op,
                initial_layout: target.src_layout,
                final_layout: target.dst_layout,
                clear_value: attachment.clear_value,
            });
            buffer_counts.push(description.buffer_count.max(1));
        }

        let dimensions = dimensions.unwrap_or(UVec3::ZERO);
        let render_pass = self.device.create_render_pass(&RenderPassDescription {
            label: name.to_string(),
            attachments,
        })?;

        let framebuffer_count = buffer_counts.iter().copied().max().unwrap_or(1);
        let mut framebuffers = Vec::with_capacity(framebuffer_count as usize);
        for index in 0..framebuffer_count {
            let description = FramebufferDescription {
                label: format!("{} #{}", name, index),
                render_pass,
                attachments: compiled
                    .outputs
                    .iter()
                    .zip(&buffer_counts)
                    .map(|(target, &count)| FramebufferAttachment {
                        texture: target.texture,
                        buffer_index: index % count,
                    })
                    .collect(),
                width: dimensions.x,
                height: dimensions.y,
                layers: dimensions.z,
            };

            match self.device.create_framebuffer(&description) {
                Ok(framebuffer) => framebuffers.push(framebuffer),
                Err(err) => {
                    for framebuffer in framebuffers {
                        self.device.destroy_framebuffer(framebuffer);
                    }
                    self.device.destroy_render_pass(render_pass);
                    return Err(err);
                }
            }
        }

        Ok(PhysicalPass {
            render_pass,
            framebuffers,
            dimensions,
            outputs: compiled.outputs.clone(),
            attachments: compiled.attachments.clone(),
        })
    }
}

/// Destroy every device object owned by `pass`.
pub(crate) fn release<C, D: RenderDevice>(device: &mut D, pass: &mut Pass<C>) {
    pass.pipelines.destroy(device);
    if let Some(physical) = pass.physical.take() {
        for framebuffer in physical.framebuffers {
            device.destroy_framebuffer(framebuffer);
        }
        device.destroy_render_pass(physical.render_pass);
    }
}

fn build_error(pass: &str, source: BackendError) -> FrameGraphError {
    log::error!("Failed to build pass `{}`: {}", pass, source);
    FrameGraphError::ResourceBuild {
        pass: pass.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_size() {
        let extent = UVec2::new(1920, 1080);

        let fixed = TextureDescription::new(TextureFormat::Rgba8Unorm, 512, 256);
        assert_eq!(resolve_size(&fixed, extent), UVec2::new(512, 256));

        let half = TextureDescription::framebuffer_relative(TextureFormat::Rgba16Float, 50, 50);
        assert_eq!(resolve_size(&half, extent), UVec2::new(960, 540));

        let present = TextureDescription::presentation(TextureFormat::Bgra8Unorm, 2);
        assert_eq!(resolve_size(&present, extent), extent);
    }

    #[test]
    fn test_resolve_size_large_extent() {
        let desc = TextureDescription::framebuffer_relative(TextureFormat::Rgba8Unorm, 200, 100);
        let extent = UVec2::new(40_000_000, 1);
        assert_eq!(resolve_size(&desc, extent), UVec2::new(80_000_000, 1));
    }

    #[test]
    fn test_resolve_size_saturates() {
        let desc = TextureDescription::framebuffer_relative(TextureFormat::Rgba8Unorm, 400, 100);
        let extent = UVec2::new(u32::MAX / 2, 640);
        assert_eq!(resolve_size(&desc, extent), UVec2::new(u32::MAX, 640));
    }
}
