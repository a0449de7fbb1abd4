//! Command recording on a Vulkan command buffer.

use std::sync::Arc;

use ash::vk;
use parking_lot::RwLock;

use crate::backend::traits::*;
use crate::backend::types::*;

use super::conversion::*;
use super::VulkanObjects;

/// Records frame graph commands into a command buffer in the recording state
pub struct VulkanCommandRecorder {
    device: ash::Device,
    objects: Arc<RwLock<VulkanObjects>>,
    command_buffer: vk::CommandBuffer,
    frame_index: u32,
}

impl VulkanCommandRecorder {
    pub(crate) fn new(
        device: ash::Device,
        objects: Arc<RwLock<VulkanObjects>>,
        command_buffer: vk::CommandBuffer,
        frame_index: u32,
    ) -> Self {
        Self {
            device,
            objects,
            command_buffer,
            frame_index,
        }
    }

    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        let Some(vk_pipeline) = self.objects.read().pipelines.get(&pipeline).copied() else {
            log::warn!("Vulkan: binding unknown pipeline {:?}", pipeline);
            return;
        };
        unsafe {
            self.device
                .cmd_bind_pipeline(self.command_buffer, vk::PipelineBindPoint::GRAPHICS, vk_pipeline);
        }
    }

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32) {
        unsafe {
            self.device
                .cmd_draw(self.command_buffer, vertex_count, instance_count, 0, 0);
        }
    }
}

impl CommandRecorder for VulkanCommandRecorder {
    fn pipeline_barrier(
        &mut self,
        src_stage: PipelineStage,
        dst_stage: PipelineStage,
        memory_barriers: &[MemoryBarrier],
        image_barriers: &[ImageBarrier],
    ) {
        // Vulkan rejects empty stage masks
        let src_stage = if src_stage.is_empty() {
            vk::PipelineStageFlags::TOP_OF_PIPE
        } else {
            convert_pipeline_stage(src_stage)
        };
        let dst_stage = if dst_stage.is_empty() {
            vk::PipelineStageFlags::BOTTOM_OF_PIPE
        } else {
            convert_pipeline_stage(dst_stage)
        };

        let vk_memory_barriers: Vec<vk::MemoryBarrier> = memory_barriers
            .iter()
            .map(|barrier| {
                vk::MemoryBarrier::default()
                    .src_access_mask(convert_access(barrier.src_access))
                    .dst_access_mask(convert_access(barrier.dst_access))
            })
            .collect();

        let objects = self.objects.read();
        let vk_image_barriers: Vec<vk::ImageMemoryBarrier> = image_barriers
            .iter()
            .filter_map(|barrier| {
                let Some((texture, image)) = objects.texture_image(barrier.texture, self.frame_index) else {
                    log::warn!("Vulkan: barrier on unknown texture {:?}", barrier.texture);
                    return None;
                };

                Some(
                    vk::ImageMemoryBarrier::default()
                        .old_layout(convert_image_layout(barrier.src_layout))
                        .new_layout(convert_image_layout(barrier.dst_layout))
                        .src_access_mask(convert_access(barrier.src_access))
                        .dst_access_mask(convert_access(barrier.dst_access))
                        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                        .image(image.image)
                        .subresource_range(vk::ImageSubresourceRange {
                            aspect_mask: aspect_mask(texture.description.format),
                            base_mip_level: 0,
                            level_count: vk::REMAINING_MIP_LEVELS,
                            base_array_layer: 0,
                            layer_count: vk::REMAINING_ARRAY_LAYERS,
                        }),
                )
            })
            .collect();

        unsafe {
            self.device.cmd_pipeline_barrier(
                self.command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &vk_memory_barriers,
                &[],
                &vk_image_barriers,
            );
        }
    }

    fn begin_render_pass(
        &mut self,
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
        render_area: ScissorRect,
        clear_values: &[ClearValue],
    ) {
        let (vk_render_pass, vk_framebuffer) = {
            let objects = self.objects.read();
            let vk_render_pass = objects
                .render_passes
                .get(&render_pass)
                .map(|render_pass| render_pass.render_pass);
            let vk_framebuffer = objects.framebuffers.get(&framebuffer).copied();
            match (vk_render_pass, vk_framebuffer) {
                (Some(render_pass), Some(framebuffer)) => (render_pass, framebuffer),
                _ => {
                    log::error!(
                        "Vulkan: cannot begin render pass {:?} with framebuffer {:?}",
                        render_pass,
                        framebuffer
                    );
                    return;
                }
            }
        };

        let vk_clear_values: Vec<vk::ClearValue> =
            clear_values.iter().copied().map(convert_clear_value).collect();
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass)
            .framebuffer(vk_framebuffer)
            .render_area(convert_rect(render_area))
            .clear_values(&vk_clear_values);

        unsafe {
            self.device
                .cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
    }

    fn end_render_pass(&mut self) {
        unsafe {
            self.device.cmd_end_render_pass(self.command_buffer);
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe {
            self.device
                .cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
    }

    fn set_scissor(&mut self, scissor: ScissorRect) {
        unsafe {
            self.device
                .cmd_set_scissor(self.command_buffer, 0, &[convert_rect(scissor)]);
        }
    }
}
