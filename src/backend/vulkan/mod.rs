//! Vulkan backend implementation using ash
//!
//! The device does not allocate images. The application registers the images
//! and views it owns (including swapchain images) as textures; the frame graph
//! then creates render passes, framebuffers and pipelines on top of them.

mod conversion;
mod pipeline;
mod recorder;

use std::collections::HashMap;
use std::sync::Arc;

use ash::vk;
use parking_lot::RwLock;

use crate::backend::traits::*;
use crate::backend::types::*;

use conversion::*;
use pipeline::{create_graphics_pipeline, PipelineInputs};
pub use recorder::VulkanCommandRecorder;

/// Image and view backing one buffer of a registered texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureImage {
    pub image: vk::Image,
    pub view: vk::ImageView,
}

struct VkTexture {
    description: TextureDescription,
    images: Vec<TextureImage>,
}

struct VkRenderPass {
    render_pass: vk::RenderPass,
    color_attachment_count: u32,
}

/// Objects shared between the device and the command recorders it hands out
#[derive(Default)]
pub(crate) struct VulkanObjects {
    textures: HashMap<TextureHandle, VkTexture>,
    render_passes: HashMap<RenderPassHandle, VkRenderPass>,
    framebuffers: HashMap<FramebufferHandle, vk::Framebuffer>,
    pipelines: HashMap<PipelineHandle, vk::Pipeline>,
}

impl VulkanObjects {
    fn texture_image(&self, texture: TextureHandle, buffer_index: u32) -> Option<(&VkTexture, TextureImage)> {
        let vk_texture = self.textures.get(&texture)?;
        if vk_texture.images.is_empty() {
            return None;
        }
        let index = buffer_index as usize % vk_texture.images.len();
        Some((vk_texture, vk_texture.images[index]))
    }
}

/// Vulkan device used by the frame graph
pub struct VulkanDevice {
    device: ash::Device,
    objects: Arc<RwLock<VulkanObjects>>,
    shaders: HashMap<String, vk::ShaderModule>,
    pipeline_layout: vk::PipelineLayout,
    next_id: u64,
    destroyed: bool,
}

impl VulkanDevice {
    /// Wrap a logical device. Pipelines are created with an empty pipeline layout.
    pub fn new(device: ash::Device) -> BackendResult<Self> {
        let layout_info = vk::PipelineLayoutCreateInfo::default();
        let pipeline_layout = unsafe { device.create_pipeline_layout(&layout_info, None) }
            .map_err(|e| BackendError::PipelineCreationFailed(format!("pipeline layout: {:?}", e)))?;

        Ok(Self {
            device,
            objects: Arc::new(RwLock::new(VulkanObjects::default())),
            shaders: HashMap::new(),
            pipeline_layout,
            next_id: 0,
            destroyed: false,
        })
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Register application-owned images as a texture. Presentation textures pass
    /// one image per swapchain buffer.
    pub fn register_texture(&mut self, description: TextureDescription, images: Vec<TextureImage>) -> TextureHandle {
        let handle = TextureHandle(self.allocate_id());
        self.objects.write().textures.insert(
            handle,
            VkTexture {
                description,
                images,
            },
        );
        handle
    }

    /// Replace the images and description of a texture, e.g. after swapchain recreation.
    pub fn update_texture(
        &mut self,
        texture: TextureHandle,
        description: TextureDescription,
        images: Vec<TextureImage>,
    ) -> BackendResult<()> {
        let mut objects = self.objects.write();
        let entry = objects
            .textures
            .get_mut(&texture)
            .ok_or(BackendError::UnknownTexture(texture))?;
        entry.description = description;
        entry.images = images;
        Ok(())
    }

    pub fn unregister_texture(&mut self, texture: TextureHandle) {
        self.objects.write().textures.remove(&texture);
    }

    /// Create a shader module from SPIR-V and make it available to pipelines under `name`.
    pub fn register_shader(&mut self, name: impl Into<String>, spirv: &[u32]) -> BackendResult<()> {
        let name = name.into();
        let create_info = vk::ShaderModuleCreateInfo::default().code(spirv);
        let module = unsafe { self.device.create_shader_module(&create_info, None) }
            .map_err(|e| BackendError::ShaderCreationFailed(format!("`{}`: {:?}", name, e)))?;

        if let Some(previous) = self.shaders.insert(name, module) {
            unsafe { self.device.destroy_shader_module(previous, None) };
        }
        Ok(())
    }

    fn shader(&self, name: &str) -> BackendResult<vk::ShaderModule> {
        self.shaders
            .get(name)
            .copied()
            .ok_or_else(|| BackendError::ShaderCreationFailed(format!("no shader registered as `{}`", name)))
    }

    /// Recorder for `command_buffer`. `frame_index` selects the swapchain image
    /// of presentation textures in barriers.
    pub fn recorder(&self, command_buffer: vk::CommandBuffer, frame_index: u32) -> VulkanCommandRecorder {
        VulkanCommandRecorder::new(self.device.clone(), self.objects.clone(), command_buffer, frame_index)
    }

    /// Destroy every object still owned by the device.
    ///
    /// # Safety
    ///
    /// The GPU must no longer use any of them.
    pub unsafe fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        let mut objects = self.objects.write();
        for (_, pipeline) in objects.pipelines.drain() {
            self.device.destroy_pipeline(pipeline, None);
        }
        for (_, framebuffer) in objects.framebuffers.drain() {
            self.device.destroy_framebuffer(framebuffer, None);
        }
        for (_, render_pass) in objects.render_passes.drain() {
            self.device.destroy_render_pass(render_pass.render_pass, None);
        }
        objects.textures.clear();

        for (_, module) in self.shaders.drain() {
            self.device.destroy_shader_module(module, None);
        }
        self.device.destroy_pipeline_layout(self.pipeline_layout, None);
        self.destroyed = true;
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        if !self.destroyed {
            log::warn!("VulkanDevice dropped without calling destroy() - Vulkan objects leaked");
        }
    }
}

impl TextureRegistry for VulkanDevice {
    fn texture_description(&self, texture: TextureHandle) -> Option<TextureDescription> {
        self.objects
            .read()
            .textures
            .get(&texture)
            .map(|vk_texture| vk_texture.description)
    }
}

impl RenderDevice for VulkanDevice {
    fn create_render_pass(&mut self, desc: &RenderPassDescription) -> BackendResult<RenderPassHandle> {
        let attachments: Vec<vk::AttachmentDescription> = desc
            .attachments
            .iter()
            .map(|attachment| {
                let (stencil_load_op, stencil_store_op) = if attachment.format.has_stencil() {
                    (
                        convert_load_op(attachment.load_op),
                        convert_store_op(attachment.store_op),
                    )
                } else {
                    (vk::AttachmentLoadOp::DONT_CARE, vk::AttachmentStoreOp::DONT_CARE)
                };

                vk::AttachmentDescription::default()
                    .format(convert_texture_format(attachment.format))
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(convert_load_op(attachment.load_op))
                    .store_op(convert_store_op(attachment.store_op))
                    .stencil_load_op(stencil_load_op)
                    .stencil_store_op(stencil_store_op)
                    .initial_layout(convert_image_layout(attachment.initial_layout))
                    .final_layout(convert_image_layout(attachment.final_layout))
            })
            .collect();

        let color_refs: Vec<vk::AttachmentReference> = desc
            .attachments
            .iter()
            .enumerate()
            .filter(|(_, attachment)| !attachment.format.is_depth())
            .map(|(index, _)| vk::AttachmentReference {
                attachment: index as u32,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            })
            .collect();
        let depth_ref = desc
            .attachments
            .iter()
            .position(|attachment| attachment.format.is_depth())
            .map(|index| vk::AttachmentReference {
                attachment: index as u32,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            });

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if let Some(depth_ref) = depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass));

        let render_pass = unsafe { self.device.create_render_pass(&create_info, None) }
            .map_err(|e| BackendError::RenderPassCreationFailed(format!("`{}`: {:?}", desc.label, e)))?;

        let handle = RenderPassHandle(self.allocate_id());
        self.objects.write().render_passes.insert(
            handle,
            VkRenderPass {
                render_pass,
                color_attachment_count: color_refs.len() as u32,
            },
        );
        log::trace!("Vulkan: created render pass {:?} `{}`", handle, desc.label);
        Ok(handle)
    }

    fn destroy_render_pass(&mut self, render_pass: RenderPassHandle) {
        if let Some(vk_render_pass) = self.objects.write().render_passes.remove(&render_pass) {
            unsafe { self.device.destroy_render_pass(vk_render_pass.render_pass, None) };
        }
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDescription) -> BackendResult<FramebufferHandle> {
        let framebuffer = {
            let objects = self.objects.read();
            let render_pass = objects
                .render_passes
                .get(&desc.render_pass)
                .ok_or(BackendError::UnknownRenderPass(desc.render_pass))?;

            let views = desc
                .attachments
                .iter()
                .map(|attachment| {
                    objects
                        .texture_image(attachment.texture, attachment.buffer_index)
                        .map(|(_, image)| image.view)
                        .ok_or(BackendError::UnknownTexture(attachment.texture))
                })
                .collect::<BackendResult<Vec<vk::ImageView>>>()?;

            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.render_pass)
                .attachments(&views)
                .width(desc.width)
                .height(desc.height)
                .layers(desc.layers);

            unsafe { self.device.create_framebuffer(&create_info, None) }.map_err(|e| {
                BackendError::FramebufferCreationFailed(format!("`{}`: {:?}", desc.label, e))
            })?
        };

        let handle = FramebufferHandle(self.allocate_id());
        self.objects.write().framebuffers.insert(handle, framebuffer);
        Ok(handle)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if let Some(vk_framebuffer) = self.objects.write().framebuffers.remove(&framebuffer) {
            unsafe { self.device.destroy_framebuffer(vk_framebuffer, None) };
        }
    }

    fn create_pipeline(
        &mut self,
        desc: &PipelineDescription,
        render_pass: RenderPassHandle,
    ) -> BackendResult<PipelineHandle> {
        let vertex_module = self.shader(&desc.vertex_shader)?;
        let fragment_module = desc
            .fragment_shader
            .as_deref()
            .map(|name| self.shader(name))
            .transpose()?;

        let pipeline = {
            let objects = self.objects.read();
            let vk_render_pass = objects
                .render_passes
                .get(&render_pass)
                .ok_or(BackendError::UnknownRenderPass(render_pass))?;

            create_graphics_pipeline(
                &self.device,
                &PipelineInputs {
                    vertex_module,
                    fragment_module,
                    layout: self.pipeline_layout,
                    render_pass: vk_render_pass.render_pass,
                    color_attachment_count: vk_render_pass.color_attachment_count,
                    description: desc,
                },
            )?
        };

        let handle = PipelineHandle(self.allocate_id());
        self.objects.write().pipelines.insert(handle, pipeline);
        log::trace!("Vulkan: created pipeline {:?} `{}`", handle, desc.label);
        Ok(handle)
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        if let Some(vk_pipeline) = self.objects.write().pipelines.remove(&pipeline) {
            unsafe { self.device.destroy_pipeline(vk_pipeline, None) };
        }
    }
}
