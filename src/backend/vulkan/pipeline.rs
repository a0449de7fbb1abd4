//! Graphics pipeline creation for frame graph render passes.

use std::ffi::CStr;

use ash::vk;

use crate::backend::traits::{BackendError, BackendResult};
use crate::backend::types::PipelineDescription;

use super::conversion::{convert_cull_mode, convert_topology};

const ENTRY_POINT: &CStr = c"main";

/// Shader modules and render pass state a pipeline is created from
pub(crate) struct PipelineInputs<'a> {
    pub vertex_module: vk::ShaderModule,
    pub fragment_module: Option<vk::ShaderModule>,
    pub layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
    pub color_attachment_count: u32,
    pub description: &'a PipelineDescription,
}

/// Create a graphics pipeline with dynamic viewport and scissor and no vertex buffers.
pub(crate) fn create_graphics_pipeline(
    device: &ash::Device,
    inputs: &PipelineInputs<'_>,
) -> BackendResult<vk::Pipeline> {
    let description = inputs.description;

    let mut shader_stages = vec![vk::PipelineShaderStageCreateInfo::default()
        .stage(vk::ShaderStageFlags::VERTEX)
        .module(inputs.vertex_module)
        .name(ENTRY_POINT)];
    if let Some(fragment_module) = inputs.fragment_module {
        shader_stages.push(
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(ENTRY_POINT),
        );
    }

    let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default();
    let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
        .topology(convert_topology(description.topology))
        .primitive_restart_enable(false);

    let viewport_state = vk::PipelineViewportStateCreateInfo::default()
        .viewport_count(1)
        .scissor_count(1);

    let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(convert_cull_mode(description.cull_mode))
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
        .depth_bias_enable(false);

    let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
        .sample_shading_enable(false)
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);

    let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
        .depth_test_enable(description.depth_test)
        .depth_write_enable(description.depth_write)
        .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL)
        .depth_bounds_test_enable(false)
        .stencil_test_enable(false);

    let color_blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = (0..inputs
        .color_attachment_count)
        .map(|_| {
            if description.blend {
                vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
                    .blend_enable(true)
                    .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                    .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                    .color_blend_op(vk::BlendOp::ADD)
                    .src_alpha_blend_factor(vk::BlendFactor::ONE)
                    .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                    .alpha_blend_op(vk::BlendOp::ADD)
            } else {
                vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(vk::ColorComponentFlags::RGBA)
                    .blend_enable(false)
            }
        })
        .collect();

    let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
        .logic_op_enable(false)
        .attachments(&color_blend_attachments);

    let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

    let create_info = vk::GraphicsPipelineCreateInfo::default()
        .stages(&shader_stages)
        .vertex_input_state(&vertex_input_state)
        .input_assembly_state(&input_assembly_state)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization_state)
        .multisample_state(&multisample_state)
        .depth_stencil_state(&depth_stencil_state)
        .color_blend_state(&color_blend_state)
        .dynamic_state(&dynamic_state)
        .layout(inputs.layout)
        .render_pass(inputs.render_pass)
        .subpass(0);

    let pipelines = unsafe {
        device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
    }
    .map_err(|(_, e)| {
        BackendError::PipelineCreationFailed(format!("`{}`: {:?}", description.label, e))
    })?;

    pipelines.into_iter().next().ok_or_else(|| {
        BackendError::PipelineCreationFailed(format!("`{}`: no pipeline returned", description.label))
    })
}
