/*!
# Plume Engine - Vulkan Backend

Vulkan side of the Plume convenience layer, built on the Ash bindings.

This crate owns native shader modules together with their reflected
interface, and converts that interface into the Vulkan structures needed to
build descriptor set layouts and pipeline layouts.
*/

// Vulkan implementation modules
mod vulkan_shader;
mod vulkan_descriptor;
mod vulkan_utils;

#[cfg(test)]
#[path = "../../plume_engine/tests/spirv_test_utils.rs"]
mod spirv_test_utils;

pub use vulkan_shader::{ShaderModuleConfig, VulkanShaderModule};

// Main plume namespace module
pub mod plume {
    pub use crate::vulkan_shader::{ShaderModuleConfig, VulkanShaderModule};
    pub use crate::vulkan_descriptor::{
        descriptor_kind_to_vk, descriptor_set_layout_bindings, entry_point_stages,
        push_constant_range, shader_stage_to_vk,
    };
    pub use crate::vulkan_utils::{
        format_to_aspect_mask, is_depth_format, is_stencil_format, sample_count_to_vk,
    };
}
