/// Conversions from reflected shader metadata to Vulkan layout structures

use ash::vk;
use plume_engine::plume::{DescriptorCount, DescriptorKind, ShaderReflector, ShaderStage};

/// Convert a reflected descriptor kind to the Vulkan descriptor type
pub fn descriptor_kind_to_vk(kind: DescriptorKind) -> vk::DescriptorType {
    match kind {
        DescriptorKind::Sampler => vk::DescriptorType::SAMPLER,
        DescriptorKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        DescriptorKind::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        DescriptorKind::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
        DescriptorKind::UniformTexelBuffer => vk::DescriptorType::UNIFORM_TEXEL_BUFFER,
        DescriptorKind::StorageTexelBuffer => vk::DescriptorType::STORAGE_TEXEL_BUFFER,
        DescriptorKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorKind::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        DescriptorKind::InputAttachment => vk::DescriptorType::INPUT_ATTACHMENT,
        DescriptorKind::AccelerationStructure => vk::DescriptorType::ACCELERATION_STRUCTURE_KHR,
    }
}

/// Convert a shader stage to Vulkan stage flags
pub fn shader_stage_to_vk(stage: ShaderStage) -> vk::ShaderStageFlags {
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::TessellationControl => vk::ShaderStageFlags::TESSELLATION_CONTROL,
        ShaderStage::TessellationEvaluation => vk::ShaderStageFlags::TESSELLATION_EVALUATION,
        ShaderStage::Geometry => vk::ShaderStageFlags::GEOMETRY,
        ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        ShaderStage::Compute => vk::ShaderStageFlags::COMPUTE,
        ShaderStage::Task => vk::ShaderStageFlags::TASK_EXT,
        ShaderStage::Mesh => vk::ShaderStageFlags::MESH_EXT,
        ShaderStage::RayGeneration => vk::ShaderStageFlags::RAYGEN_KHR,
        ShaderStage::Intersection => vk::ShaderStageFlags::INTERSECTION_KHR,
        ShaderStage::AnyHit => vk::ShaderStageFlags::ANY_HIT_KHR,
        ShaderStage::ClosestHit => vk::ShaderStageFlags::CLOSEST_HIT_KHR,
        ShaderStage::Miss => vk::ShaderStageFlags::MISS_KHR,
        ShaderStage::Callable => vk::ShaderStageFlags::CALLABLE_KHR,
    }
}

/// Union of the stages of every entry point in the module
pub fn entry_point_stages(reflection: &ShaderReflector) -> vk::ShaderStageFlags {
    reflection
        .entry_points()
        .iter()
        .fold(vk::ShaderStageFlags::empty(), |flags, entry| flags | shader_stage_to_vk(entry.stage))
}

/// Layout bindings for one descriptor set
///
/// Unbounded (runtime-sized) arrays are given `unbounded_count` descriptors;
/// the caller is expected to enable variable descriptor counts for them.
pub fn descriptor_set_layout_bindings(
    reflection: &ShaderReflector,
    set: u32,
    stages: vk::ShaderStageFlags,
    unbounded_count: u32,
) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
    reflection
        .descriptors_in_set(set)
        .map(|descriptor| {
            let count = match descriptor.count {
                DescriptorCount::Fixed(count) => count,
                DescriptorCount::Unbounded => unbounded_count,
            };
            vk::DescriptorSetLayoutBinding::default()
                .binding(descriptor.binding)
                .descriptor_type(descriptor_kind_to_vk(descriptor.kind))
                .descriptor_count(count)
                .stage_flags(stages)
        })
        .collect()
}

/// Push-constant range covering every reflected member, if the module has any
pub fn push_constant_range(
    reflection: &ShaderReflector,
    stages: vk::ShaderStageFlags,
) -> Option<vk::PushConstantRange> {
    let range = reflection.push_constant_range()?;
    Some(vk::PushConstantRange {
        stage_flags: stages,
        offset: range.start,
        size: range.end - range.start,
    })
}

#[cfg(test)]
#[path = "vulkan_descriptor_tests.rs"]
mod tests;
