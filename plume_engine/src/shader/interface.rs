/// Reflected shader interface records
///
/// Plain value types produced by the reflector. They hold no references into
/// the binary they were derived from.

use std::fmt;
use crate::error::Result;
use crate::shader::spirv::execution_model;

const SOURCE: &str = "plume::shader";

// ============================================================================
// Shader stage
// ============================================================================

/// Pipeline stage an entry point is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessellationControl,
    TessellationEvaluation,
    Geometry,
    Fragment,
    Compute,
    Task,
    Mesh,
    RayGeneration,
    Intersection,
    AnyHit,
    ClosestHit,
    Miss,
    Callable,
}

impl ShaderStage {
    /// Map a SPIR-V execution model to a stage
    pub fn from_execution_model(model: u32) -> Result<Self> {
        let stage = match model {
            execution_model::VERTEX => ShaderStage::Vertex,
            execution_model::TESSELLATION_CONTROL => ShaderStage::TessellationControl,
            execution_model::TESSELLATION_EVALUATION => ShaderStage::TessellationEvaluation,
            execution_model::GEOMETRY => ShaderStage::Geometry,
            execution_model::FRAGMENT => ShaderStage::Fragment,
            execution_model::GL_COMPUTE => ShaderStage::Compute,
            execution_model::TASK_NV | execution_model::TASK_EXT => ShaderStage::Task,
            execution_model::MESH_NV | execution_model::MESH_EXT => ShaderStage::Mesh,
            execution_model::RAY_GENERATION_KHR => ShaderStage::RayGeneration,
            execution_model::INTERSECTION_KHR => ShaderStage::Intersection,
            execution_model::ANY_HIT_KHR => ShaderStage::AnyHit,
            execution_model::CLOSEST_HIT_KHR => ShaderStage::ClosestHit,
            execution_model::MISS_KHR => ShaderStage::Miss,
            execution_model::CALLABLE_KHR => ShaderStage::Callable,
            execution_model::KERNEL => crate::plume_bail!(SOURCE, UnsupportedConstruct,
                "OpenCL Kernel execution model"),
            other => crate::plume_bail!(SOURCE, UnsupportedConstruct,
                "execution model {}", other),
        };
        Ok(stage)
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessellationControl => "tessellation control",
            ShaderStage::TessellationEvaluation => "tessellation evaluation",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
            ShaderStage::Task => "task",
            ShaderStage::Mesh => "mesh",
            ShaderStage::RayGeneration => "ray generation",
            ShaderStage::Intersection => "intersection",
            ShaderStage::AnyHit => "any hit",
            ShaderStage::ClosestHit => "closest hit",
            ShaderStage::Miss => "miss",
            ShaderStage::Callable => "callable",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Interface records
// ============================================================================

/// An entry point declared by the module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryPoint {
    pub name: String,
    pub stage: ShaderStage,
}

/// A location-bound stage input variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StageInput {
    pub location: u32,
    /// Declared size in bytes
    pub size: u32,
    /// Debug name, empty if stripped
    pub name: String,
}

/// One member of the push-constant block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PushConstant {
    /// Ordinal position of the member in the block
    pub index: u32,
    pub size: u32,
    /// Byte offset as stated by the `Offset` decoration
    pub offset: u32,
    pub name: String,
}

/// Descriptor type, matching the native descriptor-type space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    StorageBuffer,
    InputAttachment,
    AccelerationStructure,
}

/// Number of descriptors in a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorCount {
    Fixed(u32),
    /// Runtime-sized array; the actual count is chosen at layout creation
    Unbounded,
}

impl DescriptorCount {
    /// Fixed count, `None` if unbounded
    pub fn fixed(self) -> Option<u32> {
        match self {
            DescriptorCount::Fixed(count) => Some(count),
            DescriptorCount::Unbounded => None,
        }
    }

    pub fn is_unbounded(self) -> bool {
        matches!(self, DescriptorCount::Unbounded)
    }
}

impl fmt::Display for DescriptorCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorCount::Fixed(count) => write!(f, "{}", count),
            DescriptorCount::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// A resource binding declared with `layout(set = S, binding = B)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub set: u32,
    pub binding: u32,
    pub count: DescriptorCount,
    pub kind: DescriptorKind,
    /// Variable name, falling back to the block type name
    pub name: String,
}

#[cfg(test)]
#[path = "interface_tests.rs"]
mod tests;
