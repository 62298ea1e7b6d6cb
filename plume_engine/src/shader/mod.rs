/// Shader module - SPIR-V containers and interface reflection

pub mod spirv;
pub mod binary;
pub mod config;
pub mod types;
pub mod interface;
pub mod reflector;
mod declarations;

pub use binary::{Header, ShaderBinary, SpirvVersion};
pub use config::ReflectConfig;
pub use types::{
    BlockKind, ImageDim, ImageType, MatrixLayout, ReflectedType, StructMember, StructType,
};
pub use interface::{
    Descriptor, DescriptorCount, DescriptorKind, EntryPoint, PushConstant, ShaderStage, StageInput,
};
pub use reflector::ShaderReflector;

#[cfg(test)]
#[path = "../../tests/spirv_test_utils.rs"]
pub(crate) mod spirv_test_utils;

