/*!
# Plume Engine

Core types for the Plume Vulkan convenience layer.

This crate is platform-agnostic: it owns the error taxonomy, the logging hub,
explicit file loading, and SPIR-V shader reflection. The Vulkan backend crate
consumes the reflected metadata when it creates native shader modules and
layouts.

## Architecture

- **ShaderBinary**: validated SPIR-V word container
- **ShaderReflector**: recovers entry points, stage inputs, push constants and
  descriptors from a binary
- **FileLoader**: reads shader binaries relative to a root directory
- **Engine**: process-wide logger sink
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod shader;
pub mod resource;

// Main plume namespace module
pub mod plume {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging hub
    pub use crate::engine::Engine;

    // Shader binaries and reflection
    pub use crate::shader::{
        Descriptor, DescriptorCount, DescriptorKind, EntryPoint, PushConstant, ReflectConfig,
        ShaderBinary, ShaderReflector, ShaderStage, SpirvVersion, StageInput,
    };

    // Logging sub-module (types only, macros are exported at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Shader sub-module with the full type model
    pub mod shader {
        pub use crate::shader::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }
}
