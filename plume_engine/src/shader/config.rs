/// Reflection configuration

use crate::shader::binary::SpirvVersion;

/// Settings controlling what the reflector accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectConfig {
    /// Highest SPIR-V version accepted (match it to the target driver)
    pub max_version: SpirvVersion,
    /// Maximum nesting depth when resolving types (struct in array in struct ...)
    pub max_type_depth: u32,
}

impl Default for ReflectConfig {
    fn default() -> Self {
        Self {
            max_version: SpirvVersion::V1_6,
            max_type_depth: 64,
        }
    }
}

impl ReflectConfig {
    /// Configuration accepting exactly the SPIR-V versions a Vulkan API
    /// version guarantees
    ///
    /// Vulkan 1.0 consumes SPIR-V 1.0, 1.1 up to 1.3, 1.2 up to 1.5, and
    /// 1.3 or later up to 1.6.
    pub fn for_vulkan_api(major: u32, minor: u32) -> Self {
        let max_version = match (major, minor) {
            (1, 0) => SpirvVersion::V1_0,
            (1, 1) => SpirvVersion::V1_3,
            (1, 2) => SpirvVersion::V1_5,
            _ => SpirvVersion::V1_6,
        };
        Self {
            max_version,
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
