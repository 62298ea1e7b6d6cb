/// VulkanShaderModule - native shader module paired with its reflection

use ash::vk;
use plume_engine::plume::{ReflectConfig, Result, ShaderBinary, ShaderReflector};
use crate::vulkan_descriptor;
use crate::vulkan_utils::vk_error;

const SOURCE: &str = "plume::vulkan";

/// Shader module creation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderModuleConfig {
    /// Reflection settings (accepted SPIR-V versions, type depth)
    pub reflect: ReflectConfig,
    /// Descriptor count given to runtime-sized descriptor arrays
    pub unbounded_descriptor_count: u32,
}

impl Default for ShaderModuleConfig {
    fn default() -> Self {
        Self {
            reflect: ReflectConfig::default(),
            unbounded_descriptor_count: 1024,
        }
    }
}

/// Vulkan shader module
///
/// Reflection runs before the native module is created, so a binary that
/// fails reflection never reaches the driver. The handle is destroyed on drop.
pub struct VulkanShaderModule {
    /// Vulkan shader module
    module: vk::ShaderModule,
    /// Interface reflected from the same words the driver received
    reflection: ShaderReflector,
    config: ShaderModuleConfig,
    /// Vulkan device (for cleanup)
    device: ash::Device,
}

impl VulkanShaderModule {
    /// Reflect `binary` and create the native module from it
    ///
    /// # Errors
    ///
    /// Reflection errors are returned unchanged. Driver failures map to
    /// `OutOfMemory` or `BackendError`.
    pub fn new(device: &ash::Device, binary: ShaderBinary, config: ShaderModuleConfig) -> Result<Self> {
        let reflection = ShaderReflector::with_config(binary, &config.reflect)?;

        let create_info = vk::ShaderModuleCreateInfo::default()
            .code(reflection.binary().words());

        let module = unsafe { device.create_shader_module(&create_info, None) }
            .map_err(|e| vk_error(e, "create shader module"))?;

        plume_engine::plume_debug!(SOURCE,
            "Created shader module {:?} ({} bytes, entry points: [{}])",
            module,
            reflection.binary().size_bytes(),
            reflection.entry_point_names().collect::<Vec<_>>().join(", "));

        Ok(Self {
            module,
            reflection,
            config,
            device: device.clone(),
        })
    }

    /// Native handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Reflected interface
    pub fn reflection(&self) -> &ShaderReflector {
        &self.reflection
    }

    pub fn config(&self) -> &ShaderModuleConfig {
        &self.config
    }

    /// Stages of all entry points in the module
    pub fn stage_flags(&self) -> vk::ShaderStageFlags {
        vulkan_descriptor::entry_point_stages(&self.reflection)
    }

    /// Layout bindings of one set, visible to this module's stages
    pub fn descriptor_set_layout_bindings(&self, set: u32) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
        vulkan_descriptor::descriptor_set_layout_bindings(
            &self.reflection,
            set,
            self.stage_flags(),
            self.config.unbounded_descriptor_count,
        )
    }

    /// Push-constant range for this module's stages
    pub fn push_constant_range(&self) -> Option<vk::PushConstantRange> {
        vulkan_descriptor::push_constant_range(&self.reflection, self.stage_flags())
    }
}

impl Drop for VulkanShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
        plume_engine::plume_trace!(SOURCE, "Destroyed shader module {:?}", self.module);
    }
}
