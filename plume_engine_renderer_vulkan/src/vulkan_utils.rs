/// Vulkan helper functions (formats, sample counts, result mapping)

use ash::vk;
use plume_engine::plume::{Error, Result};

const SOURCE: &str = "plume::vulkan";

/// Whether `format` has a depth component
pub fn is_depth_format(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D16_UNORM
            | vk::Format::D16_UNORM_S8_UINT
            | vk::Format::D24_UNORM_S8_UINT
            | vk::Format::D32_SFLOAT
            | vk::Format::D32_SFLOAT_S8_UINT
    )
}

/// Whether `format` is a depth format with a stencil component
pub fn is_stencil_format(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D16_UNORM_S8_UINT | vk::Format::D24_UNORM_S8_UINT | vk::Format::D32_SFLOAT_S8_UINT
    )
}

/// Image aspect flags for views and barriers on an image of `format`
pub fn format_to_aspect_mask(format: vk::Format) -> vk::ImageAspectFlags {
    if is_depth_format(format) {
        let mut aspect = vk::ImageAspectFlags::DEPTH;
        if is_stencil_format(format) {
            aspect |= vk::ImageAspectFlags::STENCIL;
        }
        aspect
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Convert a sample count to Vulkan flags
///
/// Counts that are not a power of two between 1 and 64 are rejected rather
/// than silently replaced by a single sample.
pub fn sample_count_to_vk(count: u32) -> Result<vk::SampleCountFlags> {
    let flags = match count {
        1 => vk::SampleCountFlags::TYPE_1,
        2 => vk::SampleCountFlags::TYPE_2,
        4 => vk::SampleCountFlags::TYPE_4,
        8 => vk::SampleCountFlags::TYPE_8,
        16 => vk::SampleCountFlags::TYPE_16,
        32 => vk::SampleCountFlags::TYPE_32,
        64 => vk::SampleCountFlags::TYPE_64,
        other => plume_engine::plume_bail!(SOURCE, UnsupportedConstruct,
            "sample count {} (expected 1, 2, 4, 8, 16, 32 or 64)", other),
    };
    Ok(flags)
}

/// Map a failed `vk::Result` to an engine error, logging it
pub(crate) fn vk_error(result: vk::Result, action: &str) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            plume_engine::plume_error!(SOURCE, "Failed to {}: {:?}", action, result);
            Error::OutOfMemory
        }
        _ => plume_engine::plume_err!(SOURCE, BackendError, "Failed to {}: {:?}", action, result),
    }
}

#[cfg(test)]
#[path = "vulkan_utils_tests.rs"]
mod tests;
