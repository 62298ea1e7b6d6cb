//! Unit tests for Vulkan helper functions
//!
//! Pure conversions, no GPU required.

use ash::vk;
use plume_engine::plume::Error;
use crate::vulkan_utils::{
    format_to_aspect_mask, is_depth_format, is_stencil_format, sample_count_to_vk, vk_error,
};

// ============================================================================
// FORMAT CLASSIFICATION
// ============================================================================

#[test]
fn test_depth_formats() {
    assert!(is_depth_format(vk::Format::D16_UNORM));
    assert!(is_depth_format(vk::Format::D32_SFLOAT));
    assert!(is_depth_format(vk::Format::D24_UNORM_S8_UINT));
    assert!(!is_depth_format(vk::Format::R8G8B8A8_UNORM));
    assert!(!is_depth_format(vk::Format::S8_UINT));
}

#[test]
fn test_stencil_formats() {
    assert!(is_stencil_format(vk::Format::D24_UNORM_S8_UINT));
    assert!(is_stencil_format(vk::Format::D32_SFLOAT_S8_UINT));
    assert!(!is_stencil_format(vk::Format::D32_SFLOAT));
    assert!(!is_stencil_format(vk::Format::B8G8R8A8_SRGB));
}

#[test]
fn test_aspect_masks() {
    assert_eq!(format_to_aspect_mask(vk::Format::R8G8B8A8_SRGB), vk::ImageAspectFlags::COLOR);
    assert_eq!(format_to_aspect_mask(vk::Format::D32_SFLOAT), vk::ImageAspectFlags::DEPTH);
    assert_eq!(
        format_to_aspect_mask(vk::Format::D24_UNORM_S8_UINT),
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    );
}

// ============================================================================
// SAMPLE COUNTS
// ============================================================================

#[test]
fn test_valid_sample_counts() {
    assert_eq!(sample_count_to_vk(1).unwrap(), vk::SampleCountFlags::TYPE_1);
    assert_eq!(sample_count_to_vk(4).unwrap(), vk::SampleCountFlags::TYPE_4);
    assert_eq!(sample_count_to_vk(64).unwrap(), vk::SampleCountFlags::TYPE_64);
}

#[test]
fn test_invalid_sample_counts_are_errors() {
    for count in [0, 3, 12, 128] {
        match sample_count_to_vk(count) {
            Err(Error::UnsupportedConstruct(msg)) => assert!(msg.contains(&count.to_string())),
            other => panic!("expected UnsupportedConstruct for {}, got {:?}", count, other),
        }
    }
}

// ============================================================================
// RESULT MAPPING
// ============================================================================

#[test]
fn test_out_of_memory_results() {
    assert!(matches!(
        vk_error(vk::Result::ERROR_OUT_OF_HOST_MEMORY, "create shader module"),
        Error::OutOfMemory
    ));
    assert!(matches!(
        vk_error(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY, "create shader module"),
        Error::OutOfMemory
    ));
}

#[test]
fn test_other_results_are_backend_errors() {
    match vk_error(vk::Result::ERROR_INVALID_SHADER_NV, "create shader module") {
        Error::BackendError(msg) => {
            assert!(msg.contains("create shader module"));
            assert!(msg.contains("ERROR_INVALID_SHADER_NV"));
        }
        other => panic!("expected BackendError, got {:?}", other),
    }
}
