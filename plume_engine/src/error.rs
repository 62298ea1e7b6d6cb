//! Error types for the Plume engine
//!
//! This module defines the error types used throughout the engine,
//! including shader reflection, resource loading, and backend failures.

use std::fmt;

/// Result type for Plume engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Plume engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Shader binary violates the container format or its own internal
    /// consistency (bad header, truncated stream, dangling or duplicate ids)
    MalformedBinary(String),

    /// Shader binary is well-formed but declares something the reflector
    /// does not model
    UnsupportedConstruct(String),

    /// A requested resource does not exist
    ResourceNotFound(String),

    /// Reading a resource from storage failed
    IoError(String),

    /// Backend-specific error (Vulkan, etc.)
    BackendError(String),

    /// Out of host or device memory
    OutOfMemory,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedBinary(msg) => write!(f, "Malformed shader binary: {}", msg),
            Error::UnsupportedConstruct(msg) => write!(f, "Unsupported shader construct: {}", msg),
            Error::ResourceNotFound(msg) => write!(f, "Resource not found: {}", msg),
            Error::IoError(msg) => write!(f, "I/O error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
