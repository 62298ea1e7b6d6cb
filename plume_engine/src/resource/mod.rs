//! Resource loading module
//!
//! File access is explicit: construct a `FileLoader` and pass it where needed.

pub mod file_loader;

pub use file_loader::{FileLoader, FileResource};
