/// File loader for shader binaries and other on-disk resources
///
/// An explicit value holding a root directory. Callers pass it to whatever
/// needs to read files; there is no process-wide loader.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use crate::error::{Error, Result};
use crate::shader::ShaderBinary;

const SOURCE: &str = "plume::resource";

/// Raw contents of a loaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    /// Resolved path the contents were read from
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl FileResource {
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Loads files relative to a root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    /// Create a loader resolving names against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a name resolves to (absolute names are used unchanged)
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    /// Read a whole file
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if the file does not exist, `IoError` for any
    /// other read failure.
    pub fn load_file(&self, name: impl AsRef<Path>) -> Result<FileResource> {
        let path = self.resolve(name);
        let contents = fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => crate::plume_err!(SOURCE, ResourceNotFound,
                "{}", path.display()),
            _ => crate::plume_err!(SOURCE, IoError,
                "failed to read {}: {}", path.display(), err),
        })?;

        crate::plume_debug!(SOURCE, "Loaded {} ({} bytes)", path.display(), contents.len());
        Ok(FileResource { path, contents })
    }

    /// Read a `.spv` file and validate its header
    pub fn load_shader(&self, name: impl AsRef<Path>) -> Result<ShaderBinary> {
        let file = self.load_file(name)?;
        ShaderBinary::from_bytes(&file.contents).map_err(|err| match err {
            Error::MalformedBinary(msg) => {
                Error::MalformedBinary(format!("{}: {}", file.path.display(), msg))
            }
            other => other,
        })
    }
}

#[cfg(test)]
#[path = "file_loader_tests.rs"]
mod tests;
