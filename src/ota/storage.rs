//! Named byte-blob persistence for OTA artifacts

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;

/// Store bytes under a name, read bytes by name
///
/// `write` must be atomic with respect to concurrent `read`s of the same
/// name: a reader sees either the old or the new contents in full.
pub trait BlobStore: Send + Sync {
    /// Contents of `name`, or `None` if it was never written
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the contents of `name`
    fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Blobs kept as files in a single directory
///
/// Writes land in a temporary file in the same directory, are synced and then
/// renamed over the target, so a crash mid-write leaves the previous file in
/// place.
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    /// Open the store, creating `root` if needed
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Filesystem path backing `name`
    ///
    /// # Errors
    ///
    /// `InvalidInput` unless `name` is a plain file name inside the root
    pub fn path_of(&self, name: &str) -> io::Result<PathBuf> {
        if !is_plain_name(name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("blob name {:?} is not a plain file name", name),
            ));
        }
        Ok(self.root.join(name))
    }
}

/// True when `name` is a single normal path component (no separators, `.` or `..`)
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

impl BlobStore for DirBlobStore {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_of(name)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let target = self.path_of(name)?;
        let mut staged = NamedTempFile::new_in(&self.root)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(&target).map_err(|e| e.error)?;
        debug!("Stored {} bytes at {}", bytes.len(), target.display());
        Ok(())
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// In-memory blob store for testing
    #[derive(Clone, Default)]
    pub struct MemoryBlobStore {
        pub blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        pub write_error: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl MemoryBlobStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get(&self, name: &str) -> Option<Vec<u8>> {
            self.blobs.lock().get(name).cloned()
        }

        pub fn put(&self, name: &str, bytes: &[u8]) {
            self.blobs.lock().insert(name.to_string(), bytes.to_vec());
        }

        pub fn set_write_error(&self, error: io::ErrorKind) {
            *self.write_error.lock() = Some(error);
        }
    }

    impl BlobStore for MemoryBlobStore {
        fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.get(name))
        }

        fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
            if let Some(error) = *self.write_error.lock() {
                return Err(io::Error::new(error, "Mock write error").into());
            }
            self.put(name, bytes);
            Ok(())
        }
    }
}
