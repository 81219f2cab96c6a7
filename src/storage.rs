//! Backend capability contract.
//!
//! [`Storage`] is the set of capabilities a storage backend (local
//! filesystem, object store, ...) exposes. All fallible capabilities report
//! [`StorageError`]; backends raise [`StorageError::Backend`] with an explicit
//! retryable marking so that wrappers can classify failures without knowing
//! backend-specific types.

use core::future::Future;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::io::AsyncRead;

use crate::error::StorageError;

/// Byte stream used by the streaming capabilities.
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;

/// Metadata returned by [`Storage::stat`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub is_dir: bool,
}

impl FileInfo {
    /// Metadata for a regular file.
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self { path: path.into(), size, modified: None, is_dir: false }
    }

    /// Metadata for a directory or prefix.
    pub fn dir(path: impl Into<String>) -> Self {
        Self { path: path.into(), size: 0, modified: None, is_dir: true }
    }

    /// Sets the modification time.
    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }
}

/// Capabilities of a pluggable storage backend.
///
/// Paths are backend-relative, `/`-separated strings.
pub trait Storage: Send + Sync {
    /// Reads the whole object at `path`.
    fn read(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send;

    /// Creates or replaces the object at `path`.
    fn write(&self, path: &str, data: &[u8])
        -> impl Future<Output = Result<(), StorageError>> + Send;

    fn delete(&self, path: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Lists the paths starting with `prefix`.
    fn list(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;

    fn exists(&self, path: &str) -> impl Future<Output = Result<bool, StorageError>> + Send;

    fn stat(&self, path: &str) -> impl Future<Output = Result<FileInfo, StorageError>> + Send;

    fn copy(&self, src: &str, dst: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Moves `src` to `dst`.
    fn rename(&self, src: &str, dst: &str)
        -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Checks that the backend is reachable and usable.
    fn health(&self) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Opens a stream over the object at `path`.
    fn read_stream(&self, path: &str)
        -> impl Future<Output = Result<ByteReader, StorageError>> + Send;

    /// Writes everything from `reader` to `path`, returning the bytes written.
    fn write_stream(
        &self,
        path: &str,
        reader: ByteReader,
    ) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// Short backend identifier such as `"local"` or `"s3"`.
    fn kind(&self) -> &'static str;

    /// Releases backend resources.
    fn close(&self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn read(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, StorageError>> + Send {
        (**self).read(path)
    }

    fn write(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).write(path, data)
    }

    fn delete(&self, path: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).delete(path)
    }

    fn list(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send {
        (**self).list(prefix)
    }

    fn exists(&self, path: &str) -> impl Future<Output = Result<bool, StorageError>> + Send {
        (**self).exists(path)
    }

    fn stat(&self, path: &str) -> impl Future<Output = Result<FileInfo, StorageError>> + Send {
        (**self).stat(path)
    }

    fn copy(&self, src: &str, dst: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).copy(src, dst)
    }

    fn rename(
        &self,
        src: &str,
        dst: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).rename(src, dst)
    }

    fn health(&self) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).health()
    }

    fn read_stream(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<ByteReader, StorageError>> + Send {
        (**self).read_stream(path)
    }

    fn write_stream(
        &self,
        path: &str,
        reader: ByteReader,
    ) -> impl Future<Output = Result<u64, StorageError>> + Send {
        (**self).write_stream(path, reader)
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn close(&self) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).close()
    }
}
