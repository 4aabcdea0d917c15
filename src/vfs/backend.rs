//! Backend operation contract
//!
//! Each mounted filesystem implements [`Backend`]; the dispatcher never
//! looks past this trait. Hooks a backend does not support keep their
//! default bodies, which return the same errors the dispatcher would
//! report for an absent operation: [`VfsError::Access`] for
//! mount/path-level hooks and [`VfsError::BadFd`] for descriptor-level
//! hooks.
//!
//! Backends serialize their own internals (typically with a [`Mutex`])
//! and translate their native result codes into [`VfsError`] before
//! returning; nothing backend-specific crosses this boundary.
//!
//! [`Mutex`]: crate::sync::Mutex

use crate::error::{VfsError, VfsResult};
use crate::types::{FileId, Mode, SeekWhence};

/// Operation set of one pluggable filesystem backend
///
/// `open` returns a backend-chosen [`FileId`] token; the dispatcher
/// hands it back unchanged to the descriptor-level hooks. Paths are
/// passed through whole, including the `"X:/"` drive prefix.
pub trait Backend: Sync {
    /// One-time setup, invoked before the first `mount`
    fn init(&self) -> VfsResult<()> {
        Ok(())
    }

    /// Attach the backing store
    fn mount(&self) -> VfsResult<()> {
        Err(VfsError::Access)
    }

    /// Detach the backing store; open files are already force-closed
    fn unmount(&self) -> VfsResult<()> {
        Ok(())
    }

    /// Open `path` and return an opaque per-file token
    fn open(&self, path: &str, flags: u32, mode: Mode) -> VfsResult<FileId> {
        let _ = (path, flags, mode);
        Err(VfsError::Access)
    }

    /// Close a file previously returned by `open`
    fn close(&self, file: FileId) -> VfsResult<()> {
        let _ = file;
        Err(VfsError::BadFd)
    }

    /// Read into `buf`, returning the number of bytes read
    fn read(&self, file: FileId, buf: &mut [u8]) -> VfsResult<usize> {
        let _ = (file, buf);
        Err(VfsError::BadFd)
    }

    /// Write from `buf`, returning the number of bytes written
    fn write(&self, file: FileId, buf: &[u8]) -> VfsResult<usize> {
        let _ = (file, buf);
        Err(VfsError::BadFd)
    }

    /// Reposition the file cursor, returning the new offset
    fn seek(&self, file: FileId, offset: i64, whence: SeekWhence) -> VfsResult<i64> {
        let _ = (file, offset, whence);
        Err(VfsError::BadFd)
    }

    /// Create a directory
    fn mkdir(&self, path: &str, mode: Mode) -> VfsResult<()> {
        let _ = (path, mode);
        Err(VfsError::Access)
    }
}
