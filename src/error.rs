//! Error types for the VFS layer
//!
//! Uses Rust's Result pattern instead of C-style negative returns.
//! Discriminants are the POSIX errno values so that a caller-visible
//! `-errno` can be recovered with [`VfsError::errno`].

/// VFS error type
///
/// Backends translate their own result codes into this shared space
/// before anything reaches the dispatcher; the dispatcher itself only
/// ever produces `NoEntry`, `NoMemory`, `BadFd` and `Access`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum VfsError {
    /// No such mount, file, or the path shape is invalid (ENOENT)
    NoEntry = 2,
    /// Media or transport failure (EIO)
    Io = 5,
    /// Descriptor not open, or hook unimplemented (EBADF)
    BadFd = 9,
    /// Table exhaustion or allocation failure (ENOMEM)
    NoMemory = 12,
    /// Operation denied or required hook absent (EACCES)
    Access = 13,
    /// Entry already exists (EEXIST)
    Exists = 17,
    /// Path component is not a directory (ENOTDIR)
    NotDir = 20,
    /// Path names a directory where a file is required (EISDIR)
    IsDir = 21,
    /// Invalid argument (EINVAL)
    InvalidArg = 22,
    /// Backend is out of space (ENOSPC)
    NoSpace = 28,
    /// Corrupted on-media state (EILSEQ)
    IllegalByteSeq = 84,
}

/// Result type alias for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

impl VfsError {
    /// The caller-visible negative errno value
    #[inline]
    pub fn errno(self) -> i32 {
        -(self as i32)
    }
}
