//! Core type definitions for the board-support layer
//!
//! These types provide strong typing for the locking and VFS primitives.

/// Identifier of a processor core (0 or 1 on the RP2040)
pub type CoreId = u8;

/// File descriptor as seen by callers of the VFS (0 marks a free
/// open-file slot; real descriptors start at `FILES_FD_BASE`)
pub type Fd = i32;

/// Backend-opaque per-file handle token
pub type FileId = usize;

/// File permission bits passed through to backends
pub type Mode = u32;

/// Seek origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SeekWhence {
    /// From the start of the file
    Set = 0,
    /// From the current position
    Cur = 1,
    /// From the end of the file
    End = 2,
}

// ============ Open flags ============

/// Open flags (newlib encoding)
pub mod oflag {
    pub const RDONLY: u32 = 0x0000;
    pub const WRONLY: u32 = 0x0001;
    pub const RDWR: u32 = 0x0002;
    pub const ACCMODE: u32 = 0x0003;

    pub const APPEND: u32 = 0x0008;
    pub const CREAT: u32 = 0x0200;
    pub const TRUNC: u32 = 0x0400;
    pub const EXCL: u32 = 0x0800;
}
