//! Compile-time configuration for the board-support core
//!
//! These constants control the resource limits of the locking layer
//! and the VFS dispatcher.

/// Number of hardware spinlocks provided by the SIO block
pub const CFG_SPINLOCK_COUNT: u8 = 32;

/// First spinlock of the striped pool handed out to mutexes
pub const CFG_SPINLOCK_STRIPED_FIRST: u8 = 16;

/// Last spinlock of the striped pool (inclusive)
pub const CFG_SPINLOCK_STRIPED_LAST: u8 = 23;

/// Spinlock reserved for the `critical-section` implementation
pub const CFG_SPINLOCK_CRITICAL_SECTION: u8 = 31;

/// Maximum nesting depth of a recursive mutex
pub const CFG_MUTEX_MAX_DEPTH: u8 = u8::MAX;

/// Maximum number of simultaneously open files
pub const CFG_MAX_OPEN_FILES: usize = 8;

/// Maximum number of simultaneously mounted backends
pub const CFG_MAX_MOUNTS: usize = 4;

/// First file descriptor handed out by the VFS (0..=2 are the
/// standard streams)
pub const FILES_FD_BASE: i32 = 3;

/// Maximum path length accepted by the open-file table
pub const CFG_PATH_MAX: usize = 64;
