//! Synchronization primitives
//!
//! Contains the spinlock-backed dual-core mutex.

pub mod mutex;

pub use mutex::Mutex;
