//! RP2040 board-support core in Rust
//!
//! The pieces of a board-support layer that carry real concurrency and
//! resource-management weight:
//! - Dual-core mutexes built on the SIO hardware spinlocks, with
//!   core-owner tracking, recursion and timeout variants
//! - A virtual filesystem dispatcher multiplexing pluggable storage
//!   backends behind one drive-letter path space and one
//!   file-descriptor namespace
//! - The C runtime lock-retargeting shim layered on the mutex
//!
//! Peripheral drivers and concrete filesystem backends plug in from
//! outside; all hardware access funnels through the `port` module, so
//! the crate builds and tests on the host as well.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

// ============ Critical Section ============

// Cross-core critical section: local interrupts off plus a dedicated
// hardware spinlock. Nested acquires from the same core skip the
// spinlock (it is not recursive); the restore token records both the
// saved interrupt state and the nesting.
#[cfg(target_arch = "arm")]
mod cs_impl {
    use core::sync::atomic::{AtomicBool, Ordering};

    use critical_section::{set_impl, Impl, RawRestoreState};

    use crate::config::CFG_SPINLOCK_CRITICAL_SECTION;
    use crate::port;

    const IRQS_WERE_ENABLED: u8 = 0x01;
    const NESTED: u8 = 0x02;

    static CS_OWNED: [AtomicBool; 2] = [AtomicBool::new(false), AtomicBool::new(false)];

    struct DualCoreCriticalSection;
    set_impl!(DualCoreCriticalSection);

    unsafe impl Impl for DualCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = cortex_m::register::primask::read().is_active();
            cortex_m::interrupt::disable();
            let core = port::core_id() as usize;
            if CS_OWNED[core].load(Ordering::Relaxed) {
                return NESTED;
            }
            port::spin_lock_raw(CFG_SPINLOCK_CRITICAL_SECTION);
            CS_OWNED[core].store(true, Ordering::Relaxed);
            was_active as u8
        }

        unsafe fn release(state: RawRestoreState) {
            if state & NESTED == 0 {
                let core = port::core_id() as usize;
                CS_OWNED[core].store(false, Ordering::Relaxed);
                port::spin_unlock_raw(CFG_SPINLOCK_CRITICAL_SECTION);
                if state & IRQS_WERE_ENABLED != 0 {
                    unsafe { cortex_m::interrupt::enable() }
                }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod config;
pub mod error;
pub mod port;
pub mod sync;
pub mod time;
pub mod types;

#[cfg(feature = "retarget")]
pub mod retarget;

#[cfg(feature = "vfs")]
pub mod vfs;

// ============ Re-exports ============

pub use config::*;
pub use error::{VfsError, VfsResult};
pub use sync::mutex::Mutex;
pub use time::Instant;
pub use types::*;

#[cfg(feature = "vfs")]
pub use vfs::{Backend, Vfs};
