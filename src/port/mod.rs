//! Port layer - hardware-specific implementations
//!
//! This module provides the hardware abstraction for the SIO spinlock
//! pool, core identification, the WFE/SEV event signals and the
//! free-running microsecond timer.

#[cfg(target_arch = "arm")]
pub mod rp2040;

#[cfg(target_arch = "arm")]
pub use rp2040::*;

// Stub implementations for non-ARM targets (for testing)
#[cfg(not(target_arch = "arm"))]
pub mod stub {
    use portable_atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

    use crate::config::CFG_SPINLOCK_COUNT;
    use crate::types::CoreId;

    static SPIN_LOCKS: [AtomicBool; CFG_SPINLOCK_COUNT as usize] =
        [const { AtomicBool::new(false) }; CFG_SPINLOCK_COUNT as usize];

    static CURRENT_CORE: AtomicU8 = AtomicU8::new(0);

    // Advances by one microsecond per read so that deadline loops
    // terminate without a real timer.
    static CLOCK_US: AtomicU64 = AtomicU64::new(0);

    /// Identifier of the calling core
    #[inline]
    pub fn core_id() -> CoreId {
        CURRENT_CORE.load(Ordering::Relaxed)
    }

    /// Pretend the following calls run on `core` (test hook standing in
    /// for the second hardware core)
    pub fn set_core_id(core: CoreId) {
        CURRENT_CORE.store(core, Ordering::Relaxed);
    }

    pub(crate) fn spin_lock_raw(lock_num: u8) {
        let lock = &SPIN_LOCKS[lock_num as usize];
        while lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
    }

    pub(crate) fn spin_unlock_raw(lock_num: u8) {
        SPIN_LOCKS[lock_num as usize].store(false, Ordering::Release);
    }

    /// Acquire a spinlock; the returned token is passed to [`spin_unlock`]
    pub fn spin_lock_blocking(lock_num: u8) -> u32 {
        spin_lock_raw(lock_num);
        0
    }

    /// Release a spinlock acquired with [`spin_lock_blocking`]
    pub fn spin_unlock(lock_num: u8, _save: u32) {
        spin_unlock_raw(lock_num);
    }

    /// Low-power wait for an event signal
    #[inline]
    pub fn wfe() {
        core::hint::spin_loop();
    }

    /// Broadcast an event signal to both cores
    #[inline]
    pub fn sev() {}

    /// Microseconds since boot
    pub fn now_us() -> u64 {
        CLOCK_US.fetch_add(1, Ordering::Relaxed)
    }

    /// Wait for an event or until `until_us`; returns `true` when the
    /// deadline has passed
    pub fn best_effort_wfe_or_timeout(until_us: u64) -> bool {
        if now_us() >= until_us {
            true
        } else {
            core::hint::spin_loop();
            false
        }
    }
}

#[cfg(not(target_arch = "arm"))]
pub use stub::*;
