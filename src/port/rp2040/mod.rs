//! RP2040 port: SIO spinlocks, core id, event signals, raw timer
//!
//! The SIO block arbitrates 32 single-bit hardware spinlocks between
//! the two cores; reading a spinlock register returns non-zero when the
//! read itself claimed the lock, and any write releases it. These are
//! the only cross-core atomic primitive on this part.

use core::ptr::{read_volatile, write_volatile};

use crate::types::CoreId;

const SIO_BASE: usize = 0xd000_0000;
const SIO_CPUID_OFFSET: usize = 0x000;
const SIO_SPINLOCK0_OFFSET: usize = 0x100;

const TIMER_BASE: usize = 0x4005_4000;
const TIMER_TIMERAWH_OFFSET: usize = 0x24;
const TIMER_TIMERAWL_OFFSET: usize = 0x28;

#[inline]
fn spinlock_reg(lock_num: u8) -> *mut u32 {
    (SIO_BASE + SIO_SPINLOCK0_OFFSET + 4 * lock_num as usize) as *mut u32
}

/// Identifier of the calling core (0 or 1)
#[inline]
pub fn core_id() -> CoreId {
    unsafe { read_volatile((SIO_BASE + SIO_CPUID_OFFSET) as *const u32) as CoreId }
}

pub(crate) fn spin_lock_raw(lock_num: u8) {
    let reg = spinlock_reg(lock_num);
    while unsafe { read_volatile(reg) } == 0 {
        cortex_m::asm::nop();
    }
    cortex_m::asm::dmb();
}

pub(crate) fn spin_unlock_raw(lock_num: u8) {
    cortex_m::asm::dmb();
    unsafe { write_volatile(spinlock_reg(lock_num), 1) };
}

/// Acquire a spinlock with local interrupts disabled for the duration
/// of the critical section; the returned token carries the previous
/// interrupt state and must be passed to [`spin_unlock`]
pub fn spin_lock_blocking(lock_num: u8) -> u32 {
    let was_active = cortex_m::register::primask::read().is_active();
    cortex_m::interrupt::disable();
    spin_lock_raw(lock_num);
    was_active as u32
}

/// Release a spinlock acquired with [`spin_lock_blocking`], restoring
/// the saved interrupt state
pub fn spin_unlock(lock_num: u8, save: u32) {
    spin_unlock_raw(lock_num);
    if save != 0 {
        unsafe { cortex_m::interrupt::enable() };
    }
}

/// Low-power wait for an event signal from the other core
#[inline]
pub fn wfe() {
    cortex_m::asm::wfe();
}

/// Broadcast an event signal to both cores
#[inline]
pub fn sev() {
    cortex_m::asm::sev();
}

/// Microseconds since boot, from the free-running 64-bit timer
pub fn now_us() -> u64 {
    // Latch-free read: retry until the high word is stable across the
    // low-word read.
    loop {
        let hi = unsafe { read_volatile((TIMER_BASE + TIMER_TIMERAWH_OFFSET) as *const u32) };
        let lo = unsafe { read_volatile((TIMER_BASE + TIMER_TIMERAWL_OFFSET) as *const u32) };
        let hi2 = unsafe { read_volatile((TIMER_BASE + TIMER_TIMERAWH_OFFSET) as *const u32) };
        if hi == hi2 {
            return ((hi as u64) << 32) | lo as u64;
        }
    }
}

/// Wait for an event or until `until_us`; returns `true` when the
/// deadline has passed.
///
/// No timer alarm is armed here, so the wait polls instead of sleeping;
/// a release on the other core is still picked up immediately via the
/// caller's retry loop.
pub fn best_effort_wfe_or_timeout(until_us: u64) -> bool {
    if now_us() >= until_us {
        true
    } else {
        cortex_m::asm::nop();
        false
    }
}
