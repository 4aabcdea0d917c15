//! C runtime lock retargeting
//!
//! Newlib serializes stdio, malloc and friends through a small set of
//! retargetable lock hooks. On a dual-core part those hooks must land
//! on a real cross-core mutex. Following the simple retarget scheme,
//! every non-recursive hook aliases one shared mutex and every
//! recursive hook aliases one shared recursive mutex instead of giving
//! each runtime subsystem its own lock.

use crate::sync::Mutex;

static COMMON: Mutex = Mutex::new();
static COMMON_RECURSIVE: Mutex = Mutex::new_recursive();

/// Initialize the shared runtime locks; must run before the C runtime
/// first takes one. Safe to call again while neither lock is held.
pub fn init() {
    COMMON.init();
    COMMON_RECURSIVE.init();
}

/// `__retarget_lock_acquire`
pub fn lock_acquire() {
    COMMON.enter_blocking();
}

/// `__retarget_lock_try_acquire`
pub fn lock_try_acquire() -> bool {
    COMMON.try_enter().is_ok()
}

/// `__retarget_lock_release`
pub fn lock_release() {
    COMMON.exit();
}

/// `__retarget_lock_acquire_recursive`
pub fn lock_acquire_recursive() {
    COMMON_RECURSIVE.enter_blocking();
}

/// `__retarget_lock_try_acquire_recursive`
pub fn lock_try_acquire_recursive() -> bool {
    COMMON_RECURSIVE.try_enter().is_ok()
}

/// `__retarget_lock_release_recursive`
pub fn lock_release_recursive() {
    COMMON_RECURSIVE.exit();
}
