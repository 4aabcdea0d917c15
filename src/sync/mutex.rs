//! Spinlock-backed mutex with core-owner tracking
//!
//! Mutual exclusion between the two cores, built on a hardware
//! spinlock from the striped pool. The spinlock guards every state
//! transition; a blocked core parks in WFE and re-races after the
//! releasing side broadcasts SEV. There is no wait queue and no FIFO
//! fairness: with at most two contending cores the re-race is bounded.
//!
//! Recursive mutexes additionally track a nesting depth; only the
//! owning core may deepen it, and the lock is released for real only
//! when the depth returns to zero.

use core::cell::UnsafeCell;

use portable_atomic::{AtomicU8, Ordering};

use crate::config::{CFG_MUTEX_MAX_DEPTH, CFG_SPINLOCK_STRIPED_FIRST, CFG_SPINLOCK_STRIPED_LAST};
use crate::port;
use crate::time::{make_timeout_ms, make_timeout_us, Instant};
use crate::types::CoreId;

/// Sentinel: mutex not yet assigned a hardware spinlock
const SPINLOCK_UNASSIGNED: u8 = u8::MAX;

/// Round-robin spinlock striping, wrapping over the striped range
fn next_striped_spin_lock_num() -> u8 {
    static NEXT_STRIPED: AtomicU8 = AtomicU8::new(0);
    let range = CFG_SPINLOCK_STRIPED_LAST - CFG_SPINLOCK_STRIPED_FIRST + 1;
    let n = NEXT_STRIPED.fetch_add(1, Ordering::Relaxed);
    CFG_SPINLOCK_STRIPED_FIRST + n % range
}

/// Recursion state of a mutex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recursion {
    /// Plain mutex: self re-acquire is a deadlock
    NonRecursive,
    /// Recursive mutex: `depth` outstanding acquires by the owner
    Recursive { depth: u8 },
}

/// Outcome of one spinlock-guarded acquire attempt
enum Attempt {
    Entered,
    HeldBySelf,
    HeldBy(CoreId),
}

struct MutexState {
    /// Assigned hardware spinlock, [`SPINLOCK_UNASSIGNED`] before init
    spin_lock: u8,
    /// Core currently holding the mutex
    owner: Option<CoreId>,
    recursion: Recursion,
}

impl MutexState {
    /// One acquire attempt. Runs only while the hardware spinlock is
    /// held.
    fn try_take(&mut self, core: CoreId) -> Attempt {
        match self.owner {
            None => {
                self.owner = Some(core);
                if let Recursion::Recursive { depth } = &mut self.recursion {
                    *depth = 1;
                }
                Attempt::Entered
            }
            Some(owner) if owner == core => match &mut self.recursion {
                Recursion::Recursive { depth } => {
                    assert!(*depth < CFG_MUTEX_MAX_DEPTH, "mutex recursion overflow");
                    *depth += 1;
                    Attempt::Entered
                }
                Recursion::NonRecursive => Attempt::HeldBySelf,
            },
            Some(owner) => Attempt::HeldBy(owner),
        }
    }

    /// One release step; returns whether the mutex became unowned.
    /// Runs only while the hardware spinlock is held.
    fn release(&mut self, core: CoreId) -> bool {
        assert!(
            self.owner == Some(core),
            "mutex exited by a core that does not hold it"
        );
        match &mut self.recursion {
            Recursion::NonRecursive => {
                self.owner = None;
                true
            }
            Recursion::Recursive { depth } => {
                *depth -= 1;
                if *depth == 0 {
                    self.owner = None;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Dual-core mutex
///
/// Statically constructible; [`Mutex::init`] must run once before the
/// first acquire to claim a hardware spinlock from the striped pool.
///
/// All acquire paths panic on the programming errors the design treats
/// as fatal: blocking self re-acquire of a non-recursive mutex, exiting
/// a mutex the calling core does not hold, and recursion overflow.
/// Timeout expiry is the only recoverable failure and never leaves
/// partial lock state behind.
pub struct Mutex {
    state: UnsafeCell<MutexState>,
}

unsafe impl Sync for Mutex {}
unsafe impl Send for Mutex {}

impl Mutex {
    /// Create a new non-recursive mutex
    pub const fn new() -> Self {
        Mutex {
            state: UnsafeCell::new(MutexState {
                spin_lock: SPINLOCK_UNASSIGNED,
                owner: None,
                recursion: Recursion::NonRecursive,
            }),
        }
    }

    /// Create a new recursive mutex
    pub const fn new_recursive() -> Self {
        Mutex {
            state: UnsafeCell::new(MutexState {
                spin_lock: SPINLOCK_UNASSIGNED,
                owner: None,
                recursion: Recursion::Recursive { depth: 0 },
            }),
        }
    }

    /// Assign a hardware spinlock and reset ownership
    ///
    /// Must be called once, before the first acquire and before the
    /// mutex is shared with the other core. Re-initialization is only
    /// permitted while no core holds the mutex.
    pub fn init(&self) {
        let state = unsafe { &mut *self.state.get() };
        assert!(state.owner.is_none(), "mutex re-initialized while held");
        state.spin_lock = next_striped_spin_lock_num();
        state.owner = None;
        if let Recursion::Recursive { depth } = &mut state.recursion {
            *depth = 0;
        }
    }

    /// Whether [`Mutex::init`] has run
    #[inline]
    pub fn is_initialized(&self) -> bool {
        unsafe { (*self.state.get()).spin_lock != SPINLOCK_UNASSIGNED }
    }

    fn lock_num(&self) -> u8 {
        let num = unsafe { (*self.state.get()).spin_lock };
        assert!(num != SPINLOCK_UNASSIGNED, "mutex used before init");
        num
    }

    /// One spinlock-guarded acquire attempt
    fn attempt(&self, core: CoreId) -> Attempt {
        let num = self.lock_num();
        let save = port::spin_lock_blocking(num);
        let attempt = unsafe { (*self.state.get()).try_take(core) };
        port::spin_unlock(num, save);
        attempt
    }

    /// Acquire unconditionally, parking in WFE while another core holds
    /// the mutex
    ///
    /// # Panics
    /// If the calling core already holds a non-recursive mutex.
    pub fn enter_blocking(&self) {
        let core = port::core_id();
        loop {
            match self.attempt(core) {
                Attempt::Entered => return,
                Attempt::HeldBySelf => {
                    panic!("deadlock: non-recursive mutex re-entered by its owner")
                }
                Attempt::HeldBy(_) => port::wfe(),
            }
        }
    }

    /// Non-blocking acquire; on failure reports the core currently
    /// holding the mutex
    ///
    /// For a recursive mutex the owning core always succeeds and
    /// deepens the nesting.
    pub fn try_enter(&self) -> Result<(), CoreId> {
        let core = port::core_id();
        match self.attempt(core) {
            Attempt::Entered => Ok(()),
            Attempt::HeldBySelf => Err(core),
            Attempt::HeldBy(owner) => Err(owner),
        }
    }

    /// Acquire with a millisecond timeout; `true` when acquired
    pub fn enter_timeout_ms(&self, timeout_ms: u32) -> bool {
        self.enter_block_until(make_timeout_ms(timeout_ms))
    }

    /// Acquire with a microsecond timeout; `true` when acquired
    pub fn enter_timeout_us(&self, timeout_us: u64) -> bool {
        self.enter_block_until(make_timeout_us(timeout_us))
    }

    /// Acquire with a deadline; `true` when acquired
    ///
    /// A timed-out caller never holds the mutex and the owner is left
    /// unchanged.
    pub fn enter_block_until(&self, until: Instant) -> bool {
        let core = port::core_id();
        loop {
            match self.attempt(core) {
                Attempt::Entered => return true,
                Attempt::HeldBySelf => {
                    panic!("deadlock: non-recursive mutex re-entered by its owner")
                }
                Attempt::HeldBy(_) => {
                    if port::best_effort_wfe_or_timeout(until.as_micros()) {
                        return false;
                    }
                }
            }
        }
    }

    /// Release the mutex
    ///
    /// For a recursive mutex this unwinds one nesting level; the mutex
    /// becomes acquirable by the other core only at depth zero. The
    /// release broadcasts SEV so both cores wake and re-race; spurious
    /// wakeups are absorbed by the acquire loops.
    ///
    /// # Panics
    /// If the calling core does not hold the mutex.
    pub fn exit(&self) {
        let core = port::core_id();
        let num = self.lock_num();
        let save = port::spin_lock_blocking(num);
        let released = unsafe { (*self.state.get()).release(core) };
        if released {
            port::sev();
        }
        port::spin_unlock(num, save);
    }

    /// Whether any core currently holds the mutex
    pub fn is_held(&self) -> bool {
        let num = self.lock_num();
        let save = port::spin_lock_blocking(num);
        let held = unsafe { (*self.state.get()).owner.is_some() };
        port::spin_unlock(num, save);
        held
    }

    /// Whether the calling core currently holds the mutex
    pub fn is_held_by_current_core(&self) -> bool {
        let core = port::core_id();
        let num = self.lock_num();
        let save = port::spin_lock_blocking(num);
        let held = unsafe { (*self.state.get()).owner == Some(core) };
        port::spin_unlock(num, save);
        held
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}
