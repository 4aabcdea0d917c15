//! Time handling for timeout-capable lock acquisition
//!
//! Wraps the free-running microsecond timer exposed by the port layer.

use crate::port;

/// A point in time, in microseconds since boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant(u64);

impl Instant {
    /// The current time
    #[inline]
    pub fn now() -> Self {
        Instant(port::now_us())
    }

    /// Construct from a raw microsecond count
    #[inline]
    pub const fn from_micros(us: u64) -> Self {
        Instant(us)
    }

    /// Raw microsecond count
    #[inline]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Whether this point in time has been reached
    #[inline]
    pub fn reached(self) -> bool {
        port::now_us() >= self.0
    }
}

/// Deadline `us` microseconds from now
#[inline]
pub fn make_timeout_us(us: u64) -> Instant {
    Instant(port::now_us().saturating_add(us))
}

/// Deadline `ms` milliseconds from now
#[inline]
pub fn make_timeout_ms(ms: u32) -> Instant {
    make_timeout_us(ms as u64 * 1000)
}
