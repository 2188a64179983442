//! Monotonic time primitives

use core::fmt;

/// Microseconds since power-on, as sampled from the monotonic clock.
///
/// Wraps at `u32::MAX` (about 71.6 minutes). Elapsed time must always be
/// computed with [`ClockSnapshot::elapsed_since`], never by plain subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockSnapshot(u32);

impl ClockSnapshot {
    /// Power-on instant
    pub const ZERO: Self = Self(0);

    /// Wrap a raw microsecond count
    pub const fn from_micros(micros: u32) -> Self {
        Self(micros)
    }

    /// Raw microsecond count
    pub const fn micros(self) -> u32 {
        self.0
    }

    /// Microseconds from `earlier` to `self`, correct across one wrap.
    pub const fn elapsed_since(self, earlier: ClockSnapshot) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// True if `self` is later than `other` (handles wraparound)
    pub const fn is_after(self, other: ClockSnapshot) -> bool {
        let delta = self.0.wrapping_sub(other.0);
        delta != 0 && delta < u32::MAX / 2
    }

    /// Snapshot `micros` later, wrapping.
    pub const fn offset(self, micros: u32) -> Self {
        Self(self.0.wrapping_add(micros))
    }
}

impl fmt::Display for ClockSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClockSnapshot {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}us", self.0);
    }
}

/// Wraparound-safe `now - earlier` on raw counter values.
#[inline]
pub const fn elapsed_micros(now: u32, earlier: u32) -> u32 {
    now.wrapping_sub(earlier)
}

/// Free-running monotonic clock.
///
/// Both readings are non-blocking and callable from interrupt and main-loop
/// context alike. Each wraps at its own integer width.
pub trait Clock {
    /// Microseconds since power-on.
    fn now_micros(&self) -> u32;

    /// Milliseconds since power-on.
    fn now_millis(&self) -> u32;

    /// Current time as a snapshot.
    fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot::from_micros(self.now_micros())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_micros(&self) -> u32 {
        (**self).now_micros()
    }

    fn now_millis(&self) -> u32 {
        (**self).now_millis()
    }
}
