// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic nanosecond time.
//!
//! Every timestamp in this crate is a `u64` count of nanoseconds read from a
//! monotonic clock. The [`Clock`] trait is the single source of "now" for
//! components that need it; [`MonotonicClock`] reads `CLOCK_MONOTONIC` and
//! [`ManualClock`] is advanced by hand for simulations and tests.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use rustix::time::{ClockId, Timespec, clock_gettime};

/// Nanoseconds in one second.
pub const NS_PER_SEC: u64 = 1_000_000_000;

/// Nanoseconds in one millisecond.
pub const NS_PER_MS: u64 = 1_000_000;

/// Nanoseconds in one microsecond.
pub const NS_PER_US: u64 = 1_000;

/// Half a millisecond, the tolerance used when comparing present times.
pub const HALF_MS_NS: u64 = NS_PER_MS / 2;

/// Returns `percent` percent of `time_ns`.
///
/// Goes through seconds as `f64` and truncates.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "result is a non-negative fraction of a u64 input"
)]
pub fn percent_of(time_ns: u64, percent: u32) -> u64 {
    let fraction = f64::from(percent) / 100.0;
    let seconds = time_ns as f64 / NS_PER_SEC as f64;
    (seconds * fraction * NS_PER_SEC as f64) as u64
}

/// Converts nanoseconds to milliseconds, truncated to microsecond precision.
#[must_use]
pub fn ns_to_ms(time_ns: i64) -> f64 {
    (time_ns / 1_000) as f64 / 1_000.0
}

/// Returns whether `l` and `r` lie strictly within `range` of each other.
///
/// Monotonic timestamps stay far below `i64::MAX`, so the signed difference
/// cannot wrap.
#[must_use]
pub const fn is_within_of_each_other(l: u64, r: u64, range: u64) -> bool {
    let t = l as i64 - r as i64;
    -(range as i64) < t && t < range as i64
}

/// Returns whether `l` and `r` lie strictly within half a millisecond.
#[must_use]
pub const fn is_within_half_ms(l: u64, r: u64) -> bool {
    is_within_of_each_other(l, r, HALF_MS_NS)
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// A source of monotonic nanosecond timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time in nanoseconds.
    fn now_ns(&self) -> u64;
}

/// Reads `CLOCK_MONOTONIC`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        now_ns()
    }
}

/// Returns the current monotonic time in nanoseconds.
#[must_use]
pub fn now_ns() -> u64 {
    timespec_to_ns(clock_gettime(ClockId::Monotonic))
}

fn timespec_to_ns(timespec: Timespec) -> u64 {
    let seconds = u64::try_from(timespec.tv_sec).unwrap_or(0);
    let nanos = u64::try_from(timespec.tv_nsec)
        .unwrap_or(0)
        .min(NS_PER_SEC - 1);

    let wide = u128::from(seconds)
        .saturating_mul(u128::from(NS_PER_SEC))
        .saturating_add(u128::from(nanos));
    u64::try_from(wide).unwrap_or(u64::MAX)
}

/// A clock that only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `start_ns`.
    #[must_use]
    pub const fn new(start_ns: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ns),
        }
    }

    /// Moves the clock forward by `delta_ns`.
    pub fn advance(&self, delta_ns: u64) {
        self.now.fetch_add(delta_ns, Ordering::Relaxed);
    }

    /// Moves the clock to `time_ns` if that is later than the current time.
    pub fn advance_to(&self, time_ns: u64) {
        self.now.fetch_max(time_ns, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManualClock({})", self.now_ns())
    }
}
