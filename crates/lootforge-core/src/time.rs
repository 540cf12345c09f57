// crates/lootforge-core/src/time.rs
// ============================================================================
// Module: LootForge Time Model
// Description: Deterministic time source for the pipeline stages.
// Purpose: Keep rate limiting, retry backoff and run identities replayable.
// Dependencies: time
// ============================================================================

//! ## Overview
//! LootForge never reads the wall clock directly from inside a stage.
//! Every component that needs "now" — the generate orchestrator's rate
//! limiter, its retry backoff, run-id derivation — takes a [`Clock`]
//! instead. Production code wires up [`SystemClock`]; tests wire up
//! [`FixedClock`] or [`SteppedClock`] so timing-sensitive behavior
//! (§5/§8 of the spec: rate limiting within ±50ms under a mock clock)
//! stays deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// A source of milliseconds-since-epoch.
///
/// # Invariants
/// - Implementations must be `Send + Sync`; the generate orchestrator shares
///   one clock across every provider worker pool.
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Clock backed by [`SystemTime::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Clock that always returns the same instant.
///
/// Useful for hashing tests where the run id must be reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Clock that advances by a fixed step on every read.
///
/// Used by rate-limiter tests: each call to `now_millis` simulates one tick
/// of wall-clock time passing without an actual `sleep`.
#[derive(Debug)]
pub struct SteppedClock {
    current: AtomicI64,
    step_millis: i64,
}

impl SteppedClock {
    /// Creates a stepped clock starting at `start` and advancing by
    /// `step_millis` on every read.
    #[must_use]
    pub const fn new(start: i64, step_millis: i64) -> Self {
        Self {
            current: AtomicI64::new(start),
            step_millis,
        }
    }
}

impl Clock for SteppedClock {
    fn now_millis(&self) -> i64 {
        self.current.fetch_add(self.step_millis, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::Clock;
    use super::FixedClock;
    use super::SteppedClock;

    #[test]
    fn fixed_clock_never_advances() {
        let clock = FixedClock(42);
        assert_eq!(clock.now_millis(), 42);
        assert_eq!(clock.now_millis(), 42);
    }

    #[test]
    fn stepped_clock_advances_by_step() {
        let clock = SteppedClock::new(100, 10);
        assert_eq!(clock.now_millis(), 100);
        assert_eq!(clock.now_millis(), 110);
        assert_eq!(clock.now_millis(), 120);
    }
}
