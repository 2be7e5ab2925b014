//! Environment abstraction for deterministic testing.
//!
//! Decouples the idle-reaping and retry logic from the wall clock so tests
//! can drive time explicitly instead of sleeping in real time.

use std::time::Duration;

/// Abstract environment providing time and async sleep.
///
/// # Invariants
///
/// Implementations MUST guarantee `now()` never goes backwards within a
/// single execution context.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; test environments
    /// use a virtual clock that only advances when told to.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the only async method in the trait; protocol logic never
    /// calls it directly, only driver code (the reaper loop, retry backoff).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
