//! Injected time and identifier sources.
//!
//! The engines never read the system clock or a global RNG directly. They go
//! through [`EngineDeps`], which bundles a [`Clock`] and an [`IdGenerator`].
//! Production code uses [`MonotonicClock`] and [`RoomSafeIdGenerator`];
//! tests swap in [`ManualClock`] and [`SequentialIdGenerator`] to make
//! expiry and id assignment deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use muster_types::{ROOM_SAFE_ALPHABET, Timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default length of a generated group id suffix.
pub const DEFAULT_ID_SUFFIX_LEN: usize = 12;

/// A source of monotonic millisecond timestamps.
pub trait Clock: Send + Sync {
    /// The current reading in milliseconds.
    fn now_ms(&self) -> Timestamp;
}

/// A source of random group id suffixes.
///
/// Implementations must only emit characters from [`ROOM_SAFE_ALPHABET`].
pub trait IdGenerator: Send {
    /// Produce the next suffix.
    fn random_id(&mut self) -> String;
}

/// Milliseconds elapsed since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Timestamp {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// A hand-driven clock for tests and replays.
///
/// Clones share the same reading, so a test can keep one handle and advance
/// it while an engine holds another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start`.
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Jump to an absolute reading.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::Relaxed);
    }

    /// Move forward by `delta_ms`, saturating at `u64::MAX`.
    pub fn advance(&self, delta_ms: u64) {
        let current = self.now.load(Ordering::Relaxed);
        self.now
            .store(current.saturating_add(delta_ms), Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Timestamp {
        self.now.load(Ordering::Relaxed)
    }
}

/// Random suffixes drawn from [`ROOM_SAFE_ALPHABET`].
#[derive(Debug)]
pub struct RoomSafeIdGenerator {
    rng: StdRng,
    len: usize,
}

impl RoomSafeIdGenerator {
    /// Seed from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            len: DEFAULT_ID_SUFFIX_LEN,
        }
    }

    /// Seed deterministically, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            len: DEFAULT_ID_SUFFIX_LEN,
        }
    }

    /// Override the suffix length (at least one character).
    #[must_use]
    pub fn with_len(mut self, len: usize) -> Self {
        self.len = len.max(1);
        self
    }
}

impl Default for RoomSafeIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RoomSafeIdGenerator {
    fn random_id(&mut self) -> String {
        (0..self.len)
            .map(|_| {
                let idx = self.rng.random_range(0..ROOM_SAFE_ALPHABET.len());
                char::from(ROOM_SAFE_ALPHABET.get(idx).copied().unwrap_or(b'a'))
            })
            .collect()
    }
}

/// Predictable suffixes `id1`, `id2`, ... for tests.
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    next: u64,
}

impl SequentialIdGenerator {
    /// Start counting from one.
    pub const fn new() -> Self {
        Self { next: 0 }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn random_id(&mut self) -> String {
        self.next = self.next.saturating_add(1);
        format!("id{}", self.next)
    }
}

/// The clock and id source handed to every engine.
pub struct EngineDeps {
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl EngineDeps {
    /// Bundle explicit implementations.
    pub fn new(clock: impl Clock + 'static, ids: impl IdGenerator + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            ids: Box::new(ids),
        }
    }

    /// Monotonic clock and OS-seeded room-safe ids.
    pub fn system() -> Self {
        Self::new(MonotonicClock::new(), RoomSafeIdGenerator::new())
    }

    /// The current clock reading.
    pub fn now(&self) -> Timestamp {
        self.clock.now_ms()
    }

    /// The next id suffix.
    pub fn next_id(&mut self) -> String {
        self.ids.random_id()
    }
}

impl core::fmt::Debug for EngineDeps {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EngineDeps")
            .field("now", &self.now())
            .finish_non_exhaustive()
    }
}
