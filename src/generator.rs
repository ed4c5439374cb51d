//! Time-based and random UUID generator

use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::clock_seq::{ClockSequence, Tick};
use crate::error::{EntropyError, Error, RangeError};
use crate::rand_source::{random_node_id, OsRandom, RandomSource};
use crate::time::{SystemClock, Time, TimeSource};
use crate::Uuid;

pub mod with_rand08;

/// Represents a UUID generator that composes a [`TimeSource`], a [`ClockSequence`], and a
/// [`RandomSource`] into UUIDs of versions 1, 6, 7, and 4.
///
/// A generator is `Sync` and can be shared by any number of threads. Time-based UUIDs are
/// collision-free only among generators that share the same [`ClockSequence`] and node ID, so a
/// process should route its time-based generation through one shared clock sequence, such as
/// the one returned by [`shared_clock_sequence`](crate::shared_clock_sequence).
///
/// # Examples
///
/// ```rust
/// use std::{sync::Arc, thread};
/// use uuidkit::Generator;
///
/// let g = Arc::new(Generator::new().with_node_id([0x02, 0, 0, 0, 0, 0x01]));
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = Arc::clone(&g);
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.new_v1().unwrap(), i);
///             }
///         });
///     }
/// });
/// ```
///
/// # Generator functions
///
/// | Method        | Version | Timestamp | Failure                                |
/// | ------------- | ------- | --------- | -------------------------------------- |
/// | [`new_v1`]    | 1       | Now       | [`Error::Entropy`]                     |
/// | [`new_v1_at`] | 1       | Argument  | [`Error::Range`], [`Error::Entropy`]   |
/// | [`new_v6`]    | 6       | Now       | [`Error::Entropy`]                     |
/// | [`new_v6_at`] | 6       | Argument  | [`Error::Range`], [`Error::Entropy`]   |
/// | [`new_v7`]    | 7       | Now       | [`Error::Entropy`]                     |
/// | [`new_v7_at`] | 7       | Argument  | [`Error::Range`], [`Error::Entropy`]   |
/// | [`new_v4`]    | 4       | -         | [`Error::Entropy`]                     |
///
/// An [`Error::Entropy`] means the random source is broken; callers should abort rather than
/// retry.
///
/// [`new_v1`]: Generator::new_v1
/// [`new_v1_at`]: Generator::new_v1_at
/// [`new_v6`]: Generator::new_v6
/// [`new_v6_at`]: Generator::new_v6_at
/// [`new_v7`]: Generator::new_v7
/// [`new_v7_at`]: Generator::new_v7_at
/// [`new_v4`]: Generator::new_v4
#[derive(Debug)]
pub struct Generator<R = OsRandom, C = SystemClock> {
    clock_seq: Arc<ClockSequence>,
    node_id: OnceLock<[u8; 6]>,

    /// The random number generator used by the generator.
    rng: R,

    /// The wall clock used by the generator.
    clock: C,
}

impl Generator {
    /// Creates a generator with the operating system's random source, the system clock, and a
    /// fresh clock sequence.
    pub fn new() -> Self {
        Self::with_sources(OsRandom, SystemClock)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource, C: TimeSource> Generator<R, C> {
    /// Creates a generator with the specified random and time sources and a fresh clock sequence.
    pub fn with_sources(rng: R, clock: C) -> Self {
        Self {
            clock_seq: Default::default(),
            node_id: OnceLock::new(),
            rng,
            clock,
        }
    }

    /// Replaces the clock sequence with a shared one.
    pub fn with_clock_sequence(mut self, clock_seq: Arc<ClockSequence>) -> Self {
        self.clock_seq = clock_seq;
        self
    }

    /// Sets the 48-bit node ID embedded in UUIDv1 and UUIDv6. Without this, a random node ID
    /// with the multicast bit set is drawn on first use.
    pub fn with_node_id(mut self, node_id: [u8; 6]) -> Self {
        self.node_id = OnceLock::from(node_id);
        self
    }

    /// Returns the clock sequence state used by the generator.
    pub fn clock_sequence(&self) -> &Arc<ClockSequence> {
        &self.clock_seq
    }

    /// Returns the current 14-bit clock sequence, seeding it if necessary.
    pub fn current_clock_sequence(&self) -> Result<u16, EntropyError> {
        self.clock_seq.current(&self.rng)
    }

    /// Returns the node ID, drawing a random one on first call if none was configured.
    pub fn node_id(&self) -> Result<[u8; 6], EntropyError> {
        if let Some(node_id) = self.node_id.get() {
            return Ok(*node_id);
        }
        let node_id = random_node_id(&self.rng)?;
        Ok(*self.node_id.get_or_init(|| node_id))
    }

    /// Reads the clock (or takes `at` if given), converts the instant into a UUID timestamp, and
    /// registers it with the clock sequence.
    pub fn timestamp(&self, at: Option<SystemTime>) -> Result<Tick, Error> {
        let instant = at.unwrap_or_else(|| self.clock.now());
        let time = Time::from_system_time(instant)?;
        Ok(self.clock_seq.next(time, &self.rng)?)
    }

    /// Generates a new UUIDv1 object from the current timestamp.
    pub fn new_v1(&self) -> Result<Uuid, Error> {
        self.generate_v1(None)
    }

    /// Generates a new UUIDv1 object from the timestamp given.
    pub fn new_v1_at(&self, at: SystemTime) -> Result<Uuid, Error> {
        self.generate_v1(Some(at))
    }

    fn generate_v1(&self, at: Option<SystemTime>) -> Result<Uuid, Error> {
        let tick = self.timestamp(at)?;
        let node_id = self.node_id()?;
        Ok(Uuid::from_fields_v1(
            tick.time.ticks() as u64,
            tick.clock_seq,
            node_id,
        ))
    }

    /// Generates a new UUIDv6 object from the current timestamp.
    ///
    /// UUIDv6 carries the same information as UUIDv1 with the timestamp reordered so that the
    /// byte order follows the creation time.
    pub fn new_v6(&self) -> Result<Uuid, Error> {
        self.generate_v6(None)
    }

    /// Generates a new UUIDv6 object from the timestamp given.
    pub fn new_v6_at(&self, at: SystemTime) -> Result<Uuid, Error> {
        self.generate_v6(Some(at))
    }

    fn generate_v6(&self, at: Option<SystemTime>) -> Result<Uuid, Error> {
        let tick = self.timestamp(at)?;
        let node_id = self.node_id()?;
        Ok(Uuid::from_fields_v6(
            tick.time.ticks() as u64,
            tick.clock_seq,
            node_id,
        ))
    }

    /// Generates a new UUIDv7 object from the current timestamp.
    ///
    /// The 12 bits following `unix_ts_ms` hold the sub-millisecond fraction of the timestamp,
    /// bumped when needed so that UUIDv7 values sharing this generator's clock sequence strictly
    /// increase. The remaining 62 bits are random.
    pub fn new_v7(&self) -> Result<Uuid, Error> {
        self.generate_v7(self.clock.now())
    }

    /// Generates a new UUIDv7 object from the timestamp given.
    pub fn new_v7_at(&self, at: SystemTime) -> Result<Uuid, Error> {
        self.generate_v7(at)
    }

    fn generate_v7(&self, at: SystemTime) -> Result<Uuid, Error> {
        let unix_nanos = at
            .duration_since(UNIX_EPOCH)
            .map_err(|_| RangeError::BeforeEpoch)?
            .as_nanos();
        let (unix_ts_ms, sub_ms) = self.clock_seq.next_v7(unix_nanos)?;

        let mut rand_b = [0u8; 8];
        self.rng.fill(&mut rand_b)?;
        Ok(Uuid::from_fields_v7(
            unix_ts_ms,
            sub_ms,
            u64::from_be_bytes(rand_b) >> 2,
        ))
    }

    /// Generates a new UUIDv4 object utilizing the random number generator inside.
    pub fn new_v4(&self) -> Result<Uuid, Error> {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes)?;
        bytes[6] = 0x40 | (bytes[6] >> 4);
        bytes[8] = 0x80 | (bytes[8] >> 2);
        Ok(Uuid::from(bytes))
    }
}
