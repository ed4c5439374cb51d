//! Clock sequence state shared by time-based generators

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, trace};

use crate::error::{EntropyError, RangeError};
use crate::rand_source::{random_clock_seq, RandomSource};
use crate::time::Time;

const MAX_CLOCK_SEQ: u16 = (1 << 14) - 1;
const MAX_UNIX_TS_MS: u64 = (1 << 48) - 1;
const NANOS_PER_MILLI: u128 = 1_000_000;

/// Represents the 14-bit clock sequence of RFC 4122 together with the last timestamp observed,
/// plus the sub-millisecond ordering state of UUIDv7.
///
/// The sequence starts uninitialized and is seeded from a [`RandomSource`] on first use. From then
/// on, every timestamp that is not greater than the last one seen increments the sequence (modulo
/// 2^14), so that two time-based UUIDs sharing a timestamp carry distinct clock sequences.
///
/// All state lives behind one mutex that is held only for the read-modify-write itself. Random
/// seeds are drawn before the lock is taken, and log records are emitted after it is released.
/// Generators that must not collide with each other
/// have to share one instance, typically through an [`Arc`](std::sync::Arc).
///
/// # Examples
///
/// ```rust
/// use uuidkit::{ClockSequence, OsRandom, Time};
///
/// let clock_seq = ClockSequence::new();
/// let t = Time::from_unix(1728984743, 0)?;
/// let a = clock_seq.next(t, &OsRandom)?;
/// let b = clock_seq.next(t, &OsRandom)?;
/// assert_eq!(b.clock_seq, (a.clock_seq + 1) & 0x3fff);
/// assert!(a.ordinal < b.ordinal);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct ClockSequence {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    /// `None` until seeded.
    sequence: Option<Sequence>,
    ordinal: u64,
    /// Last UUIDv7 `unix_ts_ms << 12 | sub_ms` value issued.
    last_v7: u64,
}

#[derive(Copy, Clone, Debug)]
struct Sequence {
    seq: u16,
    last_time: Option<Time>,
}

impl State {
    const INIT: Self = Self {
        sequence: None,
        ordinal: 0,
        last_v7: 0,
    };

    /// Returns the sequence, initializing it with `seed` if needed, and whether it was
    /// initialized by this call.
    fn sequence_mut(&mut self, seed: Option<u16>) -> (&mut Sequence, bool) {
        let seeded = self.sequence.is_none();
        let sequence = self.sequence.get_or_insert(Sequence {
            seq: seed.unwrap_or_default(),
            last_time: None,
        });
        (sequence, seeded)
    }
}

/// A timestamp paired with the clock sequence assigned to it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Tick {
    /// The timestamp as passed to [`ClockSequence::next`].
    pub time: Time,

    /// The 14-bit clock sequence to embed alongside `time`.
    pub clock_seq: u16,

    /// A counter that strictly increases with every call to [`ClockSequence::next`] on the same
    /// instance. It is not part of any UUID.
    pub ordinal: u64,
}

impl ClockSequence {
    /// Creates an uninitialized clock sequence.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State::INIT),
        }
    }

    /// Creates a clock sequence preset to `seq` (masked to 14 bits).
    pub const fn with_sequence(seq: u16) -> Self {
        Self {
            state: Mutex::new(State {
                sequence: Some(Sequence {
                    seq: seq & MAX_CLOCK_SEQ,
                    last_time: None,
                }),
                ordinal: 0,
                last_v7: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // every critical section leaves the state consistent, so poisoning is harmless
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the state, drawing a seed first if the sequence is uninitialized. The returned seed
    /// is `Some` whenever the sequence was still uninitialized at the time the lock was taken.
    fn lock_seeded(
        &self,
        rng: &(impl RandomSource + ?Sized),
    ) -> Result<(MutexGuard<'_, State>, Option<u16>), EntropyError> {
        let mut seed = None;
        loop {
            let state = self.lock();
            if state.sequence.is_some() || seed.is_some() {
                return Ok((state, seed));
            }
            drop(state);
            seed = Some(random_clock_seq(rng)?);
        }
    }

    /// Registers `time` and returns the clock sequence to use with it.
    ///
    /// Seeds the sequence from `rng` if uninitialized; otherwise increments it when `time` is
    /// not greater than the latest timestamp registered so far.
    pub fn next(
        &self,
        time: Time,
        rng: &(impl RandomSource + ?Sized),
    ) -> Result<Tick, EntropyError> {
        let (mut state, seed) = self.lock_seeded(rng)?;
        let (sequence, seeded) = state.sequence_mut(seed);
        let stale_since = match sequence.last_time {
            Some(last_time) if time <= last_time => {
                sequence.seq = (sequence.seq + 1) & MAX_CLOCK_SEQ;
                Some(last_time)
            }
            _ => {
                sequence.last_time = Some(time);
                None
            }
        };
        let clock_seq = sequence.seq;
        state.ordinal += 1;
        let ordinal = state.ordinal;
        drop(state);

        if seeded {
            debug!("clock sequence seeded with {clock_seq:#06x}");
        }
        if let Some(last_time) = stale_since {
            trace!(
                "timestamp {} not after {}; clock sequence bumped to {clock_seq:#06x}",
                time.ticks(),
                last_time.ticks(),
            );
        }
        Ok(Tick {
            time,
            clock_seq,
            ordinal,
        })
    }

    /// Returns the current clock sequence without registering a timestamp, seeding it from `rng`
    /// if uninitialized.
    pub fn current(&self, rng: &(impl RandomSource + ?Sized)) -> Result<u16, EntropyError> {
        let (mut state, seed) = self.lock_seeded(rng)?;
        let (sequence, seeded) = state.sequence_mut(seed);
        let seq = sequence.seq;
        drop(state);

        if seeded {
            debug!("clock sequence seeded with {seq:#06x}");
        }
        Ok(seq)
    }

    /// Overwrites the clock sequence with `seq` (masked to 14 bits), keeping the last timestamp.
    pub fn set(&self, seq: u16) {
        let seq = seq & MAX_CLOCK_SEQ;
        {
            let mut state = self.lock();
            let last_time = state.sequence.and_then(|s| s.last_time);
            state.sequence = Some(Sequence { seq, last_time });
        }
        debug!("clock sequence set to {seq:#06x}");
    }

    /// Returns the state to uninitialized, discarding the sequence, the last timestamp, and the
    /// UUIDv7 ordering state. The ordinal keeps increasing.
    pub fn reset(&self) {
        {
            let mut state = self.lock();
            state.sequence = None;
            state.last_v7 = 0;
        }
        debug!("clock sequence reset");
    }

    /// Splits a Unix timestamp in nanoseconds into the `unix_ts_ms` and 12-bit sub-millisecond
    /// fields of a UUIDv7, ensuring that the pair strictly increases across calls.
    ///
    /// The sub-millisecond field holds the fraction of the millisecond in units of 256
    /// nanoseconds (0 to 3906). If the pair would not be greater than the previous one, the
    /// previous pair plus one is returned instead, carrying into `unix_ts_ms` as needed.
    pub fn next_v7(&self, unix_nanos: u128) -> Result<(u64, u16), RangeError> {
        let unix_ts_ms = unix_nanos / NANOS_PER_MILLI;
        if unix_ts_ms > MAX_UNIX_TS_MS as u128 {
            return Err(RangeError::Overflow);
        }
        let sub_ms = ((unix_nanos % NANOS_PER_MILLI) >> 8) as u64;
        let mut now = ((unix_ts_ms as u64) << 12) | sub_ms;

        let mut state = self.lock();
        if now <= state.last_v7 {
            now = state.last_v7 + 1;
            if now >> 12 > MAX_UNIX_TS_MS {
                return Err(RangeError::Overflow);
            }
        }
        state.last_v7 = now;
        Ok((now >> 12, (now & 0xfff) as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::ClockSequence;
    use crate::error::EntropyError;
    use crate::rand_source::{OsRandom, RandomSource};
    use crate::time::Time;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::{collections::HashSet, sync::Arc, thread};

    struct CountingSource(AtomicUsize, u8);

    impl RandomSource for CountingSource {
        fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            dest.fill(self.1);
            Ok(())
        }
    }

    struct BrokenSource;

    impl RandomSource for BrokenSource {
        fn fill(&self, _: &mut [u8]) -> Result<(), EntropyError> {
            Err(EntropyError::new("read error"))
        }
    }

    /// Seeds once and returns stable 14-bit value
    #[test]
    fn seeds_once_and_returns_stable_14_bit_value() {
        let rng = CountingSource(AtomicUsize::new(0), 0xff);
        let clock_seq = ClockSequence::new();
        let seq = clock_seq.current(&rng).unwrap();
        assert_eq!(seq, 0x3fff);
        assert_eq!(seq & 0xc000, 0);
        assert_eq!(clock_seq.current(&rng).unwrap(), seq);
        assert_eq!(rng.0.load(Ordering::SeqCst), 1);

        for _ in 0..1_000 {
            let clock_seq = ClockSequence::new();
            let seq = clock_seq.current(&OsRandom).unwrap();
            assert_eq!(seq & 0xc000, 0);
            assert_eq!(clock_seq.current(&OsRandom).unwrap(), seq);
        }
    }

    /// Keeps sequence while timestamp increases
    #[test]
    fn keeps_sequence_while_timestamp_increases() {
        let clock_seq = ClockSequence::with_sequence(0x1234);
        for i in 0..100 {
            let tick = clock_seq.next(Time::from_ticks(1_000 + i), &OsRandom).unwrap();
            assert_eq!(tick.clock_seq, 0x1234);
            assert_eq!(tick.ordinal, i as u64 + 1);
        }
    }

    /// Bumps sequence upon constant or decreasing timestamp
    #[test]
    fn bumps_sequence_upon_constant_or_decreasing_timestamp() {
        let clock_seq = ClockSequence::with_sequence(0x3ffe);
        let t = Time::from_ticks(1_000_000);
        assert_eq!(clock_seq.next(t, &OsRandom).unwrap().clock_seq, 0x3ffe);
        assert_eq!(clock_seq.next(t, &OsRandom).unwrap().clock_seq, 0x3fff);
        // wraps through zero
        assert_eq!(clock_seq.next(t, &OsRandom).unwrap().clock_seq, 0);
        let back = Time::from_ticks(999_000);
        assert_eq!(clock_seq.next(back, &OsRandom).unwrap().clock_seq, 1);
        // the regressed timestamp does not lower the high-water mark
        let between = Time::from_ticks(999_500);
        assert_eq!(clock_seq.next(between, &OsRandom).unwrap().clock_seq, 2);
        let later = Time::from_ticks(1_000_001);
        assert_eq!(clock_seq.next(later, &OsRandom).unwrap().clock_seq, 2);
    }

    /// Sets and resets sequence
    #[test]
    fn sets_and_resets_sequence() {
        let rng = CountingSource(AtomicUsize::new(0), 0x00);
        let clock_seq = ClockSequence::new();
        clock_seq.set(0xffff);
        assert_eq!(clock_seq.current(&rng).unwrap(), 0x3fff);
        assert_eq!(rng.0.load(Ordering::SeqCst), 0);

        let t = Time::from_ticks(5);
        clock_seq.next(t, &rng).unwrap();
        clock_seq.set(0x0100);
        assert_eq!(clock_seq.next(t, &rng).unwrap().clock_seq, 0x0101);

        clock_seq.reset();
        assert_eq!(clock_seq.next(t, &rng).unwrap().clock_seq, 0);
        assert_eq!(rng.0.load(Ordering::SeqCst), 1);
    }

    /// Emits log records only after releasing the lock
    #[test]
    fn emits_log_records_only_after_releasing_the_lock() {
        use std::cell::Cell;
        use std::sync::Mutex;

        static WATCHED: ClockSequence = ClockSequence::new();
        static HELD_WHILE_LOGGING: Mutex<Vec<String>> = Mutex::new(Vec::new());
        static N_RECORDS: AtomicUsize = AtomicUsize::new(0);
        thread_local!(static WATCHING: Cell<bool> = const { Cell::new(false) });

        struct LockCheckingLogger;

        impl log::Log for LockCheckingLogger {
            fn enabled(&self, _: &log::Metadata) -> bool {
                true
            }

            fn log(&self, record: &log::Record) {
                // other tests log from other threads concurrently
                if !WATCHING.with(Cell::get) {
                    return;
                }
                N_RECORDS.fetch_add(1, Ordering::SeqCst);
                if WATCHED.state.try_lock().is_err() {
                    HELD_WHILE_LOGGING
                        .lock()
                        .unwrap()
                        .push(record.args().to_string());
                }
            }

            fn flush(&self) {}
        }

        static LOGGER: LockCheckingLogger = LockCheckingLogger;
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(log::LevelFilter::Trace);

        WATCHING.with(|w| w.set(true));
        let t = Time::from_ticks(10);
        WATCHED.next(t, &OsRandom).unwrap();
        WATCHED.next(t, &OsRandom).unwrap();
        WATCHED.set(5);
        WATCHED.reset();
        WATCHED.current(&OsRandom).unwrap();
        WATCHING.with(|w| w.set(false));

        // seeded, bumped, set, reset, seeded again
        assert_eq!(N_RECORDS.load(Ordering::SeqCst), 5);
        assert_eq!(*HELD_WHILE_LOGGING.lock().unwrap(), Vec::<String>::new());
    }

    /// Propagates entropy failure on seeding
    #[test]
    fn propagates_entropy_failure_on_seeding() {
        let clock_seq = ClockSequence::new();
        assert!(clock_seq.current(&BrokenSource).is_err());
        assert!(clock_seq.next(Time::from_ticks(1), &BrokenSource).is_err());

        // an initialized sequence never consults the source
        clock_seq.set(7);
        assert_eq!(clock_seq.current(&BrokenSource), Ok(7));
    }

    /// Assigns distinct sequences to same timestamp under multithreading
    #[test]
    fn assigns_distinct_sequences_to_same_timestamp_under_multithreading() {
        let clock_seq = Arc::new(ClockSequence::new());
        let t = Time::from_ticks(42);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock_seq = Arc::clone(&clock_seq);
                thread::spawn(move || {
                    (0..1_000)
                        .map(|_| clock_seq.next(t, &OsRandom).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seqs = HashSet::new();
        let mut ordinals = HashSet::new();
        for h in handles {
            for tick in h.join().unwrap() {
                seqs.insert(tick.clock_seq);
                ordinals.insert(tick.ordinal);
            }
        }
        assert_eq!(seqs.len(), 4_000);
        assert_eq!(ordinals.len(), 4_000);
    }

    /// Issues strictly increasing UUIDv7 time fields
    #[test]
    fn issues_strictly_increasing_uuidv7_time_fields() {
        let clock_seq = ClockSequence::new();
        let nanos = 1_728_984_743_123_456_789u128;
        let (ms, sub_ms) = clock_seq.next_v7(nanos).unwrap();
        assert_eq!(ms, 1_728_984_743_123);
        assert_eq!(sub_ms, (456_789 >> 8) as u16);

        let mut prev = (ms, sub_ms);
        for i in 0..10_000u128 {
            let curr = clock_seq.next_v7(nanos - i.min(4_000) * 1_000).unwrap();
            assert!(prev < curr);
            assert!(curr.1 < 1 << 12);
            prev = curr;
        }

        clock_seq.reset();
        assert_eq!(clock_seq.next_v7(nanos - 10_000_000), Ok((ms - 10, sub_ms)));
    }

    /// Rejects UUIDv7 timestamps beyond 48 bits
    #[test]
    fn rejects_uuidv7_timestamps_beyond_48_bits() {
        let clock_seq = ClockSequence::new();
        let max_ms = (1u128 << 48) - 1;
        assert!(clock_seq.next_v7((max_ms + 1) * 1_000_000).is_err());
        assert_eq!(
            clock_seq.next_v7(max_ms * 1_000_000 + 999_999),
            Ok(((1 << 48) - 1, 3906))
        );
        assert!(clock_seq.next_v7(max_ms * 1_000_000 + 999_999).is_ok());
    }
}
