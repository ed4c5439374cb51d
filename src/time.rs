//! UUID timestamps and clock sources

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::RangeError;

/// Number of 100-nanosecond ticks between the Gregorian epoch (1582-10-15) and the Unix epoch.
pub const GREGORIAN_OFFSET: i64 = 122_192_928_000_000_000;

/// Largest tick count that fits in the 60-bit timestamp field of UUID versions 1 and 6.
pub const MAX_TICKS: i64 = (1 << 60) - 1;

const TICKS_PER_SEC: i128 = 10_000_000;
const NANOS_PER_TICK: i128 = 100;

/// Represents a UUID timestamp: the number of 100-nanosecond intervals since
/// 1582-10-15T00:00:00Z.
///
/// Values produced by [`Time::from_system_time`] and [`Time::from_unix`] always fit in 60 bits.
/// Values extracted from arbitrary UUIDs by [`Uuid::time`](crate::Uuid::time) are taken as found.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Time(i64);

impl Time {
    /// Creates a timestamp from a raw tick count.
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Returns the raw tick count.
    pub const fn ticks(self) -> i64 {
        self.0
    }

    /// Creates a timestamp from seconds and nanoseconds relative to the Unix epoch.
    ///
    /// Sub-tick precision is truncated toward the past.
    pub fn from_unix(secs: i64, nanos: u32) -> Result<Self, RangeError> {
        Self::from_unix_nanos(secs as i128 * 1_000_000_000 + nanos as i128)
    }

    /// Creates a timestamp from milliseconds since the Unix epoch, failing if the result does not
    /// fit in 60 bits.
    pub fn from_unix_millis(unix_ms: u64) -> Result<Self, RangeError> {
        Self::from_unix_nanos(unix_ms as i128 * 1_000_000)
    }

    /// Converts a [`SystemTime`] into a timestamp, failing if the instant predates the Gregorian
    /// epoch or lies beyond the 60-bit range (around the year 5236).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::{Duration, UNIX_EPOCH};
    /// use uuidkit::Time;
    ///
    /// let t = Time::from_system_time(UNIX_EPOCH + Duration::from_secs(1728984743))?;
    /// assert_eq!(t.unix_time(), (1728984743, 0));
    /// # Ok::<(), uuidkit::RangeError>(())
    /// ```
    pub fn from_system_time(instant: SystemTime) -> Result<Self, RangeError> {
        let unix_nanos = match instant.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_nanos() as i128,
            Err(e) => -(e.duration().as_nanos() as i128),
        };
        Self::from_unix_nanos(unix_nanos)
    }

    fn from_unix_nanos(unix_nanos: i128) -> Result<Self, RangeError> {
        let ticks = unix_nanos.div_euclid(NANOS_PER_TICK) + GREGORIAN_OFFSET as i128;
        if ticks < 0 {
            Err(RangeError::BeforeEpoch)
        } else if ticks > MAX_TICKS as i128 {
            Err(RangeError::Overflow)
        } else {
            Ok(Self(ticks as i64))
        }
    }

    /// Returns the timestamp as seconds and nanoseconds since the Unix epoch.
    ///
    /// The nanosecond part is always within `0..1_000_000_000`; instants before 1970 have
    /// negative seconds.
    pub const fn unix_time(self) -> (i64, i64) {
        // exact for any raw tick count
        let unix_ticks = self.0 as i128 - GREGORIAN_OFFSET as i128;
        (
            unix_ticks.div_euclid(TICKS_PER_SEC) as i64,
            (unix_ticks.rem_euclid(TICKS_PER_SEC) * 100) as i64,
        )
    }

    /// Converts the timestamp into a [`SystemTime`], or `None` if the platform cannot represent
    /// the instant.
    pub fn to_system_time(self) -> Option<SystemTime> {
        let (secs, nanos) = self.unix_time();
        if secs >= 0 {
            UNIX_EPOCH.checked_add(Duration::new(secs as u64, nanos as u32))
        } else {
            UNIX_EPOCH
                .checked_sub(Duration::from_secs(secs.unsigned_abs()))?
                .checked_add(Duration::from_nanos(nanos as u64))
        }
    }
}

/// A source of wall-clock time for UUID generators.
///
/// Implementations must be safe to call from multiple threads at once.
pub trait TimeSource: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> SystemTime;
}

/// The default [`TimeSource`] backed by [`SystemTime::now`].
///
/// The resolution follows the platform clock: nanoseconds on Linux and macOS, 100 nanoseconds on
/// Windows. Coarser clocks are compensated by the clock sequence and the UUIDv7 sub-millisecond
/// counter.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
