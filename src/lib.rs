//! An RFC 4122 / RFC 9562 UUID codec with clock-sequence aware generators for UUID versions 1,
//! 6, and 7
//!
//! ```rust
//! let v1 = uuidkit::uuid1()?;
//! println!("{}", v1); // e.g., "c232ab00-9414-11ec-b3c8-9e6bdeced846"
//! println!("{:?}", v1.time().unix_time()); // as (seconds, nanoseconds) since 1970
//!
//! let v7 = uuidkit::uuid7()?;
//! println!("{}", v7); // e.g., "01809424-3e59-7c05-9219-566f82fff672"
//! println!("{:?}", v7.as_bytes()); // as 16-byte big-endian array
//!
//! let x: uuidkit::Uuid = v7.urn().parse()?;
//! assert_eq!(x, v7);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! See [RFC 9562](https://www.rfc-editor.org/rfc/rfc9562).
//!
//! # Field and bit layout
//!
//! UUIDv1 stores a 60-bit count of 100-nanosecond ticks since 1582-10-15 least significant part
//! first, followed by a 14-bit clock sequence and a 48-bit node ID:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           time_low                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           time_mid            |  ver  |       time_high       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|         clock_seq         |             node              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                              node                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! UUIDv6 holds the same fields with the timestamp reordered most significant part first, so
//! that the byte order follows the creation time:
//!
//! ```text
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           time_high                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           time_mid            |  ver  |       time_low        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|         clock_seq         |             node              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                              node                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! UUIDv7 starts with a 48-bit Unix timestamp in milliseconds:
//!
//! ```text
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          unix_ts_ms                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          unix_ts_ms           |  ver  |        sub_ms         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|                          rand                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             rand                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 4-bit `ver` field is set at `0001`, `0110`, or `0111`, and the 2-bit `var` field at
//!   `10`.
//! - The 14-bit `clock_seq` field is seeded randomly and incremented whenever a timestamp not
//!   greater than the previous one is observed (see [`ClockSequence`]).
//! - The 48-bit `node` field is either configured or drawn at random with the multicast bit set.
//! - The 12-bit `sub_ms` field holds the sub-millisecond fraction in units of 256 nanoseconds,
//!   bumped when needed so that UUIDv7 values from one clock sequence strictly increase.
//! - The remaining 62 `rand` bits are filled with a cryptographically strong random number.
//!
//! # Failure model
//!
//! Parsing and decoding never panic; they return [`ParseError`] or [`LengthError`]. Generators
//! return [`Error::Range`] for timestamps that cannot be encoded and [`Error::Entropy`] when the
//! [`RandomSource`] fails. The latter is fatal: the generator never falls back to a weaker
//! source, and callers should abort the operation.
//!
//! # Crate features
//!
//! - `global_gen` (default): the process-wide generator behind [`uuid1`], [`uuid6`],
//!   [`uuid7`], and [`uuid4`].
//! - `serde` (default): [`Uuid`] serializes as the canonical string in human-readable formats
//!   and as 16 bytes otherwise. Human-readable decoding accepts the canonical 8-4-4-4-12 form
//!   only, not the braced, URN, or hyphen-less forms that [`str::parse`] accepts.
//! - `uuid`: conversions from and to [`uuid::Uuid`](https://docs.rs/uuid).

#![cfg_attr(docsrs, feature(doc_cfg))]

mod id;
pub use id::{Uuid, Variant};

mod error;
pub use error::{EntropyError, Error, LengthError, ParseError, RangeError};

mod time;
pub use time::{SystemClock, Time, TimeSource, GREGORIAN_OFFSET, MAX_TICKS};

mod rand_source;
pub use rand_source::{OsRandom, RandomSource};

mod clock_seq;
pub use clock_seq::{ClockSequence, Tick};

pub mod generator;
pub use generator::Generator;

mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{
    clock_sequence, set_clock_sequence, shared_clock_sequence, uuid1, uuid4, uuid6, uuid7,
};
