//! Error types

use thiserror::Error;

/// Error parsing an invalid string representation of UUID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Error)]
pub enum ParseError {
    /// The input length matches none of the accepted forms (32, 36, 38 or 45 characters).
    #[error("invalid UUID length: {len}")]
    InvalidLength {
        /// Length of the input in bytes.
        len: usize,
    },

    /// A character other than a hexadecimal digit was found where a digit was expected.
    #[error("invalid character {found:?} at index {index}")]
    InvalidChar {
        /// The offending character.
        found: char,
        /// Byte offset of the offending character in the input.
        index: usize,
    },

    /// A hyphen, brace, or `urn:uuid:` prefix is missing or misplaced.
    #[error("invalid group separator at index {index}")]
    InvalidGroup {
        /// Byte offset where a separator was expected.
        index: usize,
    },
}

/// Error converting a byte slice whose length is not exactly 16 into a UUID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Error)]
#[error("invalid UUID byte length: expected 16, found {actual}")]
pub struct LengthError {
    /// Length of the rejected slice.
    pub actual: usize,
}

/// Error converting an instant that cannot be expressed as a 60-bit UUID timestamp.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Error)]
pub enum RangeError {
    /// The instant precedes the Gregorian epoch (1582-10-15T00:00:00Z).
    #[error("timestamp precedes the UUID epoch (1582-10-15)")]
    BeforeEpoch,

    /// The instant needs more than 60 bits of 100-nanosecond ticks.
    #[error("timestamp exceeds the 60-bit UUID time range")]
    Overflow,
}

/// Error reported by a [`RandomSource`](crate::RandomSource) that could not produce random bytes.
///
/// This error is not recoverable: generating UUIDs without a working entropy source would silently
/// weaken their uniqueness, so callers should abort the operation rather than retry or fall back.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Error)]
#[error("entropy source failure: {message}")]
pub struct EntropyError {
    message: String,
}

impl EntropyError {
    /// Creates an error carrying a description of the underlying failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the description of the underlying failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<rand::Error> for EntropyError {
    fn from(src: rand::Error) -> Self {
        Self::new(src.to_string())
    }
}

/// Error returned by UUID generator functions.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Error)]
pub enum Error {
    /// The timestamp supplied or read from the clock is out of range.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// The random source failed. See [`EntropyError`].
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

impl Error {
    /// Returns true if the error must be treated as non-recoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Entropy(_))
    }
}
