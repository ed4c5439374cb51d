use std::{fmt, str};

use fstr::FStr;

use crate::error::{LengthError, ParseError};
use crate::time::{Time, GREGORIAN_OFFSET};

/// Represents a Universally Unique IDentifier.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Uuid([u8; 16]);

impl Uuid {
    /// Nil UUID (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max UUID (ffffffff-ffff-ffff-ffff-ffffffffffff)
    pub const MAX: Self = Self([0xff; 16]);

    /// Creates a UUID from a 16-byte big-endian array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Creates a UUID from a byte slice that must be exactly 16 bytes long.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uuidkit::Uuid;
    ///
    /// assert!(Uuid::from_slice(&[0u8; 16]).is_ok());
    /// assert_eq!(Uuid::from_slice(&[1, 2, 3]).unwrap_err().actual, 3);
    /// ```
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LengthError> {
        <[u8; 16]>::try_from(bytes)
            .map(Self)
            .map_err(|_| LengthError {
                actual: bytes.len(),
            })
    }

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns a copy of the underlying byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Creates a UUID byte array from UUIDv1 field values.
    ///
    /// # Panics
    ///
    /// Panics if `ticks` does not fit in 60 bits or `clock_seq` does not fit in 14 bits.
    pub const fn from_fields_v1(ticks: u64, clock_seq: u16, node_id: [u8; 6]) -> Self {
        if ticks >= 1 << 60 || clock_seq >= 1 << 14 {
            panic!("invalid field value");
        }

        Self([
            (ticks >> 24) as u8,
            (ticks >> 16) as u8,
            (ticks >> 8) as u8,
            ticks as u8,
            (ticks >> 40) as u8,
            (ticks >> 32) as u8,
            0x10 | (ticks >> 56) as u8,
            (ticks >> 48) as u8,
            0x80 | (clock_seq >> 8) as u8,
            clock_seq as u8,
            node_id[0],
            node_id[1],
            node_id[2],
            node_id[3],
            node_id[4],
            node_id[5],
        ])
    }

    /// Creates a UUID byte array from UUIDv6 field values.
    ///
    /// The timestamp is stored most significant bits first so that the byte order of UUIDv6 values
    /// follows their creation time.
    ///
    /// # Panics
    ///
    /// Panics if `ticks` does not fit in 60 bits or `clock_seq` does not fit in 14 bits.
    pub const fn from_fields_v6(ticks: u64, clock_seq: u16, node_id: [u8; 6]) -> Self {
        if ticks >= 1 << 60 || clock_seq >= 1 << 14 {
            panic!("invalid field value");
        }

        Self([
            (ticks >> 52) as u8,
            (ticks >> 44) as u8,
            (ticks >> 36) as u8,
            (ticks >> 28) as u8,
            (ticks >> 20) as u8,
            (ticks >> 12) as u8,
            0x60 | ((ticks >> 8) & 0x0f) as u8,
            ticks as u8,
            0x80 | (clock_seq >> 8) as u8,
            clock_seq as u8,
            node_id[0],
            node_id[1],
            node_id[2],
            node_id[3],
            node_id[4],
            node_id[5],
        ])
    }

    /// Creates a UUID byte array from UUIDv7 field values.
    ///
    /// # Panics
    ///
    /// Panics if any argument exceeds its field width (48, 12, and 62 bits respectively).
    pub const fn from_fields_v7(unix_ts_ms: u64, rand_a: u16, rand_b: u64) -> Self {
        if unix_ts_ms >= 1 << 48 || rand_a >= 1 << 12 || rand_b >= 1 << 62 {
            panic!("invalid field value");
        }

        Self([
            (unix_ts_ms >> 40) as u8,
            (unix_ts_ms >> 32) as u8,
            (unix_ts_ms >> 24) as u8,
            (unix_ts_ms >> 16) as u8,
            (unix_ts_ms >> 8) as u8,
            unix_ts_ms as u8,
            0x70 | (rand_a >> 8) as u8,
            rand_a as u8,
            0x80 | (rand_b >> 56) as u8,
            (rand_b >> 48) as u8,
            (rand_b >> 40) as u8,
            (rand_b >> 32) as u8,
            (rand_b >> 24) as u8,
            (rand_b >> 16) as u8,
            (rand_b >> 8) as u8,
            rand_b as u8,
        ])
    }

    /// Returns the variant field value of the UUID.
    pub const fn variant(&self) -> Variant {
        match self.0[8] >> 4 {
            0x0..=0x7 => Variant::Var0,
            0x8..=0xb => Variant::Var10,
            0xc..=0xd => Variant::Var110,
            _ => Variant::VarReserved,
        }
    }

    /// Returns the version field value of the UUID or `None` if the UUID does not have the
    /// RFC variant or carries a version number outside `1..=8`.
    pub const fn version(&self) -> Option<u8> {
        match (self.variant(), self.0[6] >> 4) {
            (Variant::Var10, n @ 1..=8) => Some(n),
            _ => None,
        }
    }

    /// Returns the timestamp embedded in the UUID as 100-nanosecond ticks since 1582-10-15.
    ///
    /// The bit layout is chosen from the version nibble of byte 6: version 6 reads the sorted
    /// layout, version 7 converts the Unix millisecond field into ticks, and every other value is
    /// read with the version 1 layout. The variant field is not consulted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uuidkit::Uuid;
    ///
    /// let x: Uuid = "1ec9414c-232a-6b00-b3c8-9e6bdeced846".parse()?;
    /// let (secs, _) = x.time().unix_time();
    /// assert_eq!(secs, 1645557742);
    /// # Ok::<(), uuidkit::ParseError>(())
    /// ```
    pub fn time(&self) -> Time {
        let b = &self.0;
        let ticks = match b[6] >> 4 {
            6 => {
                let high = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as i64;
                let mid = u16::from_be_bytes([b[4], b[5]]) as i64;
                let low = u16::from_be_bytes([b[6] & 0x0f, b[7]]) as i64;
                (high << 28) | (mid << 12) | low
            }
            7 => {
                // 48-bit milliseconds cannot overflow i64 ticks
                let unix_ts_ms = u64::from_be_bytes([0, 0, b[0], b[1], b[2], b[3], b[4], b[5]]);
                unix_ts_ms as i64 * 10_000 + GREGORIAN_OFFSET
            }
            _ => {
                let low = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as i64;
                let mid = u16::from_be_bytes([b[4], b[5]]) as i64;
                let high = u16::from_be_bytes([b[6] & 0x0f, b[7]]) as i64;
                low | (mid << 32) | (high << 48)
            }
        };
        Time::from_ticks(ticks)
    }

    /// Returns the 14-bit clock sequence field.
    ///
    /// The bits are extracted regardless of the version; the value is meaningful only for
    /// versions 1, 2, and 6.
    pub const fn clock_sequence(&self) -> u16 {
        u16::from_be_bytes([self.0[8] & 0x3f, self.0[9]])
    }

    /// Returns the 48-bit node field.
    pub const fn node_id(&self) -> [u8; 6] {
        [
            self.0[10], self.0[11], self.0[12], self.0[13], self.0[14], self.0[15],
        ]
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// string type that can be dereferenced as `str` and [`Display`](fmt::Display)ed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uuidkit::Uuid;
    ///
    /// let x = "01809424-3E59-7C05-9219-566F82FFF672".parse::<Uuid>()?;
    /// let y = x.encode();
    /// assert_eq!(&*y, "01809424-3e59-7c05-9219-566f82fff672");
    /// assert_eq!(format!("{}", y), "01809424-3e59-7c05-9219-566f82fff672");
    /// # Ok::<(), uuidkit::ParseError>(())
    /// ```
    pub fn encode(&self) -> FStr<36> {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";

        let mut buffer = [0u8; 36];
        let mut pos = 0;
        for (i, e) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                buffer[pos] = b'-';
                pos += 1;
            }
            buffer[pos] = DIGITS[(e >> 4) as usize];
            buffer[pos + 1] = DIGITS[(e & 15) as usize];
            pos += 2;
        }
        debug_assert!(buffer.is_ascii());
        // SAFETY: the buffer only holds ASCII hex digits and hyphens.
        unsafe { FStr::from_inner_unchecked(buffer) }
    }

    /// Returns the RFC 4122 URN form, e.g. `urn:uuid:01234567-89ab-cdef-fedc-ba9876543210`.
    pub fn urn(&self) -> String {
        format!("urn:uuid:{}", self.encode())
    }

    /// Parses the canonical 8-4-4-4-12 hexadecimal representation only.
    ///
    /// Unlike [`str::parse`], this function rejects the brace-wrapped, `urn:uuid:` prefixed and
    /// hyphen-less forms. Upper-case digits are accepted.
    pub fn parse_canonical(src: &str) -> Result<Self, ParseError> {
        match src.len() {
            36 => decode_digits(src, 0, true),
            len => Err(ParseError::InvalidLength { len }),
        }
    }
}

impl fmt::Display for Uuid {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for Uuid {
    type Err = ParseError;

    /// Creates an object from a hexadecimal string representation.
    ///
    /// Accepts the canonical 8-4-4-4-12 form, the same wrapped in braces or prefixed by
    /// `urn:uuid:`, and 32 hexadecimal digits without hyphens, all case-insensitively.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let bytes = src.as_bytes();
        match bytes.len() {
            32 => decode_digits(src, 0, false),
            36 => decode_digits(src, 0, true),
            38 => {
                if bytes[0] != b'{' {
                    return Err(ParseError::InvalidGroup { index: 0 });
                }
                let uuid = decode_digits(src, 1, true)?;
                if bytes[37] != b'}' {
                    return Err(ParseError::InvalidGroup { index: 37 });
                }
                Ok(uuid)
            }
            45 => {
                if !bytes[..9].eq_ignore_ascii_case(b"urn:uuid:") {
                    return Err(ParseError::InvalidGroup { index: 0 });
                }
                decode_digits(src, 9, true)
            }
            len => Err(ParseError::InvalidLength { len }),
        }
    }
}

/// Decodes 32 hexadecimal digits starting at `start`, expecting hyphens between the groups if
/// `hyphenated` is true. The caller guarantees that `src` is long enough.
fn decode_digits(src: &str, start: usize, hyphenated: bool) -> Result<Uuid, ParseError> {
    let input = src.as_bytes();
    let mut dst = [0u8; 16];
    let mut pos = start;
    for (i, e) in dst.iter_mut().enumerate() {
        if hyphenated && matches!(i, 4 | 6 | 8 | 10) {
            if input[pos] != b'-' {
                return Err(ParseError::InvalidGroup { index: pos });
            }
            pos += 1;
        }
        *e = (hex_digit(src, pos)? << 4) | hex_digit(src, pos + 1)?;
        pos += 2;
    }
    Ok(Uuid(dst))
}

fn hex_digit(src: &str, index: usize) -> Result<u8, ParseError> {
    match src.as_bytes()[index] {
        c @ b'0'..=b'9' => Ok(c - b'0'),
        c @ b'a'..=b'f' => Ok(c - b'a' + 10),
        c @ b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(ParseError::InvalidChar {
            // every byte before `index` is ASCII, so `index` is a char boundary
            found: src
                .get(index..)
                .and_then(|s| s.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER),
            index,
        }),
    }
}

/// The reserved variants of UUIDs.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Variant {
    /// The NCS-compatible variant (`0xxx`), which includes the Nil UUID.
    Var0,
    /// The RFC 4122 / 9562 variant (`10xx`) produced by this crate.
    Var10,
    /// The Microsoft-compatible variant (`110x`).
    Var110,
    /// The reserved variant (`111x`), which includes the Max UUID.
    VarReserved,
}

impl From<Uuid> for [u8; 16] {
    fn from(src: Uuid) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = LengthError;

    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(src)
    }
}

impl AsRef<[u8]> for Uuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Uuid> for u128 {
    fn from(src: Uuid) -> Self {
        Self::from_be_bytes(src.0)
    }
}

impl From<u128> for Uuid {
    fn from(src: u128) -> Self {
        Self(src.to_be_bytes())
    }
}

impl From<Uuid> for String {
    fn from(src: Uuid) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for Uuid {
    type Error = ParseError;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

#[cfg(feature = "uuid")]
#[cfg_attr(docsrs, doc(cfg(feature = "uuid")))]
mod uuid_support {
    use super::Uuid;

    impl From<Uuid> for uuid::Uuid {
        fn from(src: Uuid) -> Self {
            uuid::Uuid::from_bytes(src.0)
        }
    }

    impl From<uuid::Uuid> for Uuid {
        fn from(src: uuid::Uuid) -> Self {
            Self(src.into_bytes())
        }
    }
}

/// Human-readable formats (e.g. JSON) carry the canonical string; compact formats carry the 16
/// raw bytes. Human-readable input is decoded strictly with [`Uuid::parse_canonical`], so braces,
/// `urn:uuid:` prefixes, and hyphen-less strings are rejected there.
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Uuid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Uuid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Uuid {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Uuid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a UUID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Uuid::parse_canonical(value).map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            Uuid::from_slice(value).map_err(de::Error::custom)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::Uuid;
        use serde_test::{assert_de_tokens_error, assert_tokens, Configure, Token};

        const BYTES: [u8; 16] = [
            0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0xfe, 0xdc, 0xba, 0x98, 0x76, 0x54,
            0x32, 0x10,
        ];

        /// Serializes and deserializes prepared cases correctly
        #[test]
        fn serializes_and_deserializes_prepared_cases_correctly() {
            let cases = [
                ("00000000-0000-0000-0000-000000000000", &[0u8; 16]),
                ("01234567-89ab-cdef-fedc-ba9876543210", &BYTES),
                (
                    "0180ae59-078c-7b80-b113-2fe14a615fb3",
                    &[
                        1, 128, 174, 89, 7, 140, 123, 128, 177, 19, 47, 225, 74, 97, 95, 179,
                    ],
                ),
                (
                    "1ec9414c-232a-6b00-b3c8-9e6bdeced846",
                    &[
                        30, 201, 65, 76, 35, 42, 107, 0, 179, 200, 158, 107, 222, 206, 216, 70,
                    ],
                ),
            ];

            for (text, bytes) in cases {
                let e = text.parse::<Uuid>().unwrap();
                assert_tokens(&e.readable(), &[Token::String(text)]);
                assert_tokens(&e.compact(), &[Token::Bytes(bytes)]);
            }
        }

        /// Encodes to and decodes from quoted JSON string
        #[test]
        fn encodes_to_and_decodes_from_quoted_json_string() {
            let e = Uuid::from(BYTES);
            let json = serde_json::to_string(&e).unwrap();
            assert_eq!(json, r#""01234567-89ab-cdef-fedc-ba9876543210""#);
            assert_eq!(serde_json::from_str::<Uuid>(&json).unwrap(), e);
        }

        /// Rejects non-canonical string forms in human-readable formats
        #[test]
        fn rejects_non_canonical_string_forms_in_human_readable_formats() {
            let cases = [
                r#""{01234567-89ab-cdef-fedc-ba9876543210}""#,
                r#""urn:uuid:01234567-89ab-cdef-fedc-ba9876543210""#,
                r#""0123456789abcdeffedcba9876543210""#,
                r#""invalid-uuid-format""#,
            ];
            for e in cases {
                assert!(serde_json::from_str::<Uuid>(e).is_err(), "{e}");
            }
        }

        /// Rejects byte sequences not exactly 16 bytes long
        #[test]
        fn rejects_byte_sequences_not_exactly_16_bytes_long() {
            assert_de_tokens_error::<serde_test::Compact<Uuid>>(
                &[Token::Bytes(&[1, 2, 3])],
                "invalid UUID byte length: expected 16, found 3",
            );
        }
    }
}
