//! Field codec primitives shared by the scot and INFO codecs
//!
//! - Fixed-width strings: UTF-8, truncated on a character boundary, padded
//!   with a per-field pad byte
//! - Packed dates: six `MMddyy` characters plus an hour byte stored as
//!   `hour + 0x80`, with `000000` / `999999` sentinels
//! - Bit groups: bit 0 is the least significant bit of the first byte

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Offset added to every stored hour byte
pub const HOUR_OFFSET: u8 = 0x80;

/// Text of the open-start sentinel date
pub const EPOCH_START_TEXT: &[u8; 6] = b"000000";

/// Text of the open-end sentinel date
pub const FAR_FUTURE_TEXT: &[u8; 6] = b"999999";

const PACKED_DATE_FORMAT: &str = "%m%d%y";

/// Trim set for space-padded text fields
pub const TRIM_SPACE_NULL: &[char] = &[' ', '\0'];

/// Trim set for null-padded text fields
pub const TRIM_NULL: &[char] = &['\0'];

/// Encode `value` into exactly `width` bytes
///
/// Copies as many whole UTF-8 characters as fit and fills the rest with
/// `pad`. A character that would straddle the limit is dropped entirely.
pub fn encode_fixed(value: &str, width: usize, pad: u8) -> Vec<u8> {
    let mut cut = value.len().min(width);
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }

    let mut result = Vec::with_capacity(width);
    result.extend_from_slice(&value.as_bytes()[..cut]);
    result.resize(width, pad);
    result
}

/// Decode a fixed-width field, stripping trailing `trim` characters only
pub fn decode_fixed(bytes: &[u8], trim: &[char]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(trim)
        .to_string()
}

/// Single-byte character fields are stored as raw bytes, one char per
/// byte value (Latin-1); chars above U+00FF encode as `?`
pub fn encode_char(c: char) -> u8 {
    u8::try_from(u32::from(c)).unwrap_or(b'?')
}

pub fn decode_char(b: u8) -> char {
    b as char
}

/// Stored hour byte to hour, clamping corrupt values below the offset to 0
pub fn decode_hour(b: u8) -> u8 {
    b.saturating_sub(HOUR_OFFSET)
}

pub fn encode_hour(hour: u8) -> u8 {
    hour.wrapping_add(HOUR_OFFSET)
}

/// Date plus hour packed as `MMddyy` text and an offset hour byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackedDate {
    /// `000000`: valid since the beginning of time
    EpochStart,
    /// `999999`: never expires
    FarFuture,
    At(NaiveDateTime),
}

impl PackedDate {
    /// Six date characters and the hour byte
    pub fn encode(&self) -> ([u8; 6], u8) {
        match self {
            PackedDate::EpochStart => (*EPOCH_START_TEXT, HOUR_OFFSET),
            PackedDate::FarFuture => (*FAR_FUTURE_TEXT, HOUR_OFFSET),
            PackedDate::At(instant) => {
                let text = instant.format(PACKED_DATE_FORMAT).to_string();
                let mut date = [b'0'; 6];
                date.copy_from_slice(&encode_fixed(&text, 6, b'0'));
                (date, encode_hour(instant.hour() as u8))
            }
        }
    }

    /// Interpret stored date text and hour byte
    ///
    /// Sentinel text ignores the hour byte. Anything that is neither a
    /// sentinel nor a valid `MMddyy` date is a [`FieldError`]; the caller
    /// picks the fallback appropriate for the field.
    pub fn decode(
        field: &'static str,
        text: &[u8],
        hour_byte: u8,
    ) -> Result<PackedDate, FieldError> {
        let text = decode_fixed(text, TRIM_SPACE_NULL);
        match text.as_bytes() {
            t if t == EPOCH_START_TEXT => Ok(PackedDate::EpochStart),
            t if t == FAR_FUTURE_TEXT => Ok(PackedDate::FarFuture),
            _ => {
                let date = NaiveDate::parse_from_str(&text, PACKED_DATE_FORMAT)
                    .map_err(|e| FieldError::new(field, format!("bad date {:?}: {}", text, e)))?;
                let hours = Duration::hours(decode_hour(hour_byte) as i64);
                Ok(PackedDate::At(date.and_time(NaiveTime::MIN) + hours))
            }
        }
    }

    /// Absolute instant, with sentinels mapped to the Unix epoch and the
    /// latest representable instant
    pub fn instant(&self) -> NaiveDateTime {
        match self {
            // NaiveDateTime's default is 1970-01-01T00:00:00
            PackedDate::EpochStart => NaiveDateTime::default(),
            PackedDate::FarFuture => NaiveDateTime::MAX,
            PackedDate::At(instant) => *instant,
        }
    }
}

/// Earliest date the metadata carries: 0001-01-01
pub fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Read bit `index` of a little-endian bit group
pub fn get_bit(bytes: &[u8], index: usize) -> bool {
    bytes
        .get(index / 8)
        .map_or(false, |b| (b >> (index % 8)) & 1 == 1)
}

/// Write bit `index` of a little-endian bit group; out-of-range is a no-op
pub fn set_bit(bytes: &mut [u8], index: usize, on: bool) {
    if let Some(b) = bytes.get_mut(index / 8) {
        let mask = 1u8 << (index % 8);
        if on {
            *b |= mask;
        } else {
            *b &= !mask;
        }
    }
}
