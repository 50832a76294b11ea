//! `LIST`/`INFO` chunk: the tag-list fallback when no scot record exists
//!
//! Payload layout:
//! - 4-byte list type, only `INFO` is understood
//! - entries of tag, little-endian u32 length, text, pad byte if odd
//!
//! Four tags are mapped: `IPRD` album, `IART` artist, `INAM` title and
//! `ICRD` creation date. Other tags are skipped.

use std::io::{Cursor, Seek, SeekFrom};

use binrw::BinRead;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::FieldError;
use crate::field::{decode_fixed, min_date, TRIM_NULL};
use crate::metadata::{AudioMetadata, Decoded};
use crate::riff::{ChunkHeader, FourCC, CHUNK_HEADER_LEN, LIST_TAG};

pub const INFO_TAG: FourCC = FourCC(*b"INFO");
pub const IPRD_TAG: FourCC = FourCC(*b"IPRD");
pub const IART_TAG: FourCC = FourCC(*b"IART");
pub const INAM_TAG: FourCC = FourCC(*b"INAM");
pub const ICRD_TAG: FourCC = FourCC(*b"ICRD");

const ICRD_FORMAT: &str = "%Y-%m-%d";

/// Creation-date layouts tried first, in order
enum DateLayout {
    Date(&'static str),
    DateTime(&'static str),
    YearOnly,
}

const EXACT_LAYOUTS: &[DateLayout] = &[
    DateLayout::Date("%Y-%m-%d"),
    DateLayout::YearOnly,
    DateLayout::Date("%Y/%m/%d"),
    DateLayout::Date("%m/%d/%Y"),
    DateLayout::Date("%d/%m/%Y"),
    DateLayout::DateTime("%Y-%m-%d %H:%M:%S"),
];

/// Looser layouts seen in hand-tagged files
const LOOSE_LAYOUTS: &[DateLayout] = &[
    DateLayout::DateTime("%Y-%m-%dT%H:%M:%S"),
    DateLayout::DateTime("%m/%d/%Y %H:%M:%S"),
    DateLayout::Date("%B %d, %Y"),
    DateLayout::Date("%b %d, %Y"),
    DateLayout::Date("%d %B %Y"),
    DateLayout::Date("%d %b %Y"),
    DateLayout::Date("%Y.%m.%d"),
    DateLayout::Date("%Y%m%d"),
];

impl DateLayout {
    fn parse(&self, text: &str) -> Option<NaiveDate> {
        match self {
            DateLayout::Date(fmt) => NaiveDate::parse_from_str(text, fmt).ok(),
            DateLayout::DateTime(fmt) => NaiveDateTime::parse_from_str(text, fmt)
                .ok()
                .map(|dt| dt.date()),
            DateLayout::YearOnly => {
                if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                text.parse().ok().and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            }
        }
    }
}

/// Parse a free-form creation date
///
/// Exact layouts first, then RFC 3339 / RFC 2822 and the loose layouts.
pub fn parse_date(raw: &str) -> Result<NaiveDate, FieldError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(FieldError::new("creation_date", "empty"));
    }

    if let Some(date) = EXACT_LAYOUTS.iter().find_map(|layout| layout.parse(text)) {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| LOOSE_LAYOUTS.iter().find_map(|layout| layout.parse(text)))
        .ok_or_else(|| FieldError::new("creation_date", format!("unrecognized date {:?}", text)))
}

/// Decode a `LIST` payload
///
/// A list type other than `INFO` yields default metadata. An entry that
/// claims more bytes than remain ends the walk; everything read before it
/// is kept.
pub fn decode(payload: &[u8]) -> Decoded {
    if payload.len() < 4 || payload[0..4] != INFO_TAG.0 {
        return Decoded::clean(AudioMetadata::default());
    }

    let end = payload.len() as u64;
    let mut cursor = Cursor::new(payload);
    cursor.set_position(4);

    let mut recovered = Vec::new();
    let mut album = None;
    let mut artist = None;
    let mut title = None;
    let mut release_date = None;

    while cursor.position() < end {
        if end - cursor.position() < CHUNK_HEADER_LEN {
            recovered.push(FieldError::new("info", "truncated entry header"));
            break;
        }
        let entry = match ChunkHeader::read(&mut cursor) {
            Ok(entry) => entry,
            Err(e) => {
                recovered.push(FieldError::new("info", e.to_string()));
                break;
            }
        };

        let start = cursor.position() as usize;
        let Some(bytes) = payload.get(start..start + entry.length as usize) else {
            recovered.push(FieldError::new(
                "info",
                format!("{} entry overruns the chunk", entry.tag),
            ));
            break;
        };
        let text = decode_fixed(bytes, TRIM_NULL);

        let mut next = start as u64 + entry.length as u64;
        if entry.length % 2 != 0 && next < end {
            next += 1;
        }
        if cursor.seek(SeekFrom::Start(next)).is_err() {
            break;
        }

        match entry.tag {
            IPRD_TAG => album = Some(text),
            IART_TAG => artist = Some(text),
            INAM_TAG => title = Some(text),
            ICRD_TAG => {
                release_date = Some(parse_date(&text).unwrap_or_else(|e| {
                    recovered.push(e);
                    min_date()
                }))
            }
            _ => {}
        }
    }

    let defaults = AudioMetadata::default();
    let metadata = AudioMetadata {
        album: album.unwrap_or(defaults.album.clone()),
        artist: artist.unwrap_or(defaults.artist.clone()),
        title: title.unwrap_or(defaults.title.clone()),
        release_date: release_date.unwrap_or(defaults.release_date),
        ..defaults
    };

    Decoded { metadata, recovered }
}

fn write_entry(buffer: &mut Vec<u8>, tag: FourCC, text: &str) {
    if text.is_empty() {
        return;
    }

    // INFO strings are null-terminated
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);

    buffer.extend_from_slice(tag.as_bytes());
    buffer.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buffer.extend_from_slice(&bytes);
    if bytes.len() % 2 != 0 {
        buffer.push(0);
    }
}

/// Encode a complete `LIST` chunk with the four mapped entries
///
/// Empty strings and the minimum-date placeholder are left out.
pub fn encode_chunk(m: &AudioMetadata) -> Vec<u8> {
    let mut body = Vec::with_capacity(256);
    body.extend_from_slice(INFO_TAG.as_bytes());

    write_entry(&mut body, IPRD_TAG, &m.album);
    write_entry(&mut body, IART_TAG, &m.artist);
    write_entry(&mut body, INAM_TAG, &m.title);
    if m.release_date != min_date() {
        write_entry(
            &mut body,
            ICRD_TAG,
            &m.release_date.format(ICRD_FORMAT).to_string(),
        );
    }

    let mut chunk = Vec::with_capacity(8 + body.len());
    chunk.extend_from_slice(LIST_TAG.as_bytes());
    chunk.extend_from_slice(&(body.len() as u32).to_le_bytes());
    chunk.extend_from_slice(&body);
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: &[u8; 4], text: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(tag);
        bytes.extend_from_slice(&(text.len() as u32).to_le_bytes());
        bytes.extend_from_slice(text);
        if text.len() % 2 != 0 {
            bytes.push(0);
        }
        bytes
    }

    #[test]
    fn test_artist_only() {
        let mut payload = b"INFO".to_vec();
        payload.extend(entry(b"IART", b"Test Artist\0"));
        assert_eq!(payload.len(), 4 + 8 + 12);

        let decoded = decode(&payload);
        assert!(decoded.recovered.is_empty());
        assert_eq!(decoded.metadata.artist, "Test Artist");
        assert_eq!(decoded.metadata.album, "");
        assert_eq!(decoded.metadata.title, "");
        assert_eq!(decoded.metadata.cart_number, "????");
    }

    #[test]
    fn test_odd_entries_and_unknown_tags() {
        let mut payload = b"INFO".to_vec();
        payload.extend(entry(b"INAM", b"Song\0")); // 5 bytes + pad
        payload.extend(entry(b"ISFT", b"Lavf58.76.100\0"));
        payload.extend(entry(b"IPRD", b"Album\0"));
        payload.extend(entry(b"ICRD", b"2019\0"));

        let meta = decode(&payload).metadata;
        assert_eq!(meta.title, "Song");
        assert_eq!(meta.album, "Album");
        assert_eq!(meta.release_date, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
    }

    #[test]
    fn test_last_odd_entry_without_pad() {
        let mut payload = b"INFO".to_vec();
        payload.extend(entry(b"INAM", b"Song\0"));
        payload.pop();
        assert_eq!(decode(&payload).metadata.title, "Song");
    }

    #[test]
    fn test_non_info_list_ignored() {
        let mut payload = b"adtl".to_vec();
        payload.extend(entry(b"IART", b"Nobody\0"));
        let decoded = decode(&payload);
        assert_eq!(decoded.metadata, AudioMetadata::default());
        assert!(decoded.recovered.is_empty());
    }

    #[test]
    fn test_overrunning_entry_keeps_earlier_fields() {
        let mut payload = b"INFO".to_vec();
        payload.extend(entry(b"IART", b"Kept\0"));
        payload.extend_from_slice(b"INAM");
        payload.extend_from_slice(&100u32.to_le_bytes());
        payload.extend_from_slice(b"short");

        let decoded = decode(&payload);
        assert_eq!(decoded.metadata.artist, "Kept");
        assert_eq!(decoded.metadata.title, "");
        assert_eq!(decoded.recovered.len(), 1);
    }

    #[test]
    fn test_bad_creation_date() {
        let mut payload = b"INFO".to_vec();
        payload.extend(entry(b"ICRD", b"sometime\0"));
        let decoded = decode(&payload);
        assert_eq!(decoded.metadata.release_date, min_date());
        assert_eq!(decoded.recovered[0].field, "creation_date");
    }

    #[test]
    fn test_parse_date_layouts() {
        let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(parse_date("2024-02-09").unwrap(), ymd(2024, 2, 9));
        assert_eq!(parse_date("1987").unwrap(), ymd(1987, 1, 1));
        assert_eq!(parse_date("2024/02/09").unwrap(), ymd(2024, 2, 9));
        assert_eq!(parse_date("02/09/2024").unwrap(), ymd(2024, 2, 9));
        assert_eq!(parse_date("25/12/2020").unwrap(), ymd(2020, 12, 25));
        assert_eq!(parse_date("2024-02-09 10:30:00").unwrap(), ymd(2024, 2, 9));
        assert_eq!(parse_date("Feb 9, 2026").unwrap(), ymd(2026, 2, 9));
        assert_eq!(parse_date("2021-06-01T08:00:00Z").unwrap(), ymd(2021, 6, 1));
        assert!(parse_date("").is_err());
        assert!(parse_date("not a date").is_err());
    }

    #[test]
    fn test_encode_layout() {
        let meta = AudioMetadata {
            artist: "Test Artist".to_string(),
            title: "Odd".to_string(),
            ..Default::default()
        };
        let chunk = encode_chunk(&meta);

        assert_eq!(&chunk[0..4], b"LIST");
        let size = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]) as usize;
        assert_eq!(size, chunk.len() - 8);
        assert_eq!(&chunk[8..12], b"INFO");

        // Empty album and placeholder date are not written
        assert_eq!(&chunk[12..16], b"IART");
        assert_eq!(&chunk[16..20], &12u32.to_le_bytes());
        assert_eq!(&chunk[20..32], b"Test Artist\0");
        assert_eq!(&chunk[32..36], b"INAM");
        assert_eq!(&chunk[36..40], &4u32.to_le_bytes());
        assert_eq!(&chunk[40..44], b"Odd\0");
        assert_eq!(chunk.len(), 44);
    }

    #[test]
    fn test_encode_pads_odd_entries() {
        let meta = AudioMetadata {
            album: "Four".to_string(), // 5 bytes with terminator
            ..Default::default()
        };
        let chunk = encode_chunk(&meta);
        assert_eq!(chunk.len(), 8 + 4 + 8 + 6);
        assert_eq!(chunk[chunk.len() - 1], 0);
    }

    #[test]
    fn test_roundtrip() {
        let meta = AudioMetadata {
            album: "Late Shift".to_string(),
            artist: "The Night Owls".to_string(),
            title: "Midnight Drive".to_string(),
            release_date: NaiveDate::from_ymd_opt(1998, 5, 17).unwrap(),
            ..Default::default()
        };
        let chunk = encode_chunk(&meta);
        let decoded = decode(&chunk[8..]);
        assert!(decoded.recovered.is_empty());
        assert_eq!(decoded.metadata, meta);
    }
}
