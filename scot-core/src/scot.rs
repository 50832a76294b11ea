//! `scot` chunk: the automation system's fixed-layout metadata record
//!
//! The payload is always 424 bytes, little-endian, with every field at an
//! implicit offset given by the widths of the fields before it. Decoding is
//! a single sequential pass; encoding writes the same fields in the same
//! order. Two regions never round-trip: the 5-byte reserved/size field and
//! the 33-byte trailer are written as zeros.

use std::io::{Cursor, Seek, SeekFrom};

use binrw::BinReaderExt;
use chrono::{Datelike, NaiveDate};

use crate::error::{Error, FieldError, Result};
use crate::field::{
    decode_char, decode_fixed, decode_hour, encode_char, encode_fixed, PackedDate, TRIM_NULL,
    TRIM_SPACE_NULL,
};
use crate::flags::{ExtendedFlags, PrimaryFlags};
use crate::metadata::{AudioMetadata, CueTime, Dayparting, Decoded, Link, Trigger};
use crate::riff::SCOT_TAG;

/// Payload length of a scot chunk
pub const RECORD_LEN: usize = 424;

const TITLE_LEN: usize = 43;
const CART_LEN: usize = 4;
const RAW_LENGTH_LEN: usize = 5;
const CATEGORY_LEN: usize = 3;
const NAME_LEN: usize = 34;
const INTRO_LEN: usize = 2;
const YEAR_LEN: usize = 4;
const UNUSED_LEN: usize = 108;
const RESERVED_LEN: usize = 5;
const TRAILER_LEN: usize = 33;

/// Release year used when the stored year is not a number
pub const FALLBACK_YEAR: i32 = 1900;

type Reader<'a> = Cursor<&'a [u8]>;

fn skip(r: &mut Reader<'_>, n: i64) -> Result<()> {
    r.seek(SeekFrom::Current(n))?;
    Ok(())
}

fn text(r: &mut Reader<'_>, width: usize, trim: &[char]) -> Result<String> {
    let start = r.position() as usize;
    let bytes = r
        .get_ref()
        .get(start..start + width)
        .ok_or(Error::Truncated {
            chunk: "scot",
            expected: RECORD_LEN,
            actual: r.get_ref().len(),
        })?;
    let value = decode_fixed(bytes, trim);
    skip(r, width as i64)?;
    Ok(value)
}

fn cue_time(r: &mut Reader<'_>) -> Result<CueTime> {
    let seconds: u16 = r.read_le()?;
    let hundredths: u16 = r.read_le()?;
    Ok(CueTime { seconds, hundredths })
}

fn link(r: &mut Reader<'_>) -> Result<Link> {
    let category = text(r, CATEGORY_LEN, TRIM_SPACE_NULL)?;
    let cart = text(r, CART_LEN, TRIM_SPACE_NULL)?;
    skip(r, 1)?;
    Ok(Link { category, cart })
}

/// Stored length text, normalized to five characters left-padded with `'0'`
fn normalize_raw_length(raw: &str) -> String {
    format!("{:0>width$}", raw.trim_start_matches(' '), width = RAW_LENGTH_LEN)
}

fn decode_year(raw: &str) -> std::result::Result<NaiveDate, FieldError> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::new("release_year", format!("not a year: {:?}", raw)));
    }
    digits
        .parse::<i32>()
        .ok()
        .filter(|&year| year > 0)
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
        .ok_or_else(|| FieldError::new("release_year", format!("not a year: {:?}", raw)))
}

fn fallback_year() -> NaiveDate {
    NaiveDate::from_ymd_opt(FALLBACK_YEAR, 1, 1).unwrap_or_default()
}

fn resolve<T>(
    outcome: std::result::Result<T, FieldError>,
    fallback: T,
    recovered: &mut Vec<FieldError>,
) -> T {
    outcome.unwrap_or_else(|e| {
        recovered.push(e);
        fallback
    })
}

/// Decode a scot payload
///
/// Bytes past [`RECORD_LEN`] are ignored. Fields that cannot be interpreted
/// (dates, release year) fall back to their documented defaults and are
/// listed in [`Decoded::recovered`].
pub fn decode(payload: &[u8]) -> Result<Decoded> {
    if payload.len() < RECORD_LEN {
        return Err(Error::Truncated {
            chunk: "scot",
            expected: RECORD_LEN,
            actual: payload.len(),
        });
    }

    let mut r = Cursor::new(&payload[..RECORD_LEN]);
    let mut recovered = Vec::new();

    skip(&mut r, 1)?; // scratch
    let primary_flags = PrimaryFlags::from_byte(r.read_le()?);
    let artist_number: i16 = r.read_le()?;
    let title = text(&mut r, TITLE_LEN, TRIM_SPACE_NULL)?;
    let cart_number = text(&mut r, CART_LEN, TRIM_NULL)?;
    skip(&mut r, 1)?;
    let raw_length = normalize_raw_length(&text(&mut r, RAW_LENGTH_LEN, TRIM_SPACE_NULL)?);

    let start_time = cue_time(&mut r)?;
    let end_time = cue_time(&mut r)?;

    let start_text: [u8; 6] = r.read_le()?;
    let end_text: [u8; 6] = r.read_le()?;
    let start_hour: u8 = r.read_le()?;
    let end_hour: u8 = r.read_le()?;
    let start_date = resolve(
        PackedDate::decode("start_date", &start_text, start_hour),
        PackedDate::EpochStart,
        &mut recovered,
    );
    let end_date = resolve(
        PackedDate::decode("end_date", &end_text, end_hour),
        PackedDate::FarFuture,
        &mut recovered,
    );

    let audio_type = decode_char(r.read_le()?);
    let sample_rate = r.read_le::<i16>()? as i32 * 100;
    let stereo_mono = decode_char(r.read_le()?);
    let compression_type: u8 = r.read_le()?;
    let eom_start_tenths: i32 = r.read_le()?;
    let eom_length_hundredths: i16 = r.read_le()?;
    let extended_flags = ExtendedFlags::from_bytes(r.read_le()?);
    let hook_start_ms: i32 = r.read_le()?;
    let hook_eom_ms: i32 = r.read_le()?;
    let hook_end_ms: i32 = r.read_le()?;
    let font_color: [u8; 4] = r.read_le()?;
    let background_color: [u8; 4] = r.read_le()?;
    let segment_eom_ms: i32 = r.read_le()?;
    let vt_start = cue_time(&mut r)?;

    let before_link = link(&mut r)?;
    let after_link = link(&mut r)?;
    let dayparting = Dayparting(r.read_le()?);
    skip(&mut r, UNUSED_LEN as i64)?;

    let artist = text(&mut r, NAME_LEN, TRIM_SPACE_NULL)?;
    let album = text(&mut r, NAME_LEN, TRIM_SPACE_NULL)?;
    let intro_seconds = text(&mut r, INTRO_LEN, TRIM_NULL)?;
    let end_type = decode_char(r.read_le()?);
    let year = text(&mut r, YEAR_LEN, TRIM_SPACE_NULL)?;
    let release_date = resolve(decode_year(&year), fallback_year(), &mut recovered);
    skip(&mut r, 1)?;

    let import_hour: u8 = r.read_le()?;
    let import_text: [u8; 6] = r.read_le()?;
    let import_date = resolve(
        PackedDate::decode("import_date", &import_text, import_hour),
        PackedDate::EpochStart,
        &mut recovered,
    );

    let mpeg_bitrate: i16 = r.read_le()?;
    let playback_speed: u16 = r.read_le()?;
    let playback_level: u16 = r.read_le()?;
    skip(&mut r, RESERVED_LEN as i64)?;
    let new_playback_level: u16 = r.read_le()?;
    let chop_size: u32 = r.read_le()?;
    let vt_eom_override: u32 = r.read_le()?;
    let desired_length: u32 = r.read_le()?;
    let triggers = [
        Trigger(r.read_le()?),
        Trigger(r.read_le()?),
        Trigger(r.read_le()?),
        Trigger(r.read_le()?),
    ];
    // trailer: remaining TRAILER_LEN bytes

    let metadata = AudioMetadata {
        primary_flags,
        artist_number,
        title,
        cart_number,
        raw_length,
        start_time,
        end_time,
        start_date,
        end_date,
        audio_type,
        sample_rate,
        stereo_mono,
        compression_type,
        eom_start_tenths,
        eom_length_hundredths,
        extended_flags,
        hook_start_ms,
        hook_eom_ms,
        hook_end_ms,
        font_color,
        background_color,
        segment_eom_ms,
        vt_start,
        before_link,
        after_link,
        dayparting,
        artist,
        album,
        intro_seconds,
        end_type,
        release_date,
        import_date,
        mpeg_bitrate,
        playback_speed,
        playback_level,
        new_playback_level,
        chop_size,
        vt_eom_override,
        desired_length,
        triggers,
    };

    Ok(Decoded { metadata, recovered })
}

/// Encode the 424-byte scot payload
///
/// Never fails: values wider than their field are truncated.
pub fn encode(m: &AudioMetadata) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(RECORD_LEN);

    buffer.push(0); // scratch
    buffer.push(m.primary_flags.byte());
    buffer.extend_from_slice(&m.artist_number.to_le_bytes());
    buffer.extend_from_slice(&encode_fixed(&m.title, TITLE_LEN, b' '));
    buffer.extend_from_slice(&encode_fixed(&m.cart_number, CART_LEN, 0));
    buffer.push(b' ');
    buffer.extend_from_slice(&encode_fixed(&m.raw_length, RAW_LENGTH_LEN, b' '));

    for time in [&m.start_time, &m.end_time] {
        buffer.extend_from_slice(&time.seconds.to_le_bytes());
        buffer.extend_from_slice(&time.hundredths.to_le_bytes());
    }

    let (start_text, start_hour) = m.start_date.encode();
    let (end_text, end_hour) = m.end_date.encode();
    buffer.extend_from_slice(&start_text);
    buffer.extend_from_slice(&end_text);
    buffer.push(start_hour);
    buffer.push(end_hour);

    buffer.push(encode_char(m.audio_type));
    buffer.extend_from_slice(&((m.sample_rate / 100) as i16).to_le_bytes());
    buffer.push(encode_char(m.stereo_mono));
    buffer.push(m.compression_type);
    buffer.extend_from_slice(&m.eom_start_tenths.to_le_bytes());
    buffer.extend_from_slice(&m.eom_length_hundredths.to_le_bytes());
    buffer.extend_from_slice(m.extended_flags.as_bytes());
    buffer.extend_from_slice(&m.hook_start_ms.to_le_bytes());
    buffer.extend_from_slice(&m.hook_eom_ms.to_le_bytes());
    buffer.extend_from_slice(&m.hook_end_ms.to_le_bytes());
    buffer.extend_from_slice(&m.font_color);
    buffer.extend_from_slice(&m.background_color);
    buffer.extend_from_slice(&m.segment_eom_ms.to_le_bytes());
    buffer.extend_from_slice(&m.vt_start.seconds.to_le_bytes());
    buffer.extend_from_slice(&m.vt_start.hundredths.to_le_bytes());

    for link in [&m.before_link, &m.after_link] {
        buffer.extend_from_slice(&encode_fixed(&link.category, CATEGORY_LEN, b' '));
        buffer.extend_from_slice(&encode_fixed(&link.cart, CART_LEN, b' '));
        buffer.push(b' ');
    }

    buffer.extend_from_slice(&m.dayparting.0);
    buffer.resize(buffer.len() + UNUSED_LEN, 0);

    buffer.extend_from_slice(&encode_fixed(&m.artist, NAME_LEN, b' '));
    buffer.extend_from_slice(&encode_fixed(&m.album, NAME_LEN, b' '));
    buffer.extend_from_slice(&encode_fixed(&m.intro_seconds, INTRO_LEN, b'0'));
    buffer.push(encode_char(m.end_type));
    let year = format!("{:04}", m.release_date.year());
    buffer.extend_from_slice(&encode_fixed(&year, YEAR_LEN, b'0'));
    buffer.push(0);

    let (import_text, import_hour) = m.import_date.encode();
    buffer.push(import_hour);
    buffer.extend_from_slice(&import_text);

    buffer.extend_from_slice(&m.mpeg_bitrate.to_le_bytes());
    buffer.extend_from_slice(&m.playback_speed.to_le_bytes());
    buffer.extend_from_slice(&m.playback_level.to_le_bytes());
    // TODO: compute the reserved size field; zeros until its layout is known
    buffer.resize(buffer.len() + RESERVED_LEN, 0);
    buffer.extend_from_slice(&m.new_playback_level.to_le_bytes());
    buffer.extend_from_slice(&m.chop_size.to_le_bytes());
    buffer.extend_from_slice(&m.vt_eom_override.to_le_bytes());
    buffer.extend_from_slice(&m.desired_length.to_le_bytes());
    for trigger in &m.triggers {
        buffer.extend_from_slice(&trigger.0.to_le_bytes());
    }
    buffer.resize(buffer.len() + TRAILER_LEN, 0);

    debug_assert_eq!(buffer.len(), RECORD_LEN);
    buffer
}

/// Encode a complete chunk: `scot` tag, length, payload
pub fn encode_chunk(m: &AudioMetadata) -> Vec<u8> {
    let mut chunk = Vec::with_capacity(8 + RECORD_LEN);
    chunk.extend_from_slice(SCOT_TAG.as_bytes());
    chunk.extend_from_slice(&(RECORD_LEN as u32).to_le_bytes());
    chunk.extend_from_slice(&encode(m));
    chunk
}
