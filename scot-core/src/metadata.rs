//! In-memory metadata shared by the scot and INFO codecs
//!
//! Either decoder produces an [`AudioMetadata`]; either encoder consumes one.
//! Values that the record only implies (total length, absolute start/end
//! instants) are computed on demand and never stored.

use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::field::{min_date, PackedDate};
use crate::flags::{ExtendedFlag, ExtendedFlags, PrimaryFlag, PrimaryFlags};

/// Everything the automation system knows about one audio file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub primary_flags: PrimaryFlags,
    pub artist_number: i16,
    pub title: String,
    /// Four-character cart code
    pub cart_number: String,
    /// Five characters, `HMMSS` or `MM:SS` depending on [`PrimaryFlag::LengthHmmss`]
    pub raw_length: String,
    pub start_time: CueTime,
    pub end_time: CueTime,
    pub start_date: PackedDate,
    pub end_date: PackedDate,
    /// `'A'` analog or `'D'` digital
    pub audio_type: char,
    /// Hz; stored divided by 100
    pub sample_rate: i32,
    /// `'S'` stereo or `'M'` mono
    pub stereo_mono: char,
    pub compression_type: u8,
    pub eom_start_tenths: i32,
    pub eom_length_hundredths: i16,
    pub extended_flags: ExtendedFlags,
    pub hook_start_ms: i32,
    pub hook_eom_ms: i32,
    pub hook_end_ms: i32,
    pub font_color: [u8; 4],
    pub background_color: [u8; 4],
    pub segment_eom_ms: i32,
    pub vt_start: CueTime,
    pub before_link: Link,
    pub after_link: Link,
    pub dayparting: Dayparting,
    pub artist: String,
    pub album: String,
    /// Two characters
    pub intro_seconds: String,
    pub end_type: char,
    /// The scot record only keeps the year
    pub release_date: NaiveDate,
    pub import_date: PackedDate,
    pub mpeg_bitrate: i16,
    pub playback_speed: u16,
    pub playback_level: u16,
    pub new_playback_level: u16,
    pub chop_size: u32,
    pub vt_eom_override: u32,
    pub desired_length: u32,
    pub triggers: [Trigger; 4],
}

impl Default for AudioMetadata {
    fn default() -> Self {
        Self {
            primary_flags: PrimaryFlags::empty()
                .with(PrimaryFlag::ExtendedFlagsEnabled)
                .with(PrimaryFlag::LengthHmmss)
                .with(PrimaryFlag::LengthUntilEom),
            artist_number: 0,
            title: String::new(),
            cart_number: "????".to_string(),
            raw_length: "00000".to_string(),
            start_time: CueTime::default(),
            end_time: CueTime::default(),
            start_date: PackedDate::EpochStart,
            end_date: PackedDate::FarFuture,
            audio_type: 'D',
            sample_rate: 44100,
            stereo_mono: 'S',
            compression_type: 10,
            eom_start_tenths: 0,
            eom_length_hundredths: 0,
            extended_flags: ExtendedFlags::empty().with(ExtendedFlag::DaypartingEnabled),
            hook_start_ms: 0,
            hook_eom_ms: 0,
            hook_end_ms: 0,
            font_color: [0; 4],
            background_color: [0; 4],
            segment_eom_ms: 0,
            vt_start: CueTime::default(),
            before_link: Link::default(),
            after_link: Link::default(),
            dayparting: Dayparting::all(),
            artist: String::new(),
            album: String::new(),
            intro_seconds: "00".to_string(),
            end_type: ' ',
            release_date: min_date(),
            import_date: PackedDate::EpochStart,
            mpeg_bitrate: 0,
            playback_speed: 0,
            playback_level: 0,
            new_playback_level: 0,
            chop_size: 0,
            vt_eom_override: 0,
            desired_length: 0,
            triggers: [Trigger::default(); 4],
        }
    }
}

impl AudioMetadata {
    /// Extended flags only count when the primary byte enables them
    pub fn extended_flag(&self, flag: ExtendedFlag) -> bool {
        self.primary_flags.contains(PrimaryFlag::ExtendedFlagsEnabled)
            && self.extended_flags.contains(flag)
    }

    /// Total length described by `raw_length`
    pub fn length(&self) -> Result<Duration, FieldError> {
        let raw = self.raw_length.as_str();
        let part = |from: usize, to: usize| -> Result<i64, FieldError> {
            raw.get(from..to)
                .and_then(|s| s.parse::<u32>().ok())
                .map(i64::from)
                .ok_or_else(|| FieldError::new("raw_length", format!("bad length {:?}", raw)))
        };

        if self.primary_flags.contains(PrimaryFlag::LengthHmmss) {
            let (h, m, s) = (part(0, 1)?, part(1, 3)?, part(3, 5)?);
            Ok(Duration::hours(h) + Duration::minutes(m) + Duration::seconds(s))
        } else {
            // MM:SS, byte 2 is the separator
            let (m, s) = (part(0, 2)?, part(3, 5)?);
            Ok(Duration::minutes(m) + Duration::seconds(s))
        }
    }

    pub fn start_instant(&self) -> NaiveDateTime {
        self.start_date.instant()
    }

    pub fn end_instant(&self) -> NaiveDateTime {
        self.end_date.instant()
    }

    pub fn import_instant(&self) -> NaiveDateTime {
        self.import_date.instant()
    }
}

/// Offset into the audio as whole seconds plus hundredths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CueTime {
    pub seconds: u16,
    pub hundredths: u16,
}

impl CueTime {
    pub fn new(seconds: u16, hundredths: u16) -> Self {
        Self { seconds, hundredths }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::seconds(self.seconds as i64) + Duration::milliseconds(self.hundredths as i64 * 10)
    }
}

/// Automatic sequencing link to another cart
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Link {
    /// Three characters
    pub category: String,
    /// Four characters
    pub cart: String,
}

impl Link {
    pub fn new(category: impl Into<String>, cart: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            cart: cart.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.trim().is_empty() && self.cart.trim().is_empty()
    }
}

/// Permitted play hours: one bit per hour of the week, Sunday first
///
/// Bit `day * 24 + hour`, most significant bit first within each byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dayparting(pub [u8; 21]);

impl Dayparting {
    pub const HOURS: usize = 168;

    /// Every hour allowed
    pub fn all() -> Self {
        Dayparting([0xFF; 21])
    }

    pub fn none() -> Self {
        Dayparting([0; 21])
    }

    fn position(day: Weekday, hour: u8) -> Option<(usize, u8)> {
        if hour >= 24 {
            return None;
        }
        let index = day.num_days_from_sunday() as usize * 24 + hour as usize;
        Some((index / 8, 0x80 >> (index % 8)))
    }

    pub fn is_allowed(&self, day: Weekday, hour: u8) -> bool {
        Self::position(day, hour).map_or(false, |(byte, mask)| self.0[byte] & mask != 0)
    }

    pub fn set(&mut self, day: Weekday, hour: u8, allowed: bool) {
        if let Some((byte, mask)) = Self::position(day, hour) {
            if allowed {
                self.0[byte] |= mask;
            } else {
                self.0[byte] &= !mask;
            }
        }
    }
}

impl Default for Dayparting {
    fn default() -> Self {
        Self::all()
    }
}

/// Source id in the top byte, tenths-of-a-second offset in the low 24 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Trigger(pub u32);

impl Trigger {
    pub fn new(source_id: u8, offset_tenths: u32) -> Self {
        Trigger(((source_id as u32) << 24) | (offset_tenths & 0x00FF_FFFF))
    }

    pub fn source_id(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn offset_tenths(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }
}

/// Result of decoding one metadata chunk
#[derive(Debug, Clone)]
pub struct Decoded {
    pub metadata: AudioMetadata,
    /// Fields that could not be read and were replaced by their fallback
    pub recovered: Vec<FieldError>,
}

impl Decoded {
    pub fn clean(metadata: AudioMetadata) -> Self {
        Self {
            metadata,
            recovered: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_hmmss() {
        let meta = AudioMetadata {
            raw_length: "10330".to_string(),
            ..Default::default()
        };
        assert_eq!(meta.length().unwrap(), Duration::seconds(3600 + 3 * 60 + 30));
    }

    #[test]
    fn test_length_mm_ss() {
        let mut meta = AudioMetadata {
            raw_length: "03:30".to_string(),
            ..Default::default()
        };
        meta.primary_flags.remove(PrimaryFlag::LengthHmmss);
        assert_eq!(meta.length().unwrap(), Duration::seconds(210));
    }

    #[test]
    fn test_length_unparseable() {
        let meta = AudioMetadata {
            raw_length: "12".to_string(),
            ..Default::default()
        };
        let err = meta.length().unwrap_err();
        assert_eq!(err.field, "raw_length");
    }

    #[test]
    fn test_extended_flag_requires_enable_bit() {
        let mut meta = AudioMetadata::default();
        assert!(meta.extended_flag(ExtendedFlag::DaypartingEnabled));

        meta.primary_flags.remove(PrimaryFlag::ExtendedFlagsEnabled);
        assert!(!meta.extended_flag(ExtendedFlag::DaypartingEnabled));
    }

    #[test]
    fn test_dayparting_bits() {
        let mut schedule = Dayparting::none();
        schedule.set(Weekday::Sun, 0, true);
        assert_eq!(schedule.0[0], 0x80);

        schedule.set(Weekday::Mon, 1, true);
        // index 25: byte 3, second bit from the top
        assert_eq!(schedule.0[3], 0x40);
        assert!(schedule.is_allowed(Weekday::Mon, 1));
        assert!(!schedule.is_allowed(Weekday::Mon, 2));
        assert!(!schedule.is_allowed(Weekday::Sat, 24));

        schedule.set(Weekday::Sat, 23, true);
        assert_eq!(schedule.0[20], 0x01);
        assert!(Dayparting::all().is_allowed(Weekday::Wed, 12));
    }

    #[test]
    fn test_trigger_packing() {
        let trigger = Trigger::new(3, 1234);
        assert_eq!(trigger.0, 0x0300_04D2);
        assert_eq!(trigger.source_id(), 3);
        assert_eq!(trigger.offset_tenths(), 1234);
        assert_eq!(Trigger::new(1, 0x0FFF_FFFF).offset_tenths(), 0x00FF_FFFF);
    }

    #[test]
    fn test_cue_time_duration() {
        assert_eq!(CueTime::new(2, 50).as_duration(), Duration::milliseconds(2500));
    }

    #[test]
    fn test_default_flags() {
        let meta = AudioMetadata::default();
        assert_eq!(meta.primary_flags.byte(), 0x86);
        assert_eq!(meta.extended_flags.as_bytes(), &[0x00, 0x01, 0x00, 0x00]);
        assert_eq!(meta.start_instant(), NaiveDateTime::default());
        assert_eq!(meta.end_instant(), NaiveDateTime::MAX);
    }
}
