//! Named flag sets over the record's flag bytes
//!
//! The record carries two bit groups: one primary flag byte and a 4-byte
//! extended group. Bits are numbered from the least significant bit of the
//! first byte. Bits without a name are preserved as-is.

use std::fmt;
use std::marker::PhantomData;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::field::{get_bit, set_bit};

/// A named bit in a flag group
pub trait Flag: Copy + fmt::Debug + 'static {
    /// Every named flag, in bit order
    const ALL: &'static [Self];

    fn bit(self) -> usize;
}

/// Primary flag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryFlag {
    ParentOfRotationSet,
    /// Raw length measures until EOM rather than until end of file
    LengthUntilEom,
    /// Raw length is `HMMSS` rather than `MM:SS`
    LengthHmmss,
    VoiceTrack,
    RotationLookupTable,
    /// The extended flag group is meaningful
    ExtendedFlagsEnabled,
}

impl Flag for PrimaryFlag {
    const ALL: &'static [Self] = &[
        PrimaryFlag::ParentOfRotationSet,
        PrimaryFlag::LengthUntilEom,
        PrimaryFlag::LengthHmmss,
        PrimaryFlag::VoiceTrack,
        PrimaryFlag::RotationLookupTable,
        PrimaryFlag::ExtendedFlagsEnabled,
    ];

    fn bit(self) -> usize {
        match self {
            PrimaryFlag::ParentOfRotationSet => 0,
            PrimaryFlag::LengthUntilEom => 1,
            PrimaryFlag::LengthHmmss => 2,
            PrimaryFlag::VoiceTrack => 3,
            PrimaryFlag::RotationLookupTable => 4,
            PrimaryFlag::ExtendedFlagsEnabled => 7,
        }
    }
}

/// Extended flag group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtendedFlag {
    NotPlayOnInternet,
    VoiceTrackEomOverride,
    UseDesiredLength,
    HasTriggerValues,
    HasHookValues,
    DeleteAfterPlay,
    ArchiveAfterPlay,
    DtmfRecording,
    DaypartingEnabled,
}

impl Flag for ExtendedFlag {
    const ALL: &'static [Self] = &[
        ExtendedFlag::NotPlayOnInternet,
        ExtendedFlag::VoiceTrackEomOverride,
        ExtendedFlag::UseDesiredLength,
        ExtendedFlag::HasTriggerValues,
        ExtendedFlag::HasHookValues,
        ExtendedFlag::DeleteAfterPlay,
        ExtendedFlag::ArchiveAfterPlay,
        ExtendedFlag::DtmfRecording,
        ExtendedFlag::DaypartingEnabled,
    ];

    fn bit(self) -> usize {
        match self {
            ExtendedFlag::NotPlayOnInternet => 0,
            ExtendedFlag::VoiceTrackEomOverride => 1,
            ExtendedFlag::UseDesiredLength => 2,
            ExtendedFlag::HasTriggerValues => 3,
            ExtendedFlag::HasHookValues => 4,
            ExtendedFlag::DeleteAfterPlay => 5,
            ExtendedFlag::ArchiveAfterPlay => 6,
            ExtendedFlag::DtmfRecording => 7,
            ExtendedFlag::DaypartingEnabled => 8,
        }
    }
}

/// Fixed-width bit group addressed by named flags
pub struct FlagSet<F: Flag, const N: usize> {
    bytes: [u8; N],
    _flags: PhantomData<F>,
}

pub type PrimaryFlags = FlagSet<PrimaryFlag, 1>;
pub type ExtendedFlags = FlagSet<ExtendedFlag, 4>;

impl<F: Flag, const N: usize> FlagSet<F, N> {
    pub fn empty() -> Self {
        Self::from_bytes([0; N])
    }

    pub fn from_bytes(bytes: [u8; N]) -> Self {
        Self {
            bytes,
            _flags: PhantomData,
        }
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    pub fn contains(&self, flag: F) -> bool {
        get_bit(&self.bytes, flag.bit())
    }

    pub fn insert(&mut self, flag: F) {
        set_bit(&mut self.bytes, flag.bit(), true);
    }

    pub fn remove(&mut self, flag: F) {
        set_bit(&mut self.bytes, flag.bit(), false);
    }

    pub fn with(mut self, flag: F) -> Self {
        self.insert(flag);
        self
    }

    /// Named flags currently set, in bit order
    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        F::ALL.iter().copied().filter(move |f| self.contains(*f))
    }
}

impl PrimaryFlags {
    pub fn from_byte(byte: u8) -> Self {
        Self::from_bytes([byte])
    }

    pub fn byte(&self) -> u8 {
        self.bytes[0]
    }
}

// Manual impls: derives would demand `F: Clone + PartialEq + ...` and serde
// has no impls for `[u8; N]` with a generic `N`.

impl<F: Flag, const N: usize> Clone for FlagSet<F, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: Flag, const N: usize> Copy for FlagSet<F, N> {}

impl<F: Flag, const N: usize> PartialEq for FlagSet<F, N> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<F: Flag, const N: usize> Eq for FlagSet<F, N> {}

impl<F: Flag, const N: usize> Default for FlagSet<F, N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: Flag, const N: usize> fmt::Debug for FlagSet<F, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSet")
            .field("bytes", &self.bytes)
            .field("set", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<F: Flag, const N: usize> Serialize for FlagSet<F, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bytes.as_slice().serialize(serializer)
    }
}

impl<'de, F: Flag, const N: usize> Deserialize<'de> for FlagSet<F, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let bytes: [u8; N] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| D::Error::invalid_length(v.len(), &"flag group width"))?;
        Ok(Self::from_bytes(bytes))
    }
}
