//! RIFF/WAVE chunk index
//!
//! A WAVE file is a 12-byte header followed by tagged, length-prefixed chunks:
//! - `RIFF` tag, little-endian u32 size (file length - 8), `WAVE` form type
//! - per chunk: 4-byte tag, little-endian u32 payload length, payload,
//!   one pad byte when the length is odd
//!
//! Indexing only records where each payload lives; payloads are read later,
//! on demand, by whichever codec needs them.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use binrw::{binrw, BinRead};
use xxhash_rust::xxh3::Xxh3;

use crate::error::{Error, Result};

/// Size of the `RIFF` header in bytes
pub const RIFF_HEADER_LEN: u64 = 12;

/// Size of a chunk header (tag + length) in bytes
pub const CHUNK_HEADER_LEN: u64 = 8;

pub const RIFF_TAG: FourCC = FourCC(*b"RIFF");
pub const WAVE_TAG: FourCC = FourCC(*b"WAVE");
pub const FMT_TAG: FourCC = FourCC(*b"fmt ");
pub const DATA_TAG: FourCC = FourCC(*b"data");
pub const SCOT_TAG: FourCC = FourCC(*b"scot");
pub const LIST_TAG: FourCC = FourCC(*b"LIST");
pub const ID3_TAG: FourCC = FourCC(*b"id3 ");

/// Four-character chunk identifier
#[binrw]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Build a tag from text, space-padding or truncating to four bytes
    pub fn from_str_padded(s: &str) -> Self {
        let mut tag = [b' '; 4];
        for (dst, src) in tag.iter_mut().zip(s.bytes()) {
            *dst = src;
        }
        FourCC(tag)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC(\"{}\")", self)
    }
}

/// The 12-byte container header
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy)]
pub struct RiffHeader {
    /// Must be `RIFF`
    pub tag: FourCC,
    /// Total length of everything after the first 8 bytes
    pub size: u32,
    /// Must be `WAVE`
    pub form_type: FourCC,
}

impl RiffHeader {
    pub fn wave(size: u32) -> Self {
        Self {
            tag: RIFF_TAG,
            size,
            form_type: WAVE_TAG,
        }
    }
}

/// Chunk header preceding every payload
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    pub tag: FourCC,
    pub length: u32,
}

/// Location of one chunk payload within the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub tag: FourCC,
    /// Absolute position of the first payload byte
    pub offset: u64,
    /// Payload length, excluding the pad byte
    pub length: u32,
}

impl ChunkDescriptor {
    /// Position one past the last payload byte
    pub fn end(&self) -> u64 {
        self.offset + self.length as u64
    }

    /// Payload length including the pad byte of odd-sized chunks
    pub fn padded_len(&self) -> u64 {
        self.length as u64 + (self.length as u64 & 1)
    }
}

/// Ordered list of the chunks of one container
#[derive(Debug, Clone)]
pub struct ChunkIndex {
    header: RiffHeader,
    chunks: Vec<ChunkDescriptor>,
}

impl ChunkIndex {
    pub fn header(&self) -> &RiffHeader {
        &self.header
    }

    /// First chunk carrying `tag`, in container order
    pub fn find(&self, tag: FourCC) -> Option<&ChunkDescriptor> {
        self.chunks.iter().find(|c| c.tag == tag)
    }

    pub fn count(&self, tag: FourCC) -> usize {
        self.chunks.iter().filter(|c| c.tag == tag).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkDescriptor> {
        self.chunks.iter()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Walk the container and record every chunk without reading payloads
///
/// Fails with [`Error::Format`] if the header is not `RIFF`/`WAVE`.
/// A trailing fragment too short for a chunk header ends the walk.
pub fn index_chunks<R: Read + Seek>(reader: &mut R) -> Result<ChunkIndex> {
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    if end < RIFF_HEADER_LEN {
        return Err(Error::Format(format!(
            "file too short for a RIFF header: {} bytes",
            end
        )));
    }

    let header = RiffHeader::read(reader)?;
    if header.tag != RIFF_TAG || header.form_type != WAVE_TAG {
        return Err(Error::Format(format!(
            "expected RIFF/WAVE, found {}/{}",
            header.tag, header.form_type
        )));
    }

    let mut chunks = Vec::new();
    let mut pos = RIFF_HEADER_LEN;

    while pos < end {
        if end - pos < CHUNK_HEADER_LEN {
            break;
        }

        let chunk = ChunkHeader::read(reader)?;
        let offset = pos + CHUNK_HEADER_LEN;
        chunks.push(ChunkDescriptor {
            tag: chunk.tag,
            offset,
            length: chunk.length,
        });

        pos = offset + chunk.length as u64;
        // Odd payloads carry a pad byte, unless the file stops right there
        if chunk.length % 2 != 0 && pos < end {
            pos += 1;
        }
        reader.seek(SeekFrom::Start(pos))?;
    }

    Ok(ChunkIndex { header, chunks })
}

/// Read a chunk payload into memory
pub fn read_payload<R: Read + Seek>(reader: &mut R, chunk: &ChunkDescriptor) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(chunk.offset))?;
    let mut payload = Vec::with_capacity(chunk.length as usize);
    reader.take(chunk.length as u64).read_to_end(&mut payload)?;

    if payload.len() < chunk.length as usize {
        return Err(Error::Truncated {
            chunk: "payload",
            expected: chunk.length as usize,
            actual: payload.len(),
        });
    }
    Ok(payload)
}

/// XXH3 of a chunk payload, streamed in 64 KiB blocks
pub fn payload_hash<R: Read + Seek>(reader: &mut R, chunk: &ChunkDescriptor) -> Result<u64> {
    reader.seek(SeekFrom::Start(chunk.offset))?;
    let mut limited = reader.take(chunk.length as u64);
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let read = limited.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.digest())
}
