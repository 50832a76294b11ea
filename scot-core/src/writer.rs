//! WAVE output assembly
//!
//! Output files carry exactly four chunks, in this order:
//! - `fmt ` copied from the input
//! - `scot` encoded from the metadata
//! - `data` copied from the input
//! - `LIST` encoded from the metadata
//!
//! The RIFF size field is patched once everything has been written.

use std::io::{self, Read, Seek, SeekFrom, Write};

use binrw::BinWrite;

use crate::error::{Error, Result};
use crate::metadata::Decoded;
use crate::riff::{
    index_chunks, ChunkDescriptor, ChunkHeader, FourCC, RiffHeader, CHUNK_HEADER_LEN, DATA_TAG,
    FMT_TAG,
};
use crate::source::{read_metadata, MetadataSource};
use crate::{info, scot};

/// Streaming writer for a RIFF/WAVE container
pub struct WaveWriter<W: Write + Seek> {
    inner: W,
    start: u64,
}

impl<W: Write + Seek> WaveWriter<W> {
    /// Write the header with a placeholder size
    pub fn new(mut inner: W) -> Result<Self> {
        let start = inner.stream_position()?;
        RiffHeader::wave(0).write(&mut inner)?;
        Ok(Self { inner, start })
    }

    fn pad(&mut self, length: u64) -> Result<()> {
        if length % 2 != 0 {
            self.inner.write_all(&[0])?;
        }
        Ok(())
    }

    /// Frame and write one chunk
    pub fn write_chunk(&mut self, tag: FourCC, payload: &[u8]) -> Result<()> {
        ChunkHeader {
            tag,
            length: payload.len() as u32,
        }
        .write(&mut self.inner)?;
        self.inner.write_all(payload)?;
        self.pad(payload.len() as u64)
    }

    /// Write a chunk that already carries its tag and length
    pub fn write_framed(&mut self, chunk: &[u8]) -> Result<()> {
        self.inner.write_all(chunk)?;
        self.pad(chunk.len() as u64)
    }

    /// Copy a chunk from `reader` unchanged
    pub fn copy_chunk<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        chunk: &ChunkDescriptor,
    ) -> Result<()> {
        ChunkHeader {
            tag: chunk.tag,
            length: chunk.length,
        }
        .write(&mut self.inner)?;

        reader.seek(SeekFrom::Start(chunk.offset))?;
        let copied = io::copy(&mut reader.by_ref().take(chunk.length as u64), &mut self.inner)?;
        if copied < chunk.length as u64 {
            return Err(Error::Truncated {
                chunk: "copied",
                expected: chunk.length as usize,
                actual: copied as usize,
            });
        }
        self.pad(chunk.length as u64)
    }

    /// Patch the RIFF size and hand back the writer, positioned at the end
    pub fn finish(mut self) -> Result<(W, u64)> {
        let end = self.inner.stream_position()?;
        let total = end - self.start;
        let size = (total - CHUNK_HEADER_LEN) as u32;

        self.inner.seek(SeekFrom::Start(self.start + 4))?;
        self.inner.write_all(&size.to_le_bytes())?;
        self.inner.seek(SeekFrom::Start(end))?;
        self.inner.flush()?;
        Ok((self.inner, total))
    }
}

/// What happened while rewriting one file
#[derive(Debug)]
pub struct RewriteSummary {
    pub source: MetadataSource,
    pub decoded: Decoded,
    /// Input `data` chunk, for verification against the output
    pub data: ChunkDescriptor,
    pub bytes_written: u64,
}

/// Rebuild a WAVE file with freshly encoded `scot` and `LIST` chunks
///
/// Fails if the input is not RIFF/WAVE or lacks `fmt ` or `data`.
pub fn rewrite<R, W>(reader: &mut R, writer: W) -> Result<(W, RewriteSummary)>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let index = index_chunks(reader)?;
    let fmt = *index
        .find(FMT_TAG)
        .ok_or_else(|| Error::MissingChunk(FMT_TAG.to_string()))?;
    let data = *index
        .find(DATA_TAG)
        .ok_or_else(|| Error::MissingChunk(DATA_TAG.to_string()))?;

    let source = MetadataSource::select(&index);
    let decoded = read_metadata(reader, &source)?;

    let mut out = WaveWriter::new(writer)?;
    out.copy_chunk(reader, &fmt)?;
    out.write_framed(&scot::encode_chunk(&decoded.metadata))?;
    out.copy_chunk(reader, &data)?;
    out.write_framed(&info::encode_chunk(&decoded.metadata))?;
    let (writer, bytes_written) = out.finish()?;

    Ok((
        writer,
        RewriteSummary {
            source,
            decoded,
            data,
            bytes_written,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riff::{LIST_TAG, SCOT_TAG};
    use std::io::Cursor;

    #[test]
    fn test_size_field_patched() {
        let mut out = WaveWriter::new(Cursor::new(Vec::new())).unwrap();
        out.write_chunk(FourCC(*b"abcd"), &[1, 2, 3]).unwrap();
        let (cursor, total) = out.finish().unwrap();
        let bytes = cursor.into_inner();

        assert_eq!(total, 12 + 8 + 4);
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 16);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(bytes[23], 0); // pad
    }

    #[test]
    fn test_rewrite_layout() {
        let mut input = WaveWriter::new(Cursor::new(Vec::new())).unwrap();
        input.write_chunk(FourCC(*b"fmt "), &[7; 16]).unwrap();
        input.write_chunk(FourCC(*b"JUNK"), &[0; 6]).unwrap();
        input.write_chunk(FourCC(*b"data"), &[9; 11]).unwrap();
        let (mut input, _) = input.finish().unwrap();

        let (output, summary) = rewrite(&mut input, Cursor::new(Vec::new())).unwrap();
        assert_eq!(summary.source, MetadataSource::None);

        let mut output = Cursor::new(output.into_inner());
        let index = index_chunks(&mut output).unwrap();
        let tags: Vec<FourCC> = index.iter().map(|c| c.tag).collect();
        assert_eq!(tags, vec![FMT_TAG, SCOT_TAG, DATA_TAG, LIST_TAG]);
        assert_eq!(index.find(SCOT_TAG).unwrap().length, 424);
        assert_eq!(index.find(DATA_TAG).unwrap().length, 11);
        assert_eq!(
            index.header().size as u64,
            output.get_ref().len() as u64 - 8
        );
        assert_eq!(summary.bytes_written, output.get_ref().len() as u64);
    }

    #[test]
    fn test_rewrite_requires_data() {
        let mut input = WaveWriter::new(Cursor::new(Vec::new())).unwrap();
        input.write_chunk(FourCC(*b"fmt "), &[7; 16]).unwrap();
        let (mut input, _) = input.finish().unwrap();

        let err = rewrite(&mut input, Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, Error::MissingChunk(tag) if tag == "data"));
    }
}
