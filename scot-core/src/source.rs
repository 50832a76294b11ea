//! Choosing which metadata chunk to decode
//!
//! Priority: `scot`, then `LIST`, then the legacy `id3 ` chunk, which is
//! recognized but not decoded.

use std::io::{Read, Seek};

use crate::error::Result;
use crate::metadata::{AudioMetadata, Decoded};
use crate::riff::{read_payload, ChunkDescriptor, ChunkIndex, ID3_TAG, LIST_TAG, SCOT_TAG};
use crate::{info, scot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    Scot(ChunkDescriptor),
    List(ChunkDescriptor),
    /// Present but not decodable; metadata stays at defaults
    Legacy(ChunkDescriptor),
    None,
}

impl MetadataSource {
    pub fn select(index: &ChunkIndex) -> Self {
        if let Some(chunk) = index.find(SCOT_TAG) {
            MetadataSource::Scot(*chunk)
        } else if let Some(chunk) = index.find(LIST_TAG) {
            MetadataSource::List(*chunk)
        } else if let Some(chunk) = index.find(ID3_TAG) {
            MetadataSource::Legacy(*chunk)
        } else {
            MetadataSource::None
        }
    }

    pub fn chunk(&self) -> Option<&ChunkDescriptor> {
        match self {
            MetadataSource::Scot(c) | MetadataSource::List(c) | MetadataSource::Legacy(c) => {
                Some(c)
            }
            MetadataSource::None => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetadataSource::Scot(_) => "scot",
            MetadataSource::List(_) => "LIST",
            MetadataSource::Legacy(_) => "id3",
            MetadataSource::None => "none",
        }
    }
}

/// Decode the selected chunk into metadata
pub fn read_metadata<R: Read + Seek>(reader: &mut R, source: &MetadataSource) -> Result<Decoded> {
    match source {
        MetadataSource::Scot(chunk) => scot::decode(&read_payload(reader, chunk)?),
        MetadataSource::List(chunk) => Ok(info::decode(&read_payload(reader, chunk)?)),
        MetadataSource::Legacy(_) | MetadataSource::None => {
            Ok(Decoded::clean(AudioMetadata::default()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riff::index_chunks;
    use std::io::Cursor;

    fn wave(chunks: &[(&[u8; 4], Vec<u8>)]) -> Cursor<Vec<u8>> {
        let mut file = b"RIFF\0\0\0\0WAVE".to_vec();
        for (tag, payload) in chunks {
            file.extend_from_slice(*tag);
            file.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            file.extend_from_slice(payload);
            if payload.len() % 2 != 0 {
                file.push(0);
            }
        }
        let size = (file.len() - 8) as u32;
        file[4..8].copy_from_slice(&size.to_le_bytes());
        Cursor::new(file)
    }

    fn list_payload(artist: &str) -> Vec<u8> {
        let meta = AudioMetadata {
            artist: artist.to_string(),
            ..Default::default()
        };
        info::encode_chunk(&meta)[8..].to_vec()
    }

    #[test]
    fn test_scot_preferred_over_list() {
        let scot_meta = AudioMetadata {
            title: "From scot".to_string(),
            ..Default::default()
        };
        let mut file = wave(&[
            (b"LIST", list_payload("From list")),
            (b"scot", scot::encode(&scot_meta)),
        ]);
        let index = index_chunks(&mut file).unwrap();
        let source = MetadataSource::select(&index);
        assert_eq!(source.name(), "scot");

        let decoded = read_metadata(&mut file, &source).unwrap();
        assert_eq!(decoded.metadata.title, "From scot");
        assert_eq!(decoded.metadata.artist, "");
    }

    #[test]
    fn test_list_when_no_scot() {
        let mut file = wave(&[(b"id3 ", vec![1, 2, 3]), (b"LIST", list_payload("Listed"))]);
        let index = index_chunks(&mut file).unwrap();
        let source = MetadataSource::select(&index);
        assert!(matches!(source, MetadataSource::List(_)));

        let decoded = read_metadata(&mut file, &source).unwrap();
        assert_eq!(decoded.metadata.artist, "Listed");
    }

    #[test]
    fn test_legacy_and_missing_yield_defaults() {
        let mut file = wave(&[(b"id3 ", vec![1, 2, 3])]);
        let index = index_chunks(&mut file).unwrap();
        let source = MetadataSource::select(&index);
        assert!(matches!(source, MetadataSource::Legacy(_)));
        assert_eq!(
            read_metadata(&mut file, &source).unwrap().metadata,
            AudioMetadata::default()
        );

        let mut file = wave(&[(b"data", vec![0; 4])]);
        let index = index_chunks(&mut file).unwrap();
        let source = MetadataSource::select(&index);
        assert_eq!(source, MetadataSource::None);
        assert!(source.chunk().is_none());
    }
}
