//! WAVE container validation
//!
//! Checks an in-memory file against the structure the rewrite step relies on:
//! - Bytes 0-3: `RIFF`
//! - Bytes 4-7: size, expected to equal file length - 8
//! - Bytes 8-11: `WAVE`
//! - Chunks must lie within the file
//! - `fmt ` and `data` must be present
//! - A `scot` payload must hold a full 424-byte record

use std::io::Cursor;

use crate::riff::{
    index_chunks, CHUNK_HEADER_LEN, DATA_TAG, FMT_TAG, ID3_TAG, LIST_TAG, RIFF_HEADER_LEN,
    SCOT_TAG,
};
use crate::scot::RECORD_LEN;
use crate::source::MetadataSource;

/// Statistics about a WAVE file
#[derive(Debug, Default, Clone)]
pub struct ContainerStats {
    pub file_size: u64,
    pub declared_size: u32,
    pub chunk_count: usize,
    pub data_bytes: u64,
    /// Which chunk the metadata would be read from
    pub metadata_source: &'static str,
}

/// Result of validating a WAVE file
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub stats: ContainerStats,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn new() -> Self {
        Self {
            valid: true,
            stats: ContainerStats::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn add_error(&mut self, msg: impl Into<String>) {
        self.valid = false;
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Validate a WAVE file and return detailed results
pub fn validate_container(data: &[u8]) -> ValidationResult {
    let mut result = ValidationResult::new();
    let file_size = data.len() as u64;
    result.stats.file_size = file_size;

    if file_size < RIFF_HEADER_LEN {
        result.add_error(format!(
            "File too small: {} bytes (minimum {} bytes for the RIFF header)",
            file_size, RIFF_HEADER_LEN
        ));
        return result;
    }

    let index = match index_chunks(&mut Cursor::new(data)) {
        Ok(index) => index,
        Err(e) => {
            result.add_error(e.to_string());
            return result;
        }
    };

    let declared = index.header().size;
    result.stats.declared_size = declared;
    result.stats.chunk_count = index.len();

    if declared as u64 + CHUNK_HEADER_LEN != file_size {
        result.add_warning(format!(
            "Header size {} does not match file length {} - 8",
            declared, file_size
        ));
    }

    for chunk in index.iter() {
        if chunk.end() > file_size {
            result.add_error(format!(
                "{} chunk at 0x{:08X} claims {} bytes but the file ends after {}",
                chunk.tag,
                chunk.offset,
                chunk.length,
                file_size.saturating_sub(chunk.offset)
            ));
        }
    }

    for tag in [FMT_TAG, DATA_TAG] {
        if index.find(tag).is_none() {
            result.add_error(format!("Missing required {} chunk", tag));
        }
    }
    result.stats.data_bytes = index.find(DATA_TAG).map_or(0, |c| c.length as u64);

    for tag in [SCOT_TAG, LIST_TAG, ID3_TAG] {
        let count = index.count(tag);
        if count > 1 {
            result.add_warning(format!("{} {} chunks, only the first is used", count, tag));
        }
    }

    if let Some(scot) = index.find(SCOT_TAG) {
        if (scot.length as usize) < RECORD_LEN {
            result.add_error(format!(
                "scot chunk is {} bytes (expected {})",
                scot.length, RECORD_LEN
            ));
        }
    }

    let source = MetadataSource::select(&index);
    result.stats.metadata_source = source.name();
    match source {
        MetadataSource::None => result.add_warning("No metadata chunk; defaults will be written"),
        MetadataSource::Legacy(_) => {
            result.add_warning("Only an id3 chunk is present; it is not decoded")
        }
        _ => {}
    }

    result
}
