//! scot-core: broadcast WAVE metadata with write support
//!
//! This crate provides byte-exact codecs for:
//! - `scot` chunks (the automation system's 424-byte fixed-layout record)
//! - `LIST`/`INFO` chunks (tag-list fallback)
//!
//! plus the RIFF chunk index that locates them and the writer that
//! reassembles a file around them.

pub mod error;
pub mod field;
pub mod flags;
pub mod info;
pub mod metadata;
pub mod riff;
pub mod scot;
pub mod source;
pub mod validate;
pub mod writer;

pub use error::{Error, FieldError, Result};
pub use field::PackedDate;
pub use flags::{ExtendedFlag, ExtendedFlags, PrimaryFlag, PrimaryFlags};
pub use metadata::{AudioMetadata, CueTime, Dayparting, Decoded, Link, Trigger};
pub use riff::{index_chunks, payload_hash, read_payload, ChunkDescriptor, ChunkIndex, FourCC};
pub use source::{read_metadata, MetadataSource};
pub use validate::{validate_container, ValidationResult};
pub use writer::{rewrite, RewriteSummary, WaveWriter};
