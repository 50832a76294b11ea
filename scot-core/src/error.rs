//! Error types for scot-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binary format error: {0}")]
    BinRw(String),

    #[error("Not a WAVE container: {0}")]
    Format(String),

    #[error("{chunk} chunk truncated: expected {expected} bytes, found {actual}")]
    Truncated {
        chunk: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Missing required chunk: {0}")]
    MissingChunk(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<binrw::Error> for Error {
    fn from(e: binrw::Error) -> Self {
        match e {
            binrw::Error::Io(io) => Error::Io(io),
            other => Error::BinRw(other.to_string()),
        }
    }
}

/// A single field that could not be interpreted.
///
/// Never fatal: the record decoders substitute the field's documented
/// fallback and keep the error so callers can report it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field `{field}`: {reason}")]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
