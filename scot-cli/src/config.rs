//! Batch rewrite configuration

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for `.wav` files
    pub input_dir: PathBuf,
    /// Rewritten files land here, mirroring the input layout
    pub output_dir: PathBuf,
    /// Dump the source metadata chunk of every file before rewriting
    pub dump_chunks: bool,
    /// Compare audio hashes between input and output after writing
    pub verify: bool,
    /// I/O buffer size for reading and writing files
    pub buffer_size: usize,
}

impl Config {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            dump_chunks: false,
            verify: false,
            buffer_size: 8192,
        }
    }
}
