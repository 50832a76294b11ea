//! scot: inspect and rewrite broadcast WAVE metadata
//!
//! Reads the automation system's `scot` chunk (falling back to `LIST`/`INFO`
//! tags) and writes files back out with both chunks regenerated.

mod batch;
mod config;
mod display;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use scot_core::{
    index_chunks, read_metadata, read_payload, validate_container, FourCC, MetadataSource,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::Config;

#[derive(Parser)]
#[command(name = "scot")]
#[command(about = "Read, check and rewrite scot metadata in WAVE files")]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every chunk in a file
    Index {
        /// WAVE file to read
        file: PathBuf,
    },
    /// Decode and print a file's metadata
    Show {
        file: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the raw payload of the first chunk with the given tag
    Dump {
        file: PathBuf,
        /// Chunk tag, e.g. scot or LIST (padded with spaces to four bytes)
        tag: String,
        /// Bytes per line
        #[arg(long, default_value = "32")]
        width: usize,
    },
    /// Validate container structure
    Check {
        file: PathBuf,
    },
    /// Rewrite every .wav file in a directory tree
    Rewrite {
        /// Directory to scan
        #[arg(short, long)]
        input: PathBuf,
        /// Directory that receives the rewritten files
        #[arg(short, long)]
        output: PathBuf,
        /// Dump each file's source metadata chunk before rewriting
        #[arg(long)]
        dump: bool,
        /// Confirm the audio payload is unchanged after writing
        #[arg(long)]
        verify: bool,
        /// I/O buffer size in bytes
        #[arg(long, default_value = "8192")]
        buffer_size: usize,
    },
}

fn open(path: &Path) -> anyhow::Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Opening {:?}", path))?;
    Ok(BufReader::new(file))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `show --json` stays machine-readable
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Index { file } => {
            let index = index_chunks(&mut open(&file)?)?;
            display::print_index(&index);
        }

        Commands::Show { file, json } => {
            let mut reader = open(&file)?;
            let index = index_chunks(&mut reader)?;
            let source = MetadataSource::select(&index);
            if matches!(source, MetadataSource::Legacy(_) | MetadataSource::None) {
                warn!("No readable metadata chunk ({}); showing defaults", source.name());
            }
            let decoded = read_metadata(&mut reader, &source)?;
            for field in &decoded.recovered {
                warn!("{}", field);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&decoded.metadata)?);
            } else {
                println!("Metadata source: {}", source.name());
                display::print_metadata(&decoded.metadata);
            }
        }

        Commands::Dump { file, tag, width } => {
            let mut reader = open(&file)?;
            let index = index_chunks(&mut reader)?;
            let tag = FourCC::from_str_padded(&tag);
            let Some(chunk) = index.find(tag) else {
                anyhow::bail!("No {} chunk in {:?}", tag, file);
            };
            let payload = read_payload(&mut reader, chunk)?;
            display::print_dump(chunk, &payload, width);
        }

        Commands::Check { file } => {
            let data = fs::read(&file).with_context(|| format!("Reading {:?}", file))?;
            let result = validate_container(&data);
            let stats = &result.stats;

            println!("File: {:?}", file);
            println!("Size: {} bytes (header declares {})", stats.file_size, stats.declared_size);
            println!("Chunks: {}", stats.chunk_count);
            println!("Audio: {} bytes", stats.data_bytes);
            println!("Metadata source: {}", stats.metadata_source);
            for warning in &result.warnings {
                println!("Warning: {}", warning);
            }
            for error in &result.errors {
                println!("Error: {}", error);
            }

            if !result.valid {
                std::process::exit(1);
            }
            println!("Valid");
        }

        Commands::Rewrite {
            input,
            output,
            dump,
            verify,
            buffer_size,
        } => {
            info!("Input directory: {:?}", input);
            info!("Output directory: {:?}", output);

            let config = Config {
                dump_chunks: dump,
                verify,
                buffer_size,
                ..Config::new(input, output)
            };
            let report = batch::rewrite_directory(&config)?;
            if report.failed > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
