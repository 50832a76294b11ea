//! Directory rewrite: every `.wav` under the input tree gets a fresh
//! `scot`/`LIST` pair in the mirrored output tree.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{bail, Context};
use scot_core::riff::DATA_TAG;
use scot_core::{index_chunks, payload_hash, read_payload, rewrite, RewriteSummary};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::display;

/// Counts for one batch run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    /// Fields replaced by defaults across all processed files
    pub recovered_fields: usize,
}

pub fn is_wave_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

/// Rewrite every WAVE file under `config.input_dir`
///
/// A failing file is logged and skipped; the batch carries on.
pub fn rewrite_directory(config: &Config) -> anyhow::Result<BatchReport> {
    if !config.input_dir.is_dir() {
        bail!("Input directory {:?} does not exist", config.input_dir);
    }
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Creating {:?}", config.output_dir))?;
    let input_root = config.input_dir.canonicalize()?;
    let output_root = config.output_dir.canonicalize()?;
    if input_root == output_root {
        bail!("Output directory {:?} is the input directory", config.output_dir);
    }
    // Only an output tree inside the input tree can feed back into the walk
    let output_nested = output_root.starts_with(&input_root);

    let mut report = BatchReport::default();

    for entry in WalkDir::new(&config.input_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_wave_file(path) {
            continue;
        }
        if output_nested && path.canonicalize().is_ok_and(|p| p.starts_with(&output_root)) {
            continue;
        }

        let relative = path.strip_prefix(&config.input_dir)?;
        let dest = config.output_dir.join(relative);

        info!("Processing: {:?}", relative);
        match rewrite_file(config, path, &dest) {
            Ok(summary) => {
                for field in &summary.decoded.recovered {
                    warn!("{:?}: {}", relative, field);
                }
                debug!(
                    "{:?}: metadata from {}, {} bytes written",
                    relative,
                    summary.source.name(),
                    summary.bytes_written
                );
                report.recovered_fields += summary.decoded.recovered.len();
                report.processed += 1;
            }
            Err(e) => {
                error!("Failed to rewrite {:?}: {:#}", relative, e);
                if dest.exists() {
                    if let Err(e) = fs::remove_file(&dest) {
                        warn!("Could not remove partial output {:?}: {}", dest, e);
                    }
                }
                report.failed += 1;
            }
        }
    }

    info!(
        "Rewrote {} files ({} failed, {} fields defaulted)",
        report.processed, report.failed, report.recovered_fields
    );
    Ok(report)
}

/// Rewrite a single file from `src` to `dest`
pub fn rewrite_file(config: &Config, src: &Path, dest: &Path) -> anyhow::Result<RewriteSummary> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Creating {:?}", parent))?;
    }

    let file = File::open(src).with_context(|| format!("Opening {:?}", src))?;
    let mut reader = BufReader::with_capacity(config.buffer_size, file);

    if config.dump_chunks {
        let index = index_chunks(&mut reader)?;
        let source = scot_core::MetadataSource::select(&index);
        if let Some(chunk) = source.chunk() {
            let payload = read_payload(&mut reader, chunk)?;
            display::print_dump(chunk, &payload, 32);
        }
    }

    let out = File::create(dest).with_context(|| format!("Creating {:?}", dest))?;
    let writer = BufWriter::with_capacity(config.buffer_size, out);
    let (writer, summary) = rewrite(&mut reader, writer)?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    if config.verify {
        verify_audio(&mut reader, &summary, dest)?;
    }

    Ok(summary)
}

/// Check that the output `data` payload matches the input byte for byte
fn verify_audio(
    input: &mut BufReader<File>,
    summary: &RewriteSummary,
    dest: &Path,
) -> anyhow::Result<()> {
    let expected = payload_hash(input, &summary.data)?;

    let mut output = BufReader::new(File::open(dest)?);
    let index = index_chunks(&mut output)?;
    let Some(data) = index.find(DATA_TAG) else {
        bail!("Output {:?} has no data chunk", dest);
    };
    let actual = payload_hash(&mut output, data)?;

    if data.length != summary.data.length || actual != expected {
        bail!(
            "Audio mismatch in {:?}: {:016x} ({} bytes) vs {:016x} ({} bytes)",
            dest,
            actual,
            data.length,
            expected,
            summary.data.length
        );
    }
    debug!("Verified audio hash {:016x}", actual);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scot_core::riff::{LIST_TAG, SCOT_TAG};
    use scot_core::{info as list, read_metadata, AudioMetadata, FourCC, MetadataSource, WaveWriter};

    fn write_wave(path: &Path, with_data: bool) {
        let tagged = AudioMetadata {
            title: "Jingle".to_string(),
            artist: "Studio B".to_string(),
            ..Default::default()
        };
        let mut out = WaveWriter::new(BufWriter::new(File::create(path).unwrap())).unwrap();
        out.write_chunk(FourCC(*b"fmt "), &[1; 16]).unwrap();
        if with_data {
            out.write_chunk(FourCC(*b"data"), &[3; 101]).unwrap();
        }
        out.write_framed(&list::encode_chunk(&tagged)).unwrap();
        out.finish().unwrap();
    }

    #[test]
    fn test_is_wave_file() {
        assert!(is_wave_file(Path::new("a/b.wav")));
        assert!(is_wave_file(Path::new("B.WAV")));
        assert!(!is_wave_file(Path::new("b.mp3")));
        assert!(!is_wave_file(Path::new("wav")));
    }

    #[test]
    fn test_rewrite_directory_mirrors_tree() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        fs::create_dir_all(input.path().join("carts/ids")).unwrap();
        write_wave(&input.path().join("carts/ids/one.wav"), true);
        write_wave(&input.path().join("two.WAV"), true);
        write_wave(&input.path().join("broken.wav"), false);
        fs::write(input.path().join("notes.txt"), b"skip me").unwrap();

        let mut config = Config::new(input.path().to_path_buf(), output.path().to_path_buf());
        config.verify = true;
        let report = rewrite_directory(&config).unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert!(!output.path().join("broken.wav").exists());
        assert!(!output.path().join("notes.txt").exists());

        let rewritten = output.path().join("carts/ids/one.wav");
        let mut reader = BufReader::new(File::open(&rewritten).unwrap());
        let index = index_chunks(&mut reader).unwrap();
        assert!(index.find(SCOT_TAG).is_some());
        assert!(index.find(LIST_TAG).is_some());

        let decoded = read_metadata(&mut reader, &MetadataSource::select(&index)).unwrap();
        assert_eq!(decoded.metadata.title, "Jingle");
        assert_eq!(decoded.metadata.artist, "Studio B");
    }

    #[test]
    fn test_output_inside_input_is_skipped() {
        let input = tempfile::tempdir().unwrap();
        write_wave(&input.path().join("a.wav"), true);
        let output = input.path().join("out");

        let config = Config::new(input.path().to_path_buf(), output.clone());
        let first = rewrite_directory(&config).unwrap();
        let second = rewrite_directory(&config).unwrap();

        assert_eq!(first.processed, 1);
        assert_eq!(second.processed, 1);
        assert!(!output.join("out").exists());
    }

    #[test]
    fn test_output_above_input_is_processed() {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("in");
        fs::create_dir_all(&input).unwrap();
        write_wave(&input.join("a.wav"), true);

        let config = Config::new(input.clone(), root.path().to_path_buf());
        let report = rewrite_directory(&config).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 0);
        assert!(root.path().join("a.wav").exists());
    }

    #[test]
    fn test_output_same_as_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_wave(&dir.path().join("a.wav"), true);

        let config = Config::new(dir.path().to_path_buf(), dir.path().to_path_buf());
        assert!(rewrite_directory(&config).is_err());
    }

    #[test]
    fn test_missing_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("nope"), dir.path().join("out"));
        assert!(rewrite_directory(&config).is_err());
    }
}
