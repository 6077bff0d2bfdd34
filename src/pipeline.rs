use crate::config::Config;
use crate::error::{Error, Result};
use crate::header::HeaderRouter;
use crate::normalize::Normalizer;
use crate::sink::{FileSink, LineHandler, LineSplitter, WriteSink};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, instrument, trace};

/// Statistics collected while rewriting one stream.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    /// Bytes read from the input
    pub bytes_read: usize,

    /// Number of chunk reads performed
    pub chunks_read: usize,

    /// Completed lines (separators recognized)
    pub lines: usize,

    /// Total execution time
    pub duration: Duration,

    /// Input description (path or `<stdin>`)
    pub input: String,

    /// Output description (path, `<stdout>`, or the header-routed target)
    pub output: String,

    /// Generation timestamp
    pub generated_at: String,
}

impl PipelineStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\nRewrite summary");
        println!("  Input:     {}", self.input);
        println!("  Output:    {}", self.output);
        println!("  Lines:     {}", self.lines);
        println!("  Bytes in:  {}", self.bytes_read);
        println!("  Chunks:    {}", self.chunks_read);
        println!("  Duration:  {:.2}s", self.duration.as_secs_f64());
    }

    /// Returns the throughput in bytes per second.
    #[must_use]
    pub fn throughput_bytes_per_sec(&self) -> f64 {
        self.bytes_read as f64 / self.duration.as_secs_f64()
    }
}

/// Read progress counters threaded out of the pump loop.
struct Progress {
    bytes: usize,
    chunks: usize,
}

/// Orchestrates one streaming rewrite: input, sink chain, statistics.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Executes the rewrite and returns statistics.
    ///
    /// The input is read in fixed-size chunks and fed straight through
    /// the sink chain, so memory use is bounded by the chunk size no
    /// matter how large the stream is. Cross-chunk `\r\n` pairs are
    /// handled by the splitter's carry state.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, the destination
    /// cannot be opened or written, the input is not valid UTF-8, or a
    /// header-routed stream ends before its header line completes.
    #[instrument(skip(self))]
    pub fn run(self) -> Result<PipelineStats> {
        let start = Instant::now();

        let input_label = self
            .config
            .input
            .clone()
            .unwrap_or_else(|| PathBuf::from("<stdin>"));
        info!("Rewriting {}", input_label.display());

        let reader: Box<dyn Read> = match &self.config.input {
            Some(path) => Box::new(File::open(path).map_err(|e| Error::io(path, e))?),
            None => Box::new(io::stdin().lock()),
        };

        let chunk_size = self.config.chunk_size;
        let (lines, progress, output_label) = if self.config.route_by_header {
            let splitter = LineSplitter::new(HeaderRouter::new());
            let (splitter, progress) = pump(splitter, reader, chunk_size, &input_label)?;
            let output = splitter
                .handler()
                .target()
                .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());
            (splitter.line_index(), progress, output)
        } else {
            let replacement = self.config.eol.replacement();
            match &self.config.output {
                Some(path) => {
                    let sink = FileSink::create(path)?;
                    let splitter = LineSplitter::new(Normalizer::new(sink, replacement));
                    let (splitter, progress) = pump(splitter, reader, chunk_size, &input_label)?;
                    (splitter.line_index(), progress, path.display().to_string())
                }
                None => {
                    let sink = WriteSink::new("<stdout>", io::stdout().lock());
                    let splitter = LineSplitter::new(Normalizer::new(sink, replacement));
                    let (splitter, progress) = pump(splitter, reader, chunk_size, &input_label)?;
                    (splitter.line_index(), progress, "<stdout>".to_string())
                }
            }
        };

        let duration = start.elapsed();
        info!(
            "✓ Rewrote {} lines ({} bytes) to {} in {:.2}s",
            lines,
            progress.bytes,
            output_label,
            duration.as_secs_f64()
        );

        Ok(PipelineStats {
            bytes_read: progress.bytes,
            chunks_read: progress.chunks,
            lines,
            duration,
            input: input_label.display().to_string(),
            output: output_label,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    }
}

/// Streams `reader` through `splitter` in fixed-size chunks, then closes
/// the splitter.
///
/// A multi-byte character split by a read boundary is kept at the front
/// of the buffer and completed by the next read, so every slice handed to
/// the splitter is whole UTF-8. That incomplete tail is never more than
/// three bytes, and the chunk buffer is validated to hold at least four,
/// so the loop always makes progress.
fn pump<H: LineHandler>(
    mut splitter: LineSplitter<H>,
    mut reader: impl Read,
    chunk_size: usize,
    label: &Path,
) -> Result<(LineSplitter<H>, Progress)> {
    let mut buf = vec![0u8; chunk_size];
    let mut carried = 0;
    let mut progress = Progress {
        bytes: 0,
        chunks: 0,
    };

    loop {
        let read = reader
            .read(&mut buf[carried..])
            .map_err(|e| Error::io(label, e))?;
        if read == 0 {
            if carried > 0 {
                // EOF in the middle of a character.
                return Err(Error::invalid_utf8(label));
            }
            break;
        }
        progress.bytes += read;
        progress.chunks += 1;

        let filled = carried + read;
        let text = match std::str::from_utf8(&buf[..filled]) {
            Ok(text) => text,
            Err(err) if err.error_len().is_none() => {
                // Only the trailing character is incomplete; the prefix up
                // to `valid_up_to` is whole by construction.
                let valid = err.valid_up_to();
                std::str::from_utf8(&buf[..valid]).map_err(|_| Error::invalid_utf8(label))?
            }
            Err(_) => return Err(Error::invalid_utf8(label)),
        };

        splitter.write(text)?;
        let consumed = text.len();
        trace!("Fed {} bytes ({} carried)", consumed, filled - consumed);

        buf.copy_within(consumed..filled, 0);
        carried = filled - consumed;
    }

    splitter.close()?;
    Ok((splitter, progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EolKind;
    use assert_fs::prelude::*;

    #[test]
    fn test_pipeline_normalizes_mixed_separators() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("in.txt");
        let output = temp.child("out.txt");
        input.write_str("a\nb\r\nc\rd\r").unwrap();

        let config = Config::builder()
            .input(input.path())
            .output(output.path())
            .eol(EolKind::CrLf)
            .build()
            .unwrap();

        let stats = Pipeline::new(config).unwrap().run().unwrap();

        output.assert("a\r\nb\r\nc\r\nd\r\n");
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.bytes_read, 9);
    }

    #[test]
    fn test_pipeline_with_tiny_chunks_splits_crlf_pairs() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("in.txt");
        let output = temp.child("out.txt");
        // With chunk_size 4, several \r\n pairs straddle read boundaries.
        input.write_str("aaa\r\nbb\r\nc\r\n\r\n").unwrap();

        let config = Config::builder()
            .input(input.path())
            .output(output.path())
            .eol(EolKind::Lf)
            .chunk_size(4)
            .build()
            .unwrap();

        let stats = Pipeline::new(config).unwrap().run().unwrap();

        output.assert("aaa\nbb\nc\n\n");
        assert_eq!(stats.lines, 4);
        assert!(stats.chunks_read > 1);
    }

    #[test]
    fn test_pipeline_multibyte_content_across_boundaries() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("in.txt");
        let output = temp.child("out.txt");
        // Two-byte characters at every offset guarantee some reads end
        // mid-character.
        input.write_str("ééé\r\nööö\rüü\n").unwrap();

        let config = Config::builder()
            .input(input.path())
            .output(output.path())
            .eol(EolKind::Lf)
            .chunk_size(5)
            .build()
            .unwrap();

        let stats = Pipeline::new(config).unwrap().run().unwrap();

        output.assert("ééé\nööö\nüü\n");
        assert_eq!(stats.lines, 3);
    }

    #[test]
    fn test_pipeline_strip_joins_lines() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("in.txt");
        let output = temp.child("out.txt");
        input.write_str("a\nb\r\nc").unwrap();

        let config = Config::builder()
            .input(input.path())
            .output(output.path())
            .eol(EolKind::Strip)
            .build()
            .unwrap();

        Pipeline::new(config).unwrap().run().unwrap();
        output.assert("abc");
    }

    #[test]
    fn test_pipeline_routes_by_header() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("in.txt");
        let target = temp.child("nested/routed.txt");
        input
            .write_str(&format!("{}\nhello\nworld!\r", target.path().display()))
            .unwrap();

        let config = Config::builder()
            .input(input.path())
            .route_by_header(true)
            .build()
            .unwrap();

        let stats = Pipeline::new(config).unwrap().run().unwrap();

        target.assert("hello\nworld!\r");
        assert_eq!(stats.output, target.path().display().to_string());
        assert_eq!(stats.lines, 3);
    }

    #[test]
    fn test_pipeline_header_routing_without_header_fails() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("in.txt");
        input.write_str("no separator here").unwrap();

        let config = Config::builder()
            .input(input.path())
            .route_by_header(true)
            .build()
            .unwrap();

        let err = Pipeline::new(config).unwrap().run().unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_pipeline_rejects_invalid_utf8() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("in.bin");
        let output = temp.child("out.txt");
        input.write_binary(&[b'o', b'k', 0xff, 0xfe, b'\n']).unwrap();

        let config = Config::builder()
            .input(input.path())
            .output(output.path())
            .build()
            .unwrap();

        let err = Pipeline::new(config).unwrap().run().unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_pipeline_empty_input() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("in.txt");
        let output = temp.child("out.txt");
        input.write_str("").unwrap();

        let config = Config::builder()
            .input(input.path())
            .output(output.path())
            .build()
            .unwrap();

        let stats = Pipeline::new(config).unwrap().run().unwrap();

        output.assert("");
        assert_eq!(stats.lines, 0);
        assert_eq!(stats.bytes_read, 0);
    }

    #[test]
    fn test_stats_serialize_to_json() {
        let stats = PipelineStats {
            bytes_read: 10,
            chunks_read: 2,
            lines: 3,
            duration: Duration::from_millis(5),
            input: "in.txt".to_string(),
            output: "out.txt".to_string(),
            generated_at: "2026-01-01 00:00:00".to_string(),
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"lines\":3"));
        assert!(json.contains("out.txt"));
    }
}
