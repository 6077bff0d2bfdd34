//! # eol-utl
//!
//! A streaming line-boundary recognizer and rewriter.
//!
//! ## Features
//!
//! - Recognizes all three line-separator forms (`\n`, `\r`, `\r\n`)
//! - Chunk-safe: a `\r\n` pair split across two deliveries is one separator
//! - Pass-through, normalizing, and header-routed sinks over one engine
//! - Bounded memory: streams of any size are processed chunk by chunk
//!
//! ## Quick Start
//!
//! ```no_run
//! use eol_utl::{Config, EolKind, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .input("./notes.txt")
//!     .output("./notes.unix.txt")
//!     .eol(EolKind::Lf)
//!     .build()?;
//!
//! Pipeline::new(config)?.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is built leaves-first:
//! 1. **Scanner**: pure automaton turning one chunk plus one bit of carry
//!    state into content spans and separator kinds
//! 2. **`LineSplitter`**: owns the carry state and line counter, dispatches
//!    events to a [`LineHandler`]
//! 3. **Handlers**: [`PassThrough`], [`Normalizer`], [`HeaderRouter`]
//! 4. **Pipeline**: streams a file or stdin through a sink chain in
//!    fixed-size chunks

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod header;
mod normalize;
mod passthrough;
mod pipeline;
mod scanner;
mod sink;

pub use config::{Config, ConfigBuilder, EolKind};
pub use error::{Error, Result};
pub use header::{HeaderRoutedSink, HeaderRouter};
pub use normalize::{Normalizer, NormalizingSink};
pub use passthrough::{PassThrough, PassThroughSink};
pub use pipeline::{Pipeline, PipelineStats};
pub use scanner::{ScanOutcome, Segment, Separator, scan};
pub use sink::{FileSink, LineHandler, LineSplitter, TextSink, WriteSink};

/// Runs a complete rewrite with the given configuration.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The input cannot be read or is not valid UTF-8
/// - The destination cannot be opened or written
/// - A header-routed stream ends before its header line completes
///
/// # Examples
///
/// ```no_run
/// use eol_utl::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .input("./mixed.txt")
///     .output("./clean.txt")
///     .build()?;
///
/// run(config)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<PipelineStats> {
    Pipeline::new(config)?.run()
}
