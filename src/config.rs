use crate::error::{Error, Result};
use std::path::PathBuf;

const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;
// A chunk must be able to hold the longest UTF-8 sequence, or a split
// character could never be completed on the next read.
const MIN_CHUNK_SIZE: usize = 4;

/// Target end-of-line form for normalized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EolKind {
    /// Unix `"\n"`
    Lf,
    /// Windows `"\r\n"`
    CrLf,
    /// Classic Mac `"\r"`
    Cr,
    /// Remove separators entirely, joining all lines
    Strip,
}

impl EolKind {
    /// Returns the separator text written for this form.
    #[must_use]
    pub const fn replacement(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
            Self::Strip => "",
        }
    }
}

/// Configuration for the rewriting pipeline.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Input file; `None` reads from standard input
    pub input: Option<PathBuf>,

    /// Output file; `None` writes to standard output
    pub output: Option<PathBuf>,

    /// Target end-of-line form
    pub eol: EolKind,

    /// Read size per chunk, in bytes
    pub chunk_size: usize,

    /// Take the output path from the stream's first line instead of
    /// `output`; the header line itself is not written
    pub route_by_header: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use eol_utl::{Config, EolKind};
    ///
    /// let config = Config::builder()
    ///     .eol(EolKind::CrLf)
    ///     .chunk_size(4096)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input path doesn't exist or is a directory
    /// - The chunk size is too small to hold one UTF-8 character
    /// - Both an output path and header routing are requested
    pub fn validate(&self) -> Result<()> {
        if let Some(input) = &self.input {
            if !input.exists() {
                return Err(Error::config(format!(
                    "Input file does not exist: {}",
                    input.display()
                )));
            }
            if input.is_dir() {
                return Err(Error::config(format!(
                    "Input path is a directory, not a file: {}",
                    input.display()
                )));
            }
        }

        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(Error::config(format!(
                "Chunk size must be at least {MIN_CHUNK_SIZE} bytes, got {}",
                self.chunk_size
            )));
        }

        if self.route_by_header && self.output.is_some() {
            return Err(Error::config(
                "An output path and header routing are mutually exclusive",
            ));
        }

        Ok(())
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    eol: Option<EolKind>,
    chunk_size: Option<usize>,
    route_by_header: bool,
}

impl ConfigBuilder {
    /// Sets the input file path.
    #[must_use]
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    /// Sets the output file path.
    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Sets the target end-of-line form.
    #[must_use]
    pub const fn eol(mut self, eol: EolKind) -> Self {
        self.eol = Some(eol);
        self
    }

    /// Sets the read size per chunk, in bytes.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    /// Routes output to the path named by the stream's first line.
    #[must_use]
    pub const fn route_by_header(mut self, enabled: bool) -> Self {
        self.route_by_header = enabled;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails; see [`Config::validate`].
    pub fn build(self) -> Result<Config> {
        let config = Config {
            input: self.input,
            output: self.output,
            eol: self.eol.unwrap_or(EolKind::Lf),
            chunk_size: self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            route_by_header: self.route_by_header,
        };

        config.validate()?;
        Ok(config)
    }
}
