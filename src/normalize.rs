use crate::error::Result;
use crate::scanner::Separator;
use crate::sink::{LineHandler, LineSplitter, TextSink};

/// Rewrites every recognized separator to one fixed replacement while
/// passing content through untouched.
///
/// The replacement is arbitrary text supplied at construction; the empty
/// string is legal and joins all lines together. Running the output
/// through the same normalizer again is a fixed point whenever the
/// replacement is itself one of the recognized separator forms.
pub struct Normalizer<S> {
    inner: S,
    replacement: String,
}

impl<S: TextSink> Normalizer<S> {
    /// Wraps `inner`, substituting `replacement` for every separator.
    #[must_use]
    pub fn new(inner: S, replacement: impl Into<String>) -> Self {
        Self {
            inner,
            replacement: replacement.into(),
        }
    }

    /// The configured replacement text.
    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Consumes the handler and returns the wrapped sink.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: TextSink> LineHandler for Normalizer<S> {
    fn on_content(&mut self, content: &str) -> Result<()> {
        self.inner.write_str(content)
    }

    fn on_separator(&mut self, _separator: Separator) -> Result<()> {
        self.inner.write_str(&self.replacement)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

/// Line splitter that re-emits its input with uniform separators.
pub type NormalizingSink<S> = LineSplitter<Normalizer<S>>;
