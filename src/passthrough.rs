use crate::error::Result;
use crate::scanner::Separator;
use crate::sink::{LineHandler, LineSplitter, TextSink};

/// Forwards content and the literal separator text to a wrapped sink,
/// leaving the stream byte-for-byte unchanged.
///
/// On its own this is an identity transform, but every piece of the
/// stream has passed through line recognition individually, which makes
/// it the base other handlers vary: swap `on_separator` and you have a
/// normalizer, swap both and you have a router.
pub struct PassThrough<S> {
    inner: S,
}

impl<S: TextSink> PassThrough<S> {
    /// Wraps `inner` as the forwarding destination.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Shared access to the wrapped sink.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Consumes the handler and returns the wrapped sink.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: TextSink> LineHandler for PassThrough<S> {
    fn on_content(&mut self, content: &str) -> Result<()> {
        self.inner.write_str(content)
    }

    fn on_separator(&mut self, separator: Separator) -> Result<()> {
        self.inner.write_str(separator.as_str())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

/// Line splitter that re-emits its input unchanged.
pub type PassThroughSink<S> = LineSplitter<PassThrough<S>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite_in_chunks(text: &str, chunk_len: usize) -> (String, usize) {
        let mut splitter = LineSplitter::new(PassThrough::new(String::new()));
        let mut rest = text;
        while !rest.is_empty() {
            let mut cut = chunk_len.min(rest.len());
            while !rest.is_char_boundary(cut) {
                cut += 1;
            }
            let (chunk, tail) = rest.split_at(cut);
            splitter.write(chunk).unwrap();
            rest = tail;
        }
        splitter.close().unwrap();
        let lines = splitter.line_index();
        (splitter.into_handler().into_inner(), lines)
    }

    #[test]
    fn test_identity_single_chunk() {
        let input = "first\nsecond\r\nthird\rfourth";
        let (output, lines) = rewrite_in_chunks(input, input.len());

        assert_eq!(output, input);
        assert_eq!(lines, 3);
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        let input = "alpha\r\nbeta\rgamma\n\r\ndelta\r";
        let (whole, whole_lines) = rewrite_in_chunks(input, input.len());

        for chunk_len in 1..=input.len() {
            let (output, lines) = rewrite_in_chunks(input, chunk_len);
            assert_eq!(output, whole, "chunk_len={chunk_len}");
            assert_eq!(lines, whole_lines, "chunk_len={chunk_len}");
        }
    }

    #[test]
    fn test_split_crlf_survives_boundary() {
        // The pair must come out as one \r\n, not \r then \n.
        let mut splitter = LineSplitter::new(PassThrough::new(String::new()));
        splitter.write("one\r").unwrap();
        splitter.write("\ntwo\n").unwrap();
        splitter.close().unwrap();

        assert_eq!(splitter.line_index(), 2);
        assert_eq!(splitter.into_handler().into_inner(), "one\r\ntwo\n");
    }

    #[test]
    fn test_empty_stream() {
        let mut splitter = LineSplitter::new(PassThrough::new(String::new()));
        splitter.close().unwrap();

        assert_eq!(splitter.line_index(), 0);
        assert_eq!(splitter.into_handler().into_inner(), "");
    }

    #[test]
    fn test_trailing_cr_emitted_on_close() {
        let mut splitter = LineSplitter::new(PassThrough::new(String::new()));
        splitter.write("tail\r").unwrap();
        splitter.close().unwrap();

        assert_eq!(splitter.into_handler().into_inner(), "tail\r");
    }
}
