use crate::error::{Error, Result};
use crate::scanner::{self, Separator};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Destination for raw text, as consumed by the concrete line handlers.
///
/// This is the outer edge of the splitting machinery: everything that has
/// passed through line recognition is ultimately pushed into one of these.
pub trait TextSink {
    /// Writes raw characters to the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying destination rejects the write.
    fn write_str(&mut self, text: &str) -> Result<()>;

    /// Flushes any buffered output to the destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying destination cannot be flushed.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory destination, mainly useful for testing and for capturing
/// rewritten output without touching the filesystem.
impl TextSink for String {
    fn write_str(&mut self, text: &str) -> Result<()> {
        self.push_str(text);
        Ok(())
    }
}

/// Adapter routing text into any [`std::io::Write`] destination.
///
/// The label is used purely for error context, since generic writers
/// (stdout, pipes, sockets) have no path of their own.
pub struct WriteSink<W> {
    label: PathBuf,
    inner: W,
}

impl<W: Write> WriteSink<W> {
    /// Wraps a writer under the given label.
    #[must_use]
    pub fn new(label: impl Into<PathBuf>, inner: W) -> Self {
        Self {
            label: label.into(),
            inner,
        }
    }

    /// Consumes the sink and returns the wrapped writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> TextSink for WriteSink<W> {
    fn write_str(&mut self, text: &str) -> Result<()> {
        self.inner
            .write_all(text.as_bytes())
            .map_err(|e| Error::io(&self.label, e))
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(|e| Error::io(&self.label, e))
    }
}

/// Buffered file destination that creates missing parent directories
/// when opened.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Opens `path` for writing, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a parent directory or the file itself cannot
    /// be created.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }

        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        debug!("Opened {} for writing", path.display());

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Path this sink writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextSink for FileSink {
    fn write_str(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .map_err(|e| Error::io(&self.path, e))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| Error::io(&self.path, e))
    }
}

/// Receives the line events produced by [`LineSplitter`].
///
/// Content arrives exclusive of its terminator; a line whose text is
/// spread over several chunks produces several `on_content` calls before
/// its single `on_separator` call. Content borrowed from the current
/// chunk is only valid for the duration of the call; implementations that
/// retain it must copy.
pub trait LineHandler {
    /// Called with each non-empty run of line content.
    ///
    /// # Errors
    ///
    /// Errors propagate unmodified to the caller of `write`/`close`.
    fn on_content(&mut self, content: &str) -> Result<()>;

    /// Called once per recognized separator, after the content it ends.
    ///
    /// # Errors
    ///
    /// Errors propagate unmodified to the caller of `write`/`close`.
    fn on_separator(&mut self, separator: Separator) -> Result<()>;

    /// Forwards a flush request to the underlying destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be flushed.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called exactly once when the stream closes, after any carried `\r`
    /// has been resolved and dispatched.
    ///
    /// # Errors
    ///
    /// Returns an error if finalization of the destination fails.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Splits a stream of arbitrarily sized, arbitrarily aligned text chunks
/// into line events and dispatches them to a [`LineHandler`].
///
/// The splitter owns the one bit of state that must survive between
/// chunks — a trailing `\r` whose classification is still open — plus a
/// running count of completed lines. Chunk boundaries are invisible to
/// the handler: a `\r\n` pair split across two `write` calls is delivered
/// as a single separator.
///
/// The `&mut self` receivers enforce the single-writer discipline the
/// carry state requires; no locking is involved.
pub struct LineSplitter<H> {
    handler: H,
    pending_cr: bool,
    lines: usize,
    closed: bool,
}

impl<H: LineHandler> LineSplitter<H> {
    /// Creates a splitter dispatching to `handler`.
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            pending_cr: false,
            lines: 0,
            closed: false,
        }
    }

    /// Feeds one chunk of text through line recognition.
    ///
    /// Events are dispatched strictly in the order they occur in the
    /// original text: a separator carried over from the previous chunk
    /// first, then each content run followed by its terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SinkClosed`] after `close`, and propagates any
    /// handler error immediately. There is no rollback: events dispatched
    /// before the failure have already been delivered, and the carry
    /// state has already advanced past the point of failure.
    pub fn write(&mut self, chunk: &str) -> Result<()> {
        if self.closed {
            return Err(Error::SinkClosed);
        }

        let outcome = scanner::scan(chunk, self.pending_cr);
        self.pending_cr = outcome.pending_cr;

        if let Some(separator) = outcome.resolved {
            self.dispatch_separator(separator)?;
        }

        for segment in outcome.segments {
            if !segment.content.is_empty() {
                self.handler.on_content(segment.content)?;
            }
            if let Some(separator) = segment.separator {
                self.dispatch_separator(separator)?;
            }
        }

        Ok(())
    }

    /// Forwards a flush to the handler. Carry state is untouched.
    ///
    /// # Errors
    ///
    /// Propagates any handler error.
    pub fn flush(&mut self) -> Result<()> {
        self.handler.flush()
    }

    /// Closes the stream.
    ///
    /// A still-pending `\r` resolves to a standalone `CarriageReturn`
    /// separator, exactly as if one final empty chunk had been scanned,
    /// and then the handler's `finish` runs. Closing an already-closed
    /// splitter is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates any handler error from the final separator dispatch or
    /// from finalization.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.pending_cr {
            self.pending_cr = false;
            self.dispatch_separator(Separator::CarriageReturn)?;
        }

        self.handler.finish()
    }

    /// Number of completed lines, i.e. separators dispatched so far.
    #[must_use]
    pub fn line_index(&self) -> usize {
        self.lines
    }

    /// Shared access to the handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Consumes the splitter and returns its handler.
    #[must_use]
    pub fn into_handler(self) -> H {
        self.handler
    }

    fn dispatch_separator(&mut self, separator: Separator) -> Result<()> {
        self.handler.on_separator(separator)?;
        self.lines += 1;
        Ok(())
    }
}
