use crate::error::{Error, Result};
use crate::scanner::Separator;
use crate::sink::{FileSink, LineHandler, LineSplitter, TextSink};
use std::path::Path;
use tracing::debug;

/// Where the stream currently goes.
///
/// An explicit two-state union keeps "no file open yet" and "file open"
/// impossible to confuse: the path buffer only exists before the header
/// line completes, and the file handle only exists after.
enum Route {
    /// Accumulating the header line as a destination path.
    AwaitingPath(String),
    /// Header seen; all further events go to the file.
    ToFile(FileSink),
}

/// Interprets the first line of the stream as a destination file path and
/// routes everything after it to that file.
///
/// The separator ending the header line is the delimiter between header
/// and body, so it is not written anywhere. Body separators are written
/// to the file literally, preserving the original forms. The file is
/// opened lazily, at the moment the header line's separator arrives —
/// any open failure therefore surfaces inside the `write` call that
/// completed the header line, not at close.
pub struct HeaderRouter {
    route: Route,
}

impl HeaderRouter {
    /// Creates a router with no destination yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            route: Route::AwaitingPath(String::new()),
        }
    }

    /// Path of the routed file, once the header line has completed.
    #[must_use]
    pub fn target(&self) -> Option<&Path> {
        match &self.route {
            Route::AwaitingPath(_) => None,
            Route::ToFile(sink) => Some(sink.path()),
        }
    }
}

impl Default for HeaderRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineHandler for HeaderRouter {
    fn on_content(&mut self, content: &str) -> Result<()> {
        match &mut self.route {
            Route::AwaitingPath(path) => {
                path.push_str(content);
                Ok(())
            }
            Route::ToFile(sink) => sink.write_str(content),
        }
    }

    fn on_separator(&mut self, separator: Separator) -> Result<()> {
        match &mut self.route {
            Route::AwaitingPath(path) => {
                // Any separator kind ends the header line.
                let sink = FileSink::create(path.as_str())?;
                debug!("Routing stream body to {}", sink.path().display());
                self.route = Route::ToFile(sink);
                Ok(())
            }
            Route::ToFile(sink) => sink.write_str(separator.as_str()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match &mut self.route {
            Route::AwaitingPath(_) => Ok(()),
            Route::ToFile(sink) => sink.flush(),
        }
    }

    fn finish(&mut self) -> Result<()> {
        match &mut self.route {
            Route::AwaitingPath(_) => Err(Error::MissingHeaderPath),
            Route::ToFile(sink) => sink.flush(),
        }
    }
}

/// Line splitter that writes its body to the file named by line 0.
pub type HeaderRoutedSink = LineSplitter<HeaderRouter>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_body_lands_in_named_file_without_header() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("routed.txt");

        let mut splitter = LineSplitter::new(HeaderRouter::new());
        let stream = format!("{}\nhello\nworld!\r", target.path().display());
        splitter.write(&stream).unwrap();
        splitter.close().unwrap();

        // Header line and its separator are excluded; body separators are
        // preserved literally.
        target.assert("hello\nworld!\r");
    }

    #[test]
    fn test_header_split_across_chunks() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("split.txt");
        let path = target.path().display().to_string();
        let (head, tail) = path.split_at(path.len() / 2);

        let mut splitter = LineSplitter::new(HeaderRouter::new());
        splitter.write(head).unwrap();
        assert!(splitter.handler().target().is_none());
        splitter.write(tail).unwrap();
        splitter.write("\r\nbody\n").unwrap();
        splitter.close().unwrap();

        target.assert("body\n");
    }

    #[test]
    fn test_crlf_header_terminator_split_across_chunks() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("pair.txt");

        let mut splitter = LineSplitter::new(HeaderRouter::new());
        splitter
            .write(&format!("{}\r", target.path().display()))
            .unwrap();
        // File is not opened while the \r classification is still open.
        assert!(splitter.handler().target().is_none());
        splitter.write("\ncontent").unwrap();
        splitter.close().unwrap();

        target.assert("content");
    }

    #[test]
    fn test_parent_directories_are_created() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("a/b/c/deep.txt");

        let mut splitter = LineSplitter::new(HeaderRouter::new());
        splitter
            .write(&format!("{}\ndata", target.path().display()))
            .unwrap();
        splitter.close().unwrap();

        target.assert("data");
    }

    #[test]
    fn test_close_without_complete_header_fails() {
        let mut splitter = LineSplitter::new(HeaderRouter::new());
        splitter.write("partialpath").unwrap();

        let err = splitter.close().unwrap_err();
        assert!(matches!(err, Error::MissingHeaderPath));
    }

    #[test]
    fn test_close_with_no_input_fails() {
        let mut splitter = LineSplitter::new(HeaderRouter::new());

        let err = splitter.close().unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_target_reports_routed_path() {
        let temp = assert_fs::TempDir::new().unwrap();
        let target = temp.child("known.txt");

        let mut splitter = LineSplitter::new(HeaderRouter::new());
        splitter
            .write(&format!("{}\n", target.path().display()))
            .unwrap();

        assert_eq!(splitter.handler().target(), Some(target.path()));
        splitter.close().unwrap();
    }

    #[test]
    fn test_unwritable_path_fails_inside_write() {
        let temp = assert_fs::TempDir::new().unwrap();
        // A directory cannot be opened as a file.
        let err = {
            let mut splitter = LineSplitter::new(HeaderRouter::new());
            splitter
                .write(&format!("{}\n", temp.path().display()))
                .unwrap_err()
        };
        assert!(err.is_io());
    }
}
