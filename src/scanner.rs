use memchr::memchr2;

/// Which of the three recognized forms terminated a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `"\n"`
    LineFeed,
    /// `"\r"` not followed by `"\n"`
    CarriageReturn,
    /// `"\r\n"`, including pairs split across two chunks
    CarriageReturnLineFeed,
}

impl Separator {
    /// Returns the literal separator text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LineFeed => "\n",
            Self::CarriageReturn => "\r",
            Self::CarriageReturnLineFeed => "\r\n",
        }
    }
}

/// A run of line content borrowed from the scanned chunk, together with the
/// separator that ended it.
///
/// `separator` is `None` when the chunk ran out before the line did; the
/// line continues in a later chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Content exclusive of its terminator; may be empty for blank lines.
    pub content: &'a str,
    /// Terminator, if one was seen inside this chunk.
    pub separator: Option<Separator>,
}

/// Result of scanning one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome<'a> {
    /// Separator resolved from a `\r` carried out of the previous chunk.
    /// Logically precedes every segment in `segments`.
    pub resolved: Option<Separator>,

    /// Content runs in chunk order, each with its terminator if seen.
    pub segments: Vec<Segment<'a>>,

    /// True when this chunk ended with a `\r` whose classification needs
    /// the next character.
    pub pending_cr: bool,
}

/// Scans one chunk for line boundaries.
///
/// `pending_cr` carries the single bit of state that survives between
/// chunks: the previous chunk ended with a `\r` and it is not yet known
/// whether a `\n` follows. A `\r\n` pair split across two deliveries must
/// be recognized as one separator, never as two lines, so the carried `\r`
/// is resolved against this chunk's first character before the forward
/// scan starts. The resolved separator is reported out of band (in
/// [`ScanOutcome::resolved`]) because it belongs to text the caller no
/// longer holds.
///
/// A bare `\r` mid-chunk is a first-class `CarriageReturn` terminator, not
/// plain content. Separators are ASCII, so byte offsets from the `memchr`
/// search are always valid `str` boundaries.
#[must_use]
pub fn scan(chunk: &str, pending_cr: bool) -> ScanOutcome<'_> {
    let bytes = chunk.as_bytes();
    let mut resolved = None;
    let mut pos = 0;

    if pending_cr {
        if bytes.first() == Some(&b'\n') {
            resolved = Some(Separator::CarriageReturnLineFeed);
            pos = 1;
        } else {
            // Anything else, including an empty chunk, refutes the pair.
            resolved = Some(Separator::CarriageReturn);
        }
    }

    let mut segments = Vec::new();
    let mut pending = false;

    while pos < bytes.len() {
        let Some(found) = memchr2(b'\n', b'\r', &bytes[pos..]) else {
            // Unterminated trailing content; the line continues later.
            segments.push(Segment {
                content: &chunk[pos..],
                separator: None,
            });
            break;
        };

        let at = pos + found;
        let content = &chunk[pos..at];

        if bytes[at] == b'\n' {
            segments.push(Segment {
                content,
                separator: Some(Separator::LineFeed),
            });
            pos = at + 1;
        } else if at + 1 == bytes.len() {
            // `\r` at the very end of the chunk; classification waits for
            // the next delivery.
            if !content.is_empty() {
                segments.push(Segment {
                    content,
                    separator: None,
                });
            }
            pending = true;
            break;
        } else if bytes[at + 1] == b'\n' {
            segments.push(Segment {
                content,
                separator: Some(Separator::CarriageReturnLineFeed),
            });
            pos = at + 2;
        } else {
            segments.push(Segment {
                content,
                separator: Some(Separator::CarriageReturn),
            });
            pos = at + 1;
        }
    }

    ScanOutcome {
        resolved,
        segments,
        pending_cr: pending,
    }
}
