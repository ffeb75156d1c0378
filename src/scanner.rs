//! Line boundaries over a raw byte buffer.
//!
//! Every engine operation that numbers rows goes through this module, so a
//! row index means the same line for reads and patches:
//!
//! - a line is the bytes up to a `\n`; `\r` bytes right before it are not content,
//! - lines with no content (`\n`, `\r\n`, `\r\r\n` alone) are skipped and take no index,
//! - a `\r` followed by other bytes on the same line is content,
//! - a trailing line without `\n` still counts when it has content.
//!
//! [`count_newlines`] is the raw pre-pass used for capacity hints. It counts
//! every `\n`, so it can exceed the number of rows the scanner yields.

use memchr::{memchr, memchr_iter};

/// Byte positions of one non-empty line inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    /// Offset of the first content byte.
    pub start: usize,
    /// Offset one past the last content byte (excludes trailing `\r` and `\n`).
    pub end: usize,
    /// Offset where scanning for the following line resumes.
    pub next: usize,
}

impl LineSpan {
    /// Content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false for spans returned by [`next_line`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Find the next non-empty line at or after `from`.
///
/// Holds no borrow past the call, so callers may write into the buffer
/// between lines and resume from [`LineSpan::next`].
#[must_use]
pub fn next_line(buf: &[u8], mut from: usize) -> Option<LineSpan> {
    while from < buf.len() {
        let (term, next) = match memchr(b'\n', &buf[from..]) {
            Some(i) => (from + i, from + i + 1),
            None => (buf.len(), buf.len()),
        };
        let mut end = term;
        while end > from && buf[end - 1] == b'\r' {
            end -= 1;
        }
        if end > from {
            return Some(LineSpan { start: from, end, next });
        }
        from = next;
    }
    None
}

/// Number of `\n` bytes in `buf`.
#[must_use]
pub fn count_newlines(buf: &[u8]) -> usize {
    memchr_iter(b'\n', buf).count()
}

/// One non-empty line and the offset it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Offset of the line's first byte in the scanned buffer.
    pub start: usize,
    /// Line content without terminator.
    pub text: &'a [u8],
}

/// Lazy iterator over the non-empty lines of a buffer.
///
/// # Examples
///
/// ```
/// use mmap_records::scanner::LineScanner;
///
/// let lines: Vec<_> = LineScanner::new(b"a b\r\n\r\nc d\n")
///     .map(|l| (l.start, l.text))
///     .collect();
/// assert_eq!(lines, vec![(0, &b"a b"[..]), (7, &b"c d"[..])]);
/// ```
#[derive(Debug, Clone)]
pub struct LineScanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> LineScanner<'a> {
    /// Scan `buf` from the beginning.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let span = next_line(self.buf, self.pos)?;
        self.pos = span.next;
        Some(Line {
            start: span.start,
            text: &self.buf[span.start..span.end],
        })
    }
}
