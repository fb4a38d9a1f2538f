// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Line-oriented source buffer.
//!
//! The lexer never sees the whole input at once. It reads one physical line
//! at a time through [`SourceBuffer::refill_line`], which pulls from either an
//! in-memory byte slice or a blocking [`BufRead`] reader. Fetched lines are
//! retained so the cursor can jump backwards, which is how heredoc bodies are
//! read ahead of the rest of their opening line.
//!
//! Line endings are normalized on fetch: a trailing `\r\n` becomes `\n`. All
//! offsets handed out by the buffer index into the normalized text.

use std::io::{self, BufRead};

use super::{Location, Span};

/// The UTF-8 byte order mark.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A producer of physical source lines.
pub trait LineSource {
    /// Appends the next physical line, including its `\n` if present, to `buf`.
    ///
    /// Returns `Ok(false)` once the input is exhausted.
    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<bool>;
}

/// A line source over an in-memory byte slice.
#[derive(Debug)]
pub struct BytesSource<'src> {
    bytes: &'src [u8],
    pos: usize,
}

impl<'src> BytesSource<'src> {
    /// Creates a source reading from `bytes`.
    #[must_use]
    pub fn new(bytes: &'src [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl LineSource for BytesSource<'_> {
    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<bool> {
        let rest = &self.bytes[self.pos..];
        if rest.is_empty() {
            return Ok(false);
        }
        let len = rest
            .iter()
            .position(|&b| b == b'\n')
            .map_or(rest.len(), |i| i + 1);
        buf.extend_from_slice(&rest[..len]);
        self.pos += len;
        Ok(true)
    }
}

/// A line source over a blocking reader ("gets"-style).
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    /// Creates a source pulling lines from `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<bool> {
        Ok(self.reader.read_until(b'\n', buf)? > 0)
    }
}

/// A fetched physical line.
#[derive(Debug, Clone, Copy)]
struct LineInfo {
    start: usize,
    end: usize,
    number: u32,
}

/// A saved cursor position, used for heredoc resumption and newline lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    current: Option<usize>,
    next_line: usize,
    pos: usize,
}

/// The lexer's view of the input: a cursor over the current physical line.
pub struct SourceBuffer<'src> {
    source: Box<dyn LineSource + 'src>,
    text: Vec<u8>,
    lines: Vec<LineInfo>,
    current: Option<usize>,
    next_line: usize,
    pos: usize,
    first_line: u32,
    exhausted: bool,
    had_bom: bool,
    io_error: Option<io::Error>,
    token_start: Location,
}

impl std::fmt::Debug for SourceBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceBuffer")
            .field("lines", &self.lines.len())
            .field("current", &self.current)
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}

impl<'src> SourceBuffer<'src> {
    /// Creates a buffer over an arbitrary line source.
    pub fn new(source: Box<dyn LineSource + 'src>, first_line: u32) -> Self {
        Self {
            source,
            text: Vec::new(),
            lines: Vec::new(),
            current: None,
            next_line: 0,
            pos: 0,
            first_line,
            exhausted: false,
            had_bom: false,
            io_error: None,
            token_start: Location::new(0, first_line, 0),
        }
    }

    /// Creates a buffer over in-memory bytes.
    #[must_use]
    pub fn from_bytes(bytes: &'src [u8], first_line: u32) -> Self {
        Self::new(Box::new(BytesSource::new(bytes)), first_line)
    }

    /// Creates a buffer over a blocking reader.
    pub fn from_reader<R: BufRead + 'src>(reader: R, first_line: u32) -> Self {
        Self::new(Box::new(ReaderSource::new(reader)), first_line)
    }

    // ========================================================================
    // Line management
    // ========================================================================

    /// Moves the cursor to the start of the next physical line.
    ///
    /// Lines are handed out in sequence regardless of where the cursor was
    /// restored to, so lines consumed by a heredoc body are not revisited.
    /// Returns `false` at end of input.
    pub fn refill_line(&mut self) -> bool {
        if self.next_line >= self.lines.len() && !self.fetch_line() {
            return false;
        }
        let line = self.lines[self.next_line];
        self.current = Some(self.next_line);
        self.next_line += 1;
        self.pos = line.start;
        true
    }

    fn fetch_line(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        let start = self.text.len();
        match self.source.read_line(&mut self.text) {
            Ok(true) => {}
            Ok(false) => {
                self.exhausted = true;
                return false;
            }
            Err(err) => {
                self.text.truncate(start);
                self.exhausted = true;
                self.io_error = Some(err);
                return false;
            }
        }
        if self.lines.is_empty() && self.text[start..].starts_with(UTF8_BOM) {
            self.text.drain(start..start + UTF8_BOM.len());
            self.had_bom = true;
        }
        if self.text[start..].ends_with(b"\r\n") {
            let len = self.text.len();
            self.text.remove(len - 2);
        }
        let number = self.first_line + u32::try_from(self.lines.len()).unwrap_or(u32::MAX);
        self.lines.push(LineInfo {
            start,
            end: self.text.len(),
            number,
        });
        true
    }

    fn line(&self) -> Option<LineInfo> {
        self.current.map(|i| self.lines[i])
    }

    fn line_end(&self) -> usize {
        self.line().map_or(0, |l| l.end)
    }

    fn line_start(&self) -> usize {
        self.line().map_or(0, |l| l.start)
    }

    // ========================================================================
    // Cursor
    // ========================================================================

    /// Peeks `offset` bytes ahead of the cursor within the current line.
    #[must_use]
    pub fn peek(&self, offset: usize) -> Option<u8> {
        let idx = self.pos + offset;
        (self.current.is_some() && idx < self.line_end()).then(|| self.text[idx])
    }

    /// Returns true if the byte at `offset` equals `byte`.
    #[must_use]
    pub fn peek_is(&self, offset: usize, byte: u8) -> bool {
        self.peek(offset) == Some(byte)
    }

    /// Consumes one byte, pulling a new line when the current one is used up.
    ///
    /// `None` is the end-of-input sentinel.
    pub fn advance(&mut self) -> Option<u8> {
        while self.current.is_none() || self.pos >= self.line_end() {
            if !self.refill_line() {
                return None;
            }
        }
        let byte = self.text[self.pos];
        self.pos += 1;
        Some(byte)
    }

    /// Pushes back the byte most recently returned by [`advance`](Self::advance).
    ///
    /// Pushing back the end-of-input sentinel is a no-op.
    pub fn unget(&mut self, byte: Option<u8>) {
        if byte.is_some() && self.pos > self.line_start() {
            self.pos -= 1;
        }
    }

    /// Skips `n` bytes of the current line.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.line_end());
    }

    /// Returns true if the cursor sits at the end of the current line.
    #[must_use]
    pub fn at_eol(&self) -> bool {
        self.pos >= self.line_end()
    }

    /// Moves the cursor past the rest of the current line.
    pub fn goto_eol(&mut self) {
        self.pos = self.line_end();
    }

    /// Returns true if exactly one byte of the current line has been consumed.
    #[must_use]
    pub fn was_bol(&self) -> bool {
        self.current.is_some() && self.pos == self.line_start() + 1
    }

    /// Returns true if nothing of the current line has been consumed.
    #[must_use]
    pub fn at_bol(&self) -> bool {
        self.current.is_some() && self.pos == self.line_start()
    }

    /// Returns the unread remainder of the current line.
    #[must_use]
    pub fn rest_of_line(&self) -> &[u8] {
        if self.current.is_none() {
            return &[];
        }
        &self.text[self.pos..self.line_end()]
    }

    /// Returns the whole current line.
    #[must_use]
    pub fn current_line(&self) -> &[u8] {
        &self.text[self.line_start()..self.line_end()]
    }

    /// Returns the 0-based index of the current line among fetched lines.
    #[must_use]
    pub fn line_index(&self) -> Option<usize> {
        self.current
    }

    /// Returns the current cursor location.
    #[must_use]
    pub fn location(&self) -> Location {
        let line = self.line();
        let number = line.map_or(self.first_line, |l| l.number);
        let start = line.map_or(0, |l| l.start);
        Location::new(
            offset_u32(self.pos),
            number,
            offset_u32(self.pos.saturating_sub(start)),
        )
    }

    /// Marks the cursor as the start of the token being assembled.
    pub fn mark_token_start(&mut self) {
        self.token_start = self.location();
    }

    /// Returns the start location of the token being assembled.
    #[must_use]
    pub fn token_start(&self) -> Location {
        self.token_start
    }

    /// Returns the span from the marked token start to the cursor.
    #[must_use]
    pub fn current_span(&self) -> Span {
        Span::new(self.token_start, self.location())
    }

    /// Saves the cursor.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            current: self.current,
            next_line: self.next_line,
            pos: self.pos,
        }
    }

    /// Restores the cursor, including which line is fetched next.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.current = checkpoint.current;
        self.next_line = checkpoint.next_line;
        self.pos = checkpoint.pos;
    }

    /// Returns the cursor to a saved position without rewinding line fetching.
    ///
    /// Used when a heredoc body has been consumed: tokenizing resumes on the
    /// opening line, but the next line handed out is the one after the
    /// terminator.
    pub fn resume_at(&mut self, checkpoint: Checkpoint) {
        self.current = checkpoint.current;
        self.pos = checkpoint.pos;
    }

    // ========================================================================
    // Text access
    // ========================================================================

    /// Returns all normalized text fetched so far.
    #[must_use]
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Returns the text covered by `span`.
    #[must_use]
    pub fn slice(&self, span: Span) -> &[u8] {
        let range = span.as_range();
        self.text.get(range).unwrap_or(&[])
    }

    /// Returns the text of a line by its line number, without the newline.
    #[must_use]
    pub fn line_text(&self, number: u32) -> Option<&[u8]> {
        let index = number.checked_sub(self.first_line)? as usize;
        let line = self.lines.get(index)?;
        let bytes = &self.text[line.start..line.end];
        Some(bytes.strip_suffix(b"\n").unwrap_or(bytes))
    }

    /// Returns true if the first line began with a UTF-8 byte order mark.
    #[must_use]
    pub fn had_bom(&self) -> bool {
        self.had_bom
    }

    /// Takes the I/O error that ended reading early, if any.
    pub fn take_io_error(&mut self) -> Option<io::Error> {
        self.io_error.take()
    }
}

fn offset_u32(offset: usize) -> u32 {
    u32::try_from(offset).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut SourceBuffer<'_>) -> Vec<u8> {
        std::iter::from_fn(|| buffer.advance()).collect()
    }

    #[test]
    fn reads_all_bytes_across_lines() {
        let mut buffer = SourceBuffer::from_bytes(b"ab\ncd", 1);
        assert_eq!(drain(&mut buffer), b"ab\ncd");
        assert_eq!(buffer.advance(), None);
    }

    #[test]
    fn crlf_is_normalized() {
        let mut buffer = SourceBuffer::from_bytes(b"a\r\nb\r\n", 1);
        assert_eq!(drain(&mut buffer), b"a\nb\n");
        assert_eq!(buffer.text(), b"a\nb\n");
    }

    #[test]
    fn bare_carriage_return_is_kept() {
        let mut buffer = SourceBuffer::from_bytes(b"a\rb\n", 1);
        assert_eq!(drain(&mut buffer), b"a\rb\n");
    }

    #[test]
    fn bom_is_stripped() {
        let mut buffer = SourceBuffer::from_bytes(b"\xEF\xBB\xBFx\n", 1);
        assert_eq!(drain(&mut buffer), b"x\n");
        assert!(buffer.had_bom());
    }

    #[test]
    fn peek_stays_on_current_line() {
        let mut buffer = SourceBuffer::from_bytes(b"ab\ncd", 1);
        assert_eq!(buffer.advance(), Some(b'a'));
        assert_eq!(buffer.peek(0), Some(b'b'));
        assert_eq!(buffer.peek(1), Some(b'\n'));
        assert_eq!(buffer.peek(2), None);
    }

    #[test]
    fn unget_moves_back_within_line() {
        let mut buffer = SourceBuffer::from_bytes(b"xy", 1);
        let x = buffer.advance();
        buffer.unget(x);
        assert_eq!(buffer.advance(), Some(b'x'));
        buffer.unget(None);
        assert_eq!(buffer.advance(), Some(b'y'));
    }

    #[test]
    fn locations_track_lines_and_columns() {
        let mut buffer = SourceBuffer::from_bytes(b"ab\ncd", 10);
        buffer.advance();
        buffer.advance();
        buffer.advance();
        buffer.advance();
        let loc = buffer.location();
        assert_eq!(loc.line, 11);
        assert_eq!(loc.column, 1);
        assert_eq!(loc.offset, 4);
    }

    #[test]
    fn resume_keeps_sequential_line_fetching() {
        let mut buffer = SourceBuffer::from_bytes(b"one\ntwo\nthree\n", 1);
        buffer.advance();
        let saved = buffer.checkpoint();
        buffer.goto_eol();
        assert_eq!(buffer.advance(), Some(b't'));
        buffer.goto_eol();
        buffer.resume_at(saved);
        assert_eq!(drain(&mut buffer), b"ne\nthree\n");
    }

    #[test]
    fn restore_rewinds_line_fetching() {
        let mut buffer = SourceBuffer::from_bytes(b"a\nb\n", 1);
        buffer.advance();
        let saved = buffer.checkpoint();
        assert_eq!(drain(&mut buffer), b"\nb\n");
        buffer.restore(saved);
        assert_eq!(drain(&mut buffer), b"\nb\n");
    }

    #[test]
    fn reader_source_matches_bytes_source() {
        let input = b"x = 1\r\ny = 2\n";
        let mut from_bytes = SourceBuffer::from_bytes(input, 1);
        let mut from_reader = SourceBuffer::from_reader(&input[..], 1);
        assert_eq!(drain(&mut from_bytes), drain(&mut from_reader));
    }

    #[test]
    fn line_text_strips_newline() {
        let mut buffer = SourceBuffer::from_bytes(b"first\nsecond\n", 1);
        drain(&mut buffer);
        assert_eq!(buffer.line_text(2), Some(&b"second"[..]));
        assert_eq!(buffer.line_text(3), None);
    }
}
