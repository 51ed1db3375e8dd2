//! Byte-stream reading for sources that cannot be memory-mapped: piped
//! stdin and files below the mapping-worthwhile size threshold.

use std::io::{self, Read};

use memchr::memchr;

/// Reader window size. Large enough that most rows never straddle a
/// refill, small enough to bound the sequential path's working set.
pub const WINDOW_SIZE: usize = 2 * 1024 * 1024;

/// Double-buffered line reader with putback: a line returned by
/// [`ByteReader::read_line`] is only valid until the next call, after
/// which its backing bytes may have been shifted or overwritten by a
/// refill. This is the non-RFC-4180 fast path: quoted fields are not
/// unescaped here.
pub struct ByteReader<R> {
    inner: R,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> ByteReader<R> {
        ByteReader { inner, buf: vec![0u8; WINDOW_SIZE], start: 0, end: 0, eof: false }
    }

    /// Shift unconsumed bytes to the front of the buffer (the "putback"),
    /// growing the window only if a single line does not fit in it, then
    /// read more bytes from the underlying stream.
    fn fill(&mut self) -> io::Result<()> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if self.end == self.buf.len() {
            let new_len = self.buf.len() * 2;
            self.buf.resize(new_len, 0);
        }
        let n = self.inner.read(&mut self.buf[self.end..])?;
        if n == 0 {
            self.eof = true;
        } else {
            self.end += n;
        }
        Ok(())
    }

    /// Returns the next line's bytes, excluding the trailing `\n` (and a
    /// trailing `\r` immediately before it, if present). `None` at EOF.
    /// The final line is returned even without a trailing `\n`.
    pub fn read_line(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            if let Some(nl) = memchr(b'\n', &self.buf[self.start..self.end]) {
                let line_end = self.start + nl;
                let line_start = self.start;
                self.start = line_end + 1;
                return Ok(Some(&self.buf[line_start..line_end]));
            }
            if self.eof {
                if self.start < self.end {
                    let line_start = self.start;
                    self.start = self.end;
                    return Ok(Some(&self.buf[line_start..self.end]));
                }
                return Ok(None);
            }
            self.fill()?;
        }
    }
}

/// RFC-4180-compliant record parsing: quoted fields, doubled embedded
/// quotes, and `\r\n` row terminators. Used only on the stdin path, where
/// the whole stream is read into memory first — this path trades
/// zero-copy for correctness on a format the mapped hot path explicitly
/// does not support.
pub mod rfc4180 {
    /// Parse the entire buffer into rows of owned fields. Unquoted fields
    /// are copied too, for a uniform `Vec<u8>` row shape; this path is not
    /// performance-critical.
    pub fn parse_records(data: &[u8]) -> Vec<Vec<Vec<u8>>> {
        let mut rows = Vec::new();
        let mut row: Vec<Vec<u8>> = Vec::new();
        let mut field = Vec::new();
        let mut in_quotes = false;
        let mut i = 0;
        let n = data.len();
        let mut row_started = false;

        while i < n {
            let b = data[i];
            if in_quotes {
                if b == b'"' {
                    if i + 1 < n && data[i + 1] == b'"' {
                        field.push(b'"');
                        i += 2;
                        continue;
                    }
                    in_quotes = false;
                    i += 1;
                    continue;
                }
                field.push(b);
                i += 1;
                continue;
            }

            match b {
                b'"' => {
                    in_quotes = true;
                    row_started = true;
                    i += 1;
                }
                b',' => {
                    row.push(std::mem::take(&mut field));
                    row_started = true;
                    i += 1;
                }
                b'\r' => {
                    i += 1;
                }
                b'\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                    row_started = false;
                    i += 1;
                }
                _ => {
                    field.push(b);
                    row_started = true;
                    i += 1;
                }
            }
        }

        if row_started || !field.is_empty() || !row.is_empty() {
            row.push(field);
            rows.push(row);
        }

        rows
    }
}
