//! Buffered CSV output with RFC-4180 escaping on the field-wise write path.

use std::io::{self, Write};

use crate::scanner::FieldSlice;

/// Default output buffer size: flushed in whole-buffer writes once full.
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Buffered, RFC-4180-escaping CSV writer. Touched only by the main thread,
/// always after the join point — never shared across workers.
pub struct Writer<W: Write> {
    sink: W,
    buf: Vec<u8>,
    capacity: usize,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W, capacity: usize) -> Writer<W> {
        Writer { sink, buf: Vec::with_capacity(capacity), capacity }
    }

    /// Write one row of already-projected fields, comma-separated, with a
    /// trailing `\n`. Quotes a field iff it contains `,`, `"`, `\r`, or
    /// `\n`; embedded `"` are doubled.
    pub fn write_row(&mut self, fields: &[FieldSlice]) -> io::Result<()> {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.push_byte(b',')?;
            }
            self.write_field(field)?;
        }
        self.push_byte(b'\n')
    }

    fn write_field(&mut self, field: &[u8]) -> io::Result<()> {
        if needs_quoting(field) {
            self.push_byte(b'"')?;
            let mut start = 0;
            for (i, &b) in field.iter().enumerate() {
                if b == b'"' {
                    self.push_bytes(&field[start..=i])?;
                    self.push_byte(b'"')?;
                    start = i + 1;
                }
            }
            self.push_bytes(&field[start..])?;
            self.push_byte(b'"')
        } else {
            self.push_bytes(field)
        }
    }

    fn push_byte(&mut self, b: u8) -> io::Result<()> {
        if self.buf.len() >= self.capacity {
            self.flush_buf()?;
        }
        self.buf.push(b);
        Ok(())
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if bytes.len() >= self.capacity {
            self.flush_buf()?;
            self.sink.write_all(bytes)?;
            return Ok(());
        }
        if self.buf.len() + bytes.len() > self.capacity {
            self.flush_buf()?;
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            self.sink.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Idempotent: calling twice in a row is a no-op the second time.
    pub fn flush(&mut self) -> io::Result<()> {
        self.flush_buf()?;
        self.sink.flush()
    }
}

fn needs_quoting(field: &[u8]) -> bool {
    field.iter().any(|&b| matches!(b, b',' | b'"' | b'\r' | b'\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_rows(rows: &[&[&[u8]]]) -> String {
        let mut out = Vec::new();
        {
            let mut w = Writer::new(&mut out, DEFAULT_BUFFER_SIZE);
            for row in rows {
                w.write_row(row).unwrap();
            }
            w.flush().unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn plain_fields_are_unquoted() {
        let out = write_rows(&[&[b"1", b"a"]]);
        assert_eq!(out, "1,a\n");
    }

    #[test]
    fn field_with_comma_is_quoted() {
        let out = write_rows(&[&[b"hel,lo", b"x"]]);
        assert_eq!(out, "\"hel,lo\",x\n");
    }

    #[test]
    fn embedded_quote_is_doubled() {
        let out = write_rows(&[&[b"he\"llo"]]);
        assert_eq!(out, "\"he\"\"llo\"\n");
    }

    #[test]
    fn field_with_newline_is_quoted() {
        let out = write_rows(&[&[b"a\nb"]]);
        assert_eq!(out, "\"a\nb\"\n");
    }

    #[test]
    fn flush_is_idempotent() {
        let mut out = Vec::new();
        let mut w = Writer::new(&mut out, DEFAULT_BUFFER_SIZE);
        w.write_row(&[b"a"]).unwrap();
        w.flush().unwrap();
        w.flush().unwrap();
        assert_eq!(out, b"a\n");
    }

    #[test]
    fn writes_spanning_small_buffer_boundaries() {
        let mut out = Vec::new();
        let mut w = Writer::new(&mut out, 4);
        for i in 0..20 {
            w.write_row(&[format!("{i}").as_bytes()]).unwrap();
        }
        w.flush().unwrap();
        let expected: String = (0..20).map(|i| format!("{i}\n")).collect();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
}
