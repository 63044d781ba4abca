//! 80-byte record framing.
//!
//! Every part of a transport file is a sequence of 80-byte records. The
//! reader pads a short final record with blanks; the writer packs byte spans
//! end to end and pads the last partial record with its fill byte.

use std::io::{ErrorKind as IoErrorKind, Read, Write};

use crate::error::{Result, XptError};

/// Record length in bytes.
pub const RECORD_LEN: usize = 80;

/// One fixed-size record.
pub type Record = [u8; RECORD_LEN];

/// Align a size to the next record boundary (80 bytes).
#[must_use]
pub fn align_to_record(size: usize) -> usize {
    size.div_ceil(RECORD_LEN) * RECORD_LEN
}

/// Pull-based reader of 80-byte records.
///
/// Holds at most one record of look-ahead.
pub struct RecordReader<R: Read> {
    source: R,
    peeked: Option<Option<(Record, bool)>>,
    bytes_read: u64,
    records_read: usize,
    last_padded: bool,
}

impl<R: Read> RecordReader<R> {
    /// Wrap a byte source.
    pub fn new(source: R) -> Self {
        Self {
            source,
            peeked: None,
            bytes_read: 0,
            records_read: 0,
            last_padded: false,
        }
    }

    /// Read the next record, padding a short tail with blanks.
    ///
    /// Returns `Ok(None)` at end of stream. A stream with no bytes at all is
    /// an [`XptError::EmptyInput`].
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let next = match self.peeked.take() {
            Some(next) => next,
            None => self.fill()?,
        };
        Ok(next.map(|(record, padded)| {
            self.records_read += 1;
            self.last_padded = padded;
            record
        }))
    }

    /// Look at the next record without consuming it.
    pub fn peek_record(&mut self) -> Result<Option<&Record>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.fill()?);
        }
        Ok(self
            .peeked
            .as_ref()
            .and_then(|next| next.as_ref().map(|(record, _)| record)))
    }

    /// Read a record that must be present in full.
    ///
    /// Header and NAMESTR records may not be padded.
    pub fn read_full_record(&mut self, expected: &'static str) -> Result<Record> {
        match self.next_record()? {
            Some(record) if !self.last_padded => Ok(record),
            _ => Err(XptError::TruncatedRecord { expected }),
        }
    }

    /// Whether the record last returned was padded.
    #[must_use]
    pub fn last_was_padded(&self) -> bool {
        self.last_padded
    }

    /// Number of records returned so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    fn fill(&mut self) -> Result<Option<(Record, bool)>> {
        let mut record = [b' '; RECORD_LEN];
        let mut filled = 0usize;
        while filled < RECORD_LEN {
            match self.source.read(&mut record[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == IoErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        if filled == 0 {
            if self.bytes_read == 0 {
                return Err(XptError::EmptyInput);
            }
            return Ok(None);
        }

        self.bytes_read += filled as u64;
        Ok(Some((record, filled < RECORD_LEN)))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Writer packing byte spans into 80-byte records.
pub struct RecordWriter<W: Write> {
    writer: W,
    record: Record,
    pos: usize,
    fill: u8,
    bytes_written: u64,
}

impl<W: Write> RecordWriter<W> {
    /// Writer padding with spaces.
    pub fn new(writer: W) -> Self {
        Self::with_fill(writer, b' ')
    }

    /// Writer padding with `fill`.
    pub fn with_fill(writer: W, fill: u8) -> Self {
        Self {
            writer,
            record: [fill; RECORD_LEN],
            pos: 0,
            fill,
            bytes_written: 0,
        }
    }

    /// Append bytes, emitting each record as it fills up.
    pub fn write_bytes(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            let take = (RECORD_LEN - self.pos).min(bytes.len());

            self.record[self.pos..self.pos + take].copy_from_slice(&bytes[..take]);
            self.pos += take;
            bytes = &bytes[take..];

            if self.pos == RECORD_LEN {
                self.emit()?;
            }
        }
        Ok(())
    }

    /// Write a whole record, starting a new record first if one is pending.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        self.pad()?;
        self.writer.write_all(record)?;
        self.bytes_written += RECORD_LEN as u64;
        Ok(())
    }

    /// Pad and write the pending partial record, then flush the sink.
    ///
    /// Calling this again with nothing pending writes nothing.
    pub fn flush(&mut self) -> Result<()> {
        self.pad()?;
        self.writer.flush()?;
        Ok(())
    }

    /// Pad and write the pending partial record, if any.
    pub fn pad(&mut self) -> Result<()> {
        if self.pos > 0 {
            self.record[self.pos..].fill(self.fill);
            self.emit()?;
        }
        Ok(())
    }

    /// Total bytes handed to the underlying writer.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush and give back the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }

    fn emit(&mut self) -> Result<()> {
        self.writer.write_all(&self.record)?;
        self.bytes_written += RECORD_LEN as u64;
        self.record = [self.fill; RECORD_LEN];
        self.pos = 0;
        Ok(())
    }
}
