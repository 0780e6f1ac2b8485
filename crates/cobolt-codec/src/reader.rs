//! Fixed-length record framing over a byte stream.

use core::fmt;
use std::io::{ErrorKind, Read};

use cobolt_core::function;

pub type FramingResult<T> = Result<T, FramingError>;

pub type FramingError = cobolt_error::Error<FramingErrorKind>;

/// Enum representing the different kinds of record framing errors.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum FramingErrorKind {
    /// The stream ended inside a record.
    TrailingPartialRecord { received: usize, expected: usize },
    /// An I/O error on the underlying stream; details in the source.
    Io,
}

impl std::error::Error for FramingErrorKind {}

impl fmt::Display for FramingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrailingPartialRecord { received, expected } => write!(
                f,
                "truncated trailing record: received {received} bytes, expected {expected} bytes"
            ),
            Self::Io => write!(f, "I/O error while reading records"),
        }
    }
}

/// Streams fixed-length records out of a byte stream.
///
/// Yields exactly one slice per record, reusing an internal buffer of record
/// size; callers must copy a record before reading the next one. A trailing
/// partial record is a framing error, not a short final record. No character
/// decoding happens here.
#[derive(Debug)]
pub struct RecordReader<R> {
    src: R,
    record_len: usize,
    buf: Vec<u8>,
    records_read: u64,
}

impl<R: Read> RecordReader<R> {
    pub fn new(src: R, record_len: usize) -> Self {
        Self {
            src,
            record_len,
            buf: vec![0; record_len],
            records_read: 0,
        }
    }

    #[must_use]
    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// Records yielded so far.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Reads the next record, or `None` at a clean end of stream.
    pub fn read_record(&mut self) -> FramingResult<Option<&[u8]>> {
        let mut filled = 0;

        while filled < self.record_len {
            match self.src.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    return Err(FramingError::new(function!(), FramingErrorKind::Io).with_source(e));
                }
            }
        }

        if filled == 0 {
            return Ok(None);
        }

        if filled < self.record_len {
            return Err(FramingError::new(
                function!(),
                FramingErrorKind::TrailingPartialRecord {
                    received: filled,
                    expected: self.record_len,
                },
            ));
        }

        self.records_read += 1;
        Ok(Some(&self.buf))
    }
}
