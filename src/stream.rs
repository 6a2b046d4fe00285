//! Bounded in-memory stream adapter
//!
//! [`MemoryStream`] presents the fuzz input as a pull-based byte source. Every
//! read hands out at most `max_chunk` bytes, so a wrapped reader that trusts a
//! declared size from the input can never obtain more than one chunk per
//! call, whatever it does with the claim internally.
//!
//! The adapter speaks the three std I/O traits the wrapped libraries need:
//! `Read` and `Seek` for the ZIP reader, `BufRead` for the XML reader.
//!
//! # Example
//!
//! ```
//! use fuzzbound::{Limits, MemoryStream};
//!
//! # fn main() -> fuzzbound::Result<()> {
//! let data = vec![7u8; 10];
//! let limits = Limits::new().with_max_chunk(4);
//! let mut stream = MemoryStream::open(&data, &limits, None)?;
//!
//! assert_eq!(stream.pull()?.len(), 4);
//! assert_eq!(stream.pull()?.len(), 4);
//! assert_eq!(stream.pull()?.len(), 2);
//! assert!(stream.pull()?.is_empty());
//!
//! let stats = stream.close()?;
//! assert_eq!(stats.bytes_served, 10);
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::limits::Limits;
use crate::session::{Lease, ResourceKind, ResourceLedger};
use std::io::{self, BufRead, Read, Seek, SeekFrom};

/// Counters describing how a stream was consumed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Number of non-empty reads served
    pub reads: usize,
    /// Total bytes handed out across all reads
    pub bytes_served: u64,
    /// Length of the largest single chunk handed out
    pub largest_chunk: usize,
    /// Number of successful seeks
    pub seeks: usize,
}

/// Cursor over an immutable input buffer with a per-read ceiling
#[derive(Debug)]
pub struct MemoryStream<'a> {
    data: &'a [u8],
    offset: usize,
    max_chunk: usize,
    stats: StreamStats,
    _lease: Lease<'a>,
}

impl<'a> MemoryStream<'a> {
    /// Bind a fresh cursor at offset 0 over `data`
    ///
    /// Fails with a setup error when the limits are unusable or the ledger
    /// refuses the stream.
    pub fn open(
        data: &'a [u8],
        limits: &Limits,
        ledger: Option<&'a ResourceLedger>,
    ) -> Result<Self> {
        limits.validate()?;
        let lease = Lease::acquire(ResourceKind::Stream, ledger)?;
        Ok(Self {
            data,
            offset: 0,
            max_chunk: limits.max_chunk(),
            stats: StreamStats::default(),
            _lease: lease,
        })
    }

    /// Current cursor position
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total length of the underlying buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the underlying buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Largest chunk a single read may return
    pub fn max_chunk(&self) -> usize {
        self.max_chunk
    }

    /// Statistics gathered so far
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Return the next chunk and advance past it
    ///
    /// The chunk is `min(remaining, max_chunk)` bytes long; an empty chunk
    /// signals end of stream.
    pub fn pull(&mut self) -> io::Result<&'a [u8]> {
        let window = self.window()?;
        let len = window.len();
        self.advance(len);
        Ok(window)
    }

    /// Release the stream and return its final statistics
    ///
    /// Always succeeds; there is nothing to flush over an in-memory buffer.
    pub fn close(self) -> Result<StreamStats> {
        log::trace!(
            "closing stream at offset {} of {} ({} reads)",
            self.offset,
            self.data.len(),
            self.stats.reads
        );
        Ok(self.stats)
    }

    fn window(&self) -> io::Result<&'a [u8]> {
        let remaining = self.data.len().checked_sub(self.offset).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "stream offset {} past end of {}-byte buffer",
                    self.offset,
                    self.data.len()
                ),
            )
        })?;
        let len = remaining.min(self.max_chunk);
        Ok(&self.data[self.offset..self.offset + len])
    }

    fn advance(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.offset += len;
        self.stats.reads += 1;
        self.stats.bytes_served += len as u64;
        self.stats.largest_chunk = self.stats.largest_chunk.max(len);
    }
}

impl Read for MemoryStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let window = self.window()?;
        let len = window.len().min(buf.len());
        buf[..len].copy_from_slice(&window[..len]);
        self.advance(len);
        Ok(len)
    }
}

impl BufRead for MemoryStream<'_> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.window()
    }

    fn consume(&mut self, amt: usize) {
        let available = self
            .data
            .len()
            .saturating_sub(self.offset)
            .min(self.max_chunk);
        self.advance(amt.min(available));
    }
}

impl Seek for MemoryStream<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.data.len() as i128;
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::End(n) => len + n as i128,
            SeekFrom::Current(n) => self.offset as i128 + n as i128,
        };
        if target < 0 || target > len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seek to {} outside {}-byte buffer", target, len),
            ));
        }
        self.offset = target as usize;
        self.stats.seeks += 1;
        Ok(self.offset as u64)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.offset as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_chunk: usize) -> Limits {
        Limits::new().with_max_chunk(max_chunk)
    }

    #[test]
    fn test_pull_respects_chunk_ceiling() {
        let data: Vec<u8> = (0..=255).collect();
        let limits = limits(100);
        let mut stream = MemoryStream::open(&data, &limits, None).unwrap();

        let sizes: Vec<usize> = std::iter::from_fn(|| {
            let chunk = stream.pull().unwrap();
            (!chunk.is_empty()).then_some(chunk.len())
        })
        .collect();

        assert_eq!(sizes, vec![100, 100, 56]);
        assert_eq!(stream.offset(), 256);
        let stats = stream.close().unwrap();
        assert_eq!(stats.bytes_served, 256);
        assert_eq!(stats.largest_chunk, 100);
        assert_eq!(stats.reads, 3);
    }

    #[test]
    fn test_pull_returns_views_in_order() {
        let data = b"abcdefg".to_vec();
        let limits = limits(3);
        let mut stream = MemoryStream::open(&data, &limits, None).unwrap();
        assert_eq!(stream.pull().unwrap(), b"abc");
        assert_eq!(stream.pull().unwrap(), b"def");
        assert_eq!(stream.pull().unwrap(), b"g");
        assert_eq!(stream.pull().unwrap(), b"");
        assert_eq!(stream.pull().unwrap(), b"");
    }

    #[test]
    fn test_read_is_bounded_by_chunk_and_buffer() {
        let data = vec![1u8; 50];
        let limits = limits(16);
        let mut stream = MemoryStream::open(&data, &limits, None).unwrap();

        let mut big = [0u8; 64];
        assert_eq!(stream.read(&mut big).unwrap(), 16);

        let mut small = [0u8; 4];
        assert_eq!(stream.read(&mut small).unwrap(), 4);

        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        assert_eq!(rest.len(), 30);
        assert_eq!(stream.stats().largest_chunk, 16);
    }

    #[test]
    fn test_bufread_window_and_consume() {
        let data = b"<a>hello</a>".to_vec();
        let limits = limits(5);
        let mut stream = MemoryStream::open(&data, &limits, None).unwrap();

        assert_eq!(stream.fill_buf().unwrap(), b"<a>he");
        stream.consume(2);
        assert_eq!(stream.fill_buf().unwrap(), b">hell");
        // Over-consumption is clamped to the exposed window.
        stream.consume(100);
        assert_eq!(stream.offset(), 7);
        assert_eq!(stream.fill_buf().unwrap(), b"o</a>");
    }

    #[test]
    fn test_seek_bounds_checked() {
        let data = vec![0u8; 20];
        let limits = Limits::new();
        let mut stream = MemoryStream::open(&data, &limits, None).unwrap();

        assert_eq!(stream.seek(SeekFrom::End(-4)).unwrap(), 16);
        assert_eq!(stream.seek(SeekFrom::Current(-6)).unwrap(), 10);
        assert_eq!(stream.seek(SeekFrom::Start(20)).unwrap(), 20);
        assert!(stream.seek(SeekFrom::Start(21)).is_err());
        assert!(stream.seek(SeekFrom::Current(-100)).is_err());
        assert_eq!(stream.offset(), 20);
        assert!(stream.pull().unwrap().is_empty());
        assert_eq!(stream.stats().seeks, 3);
    }

    #[test]
    fn test_zero_chunk_is_a_setup_failure() {
        let data = vec![0u8; 8];
        let limits = limits(0);
        let err = MemoryStream::open(&data, &limits, None).unwrap_err();
        assert_eq!(err.code(), "E4001");
    }

    #[test]
    fn test_stream_lease_released_on_close() {
        let ledger = ResourceLedger::new();
        let data = vec![0u8; 8];
        let limits = Limits::new();
        let stream = MemoryStream::open(&data, &limits, Some(&ledger)).unwrap();
        assert_eq!(ledger.outstanding(ResourceKind::Stream), 1);
        stream.close().unwrap();
        assert_eq!(ledger.released(ResourceKind::Stream), 1);
        assert!(ledger.is_balanced());
    }
}
