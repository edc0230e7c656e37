//! A seekable window over the payload region of a signed package.

use std::io::{self, Read, Seek, SeekFrom};

/// Presents bytes `start..start + len` of `inner` as a standalone stream.
///
/// The zip reader locates its central directory relative to the end of the
/// stream, so the payload must look like a file of its own.
#[derive(Debug)]
pub(crate) struct PayloadSlice<R> {
    inner: R,
    start: u64,
    len: u64,
    position: u64,
}

impl<R: Seek> PayloadSlice<R> {
    pub(crate) fn new(mut inner: R, start: u64, len: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self {
            inner,
            start,
            len,
            position: 0,
        })
    }
}

impl<R: Read> Read for PayloadSlice<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.position);
        let max = usize::try_from(remaining)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        if max == 0 {
            return Ok(0);
        }
        let read = self.inner.read(&mut buf[..max])?;
        self.position = self
            .position
            .saturating_add(u64::try_from(read).unwrap_or(u64::MAX));
        Ok(read)
    }
}

impl<R: Seek> Seek for PayloadSlice<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
        }
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of payload")
        })?;
        let absolute = self.start.checked_add(target).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek offset overflow")
        })?;
        self.inner.seek(SeekFrom::Start(absolute))?;
        self.position = target;
        Ok(target)
    }
}
