//! Pull-based byte producers backing a response.

use crate::errors::ErrorKind;
use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

/// A size-bounded byte producer the response is drained from.
///
/// [`size`](ResponseSource::size) is known up front, it becomes the
/// `Content-Length`. [`read_some`](ResponseSource::read_some) hands out the
/// next bytes and returns `0` once everything was produced.
///
/// # Examples
/// ```
/// use webapp_http::{BufferSource, ResponseSource};
///
/// let mut source = BufferSource::new("Hello");
/// let mut out = [0; 3];
///
/// assert_eq!(source.size(), 5);
/// assert_eq!(source.read_some(&mut out).unwrap(), 3);
/// assert_eq!(&out, b"Hel");
/// assert_eq!(source.read_some(&mut out).unwrap(), 2);
/// assert_eq!(source.read_some(&mut out).unwrap(), 0);
/// ```
pub trait ResponseSource: Send {
    fn is_available(&self) -> bool;

    /// Total number of bytes the source produces.
    fn size(&self) -> usize;

    /// Copies the next bytes into `out`, `Ok(0)` once drained.
    fn read_some(&mut self, out: &mut [u8]) -> io::Result<usize>;
}

/// Reads a file from disk in pieces.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    size: usize,
    left: usize,
}

impl FileSource {
    /// Opens `path` for reading.
    ///
    /// Fails with [`ErrorKind::SourceUnavailable`] when the path cannot be
    /// opened or is not a regular file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ErrorKind> {
        let file = File::open(path).map_err(|_| ErrorKind::SourceUnavailable)?;
        let meta = file.metadata().map_err(|_| ErrorKind::SourceUnavailable)?;

        if !meta.is_file() {
            return Err(ErrorKind::SourceUnavailable);
        }

        let size = usize::try_from(meta.len()).map_err(|_| ErrorKind::SourceUnavailable)?;
        Ok(Self { file, size, left: size })
    }
}

impl ResponseSource for FileSource {
    #[inline]
    fn is_available(&self) -> bool {
        true
    }

    #[inline]
    fn size(&self) -> usize {
        self.size
    }

    // Never reads past the size announced in `Content-Length`, even if the
    // file grows meanwhile.
    fn read_some(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let limit = out.len().min(self.left);
        if limit == 0 {
            return Ok(0);
        }

        let read = self.file.read(&mut out[..limit])?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file shrank while being sent",
            ));
        }

        self.left -= read;
        Ok(read)
    }
}

/// Owned in-memory bytes.
#[derive(Debug, Clone, Default)]
pub struct BufferSource {
    data: Vec<u8>,
    offset: usize,
}

impl BufferSource {
    #[inline]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            offset: 0,
        }
    }
}

impl ResponseSource for BufferSource {
    #[inline]
    fn is_available(&self) -> bool {
        true
    }

    #[inline]
    fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn read_some(&mut self, out: &mut [u8]) -> io::Result<usize> {
        Ok(copy_from(&self.data, &mut self.offset, out))
    }
}

/// Static bytes, nothing is copied until the response is sent.
#[derive(Debug, Clone, Copy)]
pub struct ArraySource {
    data: &'static [u8],
    offset: usize,
}

impl ArraySource {
    #[inline]
    pub const fn new(data: &'static [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl ResponseSource for ArraySource {
    #[inline]
    fn is_available(&self) -> bool {
        true
    }

    #[inline]
    fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn read_some(&mut self, out: &mut [u8]) -> io::Result<usize> {
        Ok(copy_from(self.data, &mut self.offset, out))
    }
}

#[inline(always)]
fn copy_from(data: &[u8], offset: &mut usize, out: &mut [u8]) -> usize {
    let rest = &data[*offset..];
    let count = rest.len().min(out.len());

    out[..count].copy_from_slice(&rest[..count]);
    *offset += count;
    count
}
