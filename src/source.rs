use std::cmp;
use std::fmt;
use std::io;
use std::iter::FusedIterator;

use log::trace;

/// The default size of each chunk read from a `Storage`: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// A random access resource of bytes, such as a file.
///
/// Chunks are always requested in order and never overlap. An
/// implementation must return exactly `end - offset` bytes from
/// `read_range`; `Chunks` reports a short read as an error.
pub trait Storage {
    /// Return the total number of bytes in this resource.
    fn size(&mut self) -> io::Result<u64>;

    /// Read the bytes in `offset..end`.
    ///
    /// Callers guarantee that `offset <= end <= self.size()`.
    fn read_range(&mut self, offset: u64, end: u64) -> io::Result<Vec<u8>>;
}

impl<'a, S: Storage + ?Sized> Storage for &'a mut S {
    fn size(&mut self) -> io::Result<u64> {
        (**self).size()
    }

    fn read_range(&mut self, offset: u64, end: u64) -> io::Result<Vec<u8>> {
        (**self).read_range(offset, end)
    }
}

impl<'a> Storage for &'a [u8] {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_range(&mut self, offset: u64, end: u64) -> io::Result<Vec<u8>> {
        if offset > end || end > self.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "range {}..{} out of bounds for {} bytes",
                    offset,
                    end,
                    self.len()
                ),
            ));
        }
        Ok(self[offset as usize..end as usize].to_vec())
    }
}

/// A `Storage` for any seekable reader, such as a `std::fs::File`.
#[derive(Debug)]
pub struct SeekStorage<R> {
    rdr: R,
}

impl<R: io::Read + io::Seek> SeekStorage<R> {
    /// Wrap a seekable reader.
    pub fn new(rdr: R) -> SeekStorage<R> {
        SeekStorage { rdr: rdr }
    }

    /// Return a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.rdr
    }

    /// Unwrap this storage, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.rdr
    }
}

impl<R: io::Read + io::Seek> Storage for SeekStorage<R> {
    fn size(&mut self) -> io::Result<u64> {
        self.rdr.seek(io::SeekFrom::End(0))
    }

    fn read_range(&mut self, offset: u64, end: u64) -> io::Result<Vec<u8>> {
        let len = end.checked_sub(offset).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "negative range")
        })?;
        self.rdr.seek(io::SeekFrom::Start(offset))?;
        let mut buf = vec![0; len as usize];
        self.rdr.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// A block of bytes read from a fixed offset of a `Storage`.
#[derive(Clone, Eq, PartialEq)]
pub struct ByteChunk {
    offset: u64,
    bytes: Vec<u8>,
}

impl ByteChunk {
    /// Create a chunk of `bytes` that starts at `offset` in its source.
    pub fn new(offset: u64, bytes: Vec<u8>) -> ByteChunk {
        ByteChunk { offset: offset, bytes: bytes }
    }

    /// The offset of the first byte of this chunk in its source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The bytes in this chunk.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The number of bytes in this chunk.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if and only if this chunk has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Unwrap this chunk into its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<ByteChunk> for Vec<u8> {
    fn from(chunk: ByteChunk) -> Vec<u8> {
        chunk.bytes
    }
}

impl fmt::Debug for ByteChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ByteChunk")
            .field("offset", &self.offset)
            .field("bytes", &bstr::BStr::new(&self.bytes))
            .finish()
    }
}

/// A lazy iterator of consecutive chunks of a `Storage`.
///
/// No I/O happens until the first call to `next`, which queries the size of
/// the storage. Every subsequent call issues exactly one `read_range`. The
/// chunks cover the storage with no gaps or overlaps, and only the last one
/// may be shorter than the chunk size.
///
/// Once an error is returned, the iterator yields nothing more.
#[derive(Debug)]
pub struct Chunks<S> {
    storage: S,
    chunk_size: usize,
    offset: u64,
    size: Option<u64>,
    done: bool,
}

impl<S: Storage> Chunks<S> {
    /// Iterate over `storage` in chunks of `DEFAULT_CHUNK_SIZE`.
    pub fn new(storage: S) -> Chunks<S> {
        Chunks::with_chunk_size(storage, DEFAULT_CHUNK_SIZE)
    }

    /// Iterate over `storage` in chunks of at most `chunk_size` bytes.
    ///
    /// # Panics
    ///
    /// When `chunk_size` is `0`.
    pub fn with_chunk_size(storage: S, chunk_size: usize) -> Chunks<S> {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Chunks {
            storage: storage,
            chunk_size: chunk_size,
            offset: 0,
            size: None,
            done: false,
        }
    }

    /// The maximum number of bytes in each chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The offset of the next chunk to be read.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Unwrap this iterator, returning the underlying storage.
    pub fn into_inner(self) -> S {
        self.storage
    }

    fn read_next(&mut self) -> io::Result<Option<ByteChunk>> {
        let size = match self.size {
            Some(size) => size,
            None => {
                let size = self.storage.size()?;
                self.size = Some(size);
                size
            }
        };
        if self.offset >= size {
            return Ok(None);
        }
        let end = cmp::min(size, self.offset + self.chunk_size as u64);
        trace!("reading chunk {}..{} of {}", self.offset, end, size);
        let bytes = self.storage.read_range(self.offset, end)?;
        if bytes.len() as u64 != end - self.offset {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "expected {} bytes at offset {} but got {}",
                    end - self.offset,
                    self.offset,
                    bytes.len()
                ),
            ));
        }
        let chunk = ByteChunk::new(self.offset, bytes);
        self.offset = end;
        Ok(Some(chunk))
    }
}

impl<S: Storage> Iterator for Chunks<S> {
    type Item = io::Result<ByteChunk>;

    fn next(&mut self) -> Option<io::Result<ByteChunk>> {
        if self.done {
            return None;
        }
        match self.read_next() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<S: Storage> FusedIterator for Chunks<S> {}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{ByteChunk, Chunks, SeekStorage, Storage};

    fn collect<S: Storage>(chunks: Chunks<S>) -> Vec<ByteChunk> {
        chunks.map(Result::unwrap).collect()
    }

    #[test]
    fn empty() {
        let data: &[u8] = b"";
        assert!(collect(Chunks::new(data)).is_empty());
    }

    #[test]
    fn exact_multiple() {
        let data: &[u8] = b"abcdef";
        let got = collect(Chunks::with_chunk_size(data, 3));
        assert_eq!(
            got,
            vec![
                ByteChunk::new(0, b"abc".to_vec()),
                ByteChunk::new(3, b"def".to_vec()),
            ]
        );
    }

    #[test]
    fn short_last_chunk() {
        let data: &[u8] = b"abcdefg";
        let got = collect(Chunks::with_chunk_size(data, 3));
        assert_eq!(got.len(), 3);
        assert_eq!(got[2], ByteChunk::new(6, b"g".to_vec()));
        let joined: Vec<u8> =
            got.into_iter().flat_map(ByteChunk::into_bytes).collect();
        assert_eq!(joined, data);
    }

    #[test]
    fn seek_storage() {
        let rdr = io::Cursor::new(b"foo,bar\r\n".to_vec());
        let got = collect(Chunks::with_chunk_size(SeekStorage::new(rdr), 4));
        assert_eq!(got.len(), 3);
        assert_eq!(got[1], ByteChunk::new(4, b"bar\r".to_vec()));
    }

    #[test]
    #[should_panic]
    fn zero_chunk_size() {
        let data: &[u8] = b"abc";
        Chunks::with_chunk_size(data, 0);
    }

    struct Failing {
        reads: usize,
    }

    impl Storage for Failing {
        fn size(&mut self) -> io::Result<u64> {
            Ok(10)
        }

        fn read_range(&mut self, offset: u64, end: u64) -> io::Result<Vec<u8>> {
            self.reads += 1;
            if offset == 0 {
                Ok(vec![b'a'; (end - offset) as usize])
            } else {
                Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
            }
        }
    }

    #[test]
    fn error_fuses() {
        let mut storage = Failing { reads: 0 };
        {
            let mut chunks = Chunks::with_chunk_size(&mut storage, 4);
            assert!(chunks.next().unwrap().is_ok());
            assert!(chunks.next().unwrap().is_err());
            assert!(chunks.next().is_none());
        }
        assert_eq!(storage.reads, 2);
    }

    struct Short;

    impl Storage for Short {
        fn size(&mut self) -> io::Result<u64> {
            Ok(4)
        }

        fn read_range(&mut self, _: u64, _: u64) -> io::Result<Vec<u8>> {
            Ok(vec![b'a'])
        }
    }

    #[test]
    fn short_read_is_error() {
        let mut chunks = Chunks::new(Short);
        let err = chunks.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn lazy() {
        let mut storage = Failing { reads: 0 };
        let chunks = Chunks::new(&mut storage);
        drop(chunks);
        assert_eq!(storage.reads, 0);
    }
}
