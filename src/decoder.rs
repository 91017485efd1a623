use std::fmt;
use std::io;
use std::iter::FusedIterator;
use std::str;

use log::{trace, warn};

use crate::error::{Error, Result};
use crate::source::{Chunks, Storage};

/// Returns the length in bytes of the UTF-8 sequence that starts with the
/// leading byte `b`.
///
/// Only leading bytes are classified. A continuation byte (`0x80..=0xBF`)
/// is reported as a sequence of length `1`.
#[inline]
pub fn utf8_len(b: u8) -> usize {
    if b >= 0xF0 {
        4
    } else if b >= 0xE0 {
        3
    } else if b >= 0xC0 {
        2
    } else {
        1
    }
}

/// A complete UTF-8 sequence of one to four bytes.
///
/// The length of a character always matches the length declared by its
/// leading byte. The bytes themselves are not validated; use `to_char` to
/// check that they encode a Unicode scalar value.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Character {
    buf: [u8; 4],
    len: u8,
}

impl Character {
    fn from_slice(bytes: &[u8]) -> Character {
        debug_assert!(!bytes.is_empty() && bytes.len() <= 4);
        let mut buf = [0; 4];
        buf[..bytes.len()].copy_from_slice(bytes);
        Character { buf: buf, len: bytes.len() as u8 }
    }

    /// The bytes of this character.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// The number of bytes in this character.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Convert this character to a `char`.
    ///
    /// Returns `None` if the bytes are not valid UTF-8.
    pub fn to_char(&self) -> Option<char> {
        str::from_utf8(self.as_bytes()).ok().and_then(|s| s.chars().next())
    }
}

impl fmt::Debug for Character {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Character({:?})", bstr::BStr::new(self.as_bytes()))
    }
}

/// What to do when the input ends in the middle of a character.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Truncated {
    /// Report `Error::Truncated` as the final item.
    Error,
    /// Log a warning and drop the incomplete bytes.
    Warn,
}

impl Default for Truncated {
    fn default() -> Truncated {
        Truncated::Error
    }
}

/// The bytes of a character that straddles a chunk boundary.
///
/// A fragment is never complete: `0 < len < utf8_len(buf[0])` whenever it
/// is non-empty.
#[derive(Clone, Debug, Default)]
struct Fragment {
    buf: [u8; 4],
    len: usize,
    offset: u64,
}

impl Fragment {
    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn expected(&self) -> usize {
        utf8_len(self.buf[0])
    }

    /// The number of bytes still needed to complete the character.
    fn need(&self) -> usize {
        self.expected() - self.len
    }

    fn start(&mut self, offset: u64, bytes: &[u8]) {
        self.len = 0;
        self.offset = offset;
        self.extend(bytes);
    }

    fn extend(&mut self, bytes: &[u8]) {
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }

    fn take(&mut self) -> Character {
        let ch = Character::from_slice(&self.buf[..self.len]);
        self.len = 0;
        ch
    }
}

/// A lazy iterator of characters decoded from a sequence of byte chunks.
///
/// Characters whose bytes straddle a chunk boundary are stitched back
/// together, so for any partitioning of the same bytes into chunks, the
/// decoder yields the same characters. Every character is yielded exactly
/// once, in order.
///
/// A new chunk is only pulled from the underlying iterator once the current
/// one has been fully decoded. Dropping the decoder discards any pending
/// fragment.
#[derive(Debug)]
pub struct Decoder<I> {
    chunks: I,
    chunk: Vec<u8>,
    /// The position of the next undecoded byte in `chunk`.
    pos: usize,
    /// The absolute offset of the start of `chunk`.
    chunk_offset: u64,
    /// The absolute offset of the most recently yielded character.
    offset: u64,
    frag: Fragment,
    truncated: Truncated,
    done: bool,
}

/// Decode the characters of `storage` in chunks of `DEFAULT_CHUNK_SIZE`.
pub fn decode<S: Storage>(storage: S) -> Decoder<Chunks<S>> {
    Decoder::new(Chunks::new(storage))
}

impl<I> Decoder<I> {
    /// Create a decoder over the given chunks.
    ///
    /// Each chunk may be any type that converts into a `Vec<u8>`, such as a
    /// `ByteChunk`.
    pub fn new(chunks: I) -> Decoder<I> {
        Decoder {
            chunks: chunks,
            chunk: vec![],
            pos: 0,
            chunk_offset: 0,
            offset: 0,
            frag: Fragment::default(),
            truncated: Truncated::default(),
            done: false,
        }
    }

    /// Set the policy for input that ends inside a character.
    ///
    /// The default is `Truncated::Error`.
    pub fn truncated(mut self, policy: Truncated) -> Decoder<I> {
        self.truncated = policy;
        self
    }

    /// The byte offset at which the most recently yielded character began.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn finish(&mut self) -> Option<Result<Character>> {
        if self.frag.is_empty() {
            return None;
        }
        let (offset, len, expected) =
            (self.frag.offset, self.frag.len, self.frag.expected());
        self.frag.len = 0;
        match self.truncated {
            Truncated::Error => {
                Some(Err(Error::Truncated { offset, len, expected }))
            }
            Truncated::Warn => {
                warn!(
                    "input ended inside a {}-byte character at byte {} \
                     ({} bytes available), dropping it",
                    expected, offset, len
                );
                None
            }
        }
    }
}

impl<I, B> Iterator for Decoder<I>
where
    I: Iterator<Item = io::Result<B>>,
    B: Into<Vec<u8>>,
{
    type Item = Result<Character>;

    fn next(&mut self) -> Option<Result<Character>> {
        loop {
            if self.done {
                return None;
            }
            if self.pos < self.chunk.len() {
                let n = utf8_len(self.chunk[self.pos]);
                let start = self.pos;
                let offset = self.chunk_offset + start as u64;
                if start + n > self.chunk.len() {
                    trace!(
                        "carrying {} of {} bytes at offset {}",
                        self.chunk.len() - start,
                        n,
                        offset
                    );
                    self.frag.start(offset, &self.chunk[start..]);
                    self.pos = self.chunk.len();
                    continue;
                }
                self.pos += n;
                self.offset = offset;
                return Some(Ok(Character::from_slice(
                    &self.chunk[start..self.pos],
                )));
            }
            let chunk = match self.chunks.next() {
                None => {
                    self.done = true;
                    return self.finish();
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(Error::Io(err)));
                }
                Some(Ok(chunk)) => chunk.into(),
            };
            self.chunk_offset += self.chunk.len() as u64;
            self.chunk = chunk;
            self.pos = 0;
            if self.frag.is_empty() {
                continue;
            }
            let need = self.frag.need();
            if self.chunk.len() < need {
                self.frag.extend(&self.chunk);
                self.pos = self.chunk.len();
                continue;
            }
            self.frag.extend(&self.chunk[..need]);
            self.pos = need;
            self.offset = self.frag.offset;
            return Some(Ok(self.frag.take()));
        }
    }
}

impl<I, B> FusedIterator for Decoder<I>
where
    I: Iterator<Item = io::Result<B>>,
    B: Into<Vec<u8>>,
{
}
