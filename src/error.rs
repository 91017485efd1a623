use std::error;
use std::fmt;
use std::io;
use std::result;

use chunked_csv_core::{ErrorKind, SyntaxError};

use crate::decoder::Character;

/// A type alias for `Result<T, chunked_csv::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when decoding or parsing CSV data.
#[derive(Debug)]
pub enum Error {
    /// An I/O error that occurred while reading a chunk of the source.
    Io(io::Error),
    /// A decoded character was not a valid UTF-8 encoded scalar value.
    Utf8(Utf8Error),
    /// The source ended in the middle of a multi-byte character.
    ///
    /// This is only reported when the decoder's truncation policy is
    /// `Truncated::Error`, which is the default.
    Truncated {
        /// The byte offset at which the incomplete character began.
        offset: u64,
        /// The number of bytes of the character that were available.
        len: usize,
        /// The number of bytes declared by the character's leading byte.
        expected: usize,
    },
    /// A syntax error found by the grammar engine in strict mode.
    Syntax(SyntaxError),
}

impl Error {
    /// If this is a syntax error, return its kind.
    pub fn syntax_kind(&self) -> Option<ErrorKind> {
        match *self {
            Error::Syntax(ref err) => Some(err.kind()),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Error {
        Error::Syntax(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Utf8(ref err) => Some(err),
            Error::Truncated { .. } => None,
            Error::Syntax(ref err) => Some(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Utf8(ref err) => write!(f, "CSV decode error: {}", err),
            Error::Truncated { offset, len, expected } => write!(
                f,
                "CSV decode error: input ended inside a {}-byte character \
                 at byte {} ({} bytes available)",
                expected, offset, len
            ),
            Error::Syntax(ref err) => err.fmt(f),
        }
    }
}

/// An error for a decoded character that is not valid UTF-8.
///
/// The decoder groups bytes into characters using only the leading byte, so
/// a stray continuation byte or a malformed sequence still comes out as a
/// `Character`. This error is reported when such a character is converted
/// to a `char`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utf8Error {
    offset: u64,
    bytes: Character,
}

impl Utf8Error {
    pub(crate) fn new(offset: u64, bytes: Character) -> Utf8Error {
        Utf8Error { offset: offset, bytes: bytes }
    }

    /// The byte offset at which the invalid character began.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The bytes of the invalid character.
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }
}

impl fmt::Display for Utf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid UTF-8 sequence {:?} at byte {}",
            bstr::BStr::new(self.bytes()),
            self.offset
        )
    }
}

impl error::Error for Utf8Error {}
