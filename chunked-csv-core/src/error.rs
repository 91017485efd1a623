use core::fmt;

/// A position in decoded CSV text.
///
/// Positions are tracked by the parser as it consumes characters. The
/// character and byte offsets are zero based while the line number starts
/// at `1` and is incremented by every `\n`, including those that occur
/// inside quoted fields.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Position {
    char: u64,
    byte: u64,
    line: u64,
    record: u64,
}

impl Default for Position {
    fn default() -> Position {
        Position::new()
    }
}

impl Position {
    /// Returns the position at the start of CSV text.
    pub fn new() -> Position {
        Position { char: 0, byte: 0, line: 1, record: 0 }
    }

    /// The character offset, starting at `0`.
    pub fn char(&self) -> u64 {
        self.char
    }

    /// The byte offset into the UTF-8 encoding of the text, starting at `0`.
    pub fn byte(&self) -> u64 {
        self.byte
    }

    /// The line number, starting at `1`.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The index of the record being parsed, starting at `0`.
    pub fn record(&self) -> u64 {
        self.record
    }

    #[inline]
    pub(crate) fn advance(&mut self, c: char) {
        self.char += 1;
        self.byte += c.len_utf8() as u64;
        self.line += (c == '\n') as u64;
    }

    pub(crate) fn advance_str(&mut self, s: &str) {
        self.char += s.chars().count() as u64;
        self.byte += s.len() as u64;
        self.line += memchr::memchr_iter(b'\n', s.as_bytes()).count() as u64;
    }

    #[inline]
    pub(crate) fn next_record(&mut self) {
        self.record += 1;
    }
}

/// The specific kind of a CSV syntax error.
///
/// Syntax errors are only ever reported when the parser is in strict mode.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// A quote opened a field while quoting is disabled.
    UnexpectedQuoteInUnquotedField,
    /// A control character other than TAB occurred outside of quotes.
    ControlCharNotAllowed,
    /// A lone `\r` or `\n` was used as a record separator without being
    /// enabled by `allow_bare_cr` or `allow_bare_lf`.
    BareNewlineNotAllowed,
    /// A quote occurred after field content began while quoting is disabled.
    IllegalCharacterInUnquotedField,
    /// A quote occurred after unquoted field content began.
    QuoteInsideUnquotedField,
    /// A closing quote was followed by something other than a quote, a comma
    /// or a record separator.
    InvalidCharacterAfterClosingQuote,
    /// The input ended inside a quoted field.
    UnterminatedQuotedField,
}

impl ErrorKind {
    fn description(&self) -> &'static str {
        match *self {
            ErrorKind::UnexpectedQuoteInUnquotedField => {
                "unexpected quote in unquoted field"
            }
            ErrorKind::ControlCharNotAllowed => {
                "control character not allowed"
            }
            ErrorKind::BareNewlineNotAllowed => "bare newline not allowed",
            ErrorKind::IllegalCharacterInUnquotedField => {
                "illegal character in unquoted field"
            }
            ErrorKind::QuoteInsideUnquotedField => {
                "quote inside unquoted field"
            }
            ErrorKind::InvalidCharacterAfterClosingQuote => {
                "invalid character after closing quote"
            }
            ErrorKind::UnterminatedQuotedField => "unterminated quoted field",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A syntax error found while parsing CSV in strict mode.
///
/// The position points at the offending character. For an unterminated
/// quoted field, it points at the quote that opened the field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SyntaxError {
    kind: ErrorKind,
    pos: Position,
}

impl SyntaxError {
    pub(crate) fn new(kind: ErrorKind, pos: Position) -> SyntaxError {
        SyntaxError { kind: kind, pos: pos }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The position at which this error occurred.
    pub fn position(&self) -> &Position {
        &self.pos
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "CSV syntax error: record {} (line {}, byte {}, char {}): {}",
            self.pos.record(),
            self.pos.line(),
            self.pos.byte(),
            self.pos.char(),
            self.kind,
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SyntaxError {}
