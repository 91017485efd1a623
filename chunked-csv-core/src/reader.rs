use crate::error::{ErrorKind, Position, SyntaxError};

/// Options that govern how strictly CSV text is parsed.
///
/// Options are fixed for the lifetime of a `Parser`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Options {
    /// Reject input that does not conform to RFC 4180.
    ///
    /// When disabled, the parser recovers from every syntax error instead
    /// of reporting it. The default is `true`.
    pub strict: bool,
    /// Accept a lone `\n` as a record separator in strict mode.
    ///
    /// The default is `false`.
    pub allow_bare_lf: bool,
    /// Accept a lone `\r` as a record separator in strict mode.
    ///
    /// The default is `false`.
    pub allow_bare_cr: bool,
    /// Treat `"` as a quote.
    ///
    /// When disabled, `"` is ordinary field data, although strict mode still
    /// rejects it. The default is `true`.
    pub quoting: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            strict: true,
            allow_bare_lf: false,
            allow_bare_cr: false,
            quoting: true,
        }
    }
}

/// A receiver of parsed CSV data.
///
/// The parser calls `push_char` (or `push_str`) for every character of field
/// content, with quotes already unescaped. `end_field` is called once per
/// field, and `end_record` is called after the last field of every record.
pub trait Sink {
    /// Append a character to the current field.
    fn push_char(&mut self, c: char);

    /// Append a string to the current field.
    fn push_str(&mut self, s: &str) {
        for c in s.chars() {
            self.push_char(c);
        }
    }

    /// Terminate the current field.
    fn end_field(&mut self);

    /// Terminate the current record.
    fn end_record(&mut self);
}

impl<'a, S: Sink + ?Sized> Sink for &'a mut S {
    fn push_char(&mut self, c: char) {
        (**self).push_char(c);
    }

    fn push_str(&mut self, s: &str) {
        (**self).push_str(s);
    }

    fn end_field(&mut self) {
        (**self).end_field();
    }

    fn end_record(&mut self) {
        (**self).end_record();
    }
}

/// The state of the CSV grammar.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// At the start of a field, before any content.
    StartField,
    /// Inside an unquoted field.
    InField,
    /// Inside a quoted field.
    InQuoted,
    /// Just past a quote inside a quoted field. The next character decides
    /// whether the quote closed the field or escaped another quote.
    AfterQuote,
}

/// An incremental CSV parser over decoded characters.
///
/// The parser keeps all of its state between calls, so text may be fed in
/// pieces of any size. Once all text has been fed, callers must call
/// `finish` to flush the last record.
///
/// In strict mode, the first syntax error is returned and the parser
/// refuses further input (by returning the same error) until `reset` is
/// called.
#[derive(Clone, Debug)]
pub struct Parser {
    opts: Options,
    state: State,
    /// The position of the next character.
    pos: Position,
    /// The position of a `\r` that may be followed by `\n`.
    pending_cr: Option<Position>,
    /// The position of the quote that opened the current field.
    quote_pos: Position,
    /// The number of fields completed in the current record.
    fields: u64,
    err: Option<SyntaxError>,
}

impl Default for Parser {
    fn default() -> Parser {
        Parser::new(Options::default())
    }
}

impl Parser {
    /// Create a new parser with the given options.
    pub fn new(opts: Options) -> Parser {
        Parser {
            opts: opts,
            state: State::StartField,
            pos: Position::new(),
            pending_cr: None,
            quote_pos: Position::new(),
            fields: 0,
            err: None,
        }
    }

    /// Return the options used by this parser.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Return the current state of the grammar.
    pub fn state(&self) -> State {
        self.state
    }

    /// Return the position of the next character to be fed.
    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// Reset the parser such that it behaves as if it had never been used.
    pub fn reset(&mut self) {
        *self = Parser::new(self.opts);
    }

    /// Feed a single character to the parser.
    pub fn feed<S: Sink>(
        &mut self,
        c: char,
        sink: &mut S,
    ) -> Result<(), SyntaxError> {
        if let Some(err) = self.err {
            return Err(err);
        }
        let res = self.step(c, sink);
        if let Err(err) = res {
            self.err = Some(err);
        }
        res
    }

    /// Feed a string to the parser.
    ///
    /// This is equivalent to calling `feed` for every character in `s`,
    /// but copies the content of quoted fields in bulk.
    pub fn feed_str<S: Sink>(
        &mut self,
        s: &str,
        sink: &mut S,
    ) -> Result<(), SyntaxError> {
        let mut rest = s;
        while let Some(c) = rest.chars().next() {
            if self.state == State::InQuoted && self.err.is_none() {
                // `"` is ASCII, so its index is always a char boundary.
                let n = memchr::memchr(b'"', rest.as_bytes())
                    .unwrap_or(rest.len());
                if n > 0 {
                    let (content, tail) = rest.split_at(n);
                    sink.push_str(content);
                    self.pos.advance_str(content);
                    rest = tail;
                    continue;
                }
            }
            self.feed(c, sink)?;
            rest = &rest[c.len_utf8()..];
        }
        Ok(())
    }

    /// Signal the end of input.
    ///
    /// This flushes the final record, if any. A record is only flushed when
    /// there is pending data: a started field or a record that already has
    /// fields. Input that ends on a record separator therefore produces no
    /// trailing empty record.
    ///
    /// Calling `finish` again has no effect.
    pub fn finish<S: Sink>(&mut self, sink: &mut S) -> Result<(), SyntaxError> {
        if let Some(err) = self.err {
            return Err(err);
        }
        let res = self.step_end(sink);
        if let Err(err) = res {
            self.err = Some(err);
        }
        res
    }

    fn step<S: Sink>(&mut self, c: char, sink: &mut S) -> Result<(), SyntaxError> {
        let pos = self.pos;
        self.pos.advance(c);
        if let Some(cr) = self.pending_cr.take() {
            if c == '\n' {
                self.end_record(sink);
                return Ok(());
            }
            self.bare_newline('\r', cr, sink)?;
        }
        match self.state {
            State::StartField => match c {
                ',' => self.end_field(sink),
                '\r' => self.pending_cr = Some(pos),
                '\n' => self.bare_newline('\n', pos, sink)?,
                '"' if self.opts.quoting => {
                    self.quote_pos = pos;
                    self.state = State::InQuoted;
                }
                '"' => {
                    self.check(ErrorKind::UnexpectedQuoteInUnquotedField, pos)?;
                    self.push_unquoted(c, sink);
                }
                _ => {
                    self.check_control(c, pos)?;
                    self.push_unquoted(c, sink);
                }
            },
            State::InField => match c {
                ',' => self.end_field(sink),
                '\r' => self.pending_cr = Some(pos),
                '\n' => self.bare_newline('\n', pos, sink)?,
                '"' => {
                    let kind = if self.opts.quoting {
                        ErrorKind::QuoteInsideUnquotedField
                    } else {
                        ErrorKind::IllegalCharacterInUnquotedField
                    };
                    self.check(kind, pos)?;
                    sink.push_char(c);
                }
                _ => {
                    self.check_control(c, pos)?;
                    sink.push_char(c);
                }
            },
            State::InQuoted => {
                if c == '"' {
                    self.state = State::AfterQuote;
                } else {
                    sink.push_char(c);
                }
            }
            State::AfterQuote => match c {
                '"' => {
                    sink.push_char(c);
                    self.state = State::InQuoted;
                }
                ',' => self.end_field(sink),
                '\r' => self.pending_cr = Some(pos),
                '\n' => self.bare_newline('\n', pos, sink)?,
                _ => {
                    self.check(
                        ErrorKind::InvalidCharacterAfterClosingQuote,
                        pos,
                    )?;
                    self.push_unquoted(c, sink);
                }
            },
        }
        Ok(())
    }

    fn step_end<S: Sink>(&mut self, sink: &mut S) -> Result<(), SyntaxError> {
        if let Some(cr) = self.pending_cr.take() {
            self.bare_newline('\r', cr, sink)?;
        }
        match self.state {
            State::StartField => {
                if self.fields > 0 {
                    self.end_record(sink);
                }
            }
            State::InField | State::AfterQuote => self.end_record(sink),
            State::InQuoted => {
                self.check(ErrorKind::UnterminatedQuotedField, self.quote_pos)?;
                self.end_record(sink);
            }
        }
        Ok(())
    }

    /// Handle a lone `\r` or `\n` found at `pos`.
    fn bare_newline<S: Sink>(
        &mut self,
        c: char,
        pos: Position,
        sink: &mut S,
    ) -> Result<(), SyntaxError> {
        let allowed = match c {
            '\r' => self.opts.allow_bare_cr,
            _ => self.opts.allow_bare_lf,
        };
        if !allowed {
            self.check(ErrorKind::BareNewlineNotAllowed, pos)?;
        }
        self.end_record(sink);
        Ok(())
    }

    /// Report `kind` at `pos` in strict mode. Lenient mode never errors.
    #[inline]
    fn check(&self, kind: ErrorKind, pos: Position) -> Result<(), SyntaxError> {
        if self.opts.strict {
            Err(SyntaxError::new(kind, pos))
        } else {
            Ok(())
        }
    }

    #[inline]
    fn check_control(&self, c: char, pos: Position) -> Result<(), SyntaxError> {
        if is_forbidden_control(c) {
            self.check(ErrorKind::ControlCharNotAllowed, pos)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn push_unquoted<S: Sink>(&mut self, c: char, sink: &mut S) {
        sink.push_char(c);
        self.state = State::InField;
    }

    #[inline]
    fn end_field<S: Sink>(&mut self, sink: &mut S) {
        sink.end_field();
        self.fields += 1;
        self.state = State::StartField;
    }

    #[inline]
    fn end_record<S: Sink>(&mut self, sink: &mut S) {
        sink.end_field();
        sink.end_record();
        self.fields = 0;
        self.state = State::StartField;
        self.pos.next_record();
    }
}

/// Returns true for C0 controls (except TAB) and DEL.
#[inline]
fn is_forbidden_control(c: char) -> bool {
    (c <= '\x1F' && c != '\t') || c == '\x7F'
}

#[cfg(test)]
mod tests {
    use std::string::String;
    use std::vec::Vec;

    use super::{Options, Parser, Sink, State};
    use crate::error::ErrorKind;

    type Csv = Vec<Vec<String>>;

    #[derive(Debug, Default)]
    struct Collect {
        csv: Csv,
        row: Vec<String>,
        field: String,
    }

    impl Sink for Collect {
        fn push_char(&mut self, c: char) {
            self.field.push(c);
        }

        fn end_field(&mut self) {
            self.row.push(std::mem::replace(&mut self.field, String::new()));
        }

        fn end_record(&mut self) {
            self.csv.push(std::mem::replace(&mut self.row, vec![]));
        }
    }

    macro_rules! csv {
        ($([$($field:expr),*]),*) => {{
            #[allow(unused_mut)]
            fn x() -> Csv {
                let mut csv = Csv::new();
                $(
                    let mut row = Vec::new();
                    $(
                        row.push(String::from($field));
                    )*
                    csv.push(row);
                )*
                csv
            }
            x()
        }}
    }

    fn lenient(opts: &mut Options) {
        opts.strict = false;
    }

    fn bare_lf(opts: &mut Options) {
        opts.allow_bare_lf = true;
    }

    fn bare_cr(opts: &mut Options) {
        opts.allow_bare_cr = true;
    }

    fn no_quoting(opts: &mut Options) {
        opts.quoting = false;
    }

    fn parse_by_char(
        opts: Options,
        data: &str,
    ) -> Result<Csv, (ErrorKind, u64)> {
        let mut parser = Parser::new(opts);
        let mut sink = Collect::default();
        for c in data.chars() {
            parser
                .feed(c, &mut sink)
                .map_err(|e| (e.kind(), e.position().char()))?;
        }
        parser
            .finish(&mut sink)
            .map_err(|e| (e.kind(), e.position().char()))?;
        Ok(sink.csv)
    }

    fn parse_by_str(
        opts: Options,
        data: &str,
    ) -> Result<Csv, (ErrorKind, u64)> {
        let mut parser = Parser::new(opts);
        let mut sink = Collect::default();
        parser
            .feed_str(data, &mut sink)
            .map_err(|e| (e.kind(), e.position().char()))?;
        parser
            .finish(&mut sink)
            .map_err(|e| (e.kind(), e.position().char()))?;
        Ok(sink.csv)
    }

    macro_rules! parses_to {
        ($name:ident, $data:expr, $expected:expr) => {
            parses_to!($name, $data, $expected, |_| ());
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut opts = Options::default();
                $config(&mut opts);
                let expected: Csv = $expected;

                let got = parse_by_char(opts, $data);
                assert_eq!(Ok(expected.clone()), got, "by char");

                let got = parse_by_str(opts, $data);
                assert_eq!(Ok(expected), got, "by str");
            }
        };
    }

    macro_rules! fails_with {
        ($name:ident, $data:expr, $kind:expr, $at:expr) => {
            fails_with!($name, $data, $kind, $at, |_| ());
        };
        ($name:ident, $data:expr, $kind:expr, $at:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut opts = Options::default();
                $config(&mut opts);

                let got = parse_by_char(opts, $data);
                assert_eq!(Err(($kind, $at)), got, "by char");

                let got = parse_by_str(opts, $data);
                assert_eq!(Err(($kind, $at)), got, "by str");
            }
        };
    }

    parses_to!(empty, "", csv![]);
    parses_to!(one_row_one_field, "a", csv![["a"]]);
    parses_to!(one_row_many_fields, "a,b,c", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma, "a,b,", csv![["a", "b", ""]]);
    parses_to!(one_row_one_field_crlf, "a\r\n", csv![["a"]]);
    parses_to!(one_row_many_fields_crlf, "a,b,c\r\n", csv![["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma_crlf, "a,b,\r\n", csv![["a", "b", ""]]);
    parses_to!(only_comma, ",", csv![["", ""]]);
    parses_to!(empty_fields, "a,,b", csv![["a", "", "b"]]);

    parses_to!(many_rows_one_field_crlf, "a\r\nb", csv![["a"], ["b"]]);
    parses_to!(
        many_rows_many_fields_crlf,
        "a,b,c\r\nx,y,z\r\n",
        csv![["a", "b", "c"], ["x", "y", "z"]]
    );
    parses_to!(
        many_rows_trailing_comma_crlf,
        "a,b,\r\nx,y,\r\n",
        csv![["a", "b", ""], ["x", "y", ""]]
    );
    parses_to!(blank_line_crlf, "a\r\n\r\nb", csv![["a"], [""], ["b"]]);

    parses_to!(bare_lf_allowed, "a\nb\n", csv![["a"], ["b"]], bare_lf);
    parses_to!(bare_cr_allowed, "a\rb\r", csv![["a"], ["b"]], bare_cr);
    parses_to!(
        bare_cr_allowed_crlf_still_one,
        "a\r\nb",
        csv![["a"], ["b"]],
        bare_cr
    );
    parses_to!(
        bare_cr_then_cr_allowed,
        "a\r\rb",
        csv![["a"], [""], ["b"]],
        bare_cr
    );
    parses_to!(lenient_bare_lf, "a\nb", csv![["a"], ["b"]], lenient);
    parses_to!(lenient_bare_cr, "a\rb\r", csv![["a"], ["b"]], lenient);
    parses_to!(
        lenient_mixed,
        "a\r\nb\nc\rd",
        csv![["a"], ["b"], ["c"], ["d"]],
        lenient
    );

    parses_to!(quote_empty, "\"\"", csv![[""]]);
    parses_to!(quote_empty_crlf, "\"\"\r\n", csv![[""]]);
    parses_to!(quote_space, "\" \"", csv![[" "]]);
    parses_to!(quote_comma, "\"a,b\"", csv![["a,b"]]);
    parses_to!(quote_escaped, "\"a\"\"b\"", csv![["a\"b"]]);
    parses_to!(quote_only_escaped, "\"\"\"\"", csv![["\""]]);
    parses_to!(quote_crlf, "\"a\r\nb\",c", csv![["a\r\nb", "c"]]);
    parses_to!(quote_bare_lf, "\"a\nb\"", csv![["a\nb"]]);
    parses_to!(quote_control, "\"a\x01b\"", csv![["a\x01b"]]);
    parses_to!(
        quote_then_next_field,
        "\"a\",\"b\"\r\n\"c\",d",
        csv![["a", "b"], ["c", "d"]]
    );
    parses_to!(quote_then_bare_lf, "\"a\"\nb", csv![["a"], ["b"]], bare_lf);

    parses_to!(tab_allowed, "a\tb,\tc", csv![["a\tb", "\tc"]]);
    parses_to!(unicode_fields, "東京,山田\r\n", csv![["東京", "山田"]]);

    parses_to!(lenient_quote_in_field, "a\"b", csv![["a\"b"]], lenient);
    parses_to!(
        lenient_after_quote,
        "\"a\"b,c",
        csv![["ab", "c"]],
        lenient
    );
    parses_to!(
        lenient_after_quote_then_quote,
        "\"a\"b\"c",
        csv![["ab\"c"]],
        lenient
    );
    parses_to!(lenient_unterminated, "a,\"b,c", csv![["a", "b,c"]], lenient);
    parses_to!(lenient_control, "a\x00b", csv![["a\x00b"]], lenient);
    parses_to!(
        no_quoting_lenient,
        "\"a\",b\"",
        csv![["\"a\"", "b\""]],
        |o: &mut Options| {
            o.strict = false;
            o.quoting = false;
        }
    );

    fails_with!(
        strict_bare_lf,
        "a\nb",
        ErrorKind::BareNewlineNotAllowed,
        1
    );
    fails_with!(
        strict_bare_cr,
        "a\rb",
        ErrorKind::BareNewlineNotAllowed,
        1
    );
    fails_with!(
        strict_bare_cr_at_end,
        "a,b\r",
        ErrorKind::BareNewlineNotAllowed,
        3
    );
    fails_with!(
        strict_bare_lf_when_cr_allowed,
        "a\nb",
        ErrorKind::BareNewlineNotAllowed,
        1,
        bare_cr
    );
    fails_with!(
        strict_bare_lf_after_quote,
        "\"a\"\n",
        ErrorKind::BareNewlineNotAllowed,
        3
    );
    fails_with!(
        strict_quote_in_field,
        "ab\"c",
        ErrorKind::QuoteInsideUnquotedField,
        2
    );
    fails_with!(
        strict_space_before_quote,
        "a, \"b\"",
        ErrorKind::QuoteInsideUnquotedField,
        3
    );
    fails_with!(
        strict_after_quote,
        "\"a\"b",
        ErrorKind::InvalidCharacterAfterClosingQuote,
        3
    );
    fails_with!(
        strict_unterminated,
        "a\r\n\"bc",
        ErrorKind::UnterminatedQuotedField,
        3
    );
    fails_with!(
        strict_control_start,
        "a,\x07",
        ErrorKind::ControlCharNotAllowed,
        2
    );
    fails_with!(
        strict_control_mid,
        "ab\x7F",
        ErrorKind::ControlCharNotAllowed,
        2
    );
    fails_with!(
        strict_no_quoting_start,
        "\"a",
        ErrorKind::UnexpectedQuoteInUnquotedField,
        0,
        no_quoting
    );
    fails_with!(
        strict_no_quoting_mid,
        "a\"",
        ErrorKind::IllegalCharacterInUnquotedField,
        1,
        no_quoting
    );

    #[test]
    fn crlf_split_across_feeds() {
        let mut parser = Parser::default();
        let mut sink = Collect::default();
        parser.feed_str("a\r", &mut sink).unwrap();
        assert!(sink.csv.is_empty());
        parser.feed_str("\nb", &mut sink).unwrap();
        parser.finish(&mut sink).unwrap();
        assert_eq!(sink.csv, csv![["a"], ["b"]]);
    }

    #[test]
    fn error_is_sticky_until_reset() {
        let mut parser = Parser::default();
        let mut sink = Collect::default();
        let err = parser.feed_str("a\nb", &mut sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BareNewlineNotAllowed);
        assert_eq!(parser.feed('c', &mut sink), Err(err));
        assert_eq!(parser.finish(&mut sink), Err(err));

        parser.reset();
        let mut sink = Collect::default();
        parser.feed_str("c", &mut sink).unwrap();
        parser.finish(&mut sink).unwrap();
        assert_eq!(sink.csv, csv![["c"]]);
    }

    #[test]
    fn finish_twice_is_noop() {
        let mut parser = Parser::default();
        let mut sink = Collect::default();
        parser.feed_str("a,b", &mut sink).unwrap();
        parser.finish(&mut sink).unwrap();
        parser.finish(&mut sink).unwrap();
        assert_eq!(sink.csv, csv![["a", "b"]]);
    }

    #[test]
    fn states() {
        let mut parser = Parser::default();
        let mut sink = Collect::default();
        assert_eq!(parser.state(), State::StartField);
        parser.feed('"', &mut sink).unwrap();
        assert_eq!(parser.state(), State::InQuoted);
        parser.feed('x', &mut sink).unwrap();
        assert_eq!(parser.state(), State::InQuoted);
        parser.feed('"', &mut sink).unwrap();
        assert_eq!(parser.state(), State::AfterQuote);
        parser.feed(',', &mut sink).unwrap();
        assert_eq!(parser.state(), State::StartField);
        parser.feed('y', &mut sink).unwrap();
        assert_eq!(parser.state(), State::InField);
    }

    #[test]
    fn error_position() {
        let mut parser = Parser::default();
        let mut sink = Collect::default();
        let err = parser
            .feed_str("a,b\r\n\"東京\"x", &mut sink)
            .unwrap_err();
        let pos = err.position();
        assert_eq!(err.kind(), ErrorKind::InvalidCharacterAfterClosingQuote);
        assert_eq!(pos.char(), 9);
        assert_eq!(pos.byte(), 13);
        assert_eq!(pos.line(), 2);
        assert_eq!(pos.record(), 1);
    }

    #[test]
    fn line_numbers_count_quoted_newlines() {
        let mut parser = Parser::default();
        let mut sink = Collect::default();
        parser.feed_str("\"a\nb\nc\"\r\nd", &mut sink).unwrap();
        assert_eq!(parser.position().line(), 4);
        assert_eq!(parser.position().record(), 1);
    }
}
