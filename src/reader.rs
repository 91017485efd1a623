use std::cmp;
use std::fs::File;
use std::path::Path;

use chunked_csv_core::{Options, Parser, Position};
use log::debug;

use crate::config::Config;
use crate::decoder::{Decoder, Truncated};
use crate::error::{Error, Result, Utf8Error};
use crate::row::Row;
use crate::source::{Chunks, SeekStorage, Storage, DEFAULT_CHUNK_SIZE};
use crate::table::{RowQueue, Table};

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak strictness, record separators, the
/// chunk size and the handling of truncated input. Once a `Reader` is built,
/// its configuration cannot be changed.
#[derive(Clone, Debug)]
pub struct ReaderBuilder {
    opts: Options,
    chunk_size: usize,
    truncated: Truncated,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            opts: Options::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            truncated: Truncated::default(),
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder with a default configuration.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Create a new builder from a deserializable configuration.
    pub fn from_config(config: &Config) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .strict(config.strict)
            .allow_bare_lf(config.allow_bare_lf)
            .allow_bare_cr(config.allow_bare_cr)
            .quoting(config.quoting)
            .chunk_size(config.chunk_size)
            .truncated(config.truncated);
        builder
    }

    /// Build a CSV reader over the given storage.
    pub fn from_storage<S: Storage>(&self, storage: S) -> Reader<S> {
        Reader::new(self, storage)
    }

    /// Build a CSV reader over the file at the given path.
    pub fn from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Reader<SeekStorage<File>>> {
        Ok(self.from_storage(SeekStorage::new(File::open(path)?)))
    }

    /// Parse already decoded text into a table.
    pub fn parse_str(&self, text: &str) -> Result<Table> {
        Ok(crate::parse(text, self.opts)?)
    }

    /// Decode and parse an in-memory buffer of bytes into a table.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Table> {
        self.from_storage(bytes).read_table()
    }

    /// Return the grammar options this builder will use.
    pub fn options(&self) -> Options {
        self.opts
    }

    /// Whether to reject input that does not conform to RFC 4180.
    ///
    /// When disabled, every syntax error is recovered from instead. This is
    /// enabled by default.
    pub fn strict(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.opts.strict = yes;
        self
    }

    /// Whether to accept a lone `\n` as a record separator in strict mode.
    ///
    /// This is disabled by default. Lenient mode always accepts it.
    pub fn allow_bare_lf(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.opts.allow_bare_lf = yes;
        self
    }

    /// Whether to accept a lone `\r` as a record separator in strict mode.
    ///
    /// This is disabled by default. Lenient mode always accepts it.
    pub fn allow_bare_cr(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.opts.allow_bare_cr = yes;
        self
    }

    /// Whether to treat `"` as a quote.
    ///
    /// This is enabled by default.
    pub fn quoting(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.opts.quoting = yes;
        self
    }

    /// The maximum number of bytes read from storage at a time.
    ///
    /// The default is 1 MiB. A size of `0` is treated as `1`.
    pub fn chunk_size(&mut self, size: usize) -> &mut ReaderBuilder {
        self.chunk_size = cmp::max(1, size);
        self
    }

    /// What to do when the input ends in the middle of a character.
    ///
    /// The default is `Truncated::Error`.
    pub fn truncated(&mut self, policy: Truncated) -> &mut ReaderBuilder {
        self.truncated = policy;
        self
    }
}

/// A streaming CSV reader over chunked storage.
///
/// The reader pulls one chunk at a time from its storage, decodes it into
/// characters and feeds them to the grammar engine, handing out rows as soon
/// as they are complete. At most one chunk is read ahead of the rows that
/// have been returned.
///
/// Once an error is returned, the reader yields no more rows.
#[derive(Debug)]
pub struct Reader<S> {
    chars: Decoder<Chunks<S>>,
    parser: Parser,
    rows: RowQueue,
    done: bool,
}

impl<S: Storage> Reader<S> {
    fn new(builder: &ReaderBuilder, storage: S) -> Reader<S> {
        let chunks = Chunks::with_chunk_size(storage, builder.chunk_size);
        Reader {
            chars: Decoder::new(chunks).truncated(builder.truncated),
            parser: Parser::new(builder.opts),
            rows: RowQueue::default(),
            done: false,
        }
    }

    /// Create a reader with a default configuration.
    pub fn from_storage(storage: S) -> Reader<S> {
        ReaderBuilder::new().from_storage(storage)
    }

    /// Read the next row.
    ///
    /// Returns `Ok(None)` when all rows have been read.
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        loop {
            if let Some(row) = self.rows.pop() {
                return Ok(Some(row));
            }
            if self.done {
                return Ok(None);
            }
            if let Err(err) = self.step() {
                self.done = true;
                return Err(err);
            }
        }
    }

    /// Read all remaining rows into a table.
    pub fn read_table(&mut self) -> Result<Table> {
        let mut table = Table::new();
        while let Some(row) = self.read_row()? {
            table.push(row);
        }
        Ok(table)
    }

    /// Returns an iterator over the remaining rows.
    pub fn rows(&mut self) -> RowsIter<S> {
        RowsIter { rdr: self }
    }

    /// Consume this reader, returning an iterator over its remaining rows.
    pub fn into_rows(self) -> RowsIntoIter<S> {
        RowsIntoIter { rdr: self }
    }

    /// Returns true if and only if all input has been consumed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The position of the next character in the decoded text.
    pub fn position(&self) -> &Position {
        self.parser.position()
    }

    /// The grammar options used by this reader.
    pub fn options(&self) -> &Options {
        self.parser.options()
    }

    /// Move one character forward, or finish the parse at end of input.
    fn step(&mut self) -> Result<()> {
        match self.chars.next() {
            Some(Ok(ch)) => {
                let c = match ch.to_char() {
                    Some(c) => c,
                    None => {
                        let offset = self.chars.offset();
                        return Err(Error::Utf8(Utf8Error::new(offset, ch)));
                    }
                };
                self.parser.feed(c, &mut self.rows)?;
            }
            Some(Err(err)) => return Err(err),
            None => {
                debug!(
                    "end of input after {} bytes and {} records",
                    self.parser.position().byte(),
                    self.parser.position().record()
                );
                self.done = true;
                self.parser.finish(&mut self.rows)?;
            }
        }
        Ok(())
    }
}

/// A borrowed iterator over the rows of a `Reader`.
#[derive(Debug)]
pub struct RowsIter<'r, S> {
    rdr: &'r mut Reader<S>,
}

impl<'r, S: Storage> Iterator for RowsIter<'r, S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        self.rdr.read_row().transpose()
    }
}

/// An owned iterator over the rows of a `Reader`.
#[derive(Debug)]
pub struct RowsIntoIter<S> {
    rdr: Reader<S>,
}

impl<S> RowsIntoIter<S> {
    /// Return a reference to the underlying reader.
    pub fn reader(&self) -> &Reader<S> {
        &self.rdr
    }
}

impl<S: Storage> Iterator for RowsIntoIter<S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        self.rdr.read_row().transpose()
    }
}
