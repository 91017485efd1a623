/*!
The `chunked-csv` crate reads RFC 4180 style CSV data from large random
access sources without loading them into memory.

A source is read in fixed size chunks, the chunks are decoded into UTF-8
characters (stitching together characters that straddle a chunk boundary)
and the characters are fed to the grammar engine from `chunked-csv-core`.
Rows come out as soon as they are complete.

# Example

```
use chunked_csv::ReaderBuilder;

let data = "name,note\r\n\"山田, 太郎\",\"彼は\"\"優秀\"\"です\"\r\n";
let mut rdr = ReaderBuilder::new().chunk_size(4).from_storage(data.as_bytes());
let mut rows = vec![];
for row in rdr.rows() {
    rows.push(row.unwrap());
}
assert_eq!(rows[1], vec!["山田, 太郎", "彼は\"優秀\"です"]);
```

# Already decoded text

When the whole text is in memory, [`parse`] skips chunking and decoding:

```
use chunked_csv::{parse, ErrorKind, Options};

let table = parse("a,b\r\n", Options::default()).unwrap();
assert_eq!(table, vec![vec!["a", "b"]]);

let err = parse("a\nb", Options::default()).unwrap_err();
assert_eq!(err.kind(), ErrorKind::BareNewlineNotAllowed);

let lenient = Options { strict: false, ..Options::default() };
assert_eq!(parse("a\nb", lenient).unwrap().len(), 2);
```
*/

#![deny(missing_docs)]

pub use chunked_csv_core::{
    ErrorKind, Options, Parser, Position, Sink, State, SyntaxError,
};

pub use crate::config::Config;
pub use crate::decoder::{decode, utf8_len, Character, Decoder, Truncated};
pub use crate::error::{Error, Result, Utf8Error};
pub use crate::reader::{Reader, ReaderBuilder, RowsIntoIter, RowsIter};
pub use crate::row::{Row, RowIter};
pub use crate::source::{
    ByteChunk, Chunks, SeekStorage, Storage, DEFAULT_CHUNK_SIZE,
};
pub use crate::table::{Table, TableBuilder};

mod config;
mod decoder;
mod error;
mod reader;
mod row;
mod source;
mod table;

/// Parse already decoded CSV text into a table.
///
/// In strict mode, the first syntax error aborts the parse. In lenient mode
/// this never fails.
pub fn parse(
    text: &str,
    opts: Options,
) -> std::result::Result<Table, SyntaxError> {
    let mut builder = TableBuilder::new();
    let mut parser = Parser::new(opts);
    parser.feed_str(text, &mut builder)?;
    parser.finish(&mut builder)?;
    Ok(builder.finish())
}
