/*!
`chunked-csv-core` provides an incremental, allocation free grammar engine
for RFC 4180 style CSV data that has already been decoded into `char`s.

The engine is a push parser: callers hand it one character (or one string
slice) at a time and it reports fields and records to a caller provided
[`Sink`]. Because it carries its own state between calls, input may be split
at any character boundary without changing the parse.

# Example

```
use chunked_csv_core::{Options, Parser, Sink};

#[derive(Default)]
struct Count {
    fields: usize,
    records: usize,
}

impl Sink for Count {
    fn push_char(&mut self, _: char) {}
    fn end_field(&mut self) { self.fields += 1; }
    fn end_record(&mut self) { self.records += 1; }
}

let mut parser = Parser::new(Options::default());
let mut count = Count::default();
parser.feed_str("a,b\r\nc,", &mut count).unwrap();
parser.feed_str("d\r\n", &mut count).unwrap();
parser.finish(&mut count).unwrap();
assert_eq!((count.fields, count.records), (4, 2));
```

# Strict and lenient parsing

By default the parser is strict: bare `\r` or `\n` record separators,
misplaced quotes and control characters in unquoted fields are reported as a
[`SyntaxError`]. With [`Options::strict`] disabled, the parser instead
recovers from each of these and always finds *a* parse.
*/

#![deny(missing_docs)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub use crate::error::{ErrorKind, Position, SyntaxError};
pub use crate::reader::{Options, Parser, Sink, State};

mod error;
mod reader;
