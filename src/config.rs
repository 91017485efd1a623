use crate::decoder::Truncated;
use crate::source::DEFAULT_CHUNK_SIZE;

/// A plain description of a reader's configuration.
///
/// Unlike `ReaderBuilder`, this type can be deserialized (with the `serde`
/// feature enabled), so reader settings may live in a configuration file.
/// Every field is optional when deserializing and falls back to its default.
///
/// ```
/// use chunked_csv::{Config, ReaderBuilder};
///
/// let config = Config { strict: false, ..Config::default() };
/// let table = ReaderBuilder::from_config(&config)
///     .parse_bytes(b"a\nb\rc")
///     .unwrap();
/// assert_eq!(table, vec![vec!["a"], vec!["b"], vec!["c"]]);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Config {
    /// See `ReaderBuilder::strict`.
    pub strict: bool,
    /// See `ReaderBuilder::allow_bare_lf`.
    pub allow_bare_lf: bool,
    /// See `ReaderBuilder::allow_bare_cr`.
    pub allow_bare_cr: bool,
    /// See `ReaderBuilder::quoting`.
    pub quoting: bool,
    /// See `ReaderBuilder::chunk_size`.
    pub chunk_size: usize,
    /// See `ReaderBuilder::truncated`.
    pub truncated: Truncated,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            strict: true,
            allow_bare_lf: false,
            allow_bare_cr: false,
            quoting: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            truncated: Truncated::Error,
        }
    }
}
