use std::collections::VecDeque;
use std::iter::FromIterator;
use std::mem;
use std::ops;
use std::slice;
use std::vec;

use chunked_csv_core::Sink;

use crate::row::Row;

/// An ordered sequence of parsed rows.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Table {
        Table::default()
    }

    /// Return the row at index `i`.
    pub fn get(&self, i: usize) -> Option<&Row> {
        self.rows.get(i)
    }

    /// Returns the number of rows in this table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if and only if this table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row.
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Return all rows as a slice.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns an iterator over all rows in this table.
    pub fn iter(&self) -> slice::Iter<Row> {
        self.rows.iter()
    }

    /// Unwrap this table into its rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl ops::Index<usize> for Table {
    type Output = Row;

    fn index(&self, i: usize) -> &Row {
        &self.rows[i]
    }
}

impl<T: AsRef<str>> PartialEq<Vec<Vec<T>>> for Table {
    fn eq(&self, other: &Vec<Vec<T>>) -> bool {
        self.rows.len() == other.len()
            && self.rows.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl FromIterator<Row> for Table {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Table {
        Table { rows: iter.into_iter().collect() }
    }
}

impl IntoIterator for Table {
    type IntoIter = vec::IntoIter<Row>;
    type Item = Row;

    fn into_iter(self) -> vec::IntoIter<Row> {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type IntoIter = slice::Iter<'a, Row>;
    type Item = &'a Row;

    fn into_iter(self) -> slice::Iter<'a, Row> {
        self.rows.iter()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Table {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.rows)
    }
}

/// A `Sink` that accumulates every parsed row into a `Table`.
#[derive(Debug, Default)]
pub struct TableBuilder {
    table: Table,
    row: Row,
}

impl TableBuilder {
    /// Create a new builder with an empty table.
    pub fn new() -> TableBuilder {
        TableBuilder::default()
    }

    /// Return the table built so far.
    ///
    /// A partially built row is discarded.
    pub fn finish(self) -> Table {
        self.table
    }
}

impl Sink for TableBuilder {
    fn push_char(&mut self, c: char) {
        self.row.push_char(c);
    }

    fn push_str(&mut self, s: &str) {
        self.row.push_str(s);
    }

    fn end_field(&mut self) {
        self.row.end_field();
    }

    fn end_record(&mut self) {
        self.table.push(mem::take(&mut self.row));
    }
}

/// A `Sink` that hands out rows as soon as they are complete.
#[derive(Debug, Default)]
pub(crate) struct RowQueue {
    row: Row,
    done: VecDeque<Row>,
}

impl RowQueue {
    pub(crate) fn pop(&mut self) -> Option<Row> {
        self.done.pop_front()
    }
}

impl Sink for RowQueue {
    fn push_char(&mut self, c: char) {
        self.row.push_char(c);
    }

    fn push_str(&mut self, s: &str) {
        self.row.push_str(s);
    }

    fn end_field(&mut self) {
        self.row.end_field();
    }

    fn end_record(&mut self) {
        self.done.push_back(mem::take(&mut self.row));
    }
}
