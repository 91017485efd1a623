use std::fmt;
use std::iter::FromIterator;
use std::ops;

/// A single parsed CSV record.
///
/// All fields are stored contiguously in one `String`, alongside the ending
/// offset of each field.
#[derive(Clone, Default, Eq, Hash, PartialEq)]
pub struct Row {
    /// All fields in this row, stored contiguously.
    fields: String,
    /// The ending offset of each field.
    ends: Vec<usize>,
}

impl Row {
    /// Create a new empty `Row`.
    pub fn new() -> Row {
        Row::default()
    }

    /// Create a new empty `Row` with room for `buffer` bytes of field data
    /// and `fields` fields.
    pub fn with_capacity(buffer: usize, fields: usize) -> Row {
        Row {
            fields: String::with_capacity(buffer),
            ends: Vec::with_capacity(fields),
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.bounds(i).map(|range| &self.fields[range])
    }

    /// Returns true if and only if this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fields in this row.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Clear this row so that it has zero fields.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.ends.clear();
    }

    /// Add a new field.
    pub fn push_field(&mut self, field: &str) {
        self.fields.push_str(field);
        self.end_field();
    }

    /// Returns an iterator over all fields in this row.
    pub fn iter(&self) -> RowIter {
        RowIter { row: self, start: 0, i: 0 }
    }

    /// Return the contents of all fields, concatenated.
    pub fn as_str(&self) -> &str {
        &self.fields[..self.end()]
    }

    /// Append a character to the field being built.
    pub(crate) fn push_char(&mut self, c: char) {
        self.fields.push(c);
    }

    /// Append a string to the field being built.
    pub(crate) fn push_str(&mut self, s: &str) {
        self.fields.push_str(s);
    }

    /// Terminate the field being built.
    pub(crate) fn end_field(&mut self) {
        self.ends.push(self.fields.len());
    }

    fn end(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    fn bounds(&self, i: usize) -> Option<ops::Range<usize>> {
        let end = *self.ends.get(i)?;
        let start = match i.checked_sub(1) {
            None => 0,
            Some(prev) => self.ends[prev],
        };
        Some(start..end)
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Row(")?;
        f.debug_list().entries(self.iter()).finish()?;
        write!(f, ")")
    }
}

impl ops::Index<usize> for Row {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        match self.get(i) {
            Some(field) => field,
            None => panic!(
                "index out of bounds: row has {} fields but index is {}",
                self.len(),
                i
            ),
        }
    }
}

impl<T: AsRef<str>> PartialEq<[T]> for Row {
    fn eq(&self, other: &[T]) -> bool {
        self.len() == other.len()
            && self.iter().zip(other).all(|(a, b)| {
                let b: &str = b.as_ref();
                a == b
            })
    }
}

impl<T: AsRef<str>> PartialEq<Vec<T>> for Row {
    fn eq(&self, other: &Vec<T>) -> bool {
        self == other.as_slice()
    }
}

impl<T: AsRef<str>> FromIterator<T> for Row {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Row {
        let mut row = Row::new();
        row.extend(iter);
        row
    }
}

impl<T: AsRef<str>> Extend<T> for Row {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for field in iter {
            self.push_field(field.as_ref());
        }
    }
}

impl<T: AsRef<str>> From<Vec<T>> for Row {
    fn from(fields: Vec<T>) -> Row {
        fields.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Row {
    type IntoIter = RowIter<'a>;
    type Item = &'a str;

    fn into_iter(self) -> RowIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields in a row.
#[derive(Clone, Debug)]
pub struct RowIter<'a> {
    row: &'a Row,
    start: usize,
    i: usize,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let end = *self.row.ends.get(self.i)?;
        let field = &self.row.fields[self.start..end];
        self.start = end;
        self.i += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.row.len() - self.i;
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for RowIter<'a> {}

#[cfg(feature = "serde")]
impl serde::Serialize for Row {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for field in self {
            seq.serialize_element(field)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::Row;

    #[test]
    fn row_1() {
        let mut row = Row::new();
        row.push_field("foo");

        assert_eq!(row.len(), 1);
        assert_eq!(row.get(0), Some("foo"));
        assert_eq!(row.get(1), None);
        assert_eq!(row.get(2), None);
    }

    #[test]
    fn row_2() {
        let mut row = Row::new();
        row.push_field("foo");
        row.push_field("quux");

        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some("foo"));
        assert_eq!(row.get(1), Some("quux"));
        assert_eq!(row.get(2), None);
        assert_eq!(row.as_str(), "fooquux");
    }

    #[test]
    fn empty_row() {
        let row = Row::new();

        assert!(row.is_empty());
        assert_eq!(row.get(0), None);
        assert_eq!(row.iter().count(), 0);
    }

    #[test]
    fn empty_fields() {
        let row: Row = vec!["", ""].into();

        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some(""));
        assert_eq!(row.get(1), Some(""));
        assert_eq!(row.get(2), None);
    }

    #[test]
    fn empty_surround() {
        let row: Row = vec!["foo", "", "quux", ""].into();

        assert_eq!(row.len(), 4);
        assert_eq!(&row[0], "foo");
        assert_eq!(&row[1], "");
        assert_eq!(&row[2], "quux");
        assert_eq!(&row[3], "");
        assert_eq!(row.get(4), None);
    }

    #[test]
    fn multibyte_fields() {
        let mut row = Row::new();
        for c in "東京".chars() {
            row.push_char(c);
        }
        row.end_field();
        row.push_str("山田, 太郎");
        row.end_field();

        assert_eq!(row, vec!["東京", "山田, 太郎"]);
        assert_eq!(row.iter().len(), 2);
    }

    #[test]
    fn clear_reuses() {
        let mut row: Row = vec!["a", "b"].into();
        row.clear();
        assert!(row.is_empty());
        row.push_field("c");
        assert_eq!(row, vec!["c"]);
    }

    #[test]
    fn debug() {
        let row: Row = vec!["a", "b,c"].into();
        assert_eq!(format!("{:?}", row), "Row([\"a\", \"b,c\"])");
    }

    #[test]
    #[should_panic]
    fn index_out_of_bounds() {
        let row: Row = vec!["a"].into();
        let _ = &row[1];
    }
}
