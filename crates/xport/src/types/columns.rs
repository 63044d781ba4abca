//! Column-oriented view of a dataset.

use super::{XptDataset, XptValue};

/// Ordered mapping of variable name to column values.
///
/// Iteration follows variable order. Lookup by name is exact (case-sensitive).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XptColumns {
    entries: Vec<(String, Vec<XptValue>)>,
}

impl XptColumns {
    /// Empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, replacing the values of an existing one of the same name.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<XptValue>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((name, values)),
        }
    }

    /// Values of the named column.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[XptValue]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Column names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rows (length of the first column).
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.entries.first().map_or(0, |(_, values)| values.len())
    }

    /// Iterate over `(name, values)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[XptValue])> {
        self.entries
            .iter()
            .map(|(n, values)| (n.as_str(), values.as_slice()))
    }
}

impl From<&XptDataset> for XptColumns {
    fn from(dataset: &XptDataset) -> Self {
        let entries = dataset
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                (
                    column.name.clone(),
                    dataset.column_values(idx).cloned().collect(),
                )
            })
            .collect();
        Self { entries }
    }
}

impl FromIterator<(String, Vec<XptValue>)> for XptColumns {
    fn from_iter<I: IntoIterator<Item = (String, Vec<XptValue>)>>(iter: I) -> Self {
        let mut columns = Self::new();
        for (name, values) in iter {
            columns.insert(name, values);
        }
        columns
    }
}

impl IntoIterator for XptColumns {
    type Item = (String, Vec<XptValue>);
    type IntoIter = std::vec::IntoIter<(String, Vec<XptValue>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
