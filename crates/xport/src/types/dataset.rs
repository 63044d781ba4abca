//! Dataset and library containers.

use chrono::NaiveDateTime;

use super::{XptColumn, XptValue};

/// Version, OS and timestamps carried by library and member headers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XptHeader {
    /// SAS version string (up to 8 characters).
    pub sas_version: String,
    /// Operating system name (up to 8 characters).
    pub os_name: String,
    /// Creation datetime.
    pub created: NaiveDateTime,
    /// Last modification datetime.
    pub modified: NaiveDateTime,
}

/// Row arity did not match the column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLengthError {
    /// Number of columns.
    pub expected: usize,
    /// Number of values supplied.
    pub actual: usize,
}

impl std::fmt::Display for RowLengthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row has {} values but the dataset has {} columns",
            self.actual, self.expected
        )
    }
}

impl std::error::Error for RowLengthError {}

impl From<RowLengthError> for crate::XptError {
    fn from(err: RowLengthError) -> Self {
        Self::RowLengthMismatch {
            expected: err.expected,
            actual: err.actual,
        }
    }
}

/// One member of a transport library.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XptDataset {
    /// Dataset name (1-8 characters).
    pub name: String,
    /// Dataset label (up to 40 characters).
    pub label: Option<String>,
    /// Member type, usually `DATA`.
    pub dataset_type: Option<String>,
    /// Member header metadata; the writer falls back to its options when unset.
    pub header: Option<XptHeader>,
    /// Ordered column definitions.
    pub columns: Vec<XptColumn>,
    /// Rows, each aligned with `columns`.
    pub rows: Vec<Vec<XptValue>>,
}

impl XptDataset {
    /// Empty dataset with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            dataset_type: None,
            header: None,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Empty dataset with the given columns.
    pub fn with_columns(name: impl Into<String>, columns: Vec<XptColumn>) -> Self {
        Self {
            columns,
            ..Self::new(name)
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the member type.
    #[must_use]
    pub fn with_type(mut self, dataset_type: impl Into<String>) -> Self {
        self.dataset_type = Some(dataset_type.into());
        self
    }

    /// Append a row, checking its arity.
    pub fn add_row(&mut self, row: Vec<XptValue>) -> Result<(), RowLengthError> {
        if row.len() != self.columns.len() {
            return Err(RowLengthError {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Label written to the member header (empty if unset).
    #[must_use]
    pub fn effective_label(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    /// Column names in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Find a column by name.
    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<&XptColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Bytes per observation.
    #[must_use]
    pub fn observation_length(&self) -> usize {
        self.columns.iter().map(|c| c.length as usize).sum()
    }

    /// Values of one column, by position.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &XptValue> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }
}

/// A whole transport file: library header plus its members.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XptLibrary {
    /// Library header metadata.
    pub header: XptHeader,
    /// Members in file order.
    pub datasets: Vec<XptDataset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_row_checks_arity() {
        let mut ds = XptDataset::with_columns(
            "DM",
            vec![XptColumn::numeric("AGE"), XptColumn::character("SEX", 1)],
        );
        assert!(
            ds.add_row(vec![XptValue::numeric(1.0), XptValue::character("M")])
                .is_ok()
        );
        let err = ds.add_row(vec![XptValue::numeric(1.0)]).unwrap_err();
        assert_eq!(err.expected, 2);
        assert_eq!(err.actual, 1);
        assert_eq!(ds.num_rows(), 1);
    }

    #[test]
    fn test_observation_length() {
        let ds = XptDataset::with_columns(
            "T",
            vec![XptColumn::numeric("A"), XptColumn::character("B", 20)],
        );
        assert_eq!(ds.observation_length(), 28);
        assert_eq!(ds.field_names(), vec!["A", "B"]);
        assert_eq!(ds.column_by_name("B").map(|c| c.length), Some(20));
        assert!(ds.column_by_name("b").is_none());
    }
}
