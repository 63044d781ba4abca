//! Dataset builder for untyped in-memory data.
//!
//! [`XptBuilder`] turns rows, keyed rows, record objects or columns into an
//! [`XptDataset`]. Column types and storage widths are inferred from the
//! values; labels are turned into valid variable names by a
//! [`NameSanitizer`].
//!
//! ```
//! use xport::{XptBuilder, XptValue};
//!
//! let dataset = XptBuilder::from_columns([
//!     ("Subject ID", vec![XptValue::character("S-001"), XptValue::character("S-002")]),
//!     ("Age", vec![XptValue::numeric(34.0), XptValue::numeric_missing()]),
//! ])
//! .unwrap()
//! .build()
//! .unwrap();
//!
//! assert_eq!(dataset.field_names(), vec!["Subject_", "Age"]);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::Write;

use tracing::debug;

use crate::error::{Result, XptError};
use crate::float::{encode_missing, ieee_to_ibm, significant_length};
use crate::header::MAX_VARIABLES;
use crate::text::encoded_len;
use crate::types::{
    NUMERIC_LENGTH, NumericValue, XptBuilderOptions, XptColumn, XptDataset, XptValue,
    XptWriterOptions,
};
use crate::writer::{MAX_LABEL_LEN, MAX_NAME_LEN, XptWriter};

/// Turns a column label into a variable name of at most 8 characters.
pub trait NameSanitizer {
    /// Produce a variable name for `label`.
    fn sanitize(&self, label: &str) -> String;
}

impl<F> NameSanitizer for F
where
    F: Fn(&str) -> String,
{
    fn sanitize(&self, label: &str) -> String {
        self(label)
    }
}

/// Default name sanitizer.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, a leading digit gets a `_`
/// prefix and the result is cut to 8 characters. Case is preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSanitizer;

impl NameSanitizer for DefaultSanitizer {
    fn sanitize(&self, label: &str) -> String {
        let mut name: String = label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        if name.is_empty() {
            name.push('_');
        }
        name.truncate(MAX_NAME_LEN);
        name
    }
}

/// Row objects that expose named fields.
pub trait NamedFields {
    /// Field names and values, in column order.
    fn fields(&self) -> Vec<(&str, XptValue)>;
}

/// Builds a dataset from untyped input.
///
/// Input is resolved into labelled columns when the builder is created;
/// [`XptBuilder::build`] infers types and widths and picks variable names.
pub struct XptBuilder {
    labels: Vec<String>,
    columns: Vec<Vec<XptValue>>,
    options: XptBuilderOptions,
    sanitizer: Box<dyn NameSanitizer>,
}

impl XptBuilder {
    fn new(labels: Vec<String>, columns: Vec<Vec<XptValue>>) -> Self {
        Self {
            labels,
            columns,
            options: XptBuilderOptions::default(),
            sanitizer: Box::new(DefaultSanitizer),
        }
    }

    /// Build from plain rows; columns are labelled `VAR1`, `VAR2`, ...
    pub fn from_rows(rows: Vec<Vec<XptValue>>) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        let labels = (1..=width).map(|i| format!("VAR{i}")).collect();
        Self::from_rows_with_labels(labels, rows)
    }

    /// Build from plain rows with explicit column labels.
    pub fn from_rows_with_labels(labels: Vec<String>, rows: Vec<Vec<XptValue>>) -> Result<Self> {
        let mut columns: Vec<Vec<XptValue>> = vec![Vec::with_capacity(rows.len()); labels.len()];
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != labels.len() {
                return Err(XptError::RowShapeMismatch {
                    row: idx,
                    expected: labels.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        Ok(Self::new(labels, columns))
    }

    /// Build from rows of `(label, value)` pairs.
    ///
    /// Column order comes from the first row. Every row must carry the same
    /// labels; values are reordered to match the first row.
    pub fn from_mappings(rows: Vec<Vec<(String, XptValue)>>) -> Result<Self> {
        let labels: Vec<String> = rows
            .first()
            .map(|row| row.iter().map(|(label, _)| label.clone()).collect())
            .unwrap_or_default();

        let unique: HashSet<&str> = labels.iter().map(String::as_str).collect();
        if unique.len() != labels.len() {
            return Err(XptError::RowKeysMismatch { row: 0 });
        }

        let mut columns: Vec<Vec<XptValue>> = vec![Vec::with_capacity(rows.len()); labels.len()];
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != labels.len() {
                return Err(XptError::RowKeysMismatch { row: idx });
            }
            let mut by_label: HashMap<String, XptValue> = row.into_iter().collect();
            for (column, label) in columns.iter_mut().zip(&labels) {
                let value = by_label
                    .remove(label)
                    .ok_or(XptError::RowKeysMismatch { row: idx })?;
                column.push(value);
            }
        }
        Ok(Self::new(labels, columns))
    }

    /// Build from row objects exposing named fields.
    pub fn from_records<T: NamedFields>(records: &[T]) -> Result<Self> {
        let rows = records
            .iter()
            .map(|record| {
                record
                    .fields()
                    .into_iter()
                    .map(|(label, value)| (label.to_string(), value))
                    .collect()
            })
            .collect();
        Self::from_mappings(rows)
    }

    /// Build from labelled columns, in iteration order.
    pub fn from_columns<K, I>(columns: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Vec<XptValue>)>,
    {
        let mut labels = Vec::new();
        let mut values: Vec<Vec<XptValue>> = Vec::new();
        for (label, column) in columns {
            let label: String = label.into();
            if let Some(first) = values.first()
                && first.len() != column.len()
            {
                return Err(XptError::ColumnLengthMismatch {
                    label,
                    expected: first.len(),
                    actual: column.len(),
                });
            }
            labels.push(label);
            values.push(column);
        }
        Ok(Self::new(labels, values))
    }

    /// Set builder options.
    #[must_use]
    pub fn with_options(mut self, options: XptBuilderOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the member name.
    #[must_use]
    pub fn with_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.options.dataset_name = name.into();
        self
    }

    /// Use a custom name sanitizer.
    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: impl NameSanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    /// Column labels in order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Infer column definitions and materialize the dataset.
    pub fn build(self) -> Result<XptDataset> {
        if self.labels.len() > MAX_VARIABLES {
            return Err(XptError::TooManyVariables {
                count: self.labels.len(),
                max: MAX_VARIABLES,
            });
        }

        let names = unique_names(&self.labels, self.sanitizer.as_ref());
        let num_rows = self.columns.first().map_or(0, Vec::len);

        let mut definitions = Vec::with_capacity(self.labels.len());
        let mut columns = Vec::with_capacity(self.labels.len());
        for ((label, name), values) in self.labels.iter().zip(names).zip(self.columns) {
            let (mut column, values) = infer_column(name, label, values, &self.options)?;

            let label_len = encoded_len(label)?;
            if label_len > MAX_LABEL_LEN {
                return Err(XptError::LabelTooLong {
                    name: column.name,
                    length: label_len,
                });
            }
            if *label != column.name {
                column.label = Some(label.clone());
            }

            definitions.push(column);
            columns.push(values.into_iter());
        }

        let rows = (0..num_rows)
            .map(|_| columns.iter_mut().filter_map(Iterator::next).collect())
            .collect();

        Ok(XptDataset {
            name: self.options.dataset_name,
            label: self.options.dataset_label,
            dataset_type: None,
            header: None,
            columns: definitions,
            rows,
        })
    }

    /// Build the dataset and write it as a single-member XPT file.
    pub fn write_to<W: Write>(self, sink: W, options: &XptWriterOptions) -> Result<()> {
        let dataset = self.build()?;
        XptWriter::with_options(sink, options.clone()).write_dataset(&dataset)
    }

    /// Build the dataset and encode it in memory.
    pub fn to_bytes(self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out, &XptWriterOptions::default())?;
        Ok(out)
    }
}

/// Sanitize every label, resolving collisions with a numeric suffix.
///
/// Collisions are checked case-insensitively.
fn unique_names(labels: &[String], sanitizer: &dyn NameSanitizer) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .iter()
        .map(|label| {
            let base = sanitizer.sanitize(label);
            let mut name = base.clone();
            let mut counter = 1usize;
            while !seen.insert(name.to_ascii_uppercase()) {
                let suffix = counter.to_string();
                let keep = MAX_NAME_LEN.saturating_sub(suffix.len());
                name = base.chars().take(keep).chain(suffix.chars()).collect();
                counter += 1;
            }
            name
        })
        .collect()
}

/// Infer the type and width of one column, converting values to match.
fn infer_column(
    name: String,
    label: &str,
    values: Vec<XptValue>,
    options: &XptBuilderOptions,
) -> Result<(XptColumn, Vec<XptValue>)> {
    if values.iter().all(XptValue::is_numeric) {
        let mut width = if options.compact_numerics && !values.is_empty() {
            0
        } else {
            usize::from(NUMERIC_LENGTH)
        };
        if options.compact_numerics {
            for value in &values {
                width = width.max(significant_length(numeric_word(value)?));
            }
        }
        let length = u16::try_from(width).unwrap_or(NUMERIC_LENGTH);
        return Ok((XptColumn::numeric(name).with_length(length), values));
    }

    if values.iter().any(XptValue::is_numeric) {
        debug!(column = %label, "mixed values stored as character");
    }

    let texts: Vec<String> = values.iter().map(XptValue::to_text).collect();
    let mut width = 1usize;
    for text in &texts {
        width = width.max(encoded_len(text)?);
    }
    let length = u16::try_from(width).map_err(|_| XptError::InvalidLength {
        name: name.clone(),
        length: u16::MAX,
    })?;

    let values = texts.into_iter().map(XptValue::Char).collect();
    Ok((XptColumn::character(name, length), values))
}

/// Full IBM word of a numeric cell.
fn numeric_word(value: &XptValue) -> Result<[u8; 8]> {
    match value {
        XptValue::Num(NumericValue::Value(v)) => ieee_to_ibm(*v),
        XptValue::Num(NumericValue::Missing(m)) => Ok(encode_missing(*m)),
        XptValue::Char(_) => Err(XptError::TypeMismatch {
            name: value.to_text(),
            expected: "numeric",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::XptType;

    fn num(v: f64) -> XptValue {
        XptValue::numeric(v)
    }

    fn chr(s: &str) -> XptValue {
        XptValue::character(s)
    }

    #[test]
    fn test_default_sanitizer() {
        let s = DefaultSanitizer;
        assert_eq!(s.sanitize("my col"), "my_col");
        assert_eq!(s.sanitize("1abc"), "_1abc");
        assert_eq!(s.sanitize("averyverylongname"), "averyver");
        assert_eq!(s.sanitize(""), "_");
        assert_eq!(s.sanitize("é"), "_");
        assert_eq!(s.sanitize("n"), "n");
    }

    #[test]
    fn test_unique_names() {
        let labels = vec![
            "averyverylongname".to_string(),
            "averyverylongname2".to_string(),
            "A".to_string(),
            "a".to_string(),
        ];
        let names = unique_names(&labels, &DefaultSanitizer);
        assert_eq!(names, vec!["averyver", "averyve1", "A", "a1"]);
    }

    #[test]
    fn test_mixed_column_becomes_character() {
        let dataset = XptBuilder::from_columns([("x", vec![num(1.0), num(2.0), chr("x")])])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(dataset.columns[0].data_type, XptType::Char);
        assert_eq!(dataset.columns[0].length, 1);
        assert_eq!(
            dataset.column_values(0).cloned().collect::<Vec<_>>(),
            vec![chr("1"), chr("2"), chr("x")]
        );
    }

    #[test]
    fn test_numeric_widths() {
        let dataset = XptBuilder::from_columns([
            ("small", vec![num(1.0), num(2.0), XptValue::numeric_missing()]),
            ("wide", vec![num(0.1)]),
        ]);
        assert!(matches!(
            dataset,
            Err(XptError::ColumnLengthMismatch { .. })
        ));

        let dataset = XptBuilder::from_columns([
            ("small", vec![num(1.0), XptValue::numeric_missing()]),
            ("wide", vec![num(0.1), num(0.0)]),
        ])
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(dataset.columns[0].length, 2);
        assert_eq!(dataset.columns[1].length, 8);

        let full = XptBuilder::from_columns([("small", vec![num(1.0)])])
            .unwrap()
            .with_options(XptBuilderOptions::new().full_width_numerics())
            .build()
            .unwrap();
        assert_eq!(full.columns[0].length, 8);
    }

    #[test]
    fn test_from_rows_labels() {
        let dataset = XptBuilder::from_rows(vec![vec![num(1.0), chr("a")], vec![num(2.0), chr("bc")]])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(dataset.field_names(), vec!["VAR1", "VAR2"]);
        assert_eq!(dataset.columns[1].length, 2);
        assert_eq!(dataset.columns[0].label, None);
        assert_eq!(dataset.rows[1], vec![num(2.0), chr("bc")]);
    }

    #[test]
    fn test_ragged_rows() {
        let err = XptBuilder::from_rows(vec![vec![num(1.0)], vec![num(1.0), num(2.0)]])
            .err()
            .unwrap();
        assert!(matches!(
            err,
            XptError::RowShapeMismatch {
                row: 1,
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_mappings_reorder_and_mismatch() {
        let rows = vec![
            vec![("b".to_string(), num(1.0)), ("a".to_string(), chr("x"))],
            vec![("a".to_string(), chr("y")), ("b".to_string(), num(2.0))],
        ];
        let dataset = XptBuilder::from_mappings(rows).unwrap().build().unwrap();
        assert_eq!(dataset.field_names(), vec!["b", "a"]);
        assert_eq!(dataset.rows[1], vec![num(2.0), chr("y")]);

        let rows = vec![
            vec![("a".to_string(), num(1.0))],
            vec![("c".to_string(), num(2.0))],
        ];
        assert!(matches!(
            XptBuilder::from_mappings(rows),
            Err(XptError::RowKeysMismatch { row: 1 })
        ));
    }

    struct Subject {
        id: String,
        age: f64,
    }

    impl NamedFields for Subject {
        fn fields(&self) -> Vec<(&str, XptValue)> {
            vec![("id", chr(&self.id)), ("age", num(self.age))]
        }
    }

    #[test]
    fn test_from_records() {
        let records = vec![
            Subject {
                id: "S-1".to_string(),
                age: 30.0,
            },
            Subject {
                id: "S-22".to_string(),
                age: 41.5,
            },
        ];
        let dataset = XptBuilder::from_records(&records).unwrap().build().unwrap();
        assert_eq!(dataset.field_names(), vec!["id", "age"]);
        assert_eq!(dataset.columns[0].length, 4);
        assert_eq!(dataset.rows[1][1], num(41.5));
    }

    #[test]
    fn test_labels_kept_when_renamed() {
        let dataset = XptBuilder::from_columns([("Visit Date", vec![chr("2024-01-01")])])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(dataset.columns[0].name, "Visit_Da");
        assert_eq!(dataset.columns[0].label.as_deref(), Some("Visit Date"));
    }

    #[test]
    fn test_label_too_long() {
        let label = "x".repeat(41);
        let result = XptBuilder::from_columns([(label, vec![num(1.0)])])
            .unwrap()
            .build();
        assert!(matches!(result, Err(XptError::LabelTooLong { length: 41, .. })));
    }

    #[test]
    fn test_overflow_fails_before_output() {
        let result = XptBuilder::from_columns([("x", vec![num(1e100)])])
            .unwrap()
            .to_bytes();
        assert!(matches!(result, Err(XptError::FloatOverflow { .. })));
    }

    #[test]
    fn test_custom_sanitizer() {
        let dataset = XptBuilder::from_columns([("id", vec![num(1.0)])])
            .unwrap()
            .with_sanitizer(|label: &str| label.to_uppercase())
            .build()
            .unwrap();
        assert_eq!(dataset.columns[0].name, "ID");
        assert_eq!(dataset.columns[0].label.as_deref(), Some("id"));
    }
}
