//! Error types for XPT file operations.
//!
//! Errors fall into three groups, reported by [`XptError::kind`]:
//! - [`ErrorKind::Format`]: the byte stream does not follow the XPT layout
//! - [`ErrorKind::Value`]: in-memory data cannot be written as XPT
//! - [`ErrorKind::Io`]: the underlying source or sink failed

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Broad category of an [`XptError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unsupported input bytes.
    Format,
    /// Caller-supplied data violates a writer constraint.
    Value,
    /// I/O failure.
    Io,
}

/// Errors that can occur when reading or writing XPT files.
#[derive(Debug, Error)]
pub enum XptError {
    // === Format errors ===
    /// Invalid XPT file format.
    #[error("invalid XPT file: {message}")]
    InvalidFormat { message: String },

    /// The source contained no bytes at all.
    #[error("invalid XPT file: input is empty")]
    EmptyInput,

    /// Missing required header record.
    #[error("missing header: expected {expected}")]
    MissingHeader { expected: &'static str },

    /// Header layout of a newer transport version.
    #[error("unsupported transport version: {found} headers are not supported")]
    UnsupportedVersion { found: &'static str },

    /// Invalid NAMESTR record.
    #[error("invalid NAMESTR at index {index}: {message}")]
    InvalidNamestr { index: usize, message: String },

    /// Declared variable count does not match the NAMESTR block.
    #[error("member header declares {declared} variables but the NAMESTR block {detail}")]
    VariableCountMismatch {
        declared: usize,
        detail: &'static str,
    },

    /// A header record ended before 80 bytes.
    #[error("truncated {expected} record: stream ended before 80 bytes")]
    TruncatedRecord { expected: &'static str },

    /// Observation data ended in the middle of a row.
    #[error("truncated observation: {available} of {expected} bytes present")]
    TruncatedRow { expected: usize, available: usize },

    /// Numeric header field parsing error.
    #[error("failed to parse numeric field: {field}")]
    NumericParse { field: String },

    /// Header datetime does not follow `ddMMMyy:hh:mm:ss`.
    #[error("invalid header datetime: '{value}'")]
    InvalidDatetime { value: String },

    // === Value errors ===
    /// Dataset name empty or too long.
    #[error("invalid dataset name '{name}': must be 1 to 8 characters")]
    InvalidDatasetName { name: String },

    /// Dataset label exceeds 40 character limit.
    #[error("dataset label for '{name}' exceeds 40 character limit")]
    DatasetLabelTooLong { name: String },

    /// Variable name empty, too long or containing unsupported characters.
    #[error("invalid variable name '{name}': {reason}")]
    InvalidVariableName { name: String, reason: &'static str },

    /// Duplicate variable name.
    #[error("duplicate variable name: {name}")]
    DuplicateVariable { name: String },

    /// Variable label exceeds 40 character limit.
    #[error("label for '{name}' exceeds 40 character limit ({length} characters)")]
    LabelTooLong { name: String, length: usize },

    /// Format or informat name exceeds 8 character limit.
    #[error("format name '{format}' exceeds 8 character limit")]
    FormatNameTooLong { format: String },

    /// Storage length outside what the variable type allows.
    #[error("variable {name} has invalid length {length}")]
    InvalidLength { name: String, length: u16 },

    /// Library or member header text wider than its field.
    #[error("header field {field} value '{value}' exceeds 8 characters")]
    HeaderFieldTooLong { field: &'static str, value: String },

    /// Header timestamp outside what `ddMMMyy:hh:mm:ss` can hold.
    #[error("header {field} datetime {value} cannot be stored as ddMMMyy:hh:mm:ss")]
    UnrepresentableDatetime {
        field: &'static str,
        value: NaiveDateTime,
    },

    /// A library must contain at least one member.
    #[error("cannot write a library with no members")]
    EmptyLibrary,

    /// More variables than a NAMESTR header can declare.
    #[error("too many variables: {count} (maximum {max})")]
    TooManyVariables { count: usize, max: usize },

    /// Row length mismatch against the dataset columns.
    #[error("row length mismatch: expected {expected}, got {actual}")]
    RowLengthMismatch { expected: usize, actual: usize },

    /// Input rows have different lengths.
    #[error("row {row} has {actual} fields, expected {expected}")]
    RowShapeMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Input mapping rows have different key sets.
    #[error("row {row} keys do not match the first row")]
    RowKeysMismatch { row: usize },

    /// Input columns have different lengths.
    #[error("column '{label}' has {actual} values, expected {expected}")]
    ColumnLengthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },

    /// A value does not match its column type.
    #[error("value for variable {name} does not match its {expected} type")]
    TypeMismatch { name: String, expected: &'static str },

    /// Character value longer than the column storage length.
    #[error("value for variable {name} is {actual} bytes, column length is {length}")]
    ValueTooLong {
        name: String,
        length: u16,
        actual: usize,
    },

    /// Magnitude too large for IBM floating point.
    #[error("float conversion error: {value} exceeds the IBM floating point range")]
    FloatOverflow { value: f64 },

    /// Nonzero magnitude too small for IBM floating point.
    #[error("float conversion error: {value} is below the IBM floating point range")]
    FloatUnderflow { value: f64 },

    /// Text contains characters outside the single-byte charset.
    #[error("text '{text}' cannot be encoded in {encoding}")]
    Unencodable {
        text: String,
        encoding: &'static str,
    },

    // === I/O errors ===
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for XPT operations.
pub type Result<T> = std::result::Result<T, XptError>;

impl XptError {
    /// Create an InvalidFormat error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Create a MissingHeader error.
    pub fn missing_header(expected: &'static str) -> Self {
        Self::MissingHeader { expected }
    }

    /// Create an InvalidNamestr error.
    pub fn invalid_namestr(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidNamestr {
            index,
            message: message.into(),
        }
    }

    /// Create an InvalidDatasetName error.
    pub fn invalid_dataset_name(name: impl Into<String>) -> Self {
        Self::InvalidDatasetName { name: name.into() }
    }

    /// Create an InvalidVariableName error.
    pub fn invalid_variable_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidVariableName {
            name: name.into(),
            reason,
        }
    }

    /// Create a DuplicateVariable error.
    pub fn duplicate_variable(name: impl Into<String>) -> Self {
        Self::DuplicateVariable { name: name.into() }
    }

    /// Create an Unencodable error for the single-byte charset.
    pub fn unencodable(text: impl Into<String>) -> Self {
        Self::Unencodable {
            text: text.into(),
            encoding: crate::text::ENCODING_NAME,
        }
    }

    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat { .. }
            | Self::EmptyInput
            | Self::MissingHeader { .. }
            | Self::UnsupportedVersion { .. }
            | Self::InvalidNamestr { .. }
            | Self::VariableCountMismatch { .. }
            | Self::TruncatedRecord { .. }
            | Self::TruncatedRow { .. }
            | Self::NumericParse { .. }
            | Self::InvalidDatetime { .. } => ErrorKind::Format,
            Self::FileNotFound { .. } | Self::Io(_) => ErrorKind::Io,
            _ => ErrorKind::Value,
        }
    }

    /// Whether the input bytes were malformed.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    /// Whether caller-supplied data was rejected.
    #[must_use]
    pub fn is_value_error(&self) -> bool {
        self.kind() == ErrorKind::Value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = XptError::invalid_format("test message");
        assert_eq!(format!("{err}"), "invalid XPT file: test message");

        let err = XptError::missing_header("LIBRARY HEADER");
        assert_eq!(format!("{err}"), "missing header: expected LIBRARY HEADER");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let xpt_err: XptError = io_err.into();
        assert!(matches!(xpt_err, XptError::Io(_)));
        assert_eq!(xpt_err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_error_kinds() {
        assert!(XptError::EmptyInput.is_format_error());
        assert!(XptError::UnsupportedVersion { found: "LIBV8" }.is_format_error());
        assert!(XptError::FloatOverflow { value: 1e100 }.is_value_error());
        assert!(XptError::RowKeysMismatch { row: 1 }.is_value_error());
        assert!(XptError::unencodable("\u{4e2d}").is_value_error());
    }
}
