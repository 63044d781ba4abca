//! Core types for XPT file handling.
//!
//! This module provides the fundamental data structures for representing
//! XPT datasets, columns, values, and file handling options.

mod column;
mod columns;
mod dataset;
mod missing;
mod options;
mod value;

pub use column::{Justification, MIN_NUMERIC_LENGTH, NUMERIC_LENGTH, XptColumn, XptType};
pub use columns::XptColumns;
pub use dataset::{RowLengthError, XptDataset, XptHeader, XptLibrary};
pub use missing::MissingValue;
pub use options::{XptBuilderOptions, XptReaderOptions, XptWriterOptions};
pub use value::{NumericValue, XptValue};
