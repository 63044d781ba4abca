//! SAS Transport (XPT) file format reader and writer.
//!
//! This crate reads and writes SAS Transport V5 files, the fixed-record
//! format used to exchange tabular datasets between SAS and other systems.
//!
//! # Features
//!
//! - Streaming reader: headers are parsed up front, rows are decoded lazily
//! - Multi-member libraries on read and write
//! - IEEE ↔ IBM mainframe floating-point conversion
//! - Support for all 28 SAS missing value codes (`.`, `._`, `.A`-`.Z`)
//! - Variable metadata including formats and informats
//! - Dataset builder with type inference for untyped rows or columns
//! - Optional `serde` support for the data types (with `serde` feature)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use xport::{XptColumn, XptDataset, XptValue, read_xpt, write_xpt};
//!
//! // Read an XPT file
//! let dataset = read_xpt(Path::new("dm.xpt")).unwrap();
//! println!("Dataset: {} ({} rows)", dataset.name, dataset.num_rows());
//!
//! // Create a new dataset
//! let mut ds = XptDataset::with_columns(
//!     "DM",
//!     vec![
//!         XptColumn::character("USUBJID", 20).with_label("Unique Subject ID"),
//!         XptColumn::numeric("AGE").with_label("Age in Years"),
//!     ],
//! );
//! ds.add_row(vec![
//!     XptValue::character("STUDY-001"),
//!     XptValue::numeric(35.0),
//! ])
//! .unwrap();
//!
//! // Write to XPT file
//! write_xpt(Path::new("dm_out.xpt"), &ds).unwrap();
//! ```
//!
//! # Streaming
//!
//! ```no_run
//! use std::path::Path;
//! use xport::XptReader;
//!
//! let mut reader = XptReader::open(Path::new("lb.xpt")).unwrap();
//! println!("{:?}", reader.field_names());
//! for row in reader.rows() {
//!     let row = row.unwrap();
//!     println!("{row:?}");
//! }
//! ```
//!
//! # Missing Values
//!
//! SAS supports 28 different missing value codes:
//!
//! ```
//! use xport::{MissingValue, XptValue};
//!
//! // Standard missing (.)
//! let missing = XptValue::numeric_missing();
//!
//! // Special missing (.A through .Z)
//! let missing_a = XptValue::numeric_missing_with(MissingValue::Special('A'));
//!
//! assert!(missing.is_missing());
//! assert!(missing_a.is_missing());
//! ```

mod builder;
mod error;
pub mod float;
pub mod header;
mod reader;
pub mod record;
pub mod text;
mod types;
mod writer;

// Re-export error types
pub use error::{ErrorKind, Result, XptError};

// Re-export core types
pub use types::{
    Justification, MIN_NUMERIC_LENGTH, MissingValue, NUMERIC_LENGTH, NumericValue,
    RowLengthError, XptBuilderOptions, XptColumn, XptColumns, XptDataset, XptHeader, XptLibrary,
    XptReaderOptions, XptType, XptValue, XptWriterOptions,
};

// Re-export reader functionality
pub use reader::{
    Rows, XptReader, from_bytes, library_from_bytes, read_xpt, read_xpt_library,
    read_xpt_with_options,
};

// Re-export writer functionality
pub use writer::{
    MAX_LABEL_LEN, MAX_NAME_LEN, XptWriter, to_bytes, to_bytes_with_options, write_xpt,
    write_xpt_library, write_xpt_with_options,
};

// Re-export builder functionality
pub use builder::{DefaultSanitizer, NameSanitizer, NamedFields, XptBuilder};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
