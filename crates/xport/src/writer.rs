//! XPT file writer.
//!
//! Writes SAS Transport V5 files. Every dataset is validated and its
//! observations encoded before the first byte reaches the sink.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, XptError};
use crate::float::encode_numeric;
use crate::header::{
    LibraryInfo, MAX_VARIABLES, NAMESTR_LEN, build_dscrptr_header, build_library_header,
    build_member_data, build_member_header, build_member_second, build_namestr,
    build_namestr_header, build_obs_header, build_real_header, build_second_header,
    check_xpt_datetime,
};
use crate::record::{Record, RecordWriter};
use crate::text::{encode, encoded_len};
use crate::types::{
    NumericValue, XptColumn, XptDataset, XptHeader, XptType, XptValue, XptWriterOptions,
};

/// Longest dataset or variable name.
pub const MAX_NAME_LEN: usize = 8;

/// Longest dataset or variable label.
pub const MAX_LABEL_LEN: usize = 40;

/// XPT file writer.
///
/// Writes SAS Transport V5 format files.
pub struct XptWriter<W: Write> {
    records: RecordWriter<BufWriter<W>>,
    options: XptWriterOptions,
}

/// A dataset whose header records and observations are already encoded.
struct EncodedMember {
    headers: Vec<Record>,
    namestrs: Vec<u8>,
    observations: Vec<u8>,
}

impl<W: Write> XptWriter<W> {
    /// Create a new XPT writer.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, XptWriterOptions::default())
    }

    /// Create a new XPT writer with options.
    pub fn with_options(writer: W, options: XptWriterOptions) -> Self {
        Self {
            records: RecordWriter::new(BufWriter::new(writer)),
            options,
        }
    }

    /// Write a single-member library.
    pub fn write_dataset(self, dataset: &XptDataset) -> Result<()> {
        self.write_library(std::slice::from_ref(dataset))
    }

    /// Write a library with one member per dataset, in order.
    pub fn write_library(mut self, datasets: &[XptDataset]) -> Result<()> {
        if datasets.is_empty() {
            return Err(XptError::EmptyLibrary);
        }

        let header = self.options.header();
        validate_header(&header)?;
        let info = LibraryInfo::from(&header);
        let library = [
            build_library_header(),
            build_real_header(&info)?,
            build_second_header(&info.modified)?,
        ];

        let members = datasets
            .iter()
            .map(|dataset| encode_member(dataset, &header, &self.options))
            .collect::<Result<Vec<_>>>()?;

        for record in &library {
            self.records.write_record(record)?;
        }
        for member in &members {
            for record in &member.headers {
                self.records.write_record(record)?;
            }
            self.records.write_bytes(&member.namestrs)?;
            self.records.pad()?;
            self.records.write_record(&build_obs_header())?;
            self.records.write_bytes(&member.observations)?;
            self.records.pad()?;
        }
        self.records.flush()?;

        debug!(
            members = datasets.len(),
            bytes = self.records.bytes_written(),
            "wrote XPT library"
        );
        Ok(())
    }
}

impl XptWriter<File> {
    /// Create an XPT file for writing.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(file))
    }

    /// Create an XPT file with options.
    pub fn create_with_options(path: &Path, options: XptWriterOptions) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_options(file, options))
    }
}

/// Write a dataset to an XPT file.
pub fn write_xpt(path: &Path, dataset: &XptDataset) -> Result<()> {
    XptWriter::create(path)?.write_dataset(dataset)
}

/// Write a dataset to an XPT file with options.
pub fn write_xpt_with_options(
    path: &Path,
    dataset: &XptDataset,
    options: &XptWriterOptions,
) -> Result<()> {
    XptWriter::create_with_options(path, options.clone())?.write_dataset(dataset)
}

/// Write several datasets to one XPT file.
pub fn write_xpt_library(
    path: &Path,
    datasets: &[XptDataset],
    options: &XptWriterOptions,
) -> Result<()> {
    XptWriter::create_with_options(path, options.clone())?.write_library(datasets)
}

/// Encode a dataset as an in-memory XPT file.
pub fn to_bytes(dataset: &XptDataset) -> Result<Vec<u8>> {
    to_bytes_with_options(dataset, &XptWriterOptions::default())
}

/// Encode a dataset as an in-memory XPT file with options.
pub fn to_bytes_with_options(dataset: &XptDataset, options: &XptWriterOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    XptWriter::with_options(&mut out, options.clone()).write_dataset(dataset)?;
    Ok(out)
}

/// Validate a dataset and encode its records.
fn encode_member(
    dataset: &XptDataset,
    library: &XptHeader,
    options: &XptWriterOptions,
) -> Result<EncodedMember> {
    validate_dataset(dataset)?;

    let header = dataset.header.as_ref().unwrap_or(library);
    validate_header(header)?;
    let info = LibraryInfo::from(header);

    let headers = vec![
        build_member_header(NAMESTR_LEN)?,
        build_dscrptr_header(),
        build_member_data(&dataset.name, &info)?,
        build_member_second(
            dataset.effective_label(),
            dataset.dataset_type.as_deref().unwrap_or(""),
            &info,
        )?,
        build_namestr_header(dataset.columns.len())?,
    ];

    let mut namestrs = Vec::with_capacity(dataset.columns.len() * NAMESTR_LEN);
    let mut position = 0u32;
    for (idx, column) in dataset.columns.iter().enumerate() {
        let varnum = u16::try_from(idx + 1).map_err(|_| XptError::TooManyVariables {
            count: dataset.columns.len(),
            max: MAX_VARIABLES,
        })?;
        namestrs.extend_from_slice(&build_namestr(column, varnum, position)?);
        position += u32::from(column.length);
    }

    let observations = encode_observations(dataset, options)?;

    debug!(
        dataset = %dataset.name,
        variables = dataset.columns.len(),
        rows = dataset.rows.len(),
        "encoded member"
    );

    Ok(EncodedMember {
        headers,
        namestrs,
        observations,
    })
}

/// Encode every row, end to end.
fn encode_observations(dataset: &XptDataset, options: &XptWriterOptions) -> Result<Vec<u8>> {
    let obs_len = dataset.observation_length();
    let mut out = Vec::with_capacity(obs_len * dataset.rows.len());

    for row in &dataset.rows {
        if row.len() != dataset.columns.len() {
            return Err(XptError::RowLengthMismatch {
                expected: dataset.columns.len(),
                actual: row.len(),
            });
        }
        for (value, column) in row.iter().zip(&dataset.columns) {
            out.extend_from_slice(&encode_value(value, column, options)?);
        }
    }

    Ok(out)
}

/// Validate dataset-level and column-level constraints.
fn validate_dataset(dataset: &XptDataset) -> Result<()> {
    let name_len = encoded_len(&dataset.name)?;
    if dataset.name.trim().is_empty() || name_len > MAX_NAME_LEN {
        return Err(XptError::invalid_dataset_name(&dataset.name));
    }

    if encoded_len(dataset.effective_label())? > MAX_LABEL_LEN {
        return Err(XptError::DatasetLabelTooLong {
            name: dataset.name.clone(),
        });
    }

    if let Some(dataset_type) = &dataset.dataset_type {
        check_header_field("dataset type", dataset_type)?;
    }

    if dataset.columns.len() > MAX_VARIABLES {
        return Err(XptError::TooManyVariables {
            count: dataset.columns.len(),
            max: MAX_VARIABLES,
        });
    }

    let mut seen = BTreeSet::new();
    for column in &dataset.columns {
        validate_column(column)?;
        if !seen.insert(column.name.to_ascii_uppercase()) {
            return Err(XptError::duplicate_variable(&column.name));
        }
    }

    Ok(())
}

/// Validate a single column definition.
fn validate_column(column: &XptColumn) -> Result<()> {
    validate_variable_name(&column.name)?;

    if let Some(label) = &column.label {
        let length = encoded_len(label)?;
        if length > MAX_LABEL_LEN {
            return Err(XptError::LabelTooLong {
                name: column.name.clone(),
                length,
            });
        }
    }

    for format in [&column.format, &column.informat].into_iter().flatten() {
        if encoded_len(format)? > 8 {
            return Err(XptError::FormatNameTooLong {
                format: format.clone(),
            });
        }
    }

    if !column.has_valid_length() {
        return Err(XptError::InvalidLength {
            name: column.name.clone(),
            length: column.length,
        });
    }

    Ok(())
}

/// Check that a name is 1-8 characters of `[A-Za-z0-9_]`, not starting with a digit.
pub(crate) fn validate_variable_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(XptError::invalid_variable_name(
            name,
            "must be 1 to 8 characters",
        ));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(XptError::invalid_variable_name(
            name,
            "may only contain letters, digits and underscores",
        ));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(XptError::invalid_variable_name(
            name,
            "must not start with a digit",
        ));
    }
    Ok(())
}

/// Check the version and OS text of a library or member header.
fn validate_header(header: &XptHeader) -> Result<()> {
    check_header_field("SAS version", &header.sas_version)?;
    check_header_field("OS name", &header.os_name)?;
    check_xpt_datetime("created", header.created)?;
    check_xpt_datetime("modified", header.modified)
}

fn check_header_field(field: &'static str, value: &str) -> Result<()> {
    if encoded_len(value)? > 8 {
        return Err(XptError::HeaderFieldTooLong {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Encode one cell into exactly `column.length` bytes.
fn encode_value(value: &XptValue, column: &XptColumn, options: &XptWriterOptions) -> Result<Vec<u8>> {
    match (value, column.data_type) {
        (XptValue::Char(s), XptType::Char) => encode_char(s, column),
        (XptValue::Num(n), XptType::Char) => encode_char(&value_text(n), column),
        (XptValue::Num(n), XptType::Num) => encode_num(n, column, options),
        (XptValue::Char(s), XptType::Num) => {
            let text = s.trim();
            let num = if text.is_empty() {
                NumericValue::Missing(options.default_missing)
            } else {
                text.parse::<f64>()
                    .map(NumericValue::from_f64)
                    .map_err(|_| XptError::TypeMismatch {
                        name: column.name.clone(),
                        expected: "numeric",
                    })?
            };
            encode_num(&num, column, options)
        }
    }
}

fn value_text(value: &NumericValue) -> String {
    XptValue::Num(*value).to_text()
}

/// Encode a character value, space-padded to the column length.
fn encode_char(value: &str, column: &XptColumn) -> Result<Vec<u8>> {
    let bytes = encode(value)?;
    let len = usize::from(column.length);
    if bytes.len() > len {
        return Err(XptError::ValueTooLong {
            name: column.name.clone(),
            length: column.length,
            actual: bytes.len(),
        });
    }

    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&bytes);
    out.resize(len, b' ');
    Ok(out)
}

/// Encode a numeric value, truncated to the column length.
fn encode_num(value: &NumericValue, column: &XptColumn, options: &XptWriterOptions) -> Result<Vec<u8>> {
    let value = match value {
        NumericValue::Value(v) if v.is_nan() => NumericValue::Missing(options.default_missing),
        other => *other,
    };
    encode_numeric(&value, usize::from(column.length))
}
