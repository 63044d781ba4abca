//! XPT file reader.
//!
//! Reads SAS Transport V5 files incrementally. Header and NAMESTR records of
//! a member are parsed up front; observations are decoded one row at a time
//! with at most one record of look-ahead.

use std::fs::File;
use std::io::{BufReader, Read};
use std::iter::FusedIterator;
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{Result, XptError};
use crate::float::decode_ibm;
use crate::header::{
    LibraryInfo, MemberInfo, is_member_header, is_obs_header, namestr_block_size,
    parse_member_data, parse_member_second, parse_namestr_len, parse_namestr_records,
    parse_real_header, parse_second_header, parse_variable_count, validate_dscrptr_header,
    validate_library_header, validate_member_header, validate_namestr_header,
};
use crate::record::{RECORD_LEN, RecordReader};
use crate::text::{decode, trim_padding};
use crate::types::{
    XptColumn, XptColumns, XptDataset, XptHeader, XptLibrary, XptReaderOptions, XptType, XptValue,
};

/// Position of the row cursor within the current member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowState {
    /// Just past the OBS header.
    Start,
    /// At least one row returned.
    Reading,
    /// End of member reached, or an error was returned.
    Done,
}

/// Metadata of the member being read.
#[derive(Debug, Clone)]
struct Member {
    name: String,
    label: Option<String>,
    dataset_type: Option<String>,
    header: XptHeader,
    columns: Vec<XptColumn>,
    obs_len: usize,
}

/// XPT file reader.
///
/// Created with the library header and the first member's metadata already
/// parsed. Rows are pulled lazily with [`XptReader::rows`]; further members
/// are reached with [`XptReader::next_member`].
pub struct XptReader<R: Read> {
    records: RecordReader<BufReader<R>>,
    options: XptReaderOptions,
    library: XptHeader,
    member: Member,
    state: RowState,
    buffer: Vec<u8>,
    pos: usize,
}

impl<R: Read> XptReader<R> {
    /// Create a reader, parsing the library header and first member header.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, XptReaderOptions::default())
    }

    /// Create a reader with options.
    pub fn with_options(reader: R, options: XptReaderOptions) -> Result<Self> {
        let mut records = RecordReader::new(BufReader::new(reader));
        let library = read_library_header(&mut records)?;
        let member = read_member_header(&mut records)?;

        Ok(Self {
            records,
            options,
            library,
            member,
            state: RowState::Start,
            buffer: Vec::new(),
            pos: 0,
        })
    }

    /// Library header metadata.
    #[must_use]
    pub fn library(&self) -> &XptHeader {
        &self.library
    }

    /// Header metadata of the current member.
    #[must_use]
    pub fn member(&self) -> &XptHeader {
        &self.member.header
    }

    /// Name of the current member.
    #[must_use]
    pub fn dataset_name(&self) -> &str {
        &self.member.name
    }

    /// Label of the current member.
    #[must_use]
    pub fn dataset_label(&self) -> Option<&str> {
        self.member.label.as_deref()
    }

    /// Variables of the current member, in order.
    #[must_use]
    pub fn columns(&self) -> &[XptColumn] {
        &self.member.columns
    }

    /// Variable names of the current member, in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.member.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Lazy iterator over the remaining rows of the current member.
    ///
    /// The iterator is single-pass and stops for good after an error.
    pub fn rows(&mut self) -> Rows<'_, R> {
        Rows { reader: self }
    }

    /// Read all remaining rows of the current member.
    pub fn read_rows(&mut self) -> Result<Vec<Vec<XptValue>>> {
        self.rows().collect()
    }

    /// Read all remaining rows of the current member as columns.
    pub fn read_columns(&mut self) -> Result<XptColumns> {
        let mut values: Vec<Vec<XptValue>> = vec![Vec::new(); self.member.columns.len()];
        for row in self.rows() {
            for (column, value) in values.iter_mut().zip(row?) {
                column.push(value);
            }
        }

        Ok(self
            .member
            .columns
            .iter()
            .map(|c| c.name.clone())
            .zip(values)
            .collect())
    }

    /// Read the current member into a dataset.
    pub fn read_dataset(&mut self) -> Result<XptDataset> {
        let rows = self.read_rows()?;
        Ok(XptDataset {
            name: self.member.name.clone(),
            label: self.member.label.clone(),
            dataset_type: self.member.dataset_type.clone(),
            header: Some(self.member.header.clone()),
            columns: self.member.columns.clone(),
            rows,
        })
    }

    /// Skip any unread rows and move to the next member.
    ///
    /// Returns `false` at the end of the library.
    pub fn next_member(&mut self) -> Result<bool> {
        while self.next_row()?.is_some() {}

        loop {
            match self.records.peek_record()? {
                None => return Ok(false),
                Some(record) if is_member_header(record) => break,
                Some(record) if is_padding(record) => {
                    self.records.next_record()?;
                }
                Some(_) => {
                    return Err(XptError::invalid_format(
                        "unexpected record after observations",
                    ));
                }
            }
        }

        self.member = read_member_header(&mut self.records)?;
        self.state = RowState::Start;
        self.buffer.clear();
        self.pos = 0;
        Ok(true)
    }

    /// Decode the next row, moving to `Done` at the end or on error.
    fn next_row(&mut self) -> Result<Option<Vec<XptValue>>> {
        if self.state == RowState::Done {
            return Ok(None);
        }

        match self.pull_row() {
            Ok(Some(row)) => {
                self.state = RowState::Reading;
                Ok(Some(row))
            }
            Ok(None) => {
                trace!(dataset = %self.member.name, "end of member");
                self.state = RowState::Done;
                Ok(None)
            }
            Err(e) => {
                self.state = RowState::Done;
                Err(e)
            }
        }
    }

    fn pull_row(&mut self) -> Result<Option<Vec<XptValue>>> {
        let obs_len = self.member.obs_len;
        if obs_len == 0 {
            return Ok(None);
        }

        // Keep only the record holding the cursor.
        if self.pos >= RECORD_LEN {
            let consumed = self.pos - self.pos % RECORD_LEN;
            self.buffer.drain(..consumed);
            self.pos -= consumed;
        }

        if is_padding(&self.buffer[self.pos..]) && self.at_member_end()? {
            return Ok(None);
        }

        while self.buffer.len() - self.pos < obs_len {
            if self.at_member_end()? {
                break;
            }
            match self.records.next_record()? {
                Some(record) => self.buffer.extend_from_slice(&record),
                None => break,
            }
        }

        let available = self.buffer.len() - self.pos;
        if available < obs_len {
            if is_padding(&self.buffer[self.pos..]) {
                return Ok(None);
            }
            return Err(XptError::TruncatedRow {
                expected: obs_len,
                available,
            });
        }

        let row = decode_row(
            &self.buffer[self.pos..self.pos + obs_len],
            &self.member.columns,
            &self.options,
        );
        self.pos += obs_len;
        Ok(Some(row))
    }

    /// Whether the stream ends or the next record starts another member.
    fn at_member_end(&mut self) -> Result<bool> {
        Ok(match self.records.peek_record()? {
            None => true,
            Some(record) => is_member_header(record),
        })
    }
}

impl XptReader<File> {
    /// Open an XPT file for reading.
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(open_file(path)?)
    }

    /// Open an XPT file with options.
    pub fn open_with_options(path: &Path, options: XptReaderOptions) -> Result<Self> {
        Self::with_options(open_file(path)?, options)
    }
}

/// Row iterator returned by [`XptReader::rows`].
pub struct Rows<'a, R: Read> {
    reader: &'a mut XptReader<R>,
}

impl<R: Read> Iterator for Rows<'_, R> {
    type Item = Result<Vec<XptValue>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_row().transpose()
    }
}

impl<R: Read> FusedIterator for Rows<'_, R> {}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            XptError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            XptError::Io(e)
        }
    })
}

/// Read an XPT file from a path.
///
/// Returns the first member of the library.
pub fn read_xpt(path: &Path) -> Result<XptDataset> {
    XptReader::open(path)?.read_dataset()
}

/// Read an XPT file with options.
pub fn read_xpt_with_options(path: &Path, options: XptReaderOptions) -> Result<XptDataset> {
    XptReader::open_with_options(path, options)?.read_dataset()
}

/// Read every member of an XPT file.
pub fn read_xpt_library(path: &Path) -> Result<XptLibrary> {
    read_library(XptReader::open(path)?)
}

/// Parse the first member of an in-memory XPT file.
pub fn from_bytes(data: &[u8]) -> Result<XptDataset> {
    XptReader::new(data)?.read_dataset()
}

/// Parse every member of an in-memory XPT file.
pub fn library_from_bytes(data: &[u8]) -> Result<XptLibrary> {
    read_library(XptReader::new(data)?)
}

fn read_library<R: Read>(mut reader: XptReader<R>) -> Result<XptLibrary> {
    let mut datasets = vec![reader.read_dataset()?];
    while reader.next_member()? {
        datasets.push(reader.read_dataset()?);
    }
    Ok(XptLibrary {
        header: reader.library.clone(),
        datasets,
    })
}

/// Parse the three library header records.
fn read_library_header<R: Read>(records: &mut RecordReader<R>) -> Result<XptHeader> {
    let first = records.read_full_record("LIBRARY HEADER")?;
    validate_library_header(&first)?;

    let real = records.read_full_record("LIBRARY REAL HEADER")?;
    let mut info: LibraryInfo = parse_real_header(&real)?;

    let second = records.read_full_record("LIBRARY SECOND HEADER")?;
    info.modified = parse_second_header(&second);

    let header = info.to_header()?;
    debug!(
        sas_version = %header.sas_version,
        os = %header.os_name,
        created = %header.created,
        "parsed library header"
    );
    Ok(header)
}

/// Parse a member's header records, NAMESTR block and OBS header.
fn read_member_header<R: Read>(records: &mut RecordReader<R>) -> Result<Member> {
    let header = records.read_full_record("MEMBER HEADER")?;
    validate_member_header(&header)?;
    let namestr_len = parse_namestr_len(&header)?;

    let dscrptr = records.read_full_record("DSCRPTR HEADER")?;
    validate_dscrptr_header(&dscrptr)?;

    let data = records.read_full_record("MEMBER DATA")?;
    let mut info: MemberInfo = parse_member_data(&data)?;
    let second = records.read_full_record("MEMBER SECOND")?;
    parse_member_second(&second, &mut info);

    let namestr_header = records.read_full_record("NAMESTR HEADER")?;
    validate_namestr_header(&namestr_header)?;
    let var_count = parse_variable_count(&namestr_header)?;

    let block_size = namestr_block_size(var_count, namestr_len);
    let mut block = Vec::with_capacity(block_size);
    while block.len() < block_size {
        match records.next_record()? {
            Some(record) if !records.last_was_padded() && !is_obs_header(&record) => {
                block.extend_from_slice(&record);
            }
            _ => {
                return Err(XptError::VariableCountMismatch {
                    declared: var_count,
                    detail: "ends before the declared count",
                });
            }
        }
    }
    let columns = parse_namestr_records(&block, var_count, namestr_len)?;

    match records.next_record()? {
        Some(record) if is_obs_header(&record) => {}
        Some(_) => {
            return Err(XptError::VariableCountMismatch {
                declared: var_count,
                detail: "is followed by unexpected records",
            });
        }
        None => return Err(XptError::missing_header("OBS HEADER")),
    }

    let obs_len = columns.iter().map(|c| usize::from(c.length)).sum();
    debug!(
        dataset = %info.name,
        variables = var_count,
        namestr_len,
        obs_len,
        "parsed member header"
    );

    Ok(Member {
        header: info.info.to_header()?,
        name: info.name,
        label: info.label,
        dataset_type: info.dataset_type,
        columns,
        obs_len,
    })
}

/// Whether bytes are all blank padding.
fn is_padding(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == b' ')
}

/// Decode one observation.
fn decode_row(row: &[u8], columns: &[XptColumn], options: &XptReaderOptions) -> Vec<XptValue> {
    let mut values = Vec::with_capacity(columns.len());
    let mut pos = 0usize;

    for column in columns {
        let len = usize::from(column.length);
        let slice = &row[pos..pos + len];

        let value = match column.data_type {
            XptType::Char => XptValue::Char(decode_char(slice, options.trim_strings)),
            XptType::Num => XptValue::Num(decode_ibm(slice)),
        };

        values.push(value);
        pos += len;
    }

    values
}

/// Decode a character value.
fn decode_char(bytes: &[u8], trim: bool) -> String {
    if trim {
        decode(trim_padding(bytes)).into_owned()
    } else {
        decode(bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MissingValue, NumericValue};

    #[test]
    fn test_decode_char() {
        assert_eq!(decode_char(b"hello   ", true), "hello");
        assert_eq!(decode_char(b"hello   ", false), "hello   ");
        assert_eq!(decode_char(b"  a ", true), "  a");
        assert_eq!(decode_char(b"", true), "");
    }

    #[test]
    fn test_decode_row() {
        let columns = vec![XptColumn::numeric("A"), XptColumn::character("B", 4)];
        let mut row = vec![0x41, 0x10, 0, 0, 0, 0, 0, 0];
        row.extend_from_slice(b"ab  ");

        let values = decode_row(&row, &columns, &XptReaderOptions::default());
        assert_eq!(
            values,
            vec![XptValue::numeric(1.0), XptValue::character("ab")]
        );
    }

    #[test]
    fn test_decode_row_missing() {
        let columns = vec![XptColumn::numeric("A").with_length(3)];
        let values = decode_row(&[b'B', 0, 0], &columns, &XptReaderOptions::default());
        assert_eq!(
            values,
            vec![XptValue::Num(NumericValue::Missing(MissingValue::Special('B')))]
        );
    }

    #[test]
    fn test_padding_excludes_nul() {
        assert!(is_padding(b"    "));
        assert!(is_padding(b""));
        assert!(!is_padding(&[0, 0]));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(XptReader::new(&b""[..]), Err(XptError::EmptyInput)));
    }

    #[test]
    fn test_missing_library_header() {
        let data = [b'X'; RECORD_LEN * 3];
        let err = XptReader::new(&data[..]).err().unwrap();
        assert!(err.is_format_error());
    }
}
