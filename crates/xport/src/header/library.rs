//! Library header record handling.
//!
//! The library header is the first set of records in an XPT file.
//!
//! # Structure
//!
//! 1. Fixed header: `HEADER RECORD*******LIBRARY HEADER RECORD!!!!!!!...`
//! 2. Real header (80 bytes): SAS version, OS, created datetime
//! 3. Second header (80 bytes): Modified datetime

use crate::error::{Result, XptError};
use crate::record::{RECORD_LEN, Record};
use crate::text::{read_field, write_field};
use crate::types::XptHeader;

use super::datetime::{format_xpt_datetime, require_xpt_datetime};
use super::{build_fixed_header, has_prefix};

/// Library header prefix.
pub const LIBRARY_HEADER_PREFIX: &str = "HEADER RECORD*******LIBRARY HEADER RECORD!!!!!!!";

/// Library header prefix of the V8/V9 layout (not supported).
pub const LIBV8_HEADER_PREFIX: &str = "HEADER RECORD*******LIBV8   HEADER RECORD!!!!!!!";

/// Version, OS and datetime text as stored in a real header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryInfo {
    /// SAS version string.
    pub sas_version: String,
    /// Operating system name.
    pub os_name: String,
    /// Created datetime string (ddMMMyy:hh:mm:ss).
    pub created: String,
    /// Modified datetime string.
    pub modified: String,
}

impl From<&XptHeader> for LibraryInfo {
    fn from(header: &XptHeader) -> Self {
        Self {
            sas_version: header.sas_version.clone(),
            os_name: header.os_name.clone(),
            created: format_xpt_datetime(header.created),
            modified: format_xpt_datetime(header.modified),
        }
    }
}

impl LibraryInfo {
    /// Parse the datetime text into typed header metadata.
    pub fn to_header(&self) -> Result<XptHeader> {
        Ok(XptHeader {
            sas_version: self.sas_version.clone(),
            os_name: self.os_name.clone(),
            created: require_xpt_datetime(&self.created)?,
            modified: require_xpt_datetime(&self.modified)?,
        })
    }
}

/// Validate that a record starts with the library header prefix.
///
/// A V8/V9 library header is reported as unsupported rather than missing.
pub fn validate_library_header(record: &[u8]) -> Result<()> {
    if record.len() < RECORD_LEN {
        return Err(XptError::invalid_format("record too short"));
    }
    if has_prefix(record, LIBV8_HEADER_PREFIX) {
        return Err(XptError::UnsupportedVersion { found: "LIBV8" });
    }
    if !has_prefix(record, LIBRARY_HEADER_PREFIX) {
        return Err(XptError::missing_header("LIBRARY HEADER"));
    }
    Ok(())
}

/// Parse the library real header (first 80 bytes after fixed header).
///
/// # Structure
///
/// | Offset | Length | Field       | Description              |
/// |--------|--------|-------------|--------------------------|
/// | 0-7    | 8      | sas_symbol1 | "SAS     "               |
/// | 8-15   | 8      | sas_symbol2 | "SAS     "               |
/// | 16-23  | 8      | saslib      | "SASLIB  "               |
/// | 24-31  | 8      | sasver      | SAS version              |
/// | 32-39  | 8      | sas_os      | Operating system         |
/// | 40-63  | 24     | blanks      | Spaces                   |
/// | 64-79  | 16     | created     | Created datetime         |
///
/// The modified datetime comes from the second header.
pub fn parse_real_header(record: &[u8]) -> Result<LibraryInfo> {
    if record.len() < RECORD_LEN {
        return Err(XptError::invalid_format("real header too short"));
    }
    if !record.starts_with(b"SAS     ") {
        return Err(XptError::invalid_format("real header does not start with SAS"));
    }

    Ok(LibraryInfo {
        sas_version: read_field(record, 24, 8),
        os_name: read_field(record, 32, 8),
        created: read_field(record, 64, 16),
        modified: String::new(),
    })
}

/// Parse the second header (modified datetime at offset 0-15).
#[must_use]
pub fn parse_second_header(record: &[u8]) -> String {
    read_field(record, 0, 16)
}

/// Build the fixed library header record.
#[must_use]
pub fn build_library_header() -> Record {
    build_fixed_header(LIBRARY_HEADER_PREFIX)
}

/// Build the real header record with library info.
pub fn build_real_header(info: &LibraryInfo) -> Result<Record> {
    let mut record = [b' '; RECORD_LEN];
    write_field(&mut record, 0, "SAS", 8)?;
    write_field(&mut record, 8, "SAS", 8)?;
    write_field(&mut record, 16, "SASLIB", 8)?;
    write_field(&mut record, 24, &info.sas_version, 8)?;
    write_field(&mut record, 32, &info.os_name, 8)?;
    write_field(&mut record, 64, &info.created, 16)?;
    Ok(record)
}

/// Build the second header record (modified datetime).
pub fn build_second_header(modified: &str) -> Result<Record> {
    let mut record = [b' '; RECORD_LEN];
    write_field(&mut record, 0, modified, 16)?;
    Ok(record)
}
