//! Member header record handling.
//!
//! Each dataset (member) in an XPT file has its own set of header records.
//!
//! # Structure
//!
//! 1. Member header: `HEADER RECORD*******MEMBER  HEADER RECORD!!!!!!!...`
//! 2. DSCRPTR header: `HEADER RECORD*******DSCRPTR HEADER RECORD!!!!!!!...`
//! 3. Member data (80 bytes): Dataset name, version, etc.
//! 4. Member second (80 bytes): Modified datetime, label, type
//! 5. NAMESTR header: `HEADER RECORD*******NAMESTR HEADER RECORD!!!!!!!...`
//! 6. NAMESTR records: Variable definitions
//! 7. OBS header: `HEADER RECORD*******OBS     HEADER RECORD!!!!!!!...`
//! 8. Observation data

use crate::error::{Result, XptError};
use crate::record::{RECORD_LEN, Record, align_to_record};
use crate::text::{read_field, write_field};

use super::library::LibraryInfo;
use super::namestr::{NAMESTR_LEN, NAMESTR_LEN_VAX};
use super::{build_fixed_header, has_prefix};

/// Member header prefix.
pub const MEMBER_HEADER_PREFIX: &str = "HEADER RECORD*******MEMBER  HEADER RECORD!!!!!!!";

/// Member header prefix of the V8/V9 layout (not supported).
pub const MEMBV8_HEADER_PREFIX: &str = "HEADER RECORD*******MEMBV8  HEADER RECORD!!!!!!!";

/// DSCRPTR header prefix.
pub const DSCRPTR_HEADER_PREFIX: &str = "HEADER RECORD*******DSCRPTR HEADER RECORD!!!!!!!";

/// NAMESTR header prefix.
pub const NAMESTR_HEADER_PREFIX: &str = "HEADER RECORD*******NAMESTR HEADER RECORD!!!!!!!";

/// OBS header prefix.
pub const OBS_HEADER_PREFIX: &str = "HEADER RECORD*******OBS     HEADER RECORD!!!!!!!";

/// Largest variable count the 4-digit NAMESTR header field can hold.
pub const MAX_VARIABLES: usize = 9999;

/// Dataset-level metadata from the member data and member second records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    /// Dataset name.
    pub name: String,
    /// Dataset label, if not blank.
    pub label: Option<String>,
    /// Member type, if not blank.
    pub dataset_type: Option<String>,
    /// Version, OS and datetime text.
    pub info: LibraryInfo,
}

/// Whether a record is a member header (either transport version).
#[must_use]
pub fn is_member_header(record: &[u8]) -> bool {
    has_prefix(record, MEMBER_HEADER_PREFIX) || has_prefix(record, MEMBV8_HEADER_PREFIX)
}

/// Whether a record is an OBS header.
#[must_use]
pub fn is_obs_header(record: &[u8]) -> bool {
    has_prefix(record, OBS_HEADER_PREFIX)
}

/// Validate a member header record.
pub fn validate_member_header(record: &[u8]) -> Result<()> {
    if record.len() < RECORD_LEN {
        return Err(XptError::invalid_format("member header too short"));
    }
    if has_prefix(record, MEMBV8_HEADER_PREFIX) {
        return Err(XptError::UnsupportedVersion { found: "MEMBV8" });
    }
    if !has_prefix(record, MEMBER_HEADER_PREFIX) {
        return Err(XptError::missing_header("MEMBER HEADER"));
    }
    Ok(())
}

/// Validate a DSCRPTR header record.
pub fn validate_dscrptr_header(record: &[u8]) -> Result<()> {
    if !has_prefix(record, DSCRPTR_HEADER_PREFIX) {
        return Err(XptError::missing_header("DSCRPTR HEADER"));
    }
    Ok(())
}

/// Validate a NAMESTR header record.
pub fn validate_namestr_header(record: &[u8]) -> Result<()> {
    if !has_prefix(record, NAMESTR_HEADER_PREFIX) {
        return Err(XptError::missing_header("NAMESTR HEADER"));
    }
    Ok(())
}

/// Validate an OBS header record.
pub fn validate_obs_header(record: &[u8]) -> Result<()> {
    if !is_obs_header(record) {
        return Err(XptError::missing_header("OBS HEADER"));
    }
    Ok(())
}

/// Parse NAMESTR length from member header record.
///
/// The NAMESTR length is at offset 74-77 (4 ASCII digits): 140, or 136 on
/// VAX/VMS.
pub fn parse_namestr_len(record: &[u8]) -> Result<usize> {
    let len = parse_digits(record, 74, "NAMESTR length")?;
    if len != NAMESTR_LEN && len != NAMESTR_LEN_VAX {
        return Err(XptError::invalid_format(format!(
            "unsupported NAMESTR length {len}"
        )));
    }
    Ok(len)
}

/// Parse variable count from NAMESTR header record.
///
/// The variable count is at offset 54-57 (4 ASCII digits).
pub fn parse_variable_count(record: &[u8]) -> Result<usize> {
    parse_digits(record, 54, "variable count")
}

fn parse_digits(record: &[u8], offset: usize, field: &str) -> Result<usize> {
    read_field(record, offset, 4)
        .trim()
        .parse::<usize>()
        .map_err(|_| XptError::NumericParse {
            field: field.to_string(),
        })
}

/// Parse the member data record.
///
/// | Offset | Length | Field   |
/// |--------|--------|---------|
/// | 0-7    | 8      | "SAS"   |
/// | 8-15   | 8      | dsname  |
/// | 16-23  | 8      | "SASDATA" |
/// | 24-31  | 8      | sasver  |
/// | 32-39  | 8      | sas_os  |
/// | 64-79  | 16     | created |
pub fn parse_member_data(record: &[u8]) -> Result<MemberInfo> {
    if record.len() < RECORD_LEN {
        return Err(XptError::invalid_format("member data too short"));
    }
    let name = read_field(record, 8, 8);
    if name.trim().is_empty() {
        return Err(XptError::invalid_format("empty dataset name"));
    }

    Ok(MemberInfo {
        name,
        label: None,
        dataset_type: None,
        info: LibraryInfo {
            sas_version: read_field(record, 24, 8),
            os_name: read_field(record, 32, 8),
            created: read_field(record, 64, 16),
            modified: String::new(),
        },
    })
}

/// Fill modified datetime, label and type from the member second record.
///
/// Modified is at 0-15, the label at 32-71 and the type at 72-79.
pub fn parse_member_second(record: &[u8], member: &mut MemberInfo) {
    member.info.modified = read_field(record, 0, 16);
    member.label = Some(read_field(record, 32, 40)).filter(|s| !s.is_empty());
    member.dataset_type = Some(read_field(record, 72, 8)).filter(|s| !s.is_empty());
}

/// Build member header record with NAMESTR length.
pub fn build_member_header(namestr_len: usize) -> Result<Record> {
    let mut record = build_fixed_header(MEMBER_HEADER_PREFIX);

    // Descriptor header size at offset 64-67
    write_field(&mut record, 64, "0160", 4)?;
    write_field(&mut record, 74, &format!("{namestr_len:04}"), 4)?;

    Ok(record)
}

/// Build DSCRPTR header record.
#[must_use]
pub fn build_dscrptr_header() -> Record {
    build_fixed_header(DSCRPTR_HEADER_PREFIX)
}

/// Build member data record.
pub fn build_member_data(name: &str, info: &LibraryInfo) -> Result<Record> {
    let mut record = [b' '; RECORD_LEN];
    write_field(&mut record, 0, "SAS", 8)?;
    write_field(&mut record, 8, name, 8)?;
    write_field(&mut record, 16, "SASDATA", 8)?;
    write_field(&mut record, 24, &info.sas_version, 8)?;
    write_field(&mut record, 32, &info.os_name, 8)?;
    write_field(&mut record, 64, &info.created, 16)?;
    Ok(record)
}

/// Build member second record.
pub fn build_member_second(
    label: &str,
    dataset_type: &str,
    info: &LibraryInfo,
) -> Result<Record> {
    let mut record = [b' '; RECORD_LEN];
    write_field(&mut record, 0, &info.modified, 16)?;
    write_field(&mut record, 32, label, 40)?;
    write_field(&mut record, 72, dataset_type, 8)?;
    Ok(record)
}

/// Build NAMESTR header record with variable count.
pub fn build_namestr_header(var_count: usize) -> Result<Record> {
    if var_count > MAX_VARIABLES {
        return Err(XptError::TooManyVariables {
            count: var_count,
            max: MAX_VARIABLES,
        });
    }
    let mut record = build_fixed_header(NAMESTR_HEADER_PREFIX);
    write_field(&mut record, 54, &format!("{var_count:04}"), 4)?;
    Ok(record)
}

/// Build OBS header record.
#[must_use]
pub fn build_obs_header() -> Record {
    build_fixed_header(OBS_HEADER_PREFIX)
}

/// Total NAMESTR block size including padding.
#[must_use]
pub fn namestr_block_size(var_count: usize, namestr_len: usize) -> usize {
    align_to_record(var_count * namestr_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> LibraryInfo {
        LibraryInfo {
            sas_version: "9.4".to_string(),
            os_name: "RUST".to_string(),
            created: "01JAN24:00:00:00".to_string(),
            modified: "02JAN24:00:00:00".to_string(),
        }
    }

    #[test]
    fn test_validate_headers() {
        assert!(validate_member_header(&build_member_header(NAMESTR_LEN).unwrap()).is_ok());
        assert!(validate_dscrptr_header(&build_dscrptr_header()).is_ok());
        assert!(validate_namestr_header(&build_namestr_header(5).unwrap()).is_ok());
        assert!(validate_obs_header(&build_obs_header()).is_ok());

        let invalid = [b'X'; RECORD_LEN];
        assert!(validate_member_header(&invalid).is_err());
        assert!(validate_obs_header(&invalid).is_err());
    }

    #[test]
    fn test_v8_member_header_is_unsupported() {
        let record = build_fixed_header(MEMBV8_HEADER_PREFIX);
        assert!(is_member_header(&record));
        assert!(matches!(
            validate_member_header(&record),
            Err(XptError::UnsupportedVersion { found: "MEMBV8" })
        ));
    }

    #[test]
    fn test_member_header_layout() {
        let header = build_member_header(NAMESTR_LEN).unwrap();
        assert_eq!(&header[64..68], b"0160");
        assert_eq!(&header[74..78], b"0140");
        assert_eq!(&header[78..], b"  ");
    }

    #[test]
    fn test_parse_namestr_len() {
        let header = build_member_header(140).unwrap();
        assert_eq!(parse_namestr_len(&header).unwrap(), 140);

        let header = build_member_header(136).unwrap();
        assert_eq!(parse_namestr_len(&header).unwrap(), 136);

        let header = build_member_header(120).unwrap();
        assert!(parse_namestr_len(&header).unwrap_err().is_format_error());
    }

    #[test]
    fn test_parse_variable_count() {
        let header = build_namestr_header(25).unwrap();
        assert_eq!(&header[54..58], b"0025");
        assert_eq!(parse_variable_count(&header).unwrap(), 25);
        assert!(build_namestr_header(MAX_VARIABLES + 1).is_err());
    }

    #[test]
    fn test_build_and_parse_member_records() {
        let data = build_member_data("DM", &info()).unwrap();
        assert_eq!(&data[..24], b"SAS     DM      SASDATA ");
        let mut member = parse_member_data(&data).unwrap();
        assert_eq!(member.name, "DM");

        let second = build_member_second("Demographics", "DATA", &info()).unwrap();
        parse_member_second(&second, &mut member);
        assert_eq!(member.label.as_deref(), Some("Demographics"));
        assert_eq!(member.dataset_type.as_deref(), Some("DATA"));
        assert_eq!(member.info, info());
    }

    #[test]
    fn test_blank_label_and_type() {
        let second = build_member_second("", "", &info()).unwrap();
        let mut member = parse_member_data(&build_member_data("X", &info()).unwrap()).unwrap();
        parse_member_second(&second, &mut member);
        assert_eq!(member.label, None);
        assert_eq!(member.dataset_type, None);
    }

    #[test]
    fn test_namestr_block_size() {
        assert_eq!(namestr_block_size(1, 140), 160);
        assert_eq!(namestr_block_size(2, 140), 320);
        assert_eq!(namestr_block_size(10, 140), 1440);
        assert_eq!(namestr_block_size(0, 140), 0);
    }
}
