//! XPT header record parsing and building.
//!
//! This module handles the various header records in an XPT file:
//! - Library headers (file-level metadata)
//! - Member headers (dataset-level metadata)
//! - NAMESTR records (variable definitions)
//! - OBS header (marks start of observation data)

pub mod datetime;
pub mod library;
pub mod member;
pub mod namestr;

use crate::record::{RECORD_LEN, Record};

// Re-export commonly used items
pub use datetime::{
    MAX_XPT_YEAR, MIN_XPT_YEAR, check_xpt_datetime, format_xpt_datetime, parse_xpt_datetime,
    require_xpt_datetime,
};
pub use library::{
    LIBRARY_HEADER_PREFIX, LIBV8_HEADER_PREFIX, LibraryInfo, build_library_header,
    build_real_header, build_second_header, parse_real_header, parse_second_header,
    validate_library_header,
};
pub use member::{
    DSCRPTR_HEADER_PREFIX, MAX_VARIABLES, MEMBER_HEADER_PREFIX, MEMBV8_HEADER_PREFIX,
    MemberInfo, NAMESTR_HEADER_PREFIX, OBS_HEADER_PREFIX, build_dscrptr_header,
    build_member_data, build_member_header, build_member_second, build_namestr_header,
    build_obs_header, is_member_header, is_obs_header, namestr_block_size, parse_member_data,
    parse_member_second, parse_namestr_len, parse_variable_count, validate_dscrptr_header,
    validate_member_header, validate_namestr_header, validate_obs_header,
};
pub use namestr::{
    NAMESTR_LEN, NAMESTR_LEN_VAX, build_namestr, parse_namestr, parse_namestr_records,
};

/// Length of the literal text at the start of every header record.
pub(crate) const PREFIX_LEN: usize = 48;

/// Build a fixed header record: prefix, `'0'` fill to byte 78, two blanks.
pub(crate) fn build_fixed_header(prefix: &str) -> Record {
    let mut record = [b' '; RECORD_LEN];

    let prefix_bytes = prefix.as_bytes();
    let copy_len = prefix_bytes.len().min(PREFIX_LEN);
    record[..copy_len].copy_from_slice(&prefix_bytes[..copy_len]);
    record[PREFIX_LEN..78].fill(b'0');

    record
}

/// Whether a record carries the given header prefix.
pub(crate) fn has_prefix(record: &[u8], prefix: &str) -> bool {
    record.starts_with(prefix.as_bytes())
}
