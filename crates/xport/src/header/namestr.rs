//! NAMESTR record parsing and building.
//!
//! The NAMESTR record describes a single variable in an XPT dataset.
//! Each NAMESTR is 140 bytes (or 136 bytes for VAX/VMS).
//!
//! # NAMESTR Structure (140 bytes)
//!
//! | Offset | Field   | Type     | Description                    |
//! |--------|---------|----------|--------------------------------|
//! | 0-1    | ntype   | short    | 1=NUMERIC, 2=CHAR              |
//! | 2-3    | nhfun   | short    | Hash (always 0)                |
//! | 4-5    | nlng    | short    | Variable length in observation |
//! | 6-7    | nvar0   | short    | Variable number                |
//! | 8-15   | nname   | char[8]  | Variable name                  |
//! | 16-55  | nlabel  | char[40] | Variable label                 |
//! | 56-63  | nform   | char[8]  | Format name                    |
//! | 64-65  | nfl     | short    | Format field length            |
//! | 66-67  | nfd     | short    | Format decimals                |
//! | 68-69  | nfj     | short    | Justification (0=left, 1=right)|
//! | 70-71  | nfill   | char[2]  | Padding                        |
//! | 72-79  | niform  | char[8]  | Informat name                  |
//! | 80-81  | nifl    | short    | Informat length                |
//! | 82-83  | nifd    | short    | Informat decimals              |
//! | 84-87  | npos    | long     | Position in observation        |
//! | 88-139 | rest    | char[52] | Reserved                       |
//!
//! All integers are big-endian.

use crate::error::{Result, XptError};
use crate::text::{read_field, write_field};
use crate::types::{Justification, XptColumn, XptType};

/// Standard NAMESTR length.
pub const NAMESTR_LEN: usize = 140;

/// VAX/VMS NAMESTR length (shorter reserved section).
pub const NAMESTR_LEN_VAX: usize = 136;

/// Parse a single NAMESTR record into an XptColumn.
///
/// `index` is the zero-based variable position, used in error messages.
pub fn parse_namestr(data: &[u8], namestr_len: usize, index: usize) -> Result<XptColumn> {
    if data.len() < namestr_len.min(NAMESTR_LEN_VAX) {
        return Err(XptError::invalid_namestr(
            index,
            format!("data too short: {} bytes", data.len()),
        ));
    }

    let ntype = read_i16(data, 0);
    let data_type = XptType::from_ntype(ntype)
        .ok_or_else(|| XptError::invalid_namestr(index, format!("invalid ntype: {ntype}")))?;

    let name = read_field(data, 8, 8);
    if name.trim().is_empty() {
        return Err(XptError::invalid_namestr(index, "empty variable name"));
    }

    let label = read_field(data, 16, 40);
    let format = read_field(data, 56, 8);
    let informat = read_field(data, 72, 8);

    let column = XptColumn {
        name,
        label: Some(label).filter(|s| !s.is_empty()),
        data_type,
        length: read_u16(data, 4),
        format: Some(format).filter(|s| !s.is_empty()),
        format_length: read_u16(data, 64),
        format_decimals: read_u16(data, 66),
        informat: Some(informat).filter(|s| !s.is_empty()),
        informat_length: read_u16(data, 80),
        informat_decimals: read_u16(data, 82),
        justification: Justification::from_nfj(read_i16(data, 68)),
    };

    if !column.has_valid_length() {
        return Err(XptError::invalid_namestr(
            index,
            format!(
                "{} variable {} has invalid length {}",
                column.data_type, column.name, column.length
            ),
        ));
    }

    Ok(column)
}

/// Build a NAMESTR record from an XptColumn.
///
/// `varnum` is 1-based; `position` is the byte offset in the observation.
pub fn build_namestr(column: &XptColumn, varnum: u16, position: u32) -> Result<[u8; NAMESTR_LEN]> {
    let mut buf = [0u8; NAMESTR_LEN];

    write_i16(&mut buf, 0, column.data_type.to_ntype());
    write_u16(&mut buf, 4, column.length);
    write_u16(&mut buf, 6, varnum);

    write_field(&mut buf, 8, &column.name, 8)?;
    write_field(&mut buf, 16, column.label.as_deref().unwrap_or(""), 40)?;
    write_field(&mut buf, 56, column.format.as_deref().unwrap_or(""), 8)?;

    write_u16(&mut buf, 64, column.format_length);
    write_u16(&mut buf, 66, column.format_decimals);
    write_i16(&mut buf, 68, column.justification.to_nfj());

    write_field(&mut buf, 72, column.informat.as_deref().unwrap_or(""), 8)?;
    write_u16(&mut buf, 80, column.informat_length);
    write_u16(&mut buf, 82, column.informat_decimals);

    buf[84..88].copy_from_slice(&position.to_be_bytes());

    Ok(buf)
}

/// Parse `var_count` consecutive NAMESTR records.
pub fn parse_namestr_records(
    data: &[u8],
    var_count: usize,
    namestr_len: usize,
) -> Result<Vec<XptColumn>> {
    let mut columns = Vec::with_capacity(var_count);

    for idx in 0..var_count {
        let offset = idx * namestr_len;
        let record = data
            .get(offset..offset + namestr_len)
            .ok_or_else(|| XptError::invalid_namestr(idx, "NAMESTR data out of bounds"))?;

        columns.push(parse_namestr(record, namestr_len, idx)?);
    }

    Ok(columns)
}

fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([data[offset], data[offset + 1]])
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn write_i16(buf: &mut [u8], offset: usize, value: i16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

fn write_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_parse_numeric() {
        let col = XptColumn::numeric("AGE")
            .with_label("Age in Years")
            .with_length(8);

        let namestr = build_namestr(&col, 1, 0).unwrap();
        let parsed = parse_namestr(&namestr, NAMESTR_LEN, 0).unwrap();

        assert_eq!(parsed, col);
    }

    #[test]
    fn test_build_and_parse_character() {
        let col = XptColumn::character("USUBJID", 20)
            .with_label("Unique Subject ID")
            .with_format("$CHAR", 20, 0);

        let namestr = build_namestr(&col, 1, 0).unwrap();
        let parsed = parse_namestr(&namestr, NAMESTR_LEN, 0).unwrap();

        assert_eq!(parsed.name, "USUBJID");
        assert_eq!(parsed.data_type, XptType::Char);
        assert_eq!(parsed.length, 20);
        assert_eq!(parsed.format.as_deref(), Some("$CHAR"));
        assert_eq!(parsed.format_length, 20);
    }

    #[test]
    fn test_field_offsets() {
        let col = XptColumn::character("SEX", 1);
        let namestr = build_namestr(&col, 3, 16).unwrap();

        assert_eq!(&namestr[0..2], &[0, 2]);
        assert_eq!(&namestr[2..4], &[0, 0]);
        assert_eq!(&namestr[4..6], &[0, 1]);
        assert_eq!(&namestr[6..8], &[0, 3]);
        assert_eq!(&namestr[8..16], b"SEX     ");
        assert_eq!(&namestr[84..88], &[0, 0, 0, 16]);
        assert!(namestr[88..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_parse_invalid_ntype() {
        let mut namestr = [0u8; NAMESTR_LEN];
        namestr[1] = 5;

        let err = parse_namestr(&namestr, NAMESTR_LEN, 0).unwrap_err();
        assert!(matches!(err, XptError::InvalidNamestr { index: 0, .. }));
    }

    #[test]
    fn test_parse_invalid_lengths() {
        let mut namestr = build_namestr(&XptColumn::numeric("X"), 1, 0).unwrap();
        namestr[5] = 0;
        assert!(parse_namestr(&namestr, NAMESTR_LEN, 0).is_err());

        namestr[5] = 9;
        assert!(parse_namestr(&namestr, NAMESTR_LEN, 0).is_err());

        namestr[5] = 3;
        assert_eq!(parse_namestr(&namestr, NAMESTR_LEN, 0).unwrap().length, 3);
    }

    #[test]
    fn test_parse_empty_name() {
        let mut namestr = build_namestr(&XptColumn::numeric("X"), 1, 0).unwrap();
        namestr[8] = b' ';
        assert!(parse_namestr(&namestr, NAMESTR_LEN, 0).is_err());
    }

    #[test]
    fn test_roundtrip_with_format() {
        let col = XptColumn::numeric("VISIT")
            .with_label("Visit Number")
            .with_format("BEST", 8, 2)
            .with_informat("F", 8, 2)
            .with_justification(Justification::Right);

        let namestr = build_namestr(&col, 5, 100).unwrap();
        let parsed = parse_namestr(&namestr, NAMESTR_LEN, 0).unwrap();

        assert_eq!(parsed, col);
    }

    #[test]
    fn test_name_too_long() {
        let col = XptColumn::numeric("TOOLONGNAME");
        assert!(build_namestr(&col, 1, 0).is_err());
    }

    #[test]
    fn test_parse_vax_records() {
        let cols = [XptColumn::numeric("AGE"), XptColumn::character("RACE", 40)];

        let mut data = Vec::new();
        let mut position = 0u32;
        for (i, col) in cols.iter().enumerate() {
            let namestr = build_namestr(col, (i + 1) as u16, position).unwrap();
            data.extend_from_slice(&namestr[..NAMESTR_LEN_VAX]);
            position += u32::from(col.length);
        }

        let parsed = parse_namestr_records(&data, 2, NAMESTR_LEN_VAX).unwrap();
        assert_eq!(parsed, cols);
        assert!(parse_namestr_records(&data, 3, NAMESTR_LEN_VAX).is_err());
    }
}
