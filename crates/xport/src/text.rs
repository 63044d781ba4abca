//! Fixed-width single-byte text fields.
//!
//! All names, labels and character values use Windows-1252, which is
//! ASCII-compatible and covers printable Latin-1.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;

use crate::error::{Result, XptError};

/// Name of the text encoding, for error messages.
pub const ENCODING_NAME: &str = "windows-1252";

/// Encode text, failing on characters outside the charset.
pub fn encode(text: &str) -> Result<Cow<'_, [u8]>> {
    let (bytes, _, had_errors) = WINDOWS_1252.encode(text);
    if had_errors {
        return Err(XptError::unencodable(text));
    }
    Ok(bytes)
}

/// Number of bytes `text` occupies once encoded.
pub fn encoded_len(text: &str) -> Result<usize> {
    encode(text).map(|bytes| bytes.len())
}

/// Decode bytes; every byte maps to a character.
#[must_use]
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    WINDOWS_1252.decode_without_bom_handling(bytes).0
}

/// Strip trailing blanks (space or NUL), keeping leading and interior ones.
#[must_use]
pub fn trim_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Read a fixed-width field, trimming trailing blanks.
#[must_use]
pub fn read_field(data: &[u8], offset: usize, len: usize) -> String {
    data.get(offset..offset + len)
        .map(|slice| decode(trim_padding(slice)).into_owned())
        .unwrap_or_default()
}

/// Write a space-padded fixed-width field.
///
/// Fails instead of truncating when the encoded value is wider than `len`.
pub fn write_field(buf: &mut [u8], offset: usize, value: &str, len: usize) -> Result<()> {
    let bytes = encode(value)?;
    if bytes.len() > len {
        return Err(XptError::ValueTooLong {
            name: value.to_string(),
            length: u16::try_from(len).unwrap_or(u16::MAX),
            actual: bytes.len(),
        });
    }
    buf[offset..offset + bytes.len()].copy_from_slice(&bytes);
    buf[offset + bytes.len()..offset + len].fill(b' ');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_padding_keeps_leading_space() {
        assert_eq!(trim_padding(b"  a   "), b"  a");
        assert_eq!(trim_padding(b"a b\0\0"), b"a b");
        assert_eq!(trim_padding(b"    "), b"");
    }

    #[test]
    fn test_latin_roundtrip() {
        let bytes = encode("café").unwrap();
        assert_eq!(bytes.len(), 4);
        assert_eq!(decode(&bytes), "café");
    }

    #[test]
    fn test_unencodable() {
        let err = encode("日本").unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn test_write_and_read_field() {
        let mut buf = [0u8; 16];
        write_field(&mut buf, 4, "AB", 8).unwrap();
        assert_eq!(&buf[4..12], b"AB      ");
        assert_eq!(read_field(&buf, 4, 8), "AB");
        assert!(write_field(&mut buf, 0, "TOOLONGNAME", 8).is_err());
    }

    #[test]
    fn test_control_characters_survive() {
        let text: String = (1u8..=100).map(char::from).collect();
        let bytes = encode(&text).unwrap();
        assert_eq!(bytes.len(), 100);
        assert_eq!(decode(trim_padding(&bytes)), text);
    }
}
