//! SAS missing value codes.

/// One of the 28 SAS numeric missing value codes.
///
/// In a transport file a missing value is stored as its code byte followed by
/// zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MissingValue {
    /// Standard missing (`.`).
    #[default]
    Standard,
    /// Underscore missing (`._`).
    Underscore,
    /// Special missing `.A` through `.Z`.
    Special(char),
}

impl MissingValue {
    /// Byte stored in the first position of the numeric word.
    #[must_use]
    pub fn code_byte(self) -> u8 {
        match self {
            Self::Standard => b'.',
            Self::Underscore => b'_',
            Self::Special(c) if c.is_ascii_uppercase() => c as u8,
            Self::Special(c) if c.is_ascii_lowercase() => c.to_ascii_uppercase() as u8,
            Self::Special(_) => b'.',
        }
    }

    /// Interpret a leading code byte.
    #[must_use]
    pub fn from_code_byte(byte: u8) -> Option<Self> {
        match byte {
            b'.' => Some(Self::Standard),
            b'_' => Some(Self::Underscore),
            b'A'..=b'Z' => Some(Self::Special(byte as char)),
            _ => None,
        }
    }
}

impl std::fmt::Display for MissingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "."),
            Self::Underscore => write!(f, "._"),
            Self::Special(c) => write!(f, ".{}", c.to_ascii_uppercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_bytes() {
        assert_eq!(MissingValue::Standard.code_byte(), 0x2e);
        assert_eq!(MissingValue::Underscore.code_byte(), 0x5f);
        assert_eq!(MissingValue::Special('A').code_byte(), 0x41);
        assert_eq!(MissingValue::Special('z').code_byte(), b'Z');
    }

    #[test]
    fn test_all_codes_roundtrip() {
        let mut codes = vec![b'.', b'_'];
        codes.extend(b'A'..=b'Z');
        assert_eq!(codes.len(), 28);
        for byte in codes {
            let missing = MissingValue::from_code_byte(byte).unwrap();
            assert_eq!(missing.code_byte(), byte);
        }
        assert_eq!(MissingValue::from_code_byte(b'a'), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(MissingValue::Standard.to_string(), ".");
        assert_eq!(MissingValue::Underscore.to_string(), "._");
        assert_eq!(MissingValue::Special('Q').to_string(), ".Q");
    }
}
