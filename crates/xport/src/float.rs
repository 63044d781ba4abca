//! IBM mainframe ↔ IEEE 754 floating point conversion.
//!
//! An IBM double is a sign bit, a 7-bit base-16 exponent biased by 64 and a
//! 56-bit fraction whose leading hex digit is nonzero:
//!
//! ```text
//! value = (-1)^sign × 0.fraction(base 16) × 16^(exponent - 64)
//! ```
//!
//! The representable magnitudes run from `16^-65` (about 5.4e-79) to just
//! below `16^63` (about 7.2e75). Every normal IEEE double in that range
//! converts exactly, because its 53 significant bits fit in the 56-bit
//! fraction behind at most three leading zero bits.
//!
//! SAS missing values are stored as a code byte (`.`, `_`, `A`-`Z`) followed
//! by zero bytes.

use crate::error::{Result, XptError};
use crate::types::{MIN_NUMERIC_LENGTH, MissingValue, NumericValue};

const SIGN_MASK: u64 = 0x8000_0000_0000_0000;
const IBM_FRACTION_MASK: u64 = 0x00ff_ffff_ffff_ffff;
const IEEE_MANTISSA_MASK: u64 = 0x000f_ffff_ffff_ffff;
const IEEE_IMPLICIT_BIT: u64 = 1 << 52;
const IEEE_BIAS: i32 = 1023;
const IBM_BIAS: i32 = 64;

/// Convert an 8-byte IBM word to an IEEE double.
///
/// Missing-value patterns convert to NaN; use [`decode_ibm`] to keep the
/// missing code.
#[must_use]
pub fn ibm_to_ieee(ibm: [u8; 8]) -> f64 {
    if is_missing(&ibm).is_some() {
        return f64::NAN;
    }

    let bits = u64::from_be_bytes(ibm);
    let sign = bits & SIGN_MASK;
    let mut fraction = bits & IBM_FRACTION_MASK;
    if fraction == 0 {
        return f64::from_bits(sign);
    }

    // value = fraction × 2^(exponent - 56), fraction < 2^56
    let mut exponent = 4 * (((bits >> 56) & 0x7f) as i32 - IBM_BIAS);

    // Normalize so bit 55 holds the leading one.
    let shift = fraction.leading_zeros() - 8;
    fraction <<= shift;
    exponent -= shift as i32;

    // Keep 53 bits, rounding half to even on the 3 dropped bits.
    let mut mantissa = fraction >> 3;
    let dropped = fraction & 0x7;
    if dropped > 4 || (dropped == 4 && mantissa & 1 == 1) {
        mantissa += 1;
    }
    let mut ieee_exponent = exponent - 1;
    if mantissa == IEEE_IMPLICIT_BIT << 1 {
        mantissa >>= 1;
        ieee_exponent += 1;
    }

    // IBM exponents span 2^-260..2^252, always normal in IEEE.
    let biased = (ieee_exponent + IEEE_BIAS) as u64;
    f64::from_bits(sign | (biased << 52) | (mantissa & IEEE_MANTISSA_MASK))
}

/// Convert an IEEE double to an 8-byte IBM word.
///
/// Zero (of either sign) becomes the all-zero word and NaN becomes the
/// standard missing value. Infinite values and magnitudes of `16^63` or more
/// fail with [`XptError::FloatOverflow`]; nonzero magnitudes below `16^-65`
/// fail with [`XptError::FloatUnderflow`].
pub fn ieee_to_ibm(value: f64) -> Result<[u8; 8]> {
    if value.is_nan() {
        return Ok(encode_missing(MissingValue::Standard));
    }
    if value == 0.0 {
        return Ok([0u8; 8]);
    }
    if value.is_infinite() {
        return Err(XptError::FloatOverflow { value });
    }

    let bits = value.to_bits();
    let sign = bits & SIGN_MASK;
    let biased = ((bits >> 52) & 0x7ff) as i32;
    if biased == 0 {
        // IEEE subnormals are far below the IBM range.
        return Err(XptError::FloatUnderflow { value });
    }
    let mantissa = (bits & IEEE_MANTISSA_MASK) | IEEE_IMPLICIT_BIT;

    // value = 0.1xxx(binary) × 2^binary_exponent
    let binary_exponent = biased - IEEE_BIAS + 1;

    // Round the exponent up to a multiple of 4 and pre-shift the mantissa
    // right by the difference.
    let hex_exponent = binary_exponent.div_euclid(4) + i32::from(binary_exponent.rem_euclid(4) != 0);
    let shift = 4 * hex_exponent - binary_exponent;
    let fraction = (mantissa << 3) >> shift;

    let ibm_exponent = hex_exponent + IBM_BIAS;
    if ibm_exponent > 0x7f {
        return Err(XptError::FloatOverflow { value });
    }
    if ibm_exponent < 0 {
        return Err(XptError::FloatUnderflow { value });
    }

    let word = sign | ((ibm_exponent as u64) << 56) | fraction;
    Ok(word.to_be_bytes())
}

/// Check a numeric field for a missing-value pattern.
///
/// Fields shorter than 8 bytes are treated as zero-extended.
#[must_use]
pub fn is_missing(bytes: &[u8]) -> Option<MissingValue> {
    let (&first, rest) = bytes.split_first()?;
    if rest.iter().any(|&b| b != 0) {
        return None;
    }
    MissingValue::from_code_byte(first)
}

/// IBM word for a missing value.
#[must_use]
pub fn encode_missing(missing: MissingValue) -> [u8; 8] {
    let mut bytes = [0u8; 8];
    bytes[0] = missing.code_byte();
    bytes
}

/// Decode a stored numeric field of 1 to 8 bytes.
#[must_use]
pub fn decode_ibm(bytes: &[u8]) -> NumericValue {
    if bytes.is_empty() {
        return NumericValue::Missing(MissingValue::Standard);
    }
    if let Some(missing) = is_missing(bytes) {
        return NumericValue::Missing(missing);
    }

    let mut buf = [0u8; 8];
    let len = bytes.len().min(8);
    buf[..len].copy_from_slice(&bytes[..len]);
    NumericValue::Value(ibm_to_ieee(buf))
}

/// Encode a numeric value into a field of `length` bytes.
///
/// Shorter fields keep the leading bytes of the 8-byte word, as SAS does.
pub fn encode_numeric(value: &NumericValue, length: usize) -> Result<Vec<u8>> {
    let word = match value {
        NumericValue::Missing(m) => encode_missing(*m),
        NumericValue::Value(v) => ieee_to_ibm(*v)?,
    };
    Ok(truncate_ibm(word, length))
}

/// Keep the first `length` bytes of an IBM word.
#[must_use]
pub fn truncate_ibm(word: [u8; 8], length: usize) -> Vec<u8> {
    word[..length.min(8)].to_vec()
}

/// Bytes needed to store `word` without loss (between 2 and 8).
#[must_use]
pub fn significant_length(word: [u8; 8]) -> usize {
    let trailing_zeros = word.iter().rev().take_while(|&&b| b == 0).count();
    (8 - trailing_zeros).max(MIN_NUMERIC_LENGTH as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: f64) -> f64 {
        ibm_to_ieee(ieee_to_ibm(value).unwrap())
    }

    #[test]
    fn test_known_words() {
        assert_eq!(ieee_to_ibm(1.0).unwrap(), [0x41, 0x10, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ieee_to_ibm(-1.0).unwrap(), [0xc1, 0x10, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ieee_to_ibm(100.0).unwrap(), [0x42, 0x64, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ieee_to_ibm(0.5).unwrap(), [0x40, 0x80, 0, 0, 0, 0, 0, 0]);
        // -118.625 is the textbook example: C2 76 A0 00
        assert_eq!(
            ieee_to_ibm(-118.625).unwrap(),
            [0xc2, 0x76, 0xa0, 0, 0, 0, 0, 0]
        );
        assert_eq!(ibm_to_ieee([0xc2, 0x76, 0xa0, 0, 0, 0, 0, 0]), -118.625);
    }

    #[test]
    fn test_zero() {
        assert_eq!(ieee_to_ibm(0.0).unwrap(), [0u8; 8]);
        assert_eq!(ieee_to_ibm(-0.0).unwrap(), [0u8; 8]);
        assert_eq!(ibm_to_ieee([0u8; 8]), 0.0);
        assert_eq!(roundtrip(0.0), 0.0);
    }

    #[test]
    fn test_small_magnitude_integers() {
        for i in -1000..1000 {
            let value = f64::from(i);
            assert_eq!(roundtrip(value), value);
        }
    }

    #[test]
    fn test_fractions() {
        for i in -10..10 {
            let thousandths = f64::from(i) / 1000.0;
            assert_eq!(roundtrip(thousandths), thousandths);
            let millionths = f64::from(i) / 1e6;
            assert_eq!(roundtrip(millionths), millionths);
        }
    }

    #[test]
    fn test_large_magnitudes() {
        let offset = 1e9;
        for i in 0..100 {
            let value = offset + f64::from(i) / 1e9;
            assert_eq!(roundtrip(value), value);
            let whole = offset + f64::from(i);
            assert_eq!(roundtrip(whole), whole);
        }
    }

    #[test]
    fn test_powers_of_pi() {
        for e in -30..=30 {
            let value = std::f64::consts::PI.powi(e);
            assert_eq!(roundtrip(value), value);
            assert_eq!(roundtrip(-value), -value);
        }
    }

    #[test]
    fn test_range_limits() {
        // Smallest normalized IBM magnitude.
        let smallest = 16f64.powi(-65);
        assert_eq!(roundtrip(smallest), smallest);
        // Largest IBM magnitude that a double can hit exactly below 16^63.
        let largest = 16f64.powi(63) * (1.0 - f64::EPSILON / 2.0);
        assert_eq!(roundtrip(largest), largest);
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            ieee_to_ibm(16f64.powi(63)),
            Err(XptError::FloatOverflow { .. })
        ));
        assert!(matches!(
            ieee_to_ibm(1e100),
            Err(XptError::FloatOverflow { .. })
        ));
        assert!(matches!(
            ieee_to_ibm(f64::NEG_INFINITY),
            Err(XptError::FloatOverflow { .. })
        ));
    }

    #[test]
    fn test_underflow() {
        assert!(matches!(
            ieee_to_ibm(16f64.powi(-66)),
            Err(XptError::FloatUnderflow { .. })
        ));
        assert!(matches!(
            ieee_to_ibm(f64::MIN_POSITIVE / 4.0),
            Err(XptError::FloatUnderflow { .. })
        ));
    }

    #[test]
    fn test_nan_is_missing() {
        let word = ieee_to_ibm(f64::NAN).unwrap();
        assert_eq!(word, [0x2e, 0, 0, 0, 0, 0, 0, 0]);
        assert!(ibm_to_ieee(word).is_nan());
        assert_eq!(
            decode_ibm(&word),
            NumericValue::Missing(MissingValue::Standard)
        );
    }

    #[test]
    fn test_missing_patterns() {
        assert_eq!(is_missing(&[0x5f, 0, 0, 0, 0, 0, 0, 0]), Some(MissingValue::Underscore));
        assert_eq!(is_missing(&[0x5a, 0, 0]), Some(MissingValue::Special('Z')));
        // 1.0 shares the 0x41 exponent byte with .A but has a fraction.
        assert_eq!(is_missing(&[0x41, 0x10, 0, 0, 0, 0, 0, 0]), None);
        assert_eq!(is_missing(&[0u8; 8]), None);
    }

    #[test]
    fn test_unnormalized_input_decodes() {
        // Leading hex digit zero: 0x00_01 × 16^(65-64) fraction = 1/256 × 16.
        let word = [0x41, 0x01, 0, 0, 0, 0, 0, 0];
        assert_eq!(ibm_to_ieee(word), 0.0625);
    }

    #[test]
    fn test_rounding_of_extra_fraction_bits() {
        // Leading hex digit 8 leaves three bits beyond a double's precision.
        let word = [0x40, 0x80, 0, 0, 0, 0, 0, 0x01];
        assert_eq!(ibm_to_ieee(word), 0.5);
        // Exactly halfway with an even mantissa stays put.
        let word = [0x40, 0x80, 0, 0, 0, 0, 0, 0x04];
        assert_eq!(ibm_to_ieee(word), 0.5);
        // Exactly halfway with an odd mantissa rounds up to even.
        let word = [0x40, 0x80, 0, 0, 0, 0, 0, 0x0c];
        assert_eq!(ibm_to_ieee(word), 0.5 + f64::EPSILON);
    }

    #[test]
    fn test_short_words() {
        let encoded = encode_numeric(&NumericValue::Value(1.0), 3).unwrap();
        assert_eq!(encoded, vec![0x41, 0x10, 0]);
        assert_eq!(decode_ibm(&encoded), NumericValue::Value(1.0));

        let encoded = encode_numeric(&NumericValue::Missing(MissingValue::Special('B')), 2).unwrap();
        assert_eq!(encoded, vec![b'B', 0]);
        assert_eq!(
            decode_ibm(&encoded),
            NumericValue::Missing(MissingValue::Special('B'))
        );
    }

    #[test]
    fn test_significant_length() {
        assert_eq!(significant_length(ieee_to_ibm(1.0).unwrap()), 2);
        assert_eq!(significant_length(ieee_to_ibm(0.0).unwrap()), 2);
        assert_eq!(significant_length(ieee_to_ibm(-118.625).unwrap()), 3);
        assert_eq!(significant_length(ieee_to_ibm(0.1).unwrap()), 8);
    }
}
