//! Cell values.

use super::MissingValue;

/// A numeric cell: a finite double or a SAS missing code.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumericValue {
    /// Present value.
    Value(f64),
    /// Missing value with its code.
    Missing(MissingValue),
}

impl NumericValue {
    /// Build from a double; NaN becomes standard missing.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Self::Missing(MissingValue::Standard)
        } else {
            Self::Value(value)
        }
    }

    /// Whether this is a missing value.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }

    /// Whether a value is present.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// The present value, if any.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Missing(_) => None,
        }
    }

    /// The missing code, if any.
    #[must_use]
    pub fn missing_type(&self) -> Option<MissingValue> {
        match self {
            Self::Value(_) => None,
            Self::Missing(m) => Some(*m),
        }
    }
}

impl std::fmt::Display for NumericValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Missing(m) => write!(f, "{m}"),
        }
    }
}

/// A single cell of a row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum XptValue {
    /// Character value.
    Char(String),
    /// Numeric value.
    Num(NumericValue),
}

impl XptValue {
    /// Character value.
    pub fn character(value: impl Into<String>) -> Self {
        Self::Char(value.into())
    }

    /// Numeric value; NaN is stored as standard missing.
    #[must_use]
    pub fn numeric(value: f64) -> Self {
        Self::Num(NumericValue::from_f64(value))
    }

    /// Standard numeric missing (`.`).
    #[must_use]
    pub fn numeric_missing() -> Self {
        Self::Num(NumericValue::Missing(MissingValue::Standard))
    }

    /// Numeric missing with a specific code.
    #[must_use]
    pub fn numeric_missing_with(missing: MissingValue) -> Self {
        Self::Num(NumericValue::Missing(missing))
    }

    /// Whether this value is numeric (present or missing).
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Num(_))
    }

    /// Whether this is a numeric missing value.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Num(n) if n.is_missing())
    }

    /// The text, for character values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Char(s) => Some(s),
            Self::Num(_) => None,
        }
    }

    /// The number, for present numeric values.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(n) => n.value(),
            Self::Char(_) => None,
        }
    }

    /// Text form used when a numeric value lands in a character column.
    ///
    /// Integral values drop the fraction (`1`), magnitudes of `1e16` or more
    /// and below `1e-4` use a signed two-digit exponent (`1e+21`, `2.5e-07`).
    /// Missing numerics become the empty string.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Char(s) => s.clone(),
            Self::Num(NumericValue::Value(v)) => number_text(*v),
            Self::Num(NumericValue::Missing(_)) => String::new(),
        }
    }
}

fn number_text(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude.is_finite() && magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{value:e}");
        if let Some((mantissa, exponent)) = text.split_once('e') {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            return format!("{mantissa}e{sign}{digits:0>2}");
        }
    }
    value.to_string()
}

impl std::fmt::Display for XptValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Char(s) => write!(f, "{s}"),
            Self::Num(n) => write!(f, "{n}"),
        }
    }
}

impl From<f64> for XptValue {
    fn from(value: f64) -> Self {
        Self::numeric(value)
    }
}

impl From<i32> for XptValue {
    fn from(value: i32) -> Self {
        Self::numeric(f64::from(value))
    }
}

impl From<i64> for XptValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::numeric(value as f64)
    }
}

impl From<&str> for XptValue {
    fn from(value: &str) -> Self {
        Self::Char(value.to_string())
    }
}

impl From<String> for XptValue {
    fn from(value: String) -> Self {
        Self::Char(value)
    }
}

impl From<MissingValue> for XptValue {
    fn from(value: MissingValue) -> Self {
        Self::numeric_missing_with(value)
    }
}

impl<T: Into<XptValue>> From<Option<T>> for XptValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::numeric_missing, Into::into)
    }
}
