//! Variable (column) definitions.

/// Variable storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum XptType {
    /// Numeric, stored as an IBM floating point word.
    Num,
    /// Character, stored space-padded.
    Char,
}

impl XptType {
    /// Interpret the NAMESTR `ntype` code.
    #[must_use]
    pub fn from_ntype(ntype: i16) -> Option<Self> {
        match ntype {
            1 => Some(Self::Num),
            2 => Some(Self::Char),
            _ => None,
        }
    }

    /// NAMESTR `ntype` code.
    #[must_use]
    pub fn to_ntype(self) -> i16 {
        match self {
            Self::Num => 1,
            Self::Char => 2,
        }
    }

    /// Whether this is the numeric type.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Num)
    }
}

impl std::fmt::Display for XptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Num => write!(f, "Num"),
            Self::Char => write!(f, "Char"),
        }
    }
}

/// Display justification (`nfj`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Justification {
    /// Left justified (0).
    #[default]
    Left,
    /// Right justified (1).
    Right,
}

impl Justification {
    /// Interpret the NAMESTR `nfj` code; anything nonzero is right.
    #[must_use]
    pub fn from_nfj(nfj: i16) -> Self {
        if nfj == 0 { Self::Left } else { Self::Right }
    }

    /// NAMESTR `nfj` code.
    #[must_use]
    pub fn to_nfj(self) -> i16 {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// Numeric storage length used unless a shorter one is requested.
pub const NUMERIC_LENGTH: u16 = 8;

/// Shortest numeric storage length.
pub const MIN_NUMERIC_LENGTH: u16 = 2;

/// Column definition, one per NAMESTR record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XptColumn {
    /// Variable name (1-8 characters).
    pub name: String,
    /// Variable label (up to 40 characters).
    pub label: Option<String>,
    /// Storage type.
    pub data_type: XptType,
    /// Bytes occupied in each observation.
    pub length: u16,
    /// Display format name.
    pub format: Option<String>,
    /// Display format width.
    pub format_length: u16,
    /// Implied decimal digits of the display format.
    pub format_decimals: u16,
    /// Informat name.
    pub informat: Option<String>,
    /// Informat width.
    pub informat_length: u16,
    /// Informat decimals.
    pub informat_decimals: u16,
    /// Justification.
    pub justification: Justification,
}

impl XptColumn {
    fn new(name: impl Into<String>, data_type: XptType, length: u16) -> Self {
        Self {
            name: name.into(),
            label: None,
            data_type,
            length,
            format: None,
            format_length: 0,
            format_decimals: 0,
            informat: None,
            informat_length: 0,
            informat_decimals: 0,
            justification: Justification::Left,
        }
    }

    /// Numeric column with the standard 8-byte storage.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, XptType::Num, NUMERIC_LENGTH)
    }

    /// Character column of the given width.
    pub fn character(name: impl Into<String>, length: u16) -> Self {
        Self::new(name, XptType::Char, length)
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the storage length.
    #[must_use]
    pub fn with_length(mut self, length: u16) -> Self {
        self.length = length;
        self
    }

    /// Set the display format.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>, length: u16, decimals: u16) -> Self {
        self.format = Some(format.into());
        self.format_length = length;
        self.format_decimals = decimals;
        self
    }

    /// Set the informat.
    #[must_use]
    pub fn with_informat(mut self, informat: impl Into<String>, length: u16, decimals: u16) -> Self {
        self.informat = Some(informat.into());
        self.informat_length = length;
        self.informat_decimals = decimals;
        self
    }

    /// Set the justification.
    #[must_use]
    pub fn with_justification(mut self, justification: Justification) -> Self {
        self.justification = justification;
        self
    }

    /// Whether this is a numeric column.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.data_type.is_numeric()
    }

    /// Whether the storage length is legal for the type.
    #[must_use]
    pub fn has_valid_length(&self) -> bool {
        match self.data_type {
            XptType::Num => (MIN_NUMERIC_LENGTH..=NUMERIC_LENGTH).contains(&self.length),
            XptType::Char => self.length >= 1,
        }
    }
}
