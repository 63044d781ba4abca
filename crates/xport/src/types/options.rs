//! Reader, writer and builder options.

use chrono::{NaiveDateTime, SubsecRound};

use super::{MissingValue, XptHeader};

/// Options for reading XPT files.
#[derive(Debug, Clone)]
pub struct XptReaderOptions {
    /// Trim trailing blanks from character values (default: true).
    pub trim_strings: bool,
}

impl Default for XptReaderOptions {
    fn default() -> Self {
        Self { trim_strings: true }
    }
}

impl XptReaderOptions {
    /// Create reader options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep character values exactly as stored, padding included.
    #[must_use]
    pub fn keep_padding(mut self) -> Self {
        self.trim_strings = false;
        self
    }
}

/// Options for writing XPT files.
#[derive(Debug, Clone)]
pub struct XptWriterOptions {
    /// SAS version string (max 8 chars, default: "9.4").
    pub sas_version: String,
    /// Operating system name (max 8 chars, default: "RUST").
    pub os_name: String,
    /// Created datetime (default: current time).
    pub created: Option<NaiveDateTime>,
    /// Modified datetime (default: created time).
    pub modified: Option<NaiveDateTime>,
    /// Missing code written for NaN values (default: Standard ".").
    pub default_missing: MissingValue,
}

impl Default for XptWriterOptions {
    fn default() -> Self {
        Self {
            sas_version: "9.4".to_string(),
            os_name: "RUST".to_string(),
            created: None,
            modified: None,
            default_missing: MissingValue::Standard,
        }
    }
}

impl XptWriterOptions {
    /// Create writer options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SAS version string.
    #[must_use]
    pub fn with_sas_version(mut self, version: impl Into<String>) -> Self {
        self.sas_version = version.into();
        self
    }

    /// Set the operating system name.
    #[must_use]
    pub fn with_os_name(mut self, os: impl Into<String>) -> Self {
        self.os_name = os.into();
        self
    }

    /// Set the created datetime.
    #[must_use]
    pub fn with_created(mut self, datetime: NaiveDateTime) -> Self {
        self.created = Some(datetime);
        self
    }

    /// Set the modified datetime.
    #[must_use]
    pub fn with_modified(mut self, datetime: NaiveDateTime) -> Self {
        self.modified = Some(datetime);
        self
    }

    /// Set the missing code used for NaN.
    #[must_use]
    pub fn with_default_missing(mut self, missing: MissingValue) -> Self {
        self.default_missing = missing;
        self
    }

    /// Get the created datetime (current time to the second if not set).
    #[must_use]
    pub fn get_created(&self) -> NaiveDateTime {
        self.created
            .unwrap_or_else(|| chrono::Local::now().naive_local().trunc_subsecs(0))
    }

    /// Get the modified datetime (created time if not set).
    #[must_use]
    pub fn get_modified(&self) -> NaiveDateTime {
        self.modified.unwrap_or_else(|| self.get_created())
    }

    /// Resolve the header metadata, fixing "now" once.
    #[must_use]
    pub fn header(&self) -> XptHeader {
        let created = self.get_created();
        XptHeader {
            sas_version: self.sas_version.clone(),
            os_name: self.os_name.clone(),
            created,
            modified: self.modified.unwrap_or(created),
        }
    }
}

/// Options for building a dataset from in-memory rows or columns.
#[derive(Debug, Clone)]
pub struct XptBuilderOptions {
    /// Member name (default: "DATASET").
    pub dataset_name: String,
    /// Member label.
    pub dataset_label: Option<String>,
    /// Store numerics in the fewest bytes that keep every value exact
    /// (default: true). When false every numeric column uses 8 bytes.
    pub compact_numerics: bool,
}

impl Default for XptBuilderOptions {
    fn default() -> Self {
        Self {
            dataset_name: "DATASET".to_string(),
            dataset_label: None,
            compact_numerics: true,
        }
    }
}

impl XptBuilderOptions {
    /// Create builder options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the member name.
    #[must_use]
    pub fn with_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = name.into();
        self
    }

    /// Set the member label.
    #[must_use]
    pub fn with_dataset_label(mut self, label: impl Into<String>) -> Self {
        self.dataset_label = Some(label.into());
        self
    }

    /// Always use 8-byte numerics.
    #[must_use]
    pub fn full_width_numerics(mut self) -> Self {
        self.compact_numerics = false;
        self
    }
}
