//! Header datetime fields (`ddMMMyy:hh:mm:ss`).

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::{Result, XptError};

/// chrono pattern of the 16-byte header datetime.
pub const XPT_DATETIME_FORMAT: &str = "%d%b%y:%H:%M:%S";

/// Earliest year a two-digit header year maps to.
pub const MIN_XPT_YEAR: i32 = 1969;

/// Latest year a two-digit header year maps to.
pub const MAX_XPT_YEAR: i32 = 2068;

/// Format datetime as SAS format: ddMMMyy:hh:mm:ss
#[must_use]
pub fn format_xpt_datetime(dt: NaiveDateTime) -> String {
    dt.format(XPT_DATETIME_FORMAT).to_string().to_uppercase()
}

/// Parse a header datetime; month names are case-insensitive.
///
/// Two-digit years 00-68 map to 20xx and 69-99 to 19xx.
#[must_use]
pub fn parse_xpt_datetime(text: &str) -> Option<NaiveDateTime> {
    let dt = NaiveDateTime::parse_from_str(text.trim(), XPT_DATETIME_FORMAT).ok()?;
    // chrono maps 69 to 2069.
    if dt.year() > MAX_XPT_YEAR {
        dt.with_year(dt.year() - 100)
    } else {
        Some(dt)
    }
}

/// Parse a header datetime or fail with [`XptError::InvalidDatetime`].
pub fn require_xpt_datetime(text: &str) -> Result<NaiveDateTime> {
    parse_xpt_datetime(text).ok_or_else(|| XptError::InvalidDatetime {
        value: text.to_string(),
    })
}

/// Check that a datetime survives the header field unchanged.
///
/// The field holds whole seconds and a two-digit year, so only
/// [`MIN_XPT_YEAR`]..=[`MAX_XPT_YEAR`] without fractional seconds fit.
pub fn check_xpt_datetime(field: &'static str, dt: NaiveDateTime) -> Result<()> {
    if !(MIN_XPT_YEAR..=MAX_XPT_YEAR).contains(&dt.year()) || dt.nanosecond() != 0 {
        return Err(XptError::UnrepresentableDatetime { field, value: dt });
    }
    Ok(())
}
