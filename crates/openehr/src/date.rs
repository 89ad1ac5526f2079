//! Timestamp formatting for AQL literals.

use crate::constants::ISO_DATE_FORMAT;
use chrono::{DateTime, Utc};

/// Format a timestamp as `yyyy-MM-ddTHH:mmZ` in UTC.
///
/// Seconds and sub-second precision are truncated.
pub fn iso_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format(ISO_DATE_FORMAT).to_string()
}
