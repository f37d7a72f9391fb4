//! Spreadsheet date parsing.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use crate::error::InvalidDate;

/// Parses date cells written in a fixed pattern and local offset.
#[derive(Debug, Clone)]
pub struct DateParser {
    format: String,
    offset: FixedOffset,
}

impl DateParser {
    pub fn new(format: impl Into<String>, offset: FixedOffset) -> Self {
        Self {
            format: format.into(),
            offset,
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Line breaks inside the cell count as spaces. A blank cell is `Ok(None)`.
    pub fn parse(&self, raw: &str) -> Result<Option<DateTime<Utc>>, InvalidDate> {
        let text = raw.replace("\r\n", " ").replace(['\n', '\r'], " ");
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let invalid = || InvalidDate {
            value: text.to_string(),
            format: self.format.clone(),
        };
        let local = NaiveDateTime::parse_from_str(text, &self.format).map_err(|_| invalid())?;
        let utc = local.checked_sub_offset(self.offset).ok_or_else(invalid)?;
        Ok(Some(utc.and_utc()))
    }
}
