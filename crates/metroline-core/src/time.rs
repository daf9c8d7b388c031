use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

/// Parses `text` with a chrono `strftime` pattern.
///
/// Patterns carrying a time component produce that exact timestamp; date-only patterns (the
/// common case) resolve to midnight. Returns `None` when the text does not match.
pub fn parse_date(format: &str, text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn format_date(format: &str, date: NaiveDateTime) -> String {
    date.format(format).to_string()
}

/// An inclusive visible window; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

impl DateRange {
    /// Parses range boundaries written in the view format. Blank strings leave that end open.
    pub fn parse(view_format: &str, from: Option<&str>, to: Option<&str>) -> Result<Self> {
        let bound = |raw: Option<&str>| -> Result<Option<NaiveDateTime>> {
            match raw.map(str::trim) {
                None | Some("") => Ok(None),
                Some(text) => parse_date(view_format, text).map(Some).ok_or_else(|| {
                    Error::InvalidRangeBoundary {
                        value: text.to_string(),
                        format: view_format.to_string(),
                    }
                }),
            }
        };
        Ok(Self {
            from: bound(from)?,
            to: bound(to)?,
        })
    }

    /// Resolves open ends against the dataset's own earliest/latest dates.
    pub fn resolve(&self, earliest: NaiveDateTime, latest: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        (self.from.unwrap_or(earliest), self.to.unwrap_or(latest))
    }
}
