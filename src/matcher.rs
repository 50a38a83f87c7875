//! Filename matching for date-stamped photos.
//!
//! A name qualifies when it is exactly `<8 digits>_<digits>.jpg`. Matching and
//! decomposition share one compiled pattern, so a name is split into its
//! date, id and extension through capture groups rather than by position.

use regex::Regex;
use std::sync::LazyLock;

/// `YYYYMMDD_<id>.jpg`, anchored at both ends. ASCII digits only and a
/// lowercase extension.
static DATE_STAMPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<date>[0-9]{8})_(?P<id>[0-9]+)\.(?P<ext>jpg)$")
        .expect("date-stamped filename pattern must compile")
});

/// The pieces of a date-stamped filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts<'a> {
    /// The raw 8-digit date token, not yet validated as a calendar day.
    pub date: &'a str,
    pub id: &'a str,
    pub extension: &'a str,
}

/// Returns true if `name` is a date-stamped photo name.
///
/// # Examples
///
/// ```
/// use datesort::matcher::is_match;
///
/// assert!(is_match("20230415_12.jpg"));
/// assert!(!is_match("a20230415_1.jpg"));
/// assert!(!is_match("20230415_1.jpgx"));
/// ```
pub fn is_match(name: &str) -> bool {
    DATE_STAMPED.is_match(name)
}

/// Splits a date-stamped name into its parts, or `None` if it does not match.
pub fn decompose(name: &str) -> Option<NameParts<'_>> {
    let caps = DATE_STAMPED.captures(name)?;
    Some(NameParts {
        date: caps.name("date")?.as_str(),
        id: caps.name("id")?.as_str(),
        extension: caps.name("ext")?.as_str(),
    })
}
