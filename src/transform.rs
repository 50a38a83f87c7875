//! Turns a date-stamped filename into its readable form.
//!
//! `20230415_12.jpg` becomes `April_15_2023--12.jpg`.

use crate::error::{RenameError, RenameResult};
use crate::matcher::NameParts;
use chrono::NaiveDate;

/// Strict date layout of the leading token.
const DATE_TOKEN_FORMAT: &str = "%Y%m%d";

/// Full month name, zero-padded day, four-digit year.
const READABLE_DATE_FORMAT: &str = "%B_%d_%Y";

/// A date-stamped filename with its date validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedName {
    pub date: NaiveDate,
    pub id: String,
    pub extension: String,
}

impl DatedName {
    /// Validates the date token of an already-matched name.
    ///
    /// The matcher only checks for eight digits, so `20231345` gets this far.
    /// Such a token fails here with [`RenameError::InvalidDate`], which is fatal
    /// to a forward run.
    pub fn parse(parts: &NameParts<'_>) -> RenameResult<Self> {
        let date = NaiveDate::parse_from_str(parts.date, DATE_TOKEN_FORMAT).map_err(|e| {
            RenameError::InvalidDate {
                token: parts.date.to_string(),
                source: e,
            }
        })?;

        Ok(Self {
            date,
            id: parts.id.to_string(),
            extension: parts.extension.to_string(),
        })
    }

    /// The readable filename, e.g. `April_15_2023--12.jpg`.
    pub fn file_name(&self) -> String {
        format!(
            "{}--{}.{}",
            self.date.format(READABLE_DATE_FORMAT),
            self.id,
            self.extension
        )
    }
}

/// Computes the new name for a matched filename.
pub fn transform(parts: &NameParts<'_>) -> RenameResult<String> {
    DatedName::parse(parts).map(|name| name.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::decompose;

    fn transform_name(name: &str) -> RenameResult<String> {
        transform(&decompose(name).expect("test name must match"))
    }

    #[test]
    fn test_transform_example() {
        assert_eq!(
            transform_name("20230415_12.jpg").unwrap(),
            "April_15_2023--12.jpg"
        );
    }

    #[test]
    fn test_transform_pads_day() {
        assert_eq!(
            transform_name("20230101_1.jpg").unwrap(),
            "January_01_2023--1.jpg"
        );
        assert_eq!(
            transform_name("20231209_300.jpg").unwrap(),
            "December_09_2023--300.jpg"
        );
    }

    #[test]
    fn test_transform_keeps_id_verbatim() {
        assert_eq!(
            transform_name("20200229_007.jpg").unwrap(),
            "February_29_2020--007.jpg"
        );
    }

    #[test]
    fn test_transform_is_deterministic() {
        let first = transform_name("19990704_42.jpg").unwrap();
        let second = transform_name("19990704_42.jpg").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "July_04_1999--42.jpg");
    }

    #[test]
    fn test_impossible_month_is_invalid_date() {
        let err = transform_name("20231345_1.jpg").unwrap_err();
        assert!(matches!(err, RenameError::InvalidDate { ref token, .. } if token == "20231345"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_non_leap_day_is_invalid_date() {
        assert!(transform_name("20230229_1.jpg").is_err());
    }

    #[test]
    fn test_dated_name_exposes_typed_date() {
        let parts = decompose("20230415_12.jpg").unwrap();
        let dated = DatedName::parse(&parts).unwrap();
        assert_eq!(dated.date, NaiveDate::from_ymd_opt(2023, 4, 15).unwrap());
        assert_eq!(dated.id, "12");
        assert_eq!(dated.extension, "jpg");
    }
}
