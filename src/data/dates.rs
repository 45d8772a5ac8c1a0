use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::error::{ChartDataError, Result};
use super::model::ISO_DATE_FORMAT;

/// Output format of [`human_date_labels`], e.g. `Mar 2021`.
pub const MONTH_YEAR_FORMAT: &str = "%b %Y";

/// Two adjacent windows around an anchor date.
///
/// `window1_start = anchor - offset`, `window1_end = anchor`,
/// `window2_start = anchor + offset`, `window2_end = anchor + 2 * offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindows {
    pub window1_start: NaiveDate,
    pub window1_end: NaiveDate,
    pub window2_start: NaiveDate,
    pub window2_end: NaiveDate,
}

impl DateWindows {
    /// Windows around an already parsed anchor.
    pub fn around(anchor: NaiveDate, offset_days: u32) -> Result<Self> {
        let offset = Days::new(u64::from(offset_days));
        let overflow = || {
            ChartDataError::InvalidArgument(format!(
                "offset of {offset_days} days from {anchor} leaves the supported date range"
            ))
        };
        let window1_start = anchor.checked_sub_days(offset).ok_or_else(overflow)?;
        let window2_start = anchor.checked_add_days(offset).ok_or_else(overflow)?;
        let window2_end = window2_start.checked_add_days(offset).ok_or_else(overflow)?;
        Ok(DateWindows {
            window1_start,
            window1_end: anchor,
            window2_start,
            window2_end,
        })
    }

    /// The four boundaries in order.
    pub fn as_array(&self) -> [NaiveDate; 4] {
        [
            self.window1_start,
            self.window1_end,
            self.window2_start,
            self.window2_end,
        ]
    }
}

/// Parse a `YYYY-MM-DD` anchor and build its [`DateWindows`].
pub fn date_windows(anchor: &str, offset_days: u32) -> Result<DateWindows> {
    let anchor = parse_date(anchor, ISO_DATE_FORMAT)?;
    DateWindows::around(anchor, offset_days)
}

/// Parse `value` under a chrono format string.
///
/// Formats carrying a time component are accepted; the time is discarded.
pub fn parse_date(value: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, format)
        .or_else(|_| NaiveDateTime::parse_from_str(value, format).map(|dt| dt.date()))
        .map_err(|_| ChartDataError::InvalidFormat {
            value: value.to_string(),
            format: format.to_string(),
        })
}

/// Render each date string as `Mon YYYY`, keeping input order.
pub fn human_date_labels<S: AsRef<str>>(dates: &[S], format: &str) -> Result<Vec<String>> {
    dates
        .iter()
        .map(|d| {
            parse_date(d.as_ref(), format).map(|date| date.format(MONTH_YEAR_FORMAT).to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::date;

    #[test]
    fn windows_around_mid_june() {
        let w = date_windows("2021-06-15", 10).unwrap();
        assert_eq!(
            w.as_array().map(|d| d.format(ISO_DATE_FORMAT).to_string()),
            ["2021-06-05", "2021-06-15", "2021-06-25", "2021-07-05"]
        );
    }

    #[test]
    fn windows_cross_leap_day() {
        let w = date_windows("2020-02-28", 1).unwrap();
        assert_eq!(w.window2_start, date("2020-02-29"));
        assert_eq!(w.window2_end, date("2020-03-01"));
    }

    #[test]
    fn windows_are_ordered_for_positive_offsets() {
        for offset in [1, 7, 30, 365] {
            let w = date_windows("2019-12-31", offset).unwrap();
            assert!(w.window1_start <= w.window1_end);
            assert!(w.window1_end < w.window2_start);
            assert!(w.window2_start <= w.window2_end);
        }
    }

    #[test]
    fn zero_offset_collapses_to_anchor() {
        let w = date_windows("2021-06-15", 0).unwrap();
        assert!(w.as_array().iter().all(|d| *d == date("2021-06-15")));
    }

    #[test]
    fn bad_anchor_is_invalid_format() {
        for anchor in ["15/06/2021", "2021-13-01", ""] {
            assert!(matches!(
                date_windows(anchor, 3),
                Err(ChartDataError::InvalidFormat { .. })
            ));
        }
    }

    #[test]
    fn overflow_is_invalid_argument() {
        let err = DateWindows::around(NaiveDate::MAX, 1).unwrap_err();
        assert!(matches!(err, ChartDataError::InvalidArgument(_)));
    }

    #[test]
    fn month_year_labels() {
        assert_eq!(
            human_date_labels(&["2021-03-01"], "%Y-%m-%d").unwrap(),
            vec!["Mar 2021"]
        );
        assert_eq!(
            human_date_labels(&["01/12/2020", "31/01/2021"], "%d/%m/%Y").unwrap(),
            vec!["Dec 2020", "Jan 2021"]
        );
        assert_eq!(
            human_date_labels(&["2021-07-04 13:45:00"], "%Y-%m-%d %H:%M:%S").unwrap(),
            vec!["Jul 2021"]
        );
    }

    #[test]
    fn month_year_labels_reject_mismatched_input() {
        let err = human_date_labels(&["2021-03-01", "March"], "%Y-%m-%d").unwrap_err();
        assert_eq!(
            err,
            ChartDataError::InvalidFormat {
                value: "March".into(),
                format: "%Y-%m-%d".into()
            }
        );
    }
}
