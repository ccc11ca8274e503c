/// Filter primitives for list endpoints
///
/// Entity-specific filter structs live next to their models; this module
/// holds the pieces they share.

use chrono::{DateTime, Utc};

/// An optional closed date interval.
///
/// Creation-date filters use [`DateRange::bounds`]: the interval only
/// applies when BOTH endpoints are present, so a lone `from` or `to` is
/// ignored entirely. Filters that treat each endpoint independently
/// read `from`/`to` directly instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    /// Both endpoints, or nothing.
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some((from, to)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_bounds_require_both_endpoints() {
        let from = ts("2026-01-01 00:00:00");
        let to = ts("2026-02-01 00:00:00");

        assert_eq!(DateRange::new(Some(from), Some(to)).bounds(), Some((from, to)));
        assert_eq!(DateRange::new(Some(from), None).bounds(), None);
        assert_eq!(DateRange::new(None, Some(to)).bounds(), None);
        assert_eq!(DateRange::default().bounds(), None);
    }

    #[test]
    fn test_is_empty() {
        assert!(DateRange::default().is_empty());
        assert!(!DateRange::new(Some(ts("2026-01-01 00:00:00")), None).is_empty());
    }
}
