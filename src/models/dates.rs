use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("invalid date format: {0:?} (expected YYYY-MM-DD)")]
    InvalidDateFormat(String),

    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Parses a strict `YYYY-MM-DD` calendar date. The value carries no time of
/// day and no offset; it is the local wall-clock day.
pub fn parse_calendar_date(s: &str) -> Result<NaiveDate, DateError> {
    let bytes = s.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(DateError::InvalidDateFormat(s.to_string()));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| DateError::InvalidDateFormat(s.to_string()))
}

/// Browsers sometimes send full ISO timestamps; only the date part counts.
pub fn clean_date_input(s: &str) -> &str {
    let s = s.trim();
    s.split_once('T').map(|(date, _)| date).unwrap_or(s)
}

/// Number of calendar days covered by `[start, end]`. Callers guarantee
/// `start <= end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Closed-interval overlap. Touching boundaries count: a checkout day cannot
/// be another booking's checkin day.
pub fn ranges_overlap(s1: NaiveDate, e1: NaiveDate, s2: NaiveDate, e2: NaiveDate) -> bool {
    !(e1 < s2 || s1 > e2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateError> {
        if end < start {
            return Err(DateError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, DateError> {
        let start = parse_calendar_date(clean_date_input(start))?;
        let end = parse_calendar_date(clean_date_input(end))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> i64 {
        days_inclusive(self.start, self.end)
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        ranges_overlap(self.start, self.end, other.start, other.end)
    }

    pub fn overlaps_days(&self, start: NaiveDate, end: NaiveDate) -> bool {
        ranges_overlap(self.start, self.end, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_calendar_date(s).unwrap()
    }

    #[test]
    fn test_parse_valid_date() {
        assert_eq!(d("2024-05-01"), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(d("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for s in ["2024-5-01", "2024/05/01", "20240501", "", "2024-05-01 ", "abcd-ef-gh"] {
            assert!(
                matches!(parse_calendar_date(s), Err(DateError::InvalidDateFormat(_))),
                "{s:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_impossible_dates() {
        assert!(parse_calendar_date("2024-13-01").is_err());
        assert!(parse_calendar_date("2023-02-29").is_err());
        assert!(parse_calendar_date("2024-04-31").is_err());
    }

    #[test]
    fn test_clean_date_input_strips_time() {
        assert_eq!(clean_date_input("2024-05-01T00:00:00.000Z"), "2024-05-01");
        assert_eq!(clean_date_input(" 2024-05-01 "), "2024-05-01");
    }

    #[test]
    fn test_days_inclusive() {
        assert_eq!(days_inclusive(d("2024-05-01"), d("2024-05-01")), 1);
        assert_eq!(days_inclusive(d("2024-05-01"), d("2024-05-03")), 3);
        // across a DST change and a month boundary
        assert_eq!(days_inclusive(d("2024-03-30"), d("2024-04-02")), 4);
    }

    #[test]
    fn test_touching_ranges_overlap() {
        assert!(ranges_overlap(
            d("2024-05-01"),
            d("2024-05-03"),
            d("2024-05-03"),
            d("2024-05-05")
        ));
    }

    #[test]
    fn test_overlap_is_symmetric_and_reflexive() {
        let cases = [
            ("2024-05-01", "2024-05-03", "2024-05-04", "2024-05-06"),
            ("2024-05-01", "2024-05-10", "2024-05-04", "2024-05-06"),
            ("2024-05-01", "2024-05-03", "2024-04-20", "2024-05-01"),
        ];
        for (s1, e1, s2, e2) in cases {
            let a = ranges_overlap(d(s1), d(e1), d(s2), d(e2));
            let b = ranges_overlap(d(s2), d(e2), d(s1), d(e1));
            assert_eq!(a, b);
            assert!(ranges_overlap(d(s1), d(e1), d(s1), d(e1)));
        }
        assert!(!ranges_overlap(d("2024-05-01"), d("2024-05-03"), d("2024-05-04"), d("2024-05-06")));
    }

    #[test]
    fn test_range_rejects_reversed_dates() {
        let err = DateRange::parse("2024-05-03", "2024-05-01").unwrap_err();
        assert!(matches!(err, DateError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_range_days_and_overlap() {
        let a = DateRange::parse("2024-05-01", "2024-05-03").unwrap();
        let b = DateRange::parse("2024-05-03T12:00:00Z", "2024-05-05").unwrap();
        assert_eq!(a.days(), 3);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }
}
