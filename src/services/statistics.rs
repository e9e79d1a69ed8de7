use chrono::Datelike;

use crate::models::dates::days_inclusive;
use crate::models::{Booking, MonthlyStat, YearStats};

/// Per-month booking counts and revenue for `year`. A booking counts entirely
/// towards the month it starts in, even when it runs into the next month.
/// Blocks carry no revenue and are ignored.
pub fn compute_year_stats(bookings: &[Booking], year: i32, daily_rate: i64) -> YearStats {
    let mut months = [MonthlyStat::default(); 12];

    for booking in bookings.iter().filter(|b| b.start_date.year() == year) {
        let month = &mut months[booking.start_date.month0() as usize];
        month.count += 1;
        month.revenue += days_inclusive(booking.start_date, booking.end_date) * daily_rate;
    }

    YearStats {
        year,
        months,
        total_bookings: months.iter().map(|m| m.count).sum(),
        total_revenue: months.iter().map(|m| m.revenue).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(id: &str, start: &str, end: &str) -> Booking {
        Booking {
            id: id.to_string(),
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            name: "Guest".to_string(),
            phone: "070".to_string(),
            email: "guest@example.com".to_string(),
        }
    }

    #[test]
    fn test_single_booking() {
        let stats = compute_year_stats(&[booking("1", "2024-03-10", "2024-03-12")], 2024, 550);
        assert_eq!(stats.months[2], MonthlyStat { count: 1, revenue: 1650 });
        assert_eq!(stats.total_bookings, 1);
        assert_eq!(stats.total_revenue, 1650);
    }

    #[test]
    fn test_spanning_booking_attributed_to_start_month() {
        let stats = compute_year_stats(&[booking("1", "2024-01-30", "2024-02-02")], 2024, 100);
        assert_eq!(stats.months[0], MonthlyStat { count: 1, revenue: 400 });
        assert_eq!(stats.months[1], MonthlyStat::default());
    }

    #[test]
    fn test_other_years_excluded() {
        let bookings = [
            booking("1", "2023-12-30", "2024-01-02"),
            booking("2", "2025-01-01", "2025-01-01"),
            booking("3", "2024-07-01", "2024-07-01"),
        ];
        let stats = compute_year_stats(&bookings, 2024, 550);
        assert_eq!(stats.total_bookings, 1);
        assert_eq!(stats.months[6], MonthlyStat { count: 1, revenue: 550 });
    }

    #[test]
    fn test_serialized_shape() {
        let stats = compute_year_stats(&[], 2024, 550);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["year"], 2024);
        assert_eq!(json["months"].as_array().unwrap().len(), 12);
        assert_eq!(json["totalBookings"], 0);
        assert_eq!(json["totalRevenue"], 0);
    }
}
