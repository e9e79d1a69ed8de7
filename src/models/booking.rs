use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::DateRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Admin-imposed unavailable range with no guest attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Booking(Booking),
    Block(Block),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemovedCounts {
    pub bookings: usize,
    pub blocks: usize,
}

/// The whole durable occupancy record. No two entries across both lists may
/// overlap; every insert path checks that before calling [`Self::insert`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl AvailabilitySnapshot {
    pub fn is_occupied(&self, range: &DateRange) -> bool {
        self.bookings
            .iter()
            .any(|b| range.overlaps_days(b.start_date, b.end_date))
            || self
                .blocks
                .iter()
                .any(|b| range.overlaps_days(b.start_date, b.end_date))
    }

    pub fn insert(&mut self, entry: Entry) {
        match entry {
            Entry::Booking(b) => self.bookings.push(b),
            Entry::Block(b) => self.blocks.push(b),
        }
    }

    pub fn remove(&mut self, id: &str) -> RemovedCounts {
        let before = (self.bookings.len(), self.blocks.len());
        self.bookings.retain(|b| b.id != id);
        self.blocks.retain(|b| b.id != id);
        RemovedCounts {
            bookings: before.0 - self.bookings.len(),
            blocks: before.1 - self.blocks.len(),
        }
    }

    pub fn find_booking(&self, id: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    /// Largest numeric id in the document, used to keep new ids monotonic
    /// across restarts.
    pub fn max_numeric_id(&self) -> Option<i64> {
        self.bookings
            .iter()
            .map(|b| b.id.as_str())
            .chain(self.blocks.iter().map(|b| b.id.as_str()))
            .filter_map(|id| id.parse::<i64>().ok())
            .max()
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
            name: "Anna".to_string(),
            phone: "0701234567".to_string(),
            email: "anna@example.com".to_string(),
        }
    }

    fn block(id: &str, start: &str, end: &str) -> Block {
        Block {
            id: id.to_string(),
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
        }
    }

    #[test]
    fn test_occupied_by_booking_or_block() {
        let mut snap = AvailabilitySnapshot::default();
        snap.insert(Entry::Booking(booking("1", "2024-05-01", "2024-05-03")));
        snap.insert(Entry::Block(block("2", "2024-06-10", "2024-06-12")));

        assert!(snap.is_occupied(&DateRange::parse("2024-05-03", "2024-05-04").unwrap()));
        assert!(snap.is_occupied(&DateRange::parse("2024-06-01", "2024-06-10").unwrap()));
        assert!(!snap.is_occupied(&DateRange::parse("2024-05-04", "2024-06-09").unwrap()));
    }

    #[test]
    fn test_remove_counts_per_list() {
        let mut snap = AvailabilitySnapshot::default();
        snap.insert(Entry::Booking(booking("1", "2024-05-01", "2024-05-03")));
        snap.insert(Entry::Block(block("2", "2024-06-10", "2024-06-12")));

        assert_eq!(snap.remove("2"), RemovedCounts { bookings: 0, blocks: 1 });
        assert_eq!(snap.remove("2"), RemovedCounts::default());
        assert_eq!(snap.bookings.len(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let mut snap = AvailabilitySnapshot::default();
        snap.insert(Entry::Booking(booking("1714550400000", "2024-05-01", "2024-05-03")));
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["bookings"][0]["startDate"], "2024-05-01");
        assert_eq!(json["bookings"][0]["endDate"], "2024-05-03");
        assert_eq!(json["blocks"], serde_json::json!([]));
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let snap: AvailabilitySnapshot = serde_json::from_str(r#"{"bookings":[]}"#).unwrap();
        assert!(snap.blocks.is_empty());
    }

    #[test]
    fn test_max_numeric_id_ignores_opaque_ids() {
        let mut snap = AvailabilitySnapshot::default();
        snap.insert(Entry::Booking(booking("1700000000000", "2024-05-01", "2024-05-03")));
        snap.insert(Entry::Block(block("legacy-id", "2024-06-10", "2024-06-12")));
        snap.insert(Entry::Block(block("1700000000500", "2024-07-10", "2024-07-12")));
        assert_eq!(snap.max_numeric_id(), Some(1_700_000_000_500));
    }
}
