use std::collections::HashMap;

use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::models::{Booking, DateRange, ReservationState};

#[derive(Debug)]
pub struct PendingReservation {
    pub payment_id: String,
    pub booking: Booking,
    pub range: DateRange,
    pub state: ReservationState,
    pub expires_at: Instant,
    settling: bool,
    timer: Option<AbortHandle>,
}

impl PendingReservation {
    pub fn new(payment_id: String, booking: Booking, range: DateRange, expires_at: Instant) -> Self {
        Self {
            payment_id,
            booking,
            range,
            state: ReservationState::Validated,
            expires_at,
            settling: false,
            timer: None,
        }
    }

    /// An entry being committed never expires; it is removed once the commit
    /// has finished.
    pub fn is_expired(&self, now: Instant) -> bool {
        !self.settling && self.expires_at <= now
    }

    pub fn is_settling(&self) -> bool {
        self.settling
    }

    pub fn set_timer(&mut self, timer: AbortHandle) {
        self.timer = Some(timer);
    }

    /// Stops the expiry task; the entry has been resolved some other way.
    pub fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// In-memory reservations awaiting payment, keyed by payment id with a
/// booking-id index for status polling. Bounded; expired entries are purged
/// on every access.
#[derive(Debug)]
pub struct PendingReservations {
    entries: HashMap<String, PendingReservation>,
    by_booking: HashMap<String, String>,
    capacity: usize,
}

impl PendingReservations {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            by_booking: HashMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn purge_expired(&mut self, now: Instant) -> Vec<PendingReservation> {
        let expired: Vec<String> = self
            .entries
            .values()
            .filter(|e| e.is_expired(now))
            .map(|e| e.payment_id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.remove(&id))
            .collect()
    }

    /// True when a live entry holds a range overlapping `range`.
    pub fn holds(&self, range: &DateRange, now: Instant) -> bool {
        self.entries
            .values()
            .any(|e| !e.is_expired(now) && e.range.overlaps(range))
    }

    /// Returns the entry back when the map is full.
    pub fn insert(&mut self, entry: PendingReservation) -> Result<(), PendingReservation> {
        if self.entries.len() >= self.capacity {
            return Err(entry);
        }
        self.by_booking
            .insert(entry.booking.id.clone(), entry.payment_id.clone());
        self.entries.insert(entry.payment_id.clone(), entry);
        Ok(())
    }

    /// Maps a payment id or booking id to the payment id of a live entry.
    pub fn resolve(&self, id: &str, now: Instant) -> Option<String> {
        let payment_id = if self.entries.contains_key(id) {
            id
        } else {
            self.by_booking.get(id)?.as_str()
        };
        self.entries
            .get(payment_id)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.payment_id.clone())
    }

    pub fn get_mut(&mut self, payment_id: &str) -> Option<&mut PendingReservation> {
        self.entries.get_mut(payment_id)
    }

    /// Removes a live entry. An entry past its expiry is dropped and `None`
    /// is returned, so a late confirmation finds nothing. An entry being
    /// settled stays where it is.
    pub fn take_live(&mut self, payment_id: &str, now: Instant) -> Option<PendingReservation> {
        if self.entries.get(payment_id)?.is_settling() {
            return None;
        }
        let entry = self.remove(payment_id)?;
        if entry.is_expired(now) {
            return None;
        }
        Some(entry)
    }

    /// Marks a live entry as being committed and stops its expiry task. The
    /// entry keeps holding its range until [`remove`](Self::remove) is called.
    /// Returns `None` for unknown, expired or already settling entries.
    pub fn begin_settle(&mut self, payment_id: &str, now: Instant) -> Option<&PendingReservation> {
        let expired = {
            let entry = self.entries.get(payment_id)?;
            if entry.settling {
                return None;
            }
            entry.is_expired(now)
        };
        if expired {
            self.remove(payment_id);
            return None;
        }

        let entry = self.entries.get_mut(payment_id)?;
        entry.settling = true;
        entry.disarm();
        Some(&*entry)
    }

    pub fn remove(&mut self, payment_id: &str) -> Option<PendingReservation> {
        let entry = self.entries.remove(payment_id)?;
        self.by_booking.remove(&entry.booking.id);
        Some(entry)
    }
}
