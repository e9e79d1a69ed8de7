pub mod pending;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::db::AvailabilityStore;
use crate::errors::AppError;
use crate::models::dates::{clean_date_input, parse_calendar_date};
use crate::models::{
    transition, Block, Booking, DateRange, Entry, RejectReason, ReservationEvent,
    ReservationState,
};
use crate::services::clock::Clock;
use crate::services::notifications::Notifier;
use crate::services::payment::{new_payment_id, PaymentGateway, PaymentRequest, PaymentStatus};

use pending::{PendingReservation, PendingReservations};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub manual: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStarted {
    pub payment_request_token: String,
    pub qr_code: String,
    pub booking_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Manual(Booking),
    PaymentPending(PaymentStarted),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentProgress {
    Paid,
    Pending,
}

#[derive(Debug, Clone)]
pub struct ReservationSettings {
    pub payment_timeout: Duration,
    pub daily_rate: i64,
    pub max_pending: usize,
    pub apartment_name: String,
}

impl ReservationSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            payment_timeout: Duration::from_secs(config.payment_timeout_secs),
            daily_rate: config.daily_rate,
            max_pending: config.max_pending_reservations,
            apartment_name: config.apartment_name.clone(),
        }
    }
}

/// A validated request that has not been given an id yet.
struct Candidate {
    range: DateRange,
    name: String,
    phone: String,
    email: String,
}

impl Candidate {
    fn into_booking(self, id: String) -> Booking {
        Booking {
            id,
            start_date: self.range.start(),
            end_date: self.range.end(),
            name: self.name,
            phone: self.phone,
            email: self.email,
        }
    }
}

/// Drives a booking attempt from request to a committed booking or a
/// discarded one.
///
/// Durable state lives in the [`AvailabilityStore`]; reservations awaiting
/// payment live only here, in a bounded in-memory map. The payment round trip
/// never holds the store lock: only the final re-check and insert do.
pub struct ReservationService {
    store: Arc<AvailabilityStore>,
    payments: Option<Arc<dyn PaymentGateway>>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    settings: ReservationSettings,
    pending: Mutex<PendingReservations>,
}

impl ReservationService {
    pub fn new(
        store: Arc<AvailabilityStore>,
        payments: Option<Arc<dyn PaymentGateway>>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
        settings: ReservationSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            payments,
            notifier,
            clock,
            pending: Mutex::new(PendingReservations::new(settings.max_pending)),
            settings,
        })
    }

    fn pending(&self) -> MutexGuard<'_, PendingReservations> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pending_count(&self) -> usize {
        let mut pending = self.pending();
        pending.purge_expired(Instant::now());
        pending.len()
    }

    pub async fn request_booking(
        self: &Arc<Self>,
        request: BookingRequest,
        is_admin: bool,
    ) -> Result<BookingOutcome, AppError> {
        let manual = request.manual;
        let candidate = match self.validate(request) {
            Ok(candidate) => candidate,
            Err(reason) => {
                let state = transition(
                    ReservationState::Requested,
                    ReservationEvent::InputRejected(reason.clone()),
                );
                tracing::info!(state = state.as_str(), reason = %reason, "booking request rejected");
                return Err(reason.into());
            }
        };
        let state = transition(ReservationState::Requested, ReservationEvent::InputAccepted);

        if manual {
            if !is_admin {
                return Err(AppError::Unauthorized);
            }
            return self.commit_manual(state, candidate).await.map(BookingOutcome::Manual);
        }

        self.start_payment(state, candidate)
            .await
            .map(BookingOutcome::PaymentPending)
    }

    fn validate(&self, request: BookingRequest) -> Result<Candidate, RejectReason> {
        let field = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let (Some(start), Some(end), Some(name), Some(phone), Some(email)) = (
            field(request.start_date),
            field(request.end_date),
            field(request.name),
            field(request.phone),
            field(request.email),
        ) else {
            return Err(RejectReason::MissingFields);
        };

        let start = parse_calendar_date(clean_date_input(&start))?;
        let end = parse_calendar_date(clean_date_input(&end))?;

        let today = self.clock.today();
        if start < today || end < today {
            return Err(RejectReason::InvalidDateRange(
                "cannot book dates in the past".to_string(),
            ));
        }
        let range = DateRange::new(start, end)?;

        Ok(Candidate {
            range,
            name,
            phone,
            email,
        })
    }

    async fn commit_manual(
        &self,
        state: ReservationState,
        candidate: Candidate,
    ) -> Result<Booking, AppError> {
        let mut txn = self.store.transaction().await?;
        if txn.is_occupied(&candidate.range) {
            let state = transition(state, ReservationEvent::SlotTaken);
            tracing::info!(state = state.as_str(), "manual booking collides with existing entry");
            return Err(RejectReason::RangeUnavailable.into());
        }

        let booking = candidate.into_booking(self.store.next_id());
        txn.insert(Entry::Booking(booking.clone()));
        txn.commit().await?;

        let state = transition(state, ReservationEvent::ManualCommitted);
        tracing::info!(booking_id = %booking.id, state = state.as_str(), "manual booking stored");
        self.notifier.manual_booking(&booking);

        Ok(booking)
    }

    async fn start_payment(
        self: &Arc<Self>,
        state: ReservationState,
        candidate: Candidate,
    ) -> Result<PaymentStarted, AppError> {
        let Some(gateway) = self.payments.clone() else {
            return Err(RejectReason::PaymentProvider("payments are not configured".to_string()).into());
        };

        let range = candidate.range;
        let booking = candidate.into_booking(self.store.next_id());
        let payment_id = new_payment_id();
        let expires_at = Instant::now() + self.settings.payment_timeout;

        // hold first, then consult the store: a reservation being committed
        // keeps its hold until the booking is on disk
        {
            let mut pending = self.pending();
            let now = Instant::now();
            pending.purge_expired(now);
            if pending.holds(&range, now) {
                let state = transition(state, ReservationEvent::SlotTaken);
                tracing::info!(state = state.as_str(), "requested range is held by another guest");
                return Err(RejectReason::RangeUnavailable.into());
            }
            let entry = PendingReservation::new(payment_id.clone(), booking.clone(), range, expires_at);
            if pending.insert(entry).is_err() {
                tracing::warn!("pending reservation map is full");
                return Err(AppError::TooManyPending);
            }
        }

        if self.store.is_occupied(&range).await {
            self.pending().remove(&payment_id);
            let state = transition(state, ReservationEvent::SlotTaken);
            tracing::info!(state = state.as_str(), "requested range is occupied");
            return Err(RejectReason::RangeUnavailable.into());
        }

        let request = PaymentRequest {
            payment_id: payment_id.clone(),
            reference: booking.id.clone(),
            amount: range.days() * self.settings.daily_rate,
            message: format!("Booking {} {}", self.settings.apartment_name, booking.start_date),
        };

        let handle = match gateway.create_payment_request(&request).await {
            Ok(handle) => handle,
            Err(e) => {
                self.pending().remove(&payment_id);
                let state = transition(state, ReservationEvent::PaymentRequestFailed(e.to_string()));
                tracing::error!(payment_id = %payment_id, error = %e, state = state.as_str(), "failed to create payment request");
                return Err(RejectReason::PaymentProvider(e.to_string()).into());
            }
        };

        let service = Arc::clone(self);
        let timer_id = payment_id.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            service.expire(&timer_id);
        });

        {
            let mut pending = self.pending();
            let now = Instant::now();
            let live = pending.get_mut(&payment_id).filter(|e| !e.is_expired(now));
            let Some(entry) = live else {
                // expired or cancelled while the provider call was in flight
                timer.abort();
                pending.remove(&payment_id);
                drop(pending);
                let stale_id = payment_id.clone();
                tokio::spawn(async move {
                    if let Err(e) = gateway.cancel_payment_request(&stale_id).await {
                        tracing::warn!(payment_id = %stale_id, error = %e, "failed to cancel stale payment request");
                    }
                });
                return Err(RejectReason::PaymentProvider("reservation expired".to_string()).into());
            };
            entry.state = transition(state, ReservationEvent::PaymentRequested);
            entry.set_timer(timer.abort_handle());
        }

        tracing::info!(
            booking_id = %booking.id,
            payment_id = %payment_id,
            amount = request.amount,
            state = ReservationState::PendingPayment.as_str(),
            "payment requested"
        );

        Ok(PaymentStarted {
            payment_request_token: handle.payment_request_token,
            qr_code: handle.qr_code,
            booking_id: booking.id,
        })
    }

    fn expire(&self, payment_id: &str) {
        let mut pending = self.pending();
        let now = Instant::now();
        let expired = pending
            .get_mut(payment_id)
            .map(|e| e.is_expired(now))
            .unwrap_or(false);
        if !expired {
            return;
        }
        if let Some(entry) = pending.remove(payment_id) {
            let state = transition(entry.state, ReservationEvent::TimedOut);
            tracing::info!(
                booking_id = %entry.booking.id,
                payment_id = %payment_id,
                state = state.as_str(),
                "payment window elapsed, reservation released"
            );
        }
    }

    /// Applies a provider status to a pending reservation. Returns the
    /// terminal state reached, or `None` if nothing changed (unknown id, late
    /// signal, or payment still in progress).
    pub async fn settle_payment(
        &self,
        payment_id: &str,
        status: PaymentStatus,
    ) -> Result<Option<ReservationState>, AppError> {
        if status == PaymentStatus::Created {
            return Ok(None);
        }

        if status.is_final_failure() {
            let Some(mut entry) = self.pending().take_live(payment_id, Instant::now()) else {
                tracing::info!(payment_id = %payment_id, ?status, "no pending reservation for payment signal");
                return Ok(None);
            };
            entry.disarm();

            let state = transition(entry.state, ReservationEvent::PaymentDeclined);
            tracing::info!(
                booking_id = %entry.booking.id,
                payment_id = %payment_id,
                ?status,
                state = state.as_str(),
                "payment not completed, reservation discarded"
            );
            return Ok(Some(state));
        }

        let settling = self
            .pending()
            .begin_settle(payment_id, Instant::now())
            .map(|e| (e.booking.clone(), e.range, e.state.clone()));
        let Some((booking, range, state)) = settling else {
            tracing::info!(payment_id = %payment_id, ?status, "no pending reservation for payment signal");
            return Ok(None);
        };

        // the entry holds its range until the commit is done
        let outcome = self.commit_paid(payment_id, &booking, range, state).await;
        self.pending().remove(payment_id);

        if let Ok(ReservationState::Confirmed) = outcome {
            self.notifier.booking_confirmed(&booking);
        }
        outcome.map(Some)
    }

    async fn commit_paid(
        &self,
        payment_id: &str,
        booking: &Booking,
        range: DateRange,
        state: ReservationState,
    ) -> Result<ReservationState, AppError> {
        // time has passed since validation: re-check under the store lock
        let mut txn = self.store.transaction().await?;
        let still_free = !txn.is_occupied(&range);
        let state = transition(state, ReservationEvent::PaymentConfirmed { still_free });

        if state != ReservationState::Confirmed {
            tracing::warn!(
                booking_id = %booking.id,
                payment_id = %payment_id,
                state = state.as_str(),
                "paid reservation collides with a newer entry, not stored"
            );
            return Ok(state);
        }

        txn.insert(Entry::Booking(booking.clone()));
        if let Err(e) = txn.commit().await {
            tracing::error!(
                booking_id = %booking.id,
                payment_id = %payment_id,
                error = %e,
                "payment received but booking could not be stored"
            );
            return Err(e.into());
        }

        tracing::info!(booking_id = %booking.id, payment_id = %payment_id, state = state.as_str(), "booking confirmed");
        Ok(state)
    }

    /// `id` may be a booking id or a payment id. A live reservation is polled
    /// at the provider and committed if it reports the payment as paid.
    pub async fn payment_status(&self, id: &str) -> PaymentProgress {
        if self.store.load().await.find_booking(id).is_some() {
            return PaymentProgress::Paid;
        }

        let Some(payment_id) = self.pending().resolve(id, Instant::now()) else {
            return PaymentProgress::Pending;
        };
        let Some(gateway) = &self.payments else {
            return PaymentProgress::Pending;
        };

        let status = match gateway.payment_status(&payment_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(payment_id = %payment_id, error = %e, "failed to poll payment status");
                return PaymentProgress::Pending;
            }
        };

        match self.settle_payment(&payment_id, status).await {
            Ok(Some(ReservationState::Confirmed)) => PaymentProgress::Paid,
            _ => PaymentProgress::Pending,
        }
    }

    /// Aborts a reservation awaiting payment. Returns false if nothing was
    /// pending under `id`.
    pub fn cancel(&self, id: &str) -> bool {
        let entry = {
            let mut pending = self.pending();
            let now = Instant::now();
            pending
                .resolve(id, now)
                .and_then(|payment_id| pending.take_live(&payment_id, now))
        };
        let Some(mut entry) = entry else {
            return false;
        };
        entry.disarm();

        let was_requested = entry.state == ReservationState::PendingPayment;
        let state = transition(entry.state, ReservationEvent::CancelRequested);
        tracing::info!(
            booking_id = %entry.booking.id,
            payment_id = %entry.payment_id,
            state = state.as_str(),
            "reservation cancelled"
        );

        if let (true, Some(gateway)) = (was_requested, self.payments.clone()) {
            let payment_id = entry.payment_id;
            tokio::spawn(async move {
                if let Err(e) = gateway.cancel_payment_request(&payment_id).await {
                    tracing::warn!(payment_id = %payment_id, error = %e, "failed to cancel payment request");
                }
            });
        }

        true
    }

    /// Admin block. Blocks may lie in the past; only the overlap rule applies.
    pub async fn place_block(
        &self,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> Result<Block, AppError> {
        let (Some(start), Some(end)) = (start_date, end_date) else {
            return Err(AppError::InvalidInput("startDate and endDate are required".to_string()));
        };
        let range = DateRange::parse(&start, &end)?;

        let mut txn = self.store.transaction().await?;
        if txn.is_occupied(&range) {
            return Err(RejectReason::RangeUnavailable.into());
        }

        let block = Block {
            id: self.store.next_id(),
            start_date: range.start(),
            end_date: range.end(),
        };
        txn.insert(Entry::Block(block.clone()));
        txn.commit().await?;

        tracing::info!(block_id = %block.id, start = %block.start_date, end = %block.end_date, "block placed");
        Ok(block)
    }
}
