use super::dates::DateError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("all fields are required: startDate, endDate, name, phone, email")]
    MissingFields,

    #[error("{0}")]
    InvalidDateFormat(String),

    #[error("{0}")]
    InvalidDateRange(String),

    #[error("the selected dates are already taken")]
    RangeUnavailable,

    #[error("the selected dates were booked by someone else before the payment completed")]
    RangeNoLongerAvailable,

    #[error("the payment was declined")]
    PaymentDeclined,

    #[error("could not initiate payment: {0}")]
    PaymentProvider(String),
}

impl From<DateError> for RejectReason {
    fn from(err: DateError) -> Self {
        match err {
            DateError::InvalidDateFormat(_) => RejectReason::InvalidDateFormat(err.to_string()),
            DateError::InvalidDateRange { .. } => RejectReason::InvalidDateRange(err.to_string()),
        }
    }
}

/// Lifecycle of one booking attempt. Paid flow:
/// `Requested -> Validated -> PendingPayment -> Confirmed`; a manual admin
/// booking goes `Requested -> Validated -> Confirmed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationState {
    Requested,
    Validated,
    PendingPayment,
    Confirmed,
    Rejected(RejectReason),
    Expired,
    Cancelled,
}

impl ReservationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Requested => "requested",
            ReservationState::Validated => "validated",
            ReservationState::PendingPayment => "pending_payment",
            ReservationState::Confirmed => "confirmed",
            ReservationState::Rejected(_) => "rejected",
            ReservationState::Expired => "expired",
            ReservationState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationState::Confirmed
                | ReservationState::Rejected(_)
                | ReservationState::Expired
                | ReservationState::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationEvent {
    InputAccepted,
    InputRejected(RejectReason),
    /// Occupancy check failed at validation time.
    SlotTaken,
    /// Admin booking committed straight to the store.
    ManualCommitted,
    PaymentRequested,
    PaymentRequestFailed(String),
    /// Provider reported the payment as paid. `still_free` is the result of
    /// the commit-time occupancy re-check.
    PaymentConfirmed { still_free: bool },
    PaymentDeclined,
    TimedOut,
    CancelRequested,
}

/// Pure transition function. Events that do not apply to `state` leave it
/// unchanged; terminal states absorb everything.
pub fn transition(state: ReservationState, event: ReservationEvent) -> ReservationState {
    use ReservationEvent as E;
    use ReservationState as S;

    if state.is_terminal() {
        return state;
    }

    match (state, event) {
        (S::Requested, E::InputAccepted) => S::Validated,
        (S::Requested, E::InputRejected(reason)) => S::Rejected(reason),

        (S::Validated, E::SlotTaken) => S::Rejected(RejectReason::RangeUnavailable),
        (S::Validated, E::ManualCommitted) => S::Confirmed,
        (S::Validated, E::PaymentRequested) => S::PendingPayment,
        (S::Validated, E::PaymentRequestFailed(msg)) => {
            S::Rejected(RejectReason::PaymentProvider(msg))
        }
        (S::Validated, E::CancelRequested) => S::Cancelled,
        (S::Validated, E::TimedOut) => S::Expired,

        (S::PendingPayment, E::PaymentConfirmed { still_free: true }) => S::Confirmed,
        (S::PendingPayment, E::PaymentConfirmed { still_free: false }) => {
            S::Rejected(RejectReason::RangeNoLongerAvailable)
        }
        (S::PendingPayment, E::PaymentDeclined) => S::Rejected(RejectReason::PaymentDeclined),
        (S::PendingPayment, E::TimedOut) => S::Expired,
        (S::PendingPayment, E::CancelRequested) => S::Cancelled,

        (state, _) => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: Vec<ReservationEvent>) -> ReservationState {
        events
            .into_iter()
            .fold(ReservationState::Requested, transition)
    }

    #[test]
    fn test_paid_flow_confirms() {
        let state = run(vec![
            ReservationEvent::InputAccepted,
            ReservationEvent::PaymentRequested,
            ReservationEvent::PaymentConfirmed { still_free: true },
        ]);
        assert_eq!(state, ReservationState::Confirmed);
    }

    #[test]
    fn test_manual_flow_skips_payment() {
        let state = run(vec![
            ReservationEvent::InputAccepted,
            ReservationEvent::ManualCommitted,
        ]);
        assert_eq!(state, ReservationState::Confirmed);
    }

    #[test]
    fn test_invalid_input_rejects() {
        let state = run(vec![ReservationEvent::InputRejected(RejectReason::MissingFields)]);
        assert_eq!(state, ReservationState::Rejected(RejectReason::MissingFields));
    }

    #[test]
    fn test_occupied_at_validation_rejects() {
        let state = run(vec![ReservationEvent::InputAccepted, ReservationEvent::SlotTaken]);
        assert_eq!(state, ReservationState::Rejected(RejectReason::RangeUnavailable));
    }

    #[test]
    fn test_paid_but_taken_is_rejected() {
        let state = run(vec![
            ReservationEvent::InputAccepted,
            ReservationEvent::PaymentRequested,
            ReservationEvent::PaymentConfirmed { still_free: false },
        ]);
        assert_eq!(
            state,
            ReservationState::Rejected(RejectReason::RangeNoLongerAvailable)
        );
    }

    #[test]
    fn test_timeout_and_cancel() {
        let expired = run(vec![
            ReservationEvent::InputAccepted,
            ReservationEvent::PaymentRequested,
            ReservationEvent::TimedOut,
        ]);
        assert_eq!(expired, ReservationState::Expired);

        let cancelled = run(vec![
            ReservationEvent::InputAccepted,
            ReservationEvent::PaymentRequested,
            ReservationEvent::CancelRequested,
        ]);
        assert_eq!(cancelled, ReservationState::Cancelled);
    }

    #[test]
    fn test_terminal_states_absorb_late_events() {
        // late confirmation after expiry is a no-op
        let state = run(vec![
            ReservationEvent::InputAccepted,
            ReservationEvent::PaymentRequested,
            ReservationEvent::TimedOut,
            ReservationEvent::PaymentConfirmed { still_free: true },
        ]);
        assert_eq!(state, ReservationState::Expired);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_confirmation_before_payment_request_is_ignored() {
        let state = run(vec![
            ReservationEvent::InputAccepted,
            ReservationEvent::PaymentConfirmed { still_free: true },
        ]);
        assert_eq!(state, ReservationState::Validated);
    }

    #[test]
    fn test_provider_failure_rejects() {
        let state = run(vec![
            ReservationEvent::InputAccepted,
            ReservationEvent::PaymentRequestFailed("timeout".to_string()),
        ]);
        assert_eq!(
            state,
            ReservationState::Rejected(RejectReason::PaymentProvider("timeout".to_string()))
        );
    }
}
