pub mod swish;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Our identifier for the payment request; the provider echoes it in
    /// callbacks.
    pub payment_id: String,
    /// Booking id, shown to the payee as the payment reference.
    pub reference: String,
    /// Whole SEK.
    pub amount: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentHandle {
    pub payment_request_token: String,
    pub qr_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Created,
    Paid,
    Declined,
    Error,
    Cancelled,
}

impl PaymentStatus {
    /// Unknown provider statuses count as still in progress.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "PAID" => PaymentStatus::Paid,
            "DECLINED" => PaymentStatus::Declined,
            "ERROR" => PaymentStatus::Error,
            "CANCELLED" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Created,
        }
    }

    pub fn is_final_failure(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Declined | PaymentStatus::Error | PaymentStatus::Cancelled
        )
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_request(&self, request: &PaymentRequest) -> anyhow::Result<PaymentHandle>;

    async fn payment_status(&self, payment_id: &str) -> anyhow::Result<PaymentStatus>;

    async fn cancel_payment_request(&self, payment_id: &str) -> anyhow::Result<()>;
}

/// 32 uppercase hex characters, the instruction id format the provider expects.
pub fn new_payment_id() -> String {
    uuid::Uuid::new_v4().simple().to_string().to_uppercase()
}
