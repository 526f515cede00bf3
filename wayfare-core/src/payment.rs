use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Processing,
    Succeeded,
    Canceled,
}

/// A charge requested for one booking draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Reference of the draft being paid for.
    pub draft_reference: String,
    /// Amount charged, taxes included.
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Proof of a successful charge, handed to ticket issuance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentConfirmation {
    pub token: String,
    pub intent_id: String,
    pub amount: f64,
    pub confirmed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment cancelled: {0}")]
    Cancelled(String),
    #[error("Payment declined: {0}")]
    Declined(String),
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Charge the intent. Implementations must stop early and return
    /// `PaymentError::Cancelled` once `cancel` fires.
    async fn confirm(
        &self,
        intent: &PaymentIntent,
        cancel: CancellationToken,
    ) -> Result<PaymentConfirmation, PaymentError>;
}
