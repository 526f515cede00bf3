use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;
use wayfare_core::payment::{PaymentAdapter, PaymentConfirmation, PaymentError, PaymentIntent};

/// One outstanding payment, handed out when a draft is locked.
#[derive(Debug, Clone)]
pub struct PaymentTicket {
    pub draft_reference: Uuid,
    pub intent: PaymentIntent,
    pub cancel: CancellationToken,
}

impl PaymentTicket {
    /// Stop the payment if it has not settled yet.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

pub struct PaymentOrchestrator {
    adapter: Arc<dyn PaymentAdapter>,
}

impl PaymentOrchestrator {
    pub fn new(adapter: Arc<dyn PaymentAdapter>) -> Self {
        Self { adapter }
    }

    /// Run the charge for `ticket` to completion or cancellation.
    pub async fn settle(&self, ticket: &PaymentTicket) -> Result<PaymentConfirmation, PaymentError> {
        info!(
            "Processing payment {} for draft {} ({:.2} {})",
            ticket.intent.id, ticket.draft_reference, ticket.intent.amount, ticket.intent.currency
        );
        let result = self.adapter.confirm(&ticket.intent, ticket.cancel.clone()).await;
        if let Err(e) = &result {
            warn!("Payment {} did not complete: {}", ticket.intent.id, e);
        }
        result
    }
}

/// Always succeeds after a fixed delay unless cancelled first.
pub struct SimulatedPaymentAdapter {
    delay: Duration,
}

impl SimulatedPaymentAdapter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedPaymentAdapter {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[async_trait::async_trait]
impl PaymentAdapter for SimulatedPaymentAdapter {
    async fn confirm(
        &self,
        intent: &PaymentIntent,
        cancel: CancellationToken,
    ) -> Result<PaymentConfirmation, PaymentError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(PaymentError::Cancelled(intent.id.clone())),
            _ = tokio::time::sleep(self.delay) => Ok(PaymentConfirmation {
                token: format!("sim_{}", Uuid::new_v4().simple()),
                intent_id: intent.id.clone(),
                amount: intent.amount,
                confirmed_at: Utc::now(),
            }),
        }
    }
}
