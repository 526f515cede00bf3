use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use wayfare_catalog::CatalogSource;
use wayfare_core::payment::PaymentAdapter;
use wayfare_offer::SearchEngine;
use wayfare_order::{BookingSession, PaymentOrchestrator};

/// Shared by every handler.
///
/// The session lock is only ever held across synchronous session calls; the
/// catalog read and the payment run without it.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<BookingSession>>,
    pub engine: SearchEngine,
    pub payments: Arc<PaymentOrchestrator>,
    /// Pins "today" for date validation; the system clock otherwise.
    pub today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(
        session: BookingSession,
        catalog: Arc<dyn CatalogSource>,
        payments: Arc<dyn PaymentAdapter>,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            engine: SearchEngine::new(catalog),
            payments: Arc::new(PaymentOrchestrator::new(payments)),
            today: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}
