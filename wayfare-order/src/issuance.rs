use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;
use wayfare_catalog::{FareBreakdown, FareConfig};
use wayfare_core::payment::PaymentConfirmation;
use wayfare_core::CoreError;

use crate::draft::{BookingDraft, DraftStatus};
use crate::ledger::{BookingLedger, LedgerError};
use crate::models::{Booking, BookingStatus};

const PNR_PREFIX: &str = "PNR";
const PNR_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const PNR_SUFFIX_LEN: usize = 9;

/// Turns a paid draft into a ledger booking.
pub struct TicketIssuer {
    rng: StdRng,
}

impl TicketIssuer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Build a confirmed booking from `draft` and append it to `ledger`.
    ///
    /// The draft must have its seats attached. Id and reference code are
    /// regenerated until neither collides with the ledger.
    pub fn issue(
        &mut self,
        draft: &BookingDraft,
        confirmation: &PaymentConfirmation,
        ledger: &mut BookingLedger,
    ) -> Result<Booking, IssuanceError> {
        if !matches!(draft.status(), DraftStatus::SeatsAttached | DraftStatus::PaymentPending) {
            return Err(IssuanceError::InvalidDraft(format!("{:?}", draft.status())));
        }
        if draft.seats().len() != draft.passengers().len() {
            return Err(IssuanceError::InvalidDraft("seats do not match passengers".to_string()));
        }

        let booked_at = Utc::now();
        let mut millis = booked_at.timestamp_millis();
        let mut id = format!("BK{}", millis);
        while ledger.contains_id(&id) {
            millis += 1;
            id = format!("BK{}", millis);
        }

        let mut pnr = self.generate_pnr();
        while ledger.contains_pnr(&pnr) {
            pnr = self.generate_pnr();
        }

        let booking = Booking {
            id,
            pnr,
            trip: draft.trip().clone(),
            passengers: draft.passengers().to_vec(),
            seats: draft.seats().to_vec(),
            total_amount: draft.total_amount(),
            booked_at,
            status: BookingStatus::Confirmed,
        };
        ledger.add(booking.clone())?;

        info!(
            "Issued booking {} ({}) for draft {}, payment {}",
            booking.id,
            booking.pnr,
            draft.reference(),
            confirmation.token
        );
        Ok(booking)
    }

    fn generate_pnr(&mut self) -> String {
        let suffix: String = (0..PNR_SUFFIX_LEN)
            .map(|_| PNR_CHARSET[self.rng.gen_range(0..PNR_CHARSET.len())] as char)
            .collect();
        format!("{}{}", PNR_PREFIX, suffix)
    }
}

impl Default for TicketIssuer {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TravellerLine {
    pub name: String,
    pub age: u32,
    pub seat: String,
}

/// What the e-ticket screen shows for one booking.
#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    pub booking: Booking,
    pub fare: FareBreakdown,
    pub travellers: Vec<TravellerLine>,
    /// Encoded into the boarding QR code.
    pub qr_payload: String,
}

impl TicketView {
    pub fn new(booking: &Booking, fare: &FareConfig) -> Result<Self, IssuanceError> {
        if booking.is_cancelled() {
            return Err(IssuanceError::TicketCancelled(booking.id.clone()));
        }

        let travellers = booking
            .seat_assignments()
            .map(|(passenger, seat)| TravellerLine {
                name: passenger.name.clone(),
                age: passenger.age,
                seat: seat.to_string(),
            })
            .collect();
        let qr_payload = serde_json::json!({
            "pnr": booking.pnr,
            "from": booking.trip.from_code,
            "to": booking.trip.to_code,
            "date": booking.trip.date,
        })
        .to_string();

        Ok(Self {
            booking: booking.clone(),
            fare: FareBreakdown::new(booking.trip.price, booking.passengers.len(), fare),
            travellers,
            qr_payload,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssuanceError {
    #[error("Draft is not ready for ticketing: {0}")]
    InvalidDraft(String),

    #[error("Booking {0} is cancelled, its ticket is no longer valid")]
    TicketCancelled(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<IssuanceError> for CoreError {
    fn from(err: IssuanceError) -> Self {
        match err {
            IssuanceError::Ledger(inner) => inner.into(),
            other => CoreError::Validation(other.to_string()),
        }
    }
}
