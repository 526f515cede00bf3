use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;
use wayfare_catalog::{base_amount, Offering, SeatMap};
use wayfare_core::CoreError;
use wayfare_shared::Masked;

use crate::models::{Passenger, PassengerUpdate, TripDetails};

/// Where a draft is in the booking flow.
///
/// "Empty" is the absence of a draft and "Finalized" is the draft turning
/// into a ledger booking, so neither is a variant here.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    OfferingSelected,
    PassengersAttached,
    SeatsAttached,
    /// Locked while the payment runs.
    PaymentPending,
}

/// The in-progress booking.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDraft {
    reference: Uuid,
    trip: TripDetails,
    passengers: Vec<Passenger>,
    seats: Vec<String>,
    status: DraftStatus,
    created_at: DateTime<Utc>,
}

impl BookingDraft {
    /// Empty -> OfferingSelected. Starts with one blank passenger row.
    pub fn new(offering: &Offering, date: NaiveDate) -> Self {
        let draft = Self {
            reference: Uuid::new_v4(),
            trip: TripDetails::from_offering(offering, date),
            passengers: vec![Passenger::blank()],
            seats: Vec::new(),
            status: DraftStatus::OfferingSelected,
            created_at: Utc::now(),
        };
        info!(
            "Draft {} created for {} {} on {}",
            draft.reference, draft.trip.carrier, draft.trip.service_number, date
        );
        draft
    }

    pub fn reference(&self) -> Uuid {
        self.reference
    }

    pub fn trip(&self) -> &TripDetails {
        &self.trip
    }

    pub fn passengers(&self) -> &[Passenger] {
        &self.passengers
    }

    pub fn seats(&self) -> &[String] {
        &self.seats
    }

    pub fn status(&self) -> DraftStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_locked(&self) -> bool {
        self.status == DraftStatus::PaymentPending
    }

    /// Stored amount a booking from this draft will carry.
    pub fn total_amount(&self) -> f64 {
        base_amount(self.trip.price, self.passengers.len())
    }

    pub fn add_passenger(&mut self) -> Result<&Passenger, DraftError> {
        self.begin_edit()?;
        self.passengers.push(Passenger::blank());
        Ok(&self.passengers[self.passengers.len() - 1])
    }

    /// Rejected when it would leave the draft without passengers.
    pub fn remove_passenger(&mut self, passenger_id: &str) -> Result<(), DraftError> {
        self.ensure_unlocked()?;
        let pos = self.position(passenger_id)?;
        if self.passengers.len() == 1 {
            return Err(DraftError::PassengerFloor);
        }
        self.begin_edit()?;
        let mut removed = self.passengers.remove(pos);
        // Contact details belong to whoever is first now
        if pos == 0 {
            if let Some(first) = self.passengers.first_mut() {
                first.email = removed.email.take();
                first.phone = removed.phone.take();
            }
        }
        Ok(())
    }

    pub fn update_passenger(&mut self, passenger_id: &str, update: PassengerUpdate) -> Result<(), DraftError> {
        self.ensure_unlocked()?;
        let pos = self.position(passenger_id)?;
        self.begin_edit()?;
        update.apply(&mut self.passengers[pos]);
        Ok(())
    }

    pub fn set_contact(&mut self, email: Option<String>, phone: Option<String>) -> Result<(), DraftError> {
        self.ensure_unlocked()?;
        let first = self.passengers.first_mut().ok_or(DraftError::PassengerFloor)?;
        first.email = email.filter(|e| !e.trim().is_empty()).map(Masked::new);
        first.phone = phone.filter(|p| !p.trim().is_empty()).map(Masked::new);
        debug!("Contact set for draft {}: {:?} {:?}", self.reference, first.email, first.phone);
        Ok(())
    }

    /// OfferingSelected -> PassengersAttached.
    ///
    /// With `Some`, the given list replaces the form rows first. Every
    /// passenger needs a name and an age in range; contact fields are kept on
    /// the first passenger only. Re-attaching from a later state drops the
    /// chosen seats.
    pub fn attach_passengers(&mut self, passengers: Option<Vec<Passenger>>) -> Result<(), DraftError> {
        self.ensure_unlocked()?;

        let mut candidate = passengers.unwrap_or_else(|| self.passengers.clone());
        if candidate.is_empty() {
            return Err(DraftError::PassengerFloor);
        }
        if candidate.iter().any(|p| !p.is_complete()) {
            return Err(DraftError::IncompletePassenger);
        }
        let mut ids = HashSet::new();
        for p in &candidate {
            if !ids.insert(p.id.as_str()) {
                return Err(DraftError::DuplicatePassenger(p.id.clone()));
            }
        }
        for p in candidate.iter_mut().skip(1) {
            p.clear_contact();
        }

        self.passengers = candidate;
        self.seats.clear();
        self.status = DraftStatus::PassengersAttached;
        info!("Draft {}: {} passenger(s) attached", self.reference, self.passengers.len());
        Ok(())
    }

    /// PassengersAttached -> SeatsAttached.
    ///
    /// Needs exactly one seat per passenger, no repeats, none booked on `map`.
    /// Leaves the draft unchanged on failure.
    pub fn attach_seats(&mut self, seats: Vec<String>, map: &SeatMap) -> Result<(), DraftError> {
        self.ensure_unlocked()?;
        if !matches!(self.status, DraftStatus::PassengersAttached | DraftStatus::SeatsAttached) {
            return Err(DraftError::InvalidTransition {
                from: self.status,
                to: DraftStatus::SeatsAttached,
            });
        }
        if seats.len() != self.passengers.len() {
            return Err(DraftError::SeatCountMismatch {
                expected: self.passengers.len(),
                selected: seats.len(),
            });
        }
        let mut seen = HashSet::new();
        for seat in &seats {
            if !seen.insert(seat.as_str()) {
                return Err(DraftError::DuplicateSeat(seat.clone()));
            }
            if map.status(seat).is_none() {
                return Err(DraftError::UnknownSeat(seat.clone()));
            }
            if map.is_booked(seat) {
                return Err(DraftError::SeatConflict(seat.clone()));
            }
        }

        info!("Draft {}: seats {:?} attached", self.reference, seats);
        self.seats = seats;
        self.status = DraftStatus::SeatsAttached;
        Ok(())
    }

    /// SeatsAttached -> PassengersAttached, when the seat selection changes
    /// after it was confirmed. No-op in any other status.
    pub fn detach_seats(&mut self) {
        if self.status == DraftStatus::SeatsAttached {
            info!("Draft {}: seat selection changed, seats detached", self.reference);
            self.seats.clear();
            self.status = DraftStatus::PassengersAttached;
        }
    }

    /// SeatsAttached -> PaymentPending.
    pub fn lock_for_payment(&mut self) -> Result<(), DraftError> {
        match self.status {
            DraftStatus::SeatsAttached => {
                self.status = DraftStatus::PaymentPending;
                Ok(())
            }
            DraftStatus::PaymentPending => Err(DraftError::PaymentInProgress),
            from => Err(DraftError::InvalidTransition {
                from,
                to: DraftStatus::PaymentPending,
            }),
        }
    }

    /// PaymentPending -> SeatsAttached, after an aborted payment.
    pub fn unlock(&mut self) {
        if self.status == DraftStatus::PaymentPending {
            self.status = DraftStatus::SeatsAttached;
        }
    }

    fn ensure_unlocked(&self) -> Result<(), DraftError> {
        if self.is_locked() {
            return Err(DraftError::PaymentInProgress);
        }
        Ok(())
    }

    /// Editing the passenger list sends the draft back to OfferingSelected.
    fn begin_edit(&mut self) -> Result<(), DraftError> {
        self.ensure_unlocked()?;
        if self.status != DraftStatus::OfferingSelected {
            debug!("Draft {}: passengers edited, seats dropped", self.reference);
            self.status = DraftStatus::OfferingSelected;
            self.seats.clear();
        }
        Ok(())
    }

    fn position(&self, passenger_id: &str) -> Result<usize, DraftError> {
        self.passengers
            .iter()
            .position(|p| p.id == passenger_id)
            .ok_or_else(|| DraftError::UnknownPassenger(passenger_id.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("At least one passenger is required")]
    PassengerFloor,

    #[error("Please fill in all passenger details")]
    IncompletePassenger,

    #[error("Passenger {0} is listed twice")]
    DuplicatePassenger(String),

    #[error("Passenger {0} not found")]
    UnknownPassenger(String),

    #[error("Please select exactly {expected} seat(s), {selected} given")]
    SeatCountMismatch { expected: usize, selected: usize },

    #[error("Seat {0} is chosen twice")]
    DuplicateSeat(String),

    #[error("Seat {0} does not exist on this map")]
    UnknownSeat(String),

    #[error("Seat {0} is already booked")]
    SeatConflict(String),

    #[error("Invalid draft transition from {from:?} to {to:?}")]
    InvalidTransition { from: DraftStatus, to: DraftStatus },

    #[error("A payment is already in progress for this booking")]
    PaymentInProgress,
}

impl From<DraftError> for CoreError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::UnknownPassenger(_) | DraftError::UnknownSeat(_) => CoreError::NotFound(err.to_string()),
            _ => CoreError::Validation(err.to_string()),
        }
    }
}
