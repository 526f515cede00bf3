use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use wayfare_catalog::base_amount;
use wayfare_core::CoreError;

use crate::models::{Booking, BookingPatch, BookingStatus};

/// Finalized bookings for one session.
///
/// Stored in insertion order; every read-side enumeration is newest-first.
/// Records are never removed, cancellation only flips the status.
#[derive(Debug, Default)]
pub struct BookingLedger {
    bookings: Vec<Booking>,
    index: HashMap<String, usize>,
    pnrs: HashSet<String>,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, booking: Booking) -> Result<(), LedgerError> {
        if self.index.contains_key(&booking.id) {
            return Err(LedgerError::DuplicateId(booking.id));
        }
        if self.pnrs.contains(&booking.pnr) {
            return Err(LedgerError::DuplicatePnr(booking.pnr));
        }
        info!("Booking {} ({}) added to ledger", booking.id, booking.pnr);
        self.index.insert(booking.id.clone(), self.bookings.len());
        self.pnrs.insert(booking.pnr.clone());
        self.bookings.push(booking);
        Ok(())
    }

    pub fn lookup(&self, booking_id: &str) -> Result<&Booking, LedgerError> {
        self.index
            .get(booking_id)
            .map(|&idx| &self.bookings[idx])
            .ok_or_else(|| LedgerError::NotFound(booking_id.to_string()))
    }

    /// Soft cancel. Cancelling twice leaves the booking cancelled.
    pub fn cancel(&mut self, booking_id: &str) -> Result<&Booking, LedgerError> {
        let booking = self.get_mut(booking_id)?;
        if booking.is_cancelled() {
            warn!("Booking {} is already cancelled", booking_id);
        } else {
            booking.status = BookingStatus::Cancelled;
            info!("Booking {} cancelled", booking_id);
        }
        Ok(&*booking)
    }

    /// Apply a partial update. The amount is recomputed as `price x passengers`.
    /// A cancelled booking only accepts another cancel.
    /// On any failure the booking is left as it was.
    pub fn update(&mut self, booking_id: &str, patch: BookingPatch) -> Result<&Booking, LedgerError> {
        let booking = self.get_mut(booking_id)?;

        if booking.is_cancelled() {
            let only_recancel = patch.passengers.is_none()
                && patch.seats.is_none()
                && patch.total_amount.is_none()
                && matches!(patch.status, None | Some(BookingStatus::Cancelled));
            if !only_recancel {
                return Err(LedgerError::InvalidUpdate(format!("booking {} is cancelled", booking_id)));
            }
            return Ok(&*booking);
        }

        let passengers = patch.passengers.as_ref().unwrap_or(&booking.passengers);
        let seats = patch.seats.as_ref().unwrap_or(&booking.seats);
        if passengers.len() != seats.len() {
            return Err(LedgerError::InvalidUpdate(format!(
                "{} passenger(s) but {} seat(s)",
                passengers.len(),
                seats.len()
            )));
        }
        let amount = base_amount(booking.trip.price, passengers.len());
        if let Some(requested) = patch.total_amount {
            if requested != amount {
                return Err(LedgerError::InvalidUpdate(format!(
                    "amount {} does not match {} x {} passenger(s)",
                    requested,
                    booking.trip.price,
                    passengers.len()
                )));
            }
        }

        if let Some(passengers) = patch.passengers {
            booking.passengers = passengers;
        }
        if let Some(seats) = patch.seats {
            booking.seats = seats;
        }
        booking.total_amount = amount;
        if patch.status == Some(BookingStatus::Cancelled) {
            booking.status = BookingStatus::Cancelled;
            info!("Booking {} cancelled", booking_id);
        }
        Ok(&*booking)
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.iter().rev()
    }

    pub fn snapshot(&self) -> Vec<Booking> {
        self.iter().cloned().collect()
    }

    pub fn contains_id(&self, booking_id: &str) -> bool {
        self.index.contains_key(booking_id)
    }

    pub fn contains_pnr(&self, pnr: &str) -> bool {
        self.pnrs.contains(pnr)
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    fn get_mut(&mut self, booking_id: &str) -> Result<&mut Booking, LedgerError> {
        let idx = *self
            .index
            .get(booking_id)
            .ok_or_else(|| LedgerError::NotFound(booking_id.to_string()))?;
        Ok(&mut self.bookings[idx])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Booking id {0} already exists")]
    DuplicateId(String),

    #[error("Reference code {0} already exists")]
    DuplicatePnr(String),

    #[error("Invalid booking update: {0}")]
    InvalidUpdate(String),
}

impl From<LedgerError> for CoreError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) => CoreError::NotFound(err.to_string()),
            _ => CoreError::Validation(err.to_string()),
        }
    }
}
