use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wayfare_catalog::{
    FareBreakdown, FareConfig, Offering, SeatError, SeatMap, SeatMapView, SeatToggle,
};
use wayfare_core::payment::{PaymentConfirmation, PaymentIntent, PaymentStatus};
use wayfare_core::{CoreError, SearchQuery, SortKey};
use wayfare_offer::{SearchOutcome, SearchSession, SearchTicket};

use crate::draft::{BookingDraft, DraftError, DraftStatus};
use crate::guard::{Redirect, Step};
use crate::issuance::{IssuanceError, TicketIssuer, TicketView};
use crate::ledger::{BookingLedger, LedgerError};
use crate::models::{Booking, BookingPatch, Passenger, PassengerUpdate};
use crate::orchestrator::PaymentTicket;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Seats on every generated map, whatever the offering.
    pub seat_capacity: u32,
    pub prebooked_ratio: f64,
    /// Fixes seat maps and reference codes for reproducible runs.
    pub seed: Option<u64>,
    pub fare: FareConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seat_capacity: 120,
            prebooked_ratio: 0.3,
            seed: None,
            fare: FareConfig::default(),
        }
    }
}

/// All state for one user's booking session: the current search, at most
/// one draft with its seat map, and the ledger of finished bookings.
///
/// Every operation is synchronous. The two slow steps (catalog read and
/// payment) are split into begin/complete pairs so callers can run them
/// without holding the session.
pub struct BookingSession {
    options: SessionOptions,
    search: SearchSession,
    draft: Option<BookingDraft>,
    seat_map: Option<SeatMap>,
    ledger: BookingLedger,
    issuer: TicketIssuer,
    rng: StdRng,
}

impl Default for BookingSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl BookingSession {
    pub fn new(options: SessionOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let issuer = TicketIssuer::new(options.seed.map(|s| s.wrapping_add(1)));
        Self {
            options,
            search: SearchSession::new(),
            draft: None,
            seat_map: None,
            ledger: BookingLedger::new(),
            issuer,
            rng,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Check that `step` can be shown now.
    pub fn guard(&self, step: Step) -> Result<(), Redirect> {
        match step {
            Step::Search | Step::Bookings => Ok(()),
            Step::Results => match self.search.query() {
                Some(_) => Ok(()),
                None => Err(Redirect::new(Step::Search, "No search has been made")),
            },
            Step::Passengers => match &self.draft {
                Some(_) => Ok(()),
                None => Err(Redirect::new(Step::Search, "No booking in progress")),
            },
            Step::Seats => match &self.draft {
                Some(d) if d.status() != DraftStatus::OfferingSelected => Ok(()),
                Some(_) => Err(Redirect::new(Step::Search, "Passenger details are missing")),
                None => Err(Redirect::new(Step::Search, "No booking in progress")),
            },
            Step::Payment => match &self.draft {
                Some(d) if matches!(d.status(), DraftStatus::SeatsAttached | DraftStatus::PaymentPending) => Ok(()),
                Some(_) => Err(Redirect::new(Step::Search, "Seats have not been selected")),
                None => Err(Redirect::new(Step::Search, "No booking in progress")),
            },
            Step::Ticket(ref id) => {
                if self.ledger.contains_id(id) {
                    Ok(())
                } else {
                    Err(Redirect::new(Step::Bookings, format!("Booking {} not found", id)))
                }
            }
        }
    }

    // -- search --

    /// Start a search. The returned ticket supersedes any search in flight.
    pub fn begin_search(&mut self, query: SearchQuery, today: NaiveDate) -> Result<SearchTicket, SessionError> {
        Ok(self.search.begin(query, today)?)
    }

    /// Apply a finished catalog read. `false` if a newer search started.
    pub fn complete_search(&mut self, ticket: &SearchTicket, result: Result<Vec<Offering>, CoreError>) -> bool {
        self.search.complete(ticket, result)
    }

    pub fn search_query(&self) -> Option<&SearchQuery> {
        self.search.query()
    }

    pub fn search_outcome(&self) -> &SearchOutcome {
        self.search.outcome()
    }

    pub fn results(&self, key: SortKey) -> Result<Vec<Offering>, SessionError> {
        self.guard(Step::Results)?;
        Ok(self.search.results(key))
    }

    // -- draft --

    pub fn draft(&self) -> Option<&BookingDraft> {
        self.draft.as_ref()
    }

    /// Start a draft from one of the current results. Replaces any draft not
    /// yet in payment.
    pub fn select_offering(&mut self, offering_id: &str) -> Result<&BookingDraft, SessionError> {
        self.guard(Step::Results)?;
        self.ensure_not_paying()?;

        let date = self
            .search
            .query()
            .and_then(|q| q.date)
            .ok_or_else(|| CoreError::validation("Please fill in all fields"))?;
        let offering = self.search.find(offering_id)?;

        self.seat_map = None;
        Ok(&*self.draft.insert(BookingDraft::new(offering, date)))
    }

    pub fn add_passenger(&mut self) -> Result<Passenger, SessionError> {
        let passenger = self.draft_mut()?.add_passenger()?.clone();
        self.seat_map = None;
        Ok(passenger)
    }

    pub fn remove_passenger(&mut self, passenger_id: &str) -> Result<(), SessionError> {
        self.draft_mut()?.remove_passenger(passenger_id)?;
        self.seat_map = None;
        Ok(())
    }

    pub fn update_passenger(&mut self, passenger_id: &str, update: PassengerUpdate) -> Result<(), SessionError> {
        self.draft_mut()?.update_passenger(passenger_id, update)?;
        self.seat_map = None;
        Ok(())
    }

    pub fn set_contact(&mut self, email: Option<String>, phone: Option<String>) -> Result<(), SessionError> {
        self.draft_mut()?.set_contact(email, phone)?;
        Ok(())
    }

    /// Validate the passenger list, optionally replacing it first.
    pub fn attach_passengers(&mut self, passengers: Option<Vec<Passenger>>) -> Result<&BookingDraft, SessionError> {
        self.draft_mut()?.attach_passengers(passengers)?;
        self.seat_map = None;
        Ok(self.draft.as_ref().ok_or_else(no_draft)?)
    }

    /// `price x passengers` for the draft, shown while passengers are entered.
    pub fn running_total(&self) -> Option<f64> {
        self.draft.as_ref().map(BookingDraft::total_amount)
    }

    /// Drop the draft. Not allowed while its payment is running.
    pub fn reset_draft(&mut self) -> Result<(), SessionError> {
        self.ensure_not_paying()?;
        if let Some(draft) = self.draft.take() {
            info!("Draft {} discarded", draft.reference());
        }
        self.seat_map = None;
        Ok(())
    }

    // -- seats --

    /// The seat map for the draft, generated on first use and kept until the
    /// passenger list changes.
    pub fn open_seat_map(&mut self) -> Result<SeatMapView, SessionError> {
        self.guard(Step::Seats)?;
        let required = self.draft.as_ref().map(|d| d.passengers().len()).unwrap_or(0);

        let map = match self.seat_map.take() {
            Some(map) if map.required() == required => map,
            _ => SeatMap::generate(
                self.options.seat_capacity,
                required,
                self.options.prebooked_ratio,
                &mut self.rng,
            )?,
        };
        let view = map.view();
        self.seat_map = Some(map);
        Ok(view)
    }

    pub fn seat_map(&self) -> Option<&SeatMap> {
        self.seat_map.as_ref()
    }

    pub fn toggle_seat(&mut self, seat: &str) -> Result<SeatToggle, SessionError> {
        self.guard(Step::Seats)?;
        self.ensure_not_paying()?;
        let map = self.seat_map.as_mut().ok_or_else(|| Redirect::new(Step::Seats, "Seat map is not open"))?;
        let toggled = map.toggle(seat)?;
        // A confirmed selection no longer matches the map
        if let Some(draft) = self.draft.as_mut() {
            draft.detach_seats();
        }
        Ok(toggled)
    }

    /// Attach the selected seats to the draft.
    pub fn confirm_seats(&mut self) -> Result<&BookingDraft, SessionError> {
        self.guard(Step::Seats)?;
        let map = self.seat_map.as_ref().ok_or_else(|| Redirect::new(Step::Seats, "Seat map is not open"))?;
        let seats = map.confirm()?;

        let draft = self.draft.as_mut().ok_or_else(no_draft)?;
        draft.attach_seats(seats, map)?;
        Ok(&*draft)
    }

    // -- payment --

    /// What the payment screen charges.
    pub fn payment_summary(&self) -> Result<FareBreakdown, SessionError> {
        self.guard(Step::Payment)?;
        let draft = self.draft.as_ref().ok_or_else(no_draft)?;
        Ok(FareBreakdown::new(draft.trip().price, draft.passengers().len(), &self.options.fare))
    }

    /// Lock the draft and hand out the payment to run. Only one payment may
    /// be outstanding.
    pub fn begin_payment(&mut self) -> Result<PaymentTicket, SessionError> {
        let fare = self.payment_summary()?;
        let draft = self.draft.as_mut().ok_or_else(no_draft)?;
        draft.lock_for_payment()?;

        let intent = PaymentIntent {
            id: format!("pi_{}", Uuid::new_v4().simple()),
            draft_reference: draft.reference().to_string(),
            amount: fare.total,
            currency: fare.currency,
            status: PaymentStatus::Processing,
            created_at: Utc::now(),
        };
        info!("Payment {} started for draft {}", intent.id, draft.reference());
        Ok(PaymentTicket {
            draft_reference: draft.reference(),
            intent,
            cancel: CancellationToken::new(),
        })
    }

    /// Finalize the paid draft into a booking. The draft is gone afterwards.
    pub fn complete_payment(
        &mut self,
        ticket: &PaymentTicket,
        confirmation: PaymentConfirmation,
    ) -> Result<Booking, SessionError> {
        if ticket.is_cancelled() {
            return Err(CoreError::validation("Payment was cancelled").into());
        }
        let draft = pending_draft(self.draft.as_ref(), ticket)?;
        let booking = self.issuer.issue(draft, &confirmation, &mut self.ledger)?;

        self.draft = None;
        self.seat_map = None;
        Ok(booking)
    }

    /// Cancellation hook: stop the payment and unlock the draft.
    pub fn abort_payment(&mut self, ticket: &PaymentTicket) {
        ticket.cancel();
        match self.draft.as_mut() {
            Some(draft) if draft.reference() == ticket.draft_reference => {
                draft.unlock();
                warn!("Payment {} aborted, draft {} unlocked", ticket.intent.id, ticket.draft_reference);
            }
            _ => debug!("Payment {} aborted with no matching draft", ticket.intent.id),
        }
    }

    // -- ledger --

    pub fn ledger(&self) -> &BookingLedger {
        &self.ledger
    }

    /// Newest first.
    pub fn bookings(&self) -> Vec<Booking> {
        self.ledger.snapshot()
    }

    pub fn lookup(&self, booking_id: &str) -> Result<&Booking, SessionError> {
        Ok(self.ledger.lookup(booking_id)?)
    }

    pub fn cancel_booking(&mut self, booking_id: &str) -> Result<Booking, SessionError> {
        Ok(self.ledger.cancel(booking_id)?.clone())
    }

    pub fn update_booking(&mut self, booking_id: &str, patch: BookingPatch) -> Result<Booking, SessionError> {
        Ok(self.ledger.update(booking_id, patch)?.clone())
    }

    pub fn ticket(&self, booking_id: &str) -> Result<TicketView, SessionError> {
        self.guard(Step::Ticket(booking_id.to_string()))?;
        let booking = self.ledger.lookup(booking_id)?;
        Ok(TicketView::new(booking, &self.options.fare)?)
    }

    fn draft_mut(&mut self) -> Result<&mut BookingDraft, SessionError> {
        self.guard(Step::Passengers)?;
        self.draft.as_mut().ok_or_else(|| no_draft().into())
    }

    fn ensure_not_paying(&self) -> Result<(), SessionError> {
        match &self.draft {
            Some(d) if d.is_locked() => Err(SessionError::PaymentInProgress),
            _ => Ok(()),
        }
    }
}

fn no_draft() -> Redirect {
    Redirect::new(Step::Search, "No booking in progress")
}

/// The locked draft `ticket` was issued for.
fn pending_draft<'a>(draft: Option<&'a BookingDraft>, ticket: &PaymentTicket) -> Result<&'a BookingDraft, SessionError> {
    match draft {
        Some(d) if d.reference() == ticket.draft_reference && d.is_locked() => Ok(d),
        Some(d) if d.reference() == ticket.draft_reference => {
            Err(CoreError::validation("No payment is pending for this booking").into())
        }
        _ => Err(no_draft().into()),
    }
}

/// Failure of a session operation: either the step is not reachable right
/// now, or the operation itself was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Redirect(#[from] Redirect),

    #[error("A payment is already in progress for this booking")]
    PaymentInProgress,

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<DraftError> for SessionError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::PaymentInProgress => SessionError::PaymentInProgress,
            other => SessionError::Core(other.into()),
        }
    }
}

impl From<SeatError> for SessionError {
    fn from(err: SeatError) -> Self {
        SessionError::Core(err.into())
    }
}

impl From<LedgerError> for SessionError {
    fn from(err: LedgerError) -> Self {
        SessionError::Core(err.into())
    }
}

impl From<IssuanceError> for SessionError {
    fn from(err: IssuanceError) -> Self {
        SessionError::Core(err.into())
    }
}

impl From<SessionError> for CoreError {
    fn from(err: SessionError) -> Self {
        let message = err.to_string();
        match err {
            SessionError::Core(inner) => inner,
            SessionError::Redirect(_) => CoreError::NotFound(message),
            SessionError::PaymentInProgress => CoreError::Validation(message),
        }
    }
}
