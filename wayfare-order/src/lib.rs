pub mod models;
pub mod draft;
pub mod ledger;
pub mod issuance;
pub mod orchestrator;
pub mod guard;
pub mod session;

pub use models::{Booking, BookingPatch, BookingStatus, Gender, Passenger, PassengerUpdate, TripDetails};
pub use draft::{BookingDraft, DraftError, DraftStatus};
pub use ledger::{BookingLedger, LedgerError};
pub use issuance::{IssuanceError, TicketIssuer, TicketView, TravellerLine};
pub use orchestrator::{PaymentOrchestrator, PaymentTicket, SimulatedPaymentAdapter};
pub use guard::{Redirect, Step};
pub use session::{BookingSession, SessionError, SessionOptions};
