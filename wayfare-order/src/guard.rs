use serde::Serialize;
use std::fmt;

/// The screens of the booking flow, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", content = "booking_id", rename_all = "snake_case")]
pub enum Step {
    Search,
    Results,
    Passengers,
    Seats,
    Payment,
    Ticket(String),
    Bookings,
}

impl Step {
    pub fn path(&self) -> String {
        match self {
            Step::Search => "/".to_string(),
            Step::Results => "/search-results".to_string(),
            Step::Passengers => "/booking".to_string(),
            Step::Seats => "/seat-selection".to_string(),
            Step::Payment => "/payment".to_string(),
            Step::Ticket(id) => format!("/e-ticket/{}", id),
            Step::Bookings => "/my-bookings".to_string(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// A step was entered without what it needs; go to `to` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{reason}, redirecting to {to}")]
pub struct Redirect {
    pub to: Step,
    pub reason: String,
}

impl Redirect {
    pub fn new(to: Step, reason: impl Into<String>) -> Self {
        Self { to, reason: reason.into() }
    }

    pub fn location(&self) -> String {
        self.to.path()
    }
}
