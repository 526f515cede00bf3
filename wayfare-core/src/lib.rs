pub mod search;
pub mod payment;

pub use search::{SearchQuery, SortKey, TravelMode};

/// The three failure classes every booking step reports.
///
/// None of them is fatal: the session stays in its previous state and the
/// user can retry or navigate back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Catalog source unavailable: {0}")]
    SourceUnavailable(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
