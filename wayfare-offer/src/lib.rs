pub mod filter;
pub mod ranker;
pub mod engine;

pub use filter::OfferingMatcher;
pub use ranker::sort_offerings;
pub use engine::{SearchEngine, SearchOutcome, SearchSession, SearchTicket};
