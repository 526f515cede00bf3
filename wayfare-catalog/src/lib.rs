pub mod offering;
pub mod seatmap;
pub mod fare;

pub use offering::{CatalogRecord, CatalogSource, InMemoryCatalog, Offering};
pub use seatmap::{SeatError, SeatMap, SeatMapView, SeatRowView, SeatStatus, SeatToggle, SeatView};
pub use fare::{base_amount, FareBreakdown, FareConfig};
