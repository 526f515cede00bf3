use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use wayfare_core::CoreError;

pub const SEAT_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

/// Derived per seat, never stored.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Selected,
    Booked,
}

/// What a successful click did.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeatToggle {
    Selected,
    Deselected,
}

/// Seat grid for one offering, rows of six (A-F).
///
/// The unavailable set is sampled when the map is generated; a new map for
/// the same offering gets a different set unless the caller reuses the seed.
#[derive(Debug, Clone)]
pub struct SeatMap {
    capacity: u32,
    rows: u32,
    required: usize,
    booked: BTreeSet<String>,
    /// Click order, not sorted.
    selected: Vec<String>,
}

impl SeatMap {
    /// Generate a map for `capacity` seats that must end with exactly
    /// `required` selections. About `prebooked_ratio * capacity` draws are
    /// marked booked; repeated draws collapse into one seat.
    pub fn generate<R: Rng + ?Sized>(
        capacity: u32,
        required: usize,
        prebooked_ratio: f64,
        rng: &mut R,
    ) -> Result<Self, SeatError> {
        let mut map = Self::with_booked(capacity, required, std::iter::empty::<String>())?;

        let draws = (capacity as f64 * prebooked_ratio.clamp(0.0, 1.0)).ceil() as u32;
        for _ in 0..draws {
            let row = rng.gen_range(1..=map.rows);
            let letter = SEAT_LETTERS[rng.gen_range(0..SEAT_LETTERS.len())];
            map.booked.insert(format!("{}{}", row, letter));
        }

        tracing::debug!(
            "Generated seat map: {} rows, {} booked, {} to select",
            map.rows,
            map.booked.len(),
            required
        );
        Ok(map)
    }

    /// Map with an explicit unavailable set.
    pub fn with_booked<I, S>(capacity: u32, required: usize, booked: I) -> Result<Self, SeatError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if capacity == 0 {
            return Err(SeatError::InvalidLayout("capacity must be positive".to_string()));
        }
        if required == 0 || required > capacity as usize {
            return Err(SeatError::InvalidLayout(format!(
                "cannot seat {} passenger(s) in {} seats",
                required, capacity
            )));
        }

        let rows = capacity.div_ceil(SEAT_LETTERS.len() as u32);
        let mut map = Self {
            capacity,
            rows,
            required,
            booked: BTreeSet::new(),
            selected: Vec::new(),
        };
        for seat in booked {
            let seat = seat.into();
            map.check_exists(&seat)?;
            map.booked.insert(seat);
        }
        Ok(map)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn booked(&self) -> impl Iterator<Item = &str> {
        self.booked.iter().map(String::as_str)
    }

    pub fn is_booked(&self, seat: &str) -> bool {
        self.booked.contains(seat)
    }

    /// `None` for ids outside the grid.
    pub fn status(&self, seat: &str) -> Option<SeatStatus> {
        self.check_exists(seat).ok()?;
        Some(if self.booked.contains(seat) {
            SeatStatus::Booked
        } else if self.selected.iter().any(|s| s == seat) {
            SeatStatus::Selected
        } else {
            SeatStatus::Available
        })
    }

    /// Click on a seat.
    pub fn toggle(&mut self, seat: &str) -> Result<SeatToggle, SeatError> {
        self.check_exists(seat)?;

        if self.booked.contains(seat) {
            return Err(SeatError::AlreadyBooked(seat.to_string()));
        }

        if let Some(pos) = self.selected.iter().position(|s| s == seat) {
            self.selected.remove(pos);
            return Ok(SeatToggle::Deselected);
        }

        if self.selected.len() >= self.required {
            return Err(SeatError::SelectionLimit { limit: self.required });
        }

        self.selected.push(seat.to_string());
        Ok(SeatToggle::Selected)
    }

    /// Hand the selection back, in click order.
    pub fn confirm(&self) -> Result<Vec<String>, SeatError> {
        if self.selected.len() != self.required {
            return Err(SeatError::WrongCount {
                expected: self.required,
                selected: self.selected.len(),
            });
        }
        Ok(self.selected.clone())
    }

    pub fn view(&self) -> SeatMapView {
        let rows = (1..=self.rows)
            .map(|number| SeatRowView {
                number,
                seats: SEAT_LETTERS
                    .iter()
                    .map(|letter| {
                        let id = format!("{}{}", number, letter);
                        let status = self.status(&id).unwrap_or(SeatStatus::Booked);
                        SeatView { id, status }
                    })
                    .collect(),
            })
            .collect();

        SeatMapView {
            required: self.required,
            selected: self.selected.clone(),
            rows,
        }
    }

    fn check_exists(&self, seat: &str) -> Result<(), SeatError> {
        let unknown = || SeatError::UnknownSeat(seat.to_string());

        let letter = seat.chars().last().ok_or_else(unknown)?;
        if !SEAT_LETTERS.contains(&letter) {
            return Err(unknown());
        }
        let row_text = &seat[..seat.len() - letter.len_utf8()];
        if row_text.is_empty() || !row_text.chars().all(|c| c.is_ascii_digit()) || row_text.starts_with('0') {
            return Err(unknown());
        }
        let row: u32 = row_text.parse().map_err(|_| unknown())?;
        if row == 0 || row > self.rows {
            return Err(unknown());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatMapView {
    pub required: usize,
    pub selected: Vec<String>,
    pub rows: Vec<SeatRowView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatRowView {
    pub number: u32,
    pub seats: Vec<SeatView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatView {
    pub id: String,
    pub status: SeatStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatError {
    #[error("Seat {0} does not exist on this map")]
    UnknownSeat(String),

    #[error("Seat {0} is already booked")]
    AlreadyBooked(String),

    #[error("You can only select {limit} seat(s)")]
    SelectionLimit { limit: usize },

    #[error("Please select exactly {expected} seat(s), {selected} selected")]
    WrongCount { expected: usize, selected: usize },

    #[error("Invalid seat layout: {0}")]
    InvalidLayout(String),
}

impl From<SeatError> for CoreError {
    fn from(err: SeatError) -> Self {
        match err {
            SeatError::UnknownSeat(_) => CoreError::NotFound(err.to_string()),
            _ => CoreError::Validation(err.to_string()),
        }
    }
}
