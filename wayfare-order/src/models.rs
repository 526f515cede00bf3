use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfare_catalog::Offering;
use wayfare_core::TravelMode;
use wayfare_shared::Masked;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 120;

fn new_passenger_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_age() -> u32 {
    18
}

/// A traveller on a draft or booking. Only the first passenger carries
/// contact details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passenger {
    #[serde(default = "new_passenger_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_age")]
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Masked<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Masked<String>>,
}

impl Default for Passenger {
    fn default() -> Self {
        Self::blank()
    }
}

impl Passenger {
    /// Empty form row: no name, age 18, male.
    pub fn blank() -> Self {
        Self {
            id: new_passenger_id(),
            name: String::new(),
            age: default_age(),
            gender: Gender::default(),
            email: None,
            phone: None,
        }
    }

    pub fn named(name: impl Into<String>, age: u32, gender: Gender) -> Self {
        Self {
            name: name.into(),
            age,
            gender,
            ..Self::blank()
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && (MIN_AGE..=MAX_AGE).contains(&self.age)
    }

    pub fn has_contact(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }

    pub fn clear_contact(&mut self) {
        self.email = None;
        self.phone = None;
    }
}

/// Field-level edit from the passenger form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PassengerUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

impl PassengerUpdate {
    pub fn apply(self, passenger: &mut Passenger) {
        if let Some(name) = self.name {
            passenger.name = name;
        }
        if let Some(age) = self.age {
            passenger.age = age;
        }
        if let Some(gender) = self.gender {
            passenger.gender = gender;
        }
    }
}

/// Offering fields copied into a draft at selection time, plus the travel
/// date from the query. A copy, since the catalog never changes under it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripDetails {
    pub offering_id: String,
    pub mode: TravelMode,
    pub carrier: String,
    pub service_number: String,
    pub from: String,
    pub from_code: String,
    pub to: String,
    pub to_code: String,
    pub date: NaiveDate,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    #[serde(rename = "class")]
    pub travel_class: String,
    pub price: f64,
}

impl TripDetails {
    pub fn from_offering(offering: &Offering, date: NaiveDate) -> Self {
        Self {
            offering_id: offering.id.clone(),
            mode: offering.mode,
            carrier: offering.carrier.clone(),
            service_number: offering.service_number.clone(),
            from: offering.from.clone(),
            from_code: offering.from_code.clone(),
            to: offering.to.clone(),
            to_code: offering.to_code.clone(),
            date,
            departure: offering.departure.clone(),
            arrival: offering.arrival.clone(),
            duration: offering.duration.clone(),
            travel_class: offering.travel_class.clone(),
            price: offering.price,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// A finalized booking. Only `status` changes after issuance, through
/// cancellation; the record is never removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub pnr: String,
    #[serde(flatten)]
    pub trip: TripDetails,
    pub passengers: Vec<Passenger>,
    /// Parallel to `passengers`.
    pub seats: Vec<String>,
    /// `price x passengers`, before the displayed surcharge.
    pub total_amount: f64,
    pub booked_at: DateTime<Utc>,
    pub status: BookingStatus,
}

impl Booking {
    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// Passenger and seat side by side.
    pub fn seat_assignments(&self) -> impl Iterator<Item = (&Passenger, &str)> {
        self.passengers.iter().zip(self.seats.iter().map(String::as_str))
    }
}

/// Partial update of a booking. Identifier, reference code and timestamp are
/// not expressible here, so they can't change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingPatch {
    pub passengers: Option<Vec<Passenger>>,
    pub seats: Option<Vec<String>>,
    pub total_amount: Option<f64>,
    pub status: Option<BookingStatus>,
}
