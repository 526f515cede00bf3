use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use tracing::warn;
use wayfare_core::{CoreError, TravelMode};

/// One row of `flights.json` or `trains.json`.
///
/// Flight rows name the carrier `airline`/`flightNumber`, train rows
/// `trainName`/`trainNumber`; both land in the same fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "airline", alias = "trainName")]
    pub carrier: String,
    #[serde(alias = "flightNumber", alias = "trainNumber")]
    pub service_number: String,
    pub from: String,
    pub from_code: String,
    pub to: String,
    pub to_code: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub class: String,
    pub price: f64,
    pub available_seats: u32,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

impl CatalogRecord {
    pub fn into_offering(self, mode: TravelMode) -> Result<Offering, CoreError> {
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(CoreError::Validation(format!(
                "Offering {} has a non-positive price",
                self.id
            )));
        }
        Ok(Offering {
            id: self.id,
            mode,
            carrier: self.carrier,
            service_number: self.service_number,
            from: self.from,
            from_code: self.from_code,
            to: self.to,
            to_code: self.to_code,
            departure: self.departure,
            arrival: self.arrival,
            duration: self.duration,
            travel_class: self.class,
            price: self.price,
            available_seats: self.available_seats,
        })
    }
}

/// A bookable service instance. Read-only for the whole session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offering {
    pub id: String,
    pub mode: TravelMode,
    pub carrier: String,
    pub service_number: String,
    pub from: String,
    pub from_code: String,
    pub to: String,
    pub to_code: String,
    /// Clock time, `HH:MM`.
    pub departure: String,
    pub arrival: String,
    /// Free text such as `7h 30m`.
    pub duration: String,
    #[serde(rename = "class")]
    pub travel_class: String,
    pub price: f64,
    pub available_seats: u32,
}

impl Offering {
    /// Leading whole-hours token of `duration` (`"7h 30m"` -> 7).
    pub fn duration_hours(&self) -> Option<u32> {
        let digits: String = self
            .duration
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    /// Decode a whole dataset. Rows that fail validation are skipped.
    pub fn parse_dataset(mode: TravelMode, bytes: &[u8]) -> Result<Vec<Offering>, CoreError> {
        let records: Vec<CatalogRecord> = serde_json::from_slice(bytes).map_err(|e| {
            CoreError::SourceUnavailable(format!("{} dataset is malformed: {}", mode.dataset(), e))
        })?;

        Ok(records
            .into_iter()
            .filter_map(|record| match record.into_offering(mode) {
                Ok(offering) => Some(offering),
                Err(e) => {
                    warn!("Skipping catalog row: {}", e);
                    None
                }
            })
            .collect())
    }
}

/// Read-only access to the offerings of one travel mode.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fails with `CoreError::SourceUnavailable` when the dataset can't be read.
    async fn load(&self, mode: TravelMode) -> Result<Vec<Offering>, CoreError>;
}

/// Catalog held in memory, used for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    offerings: HashMap<TravelMode, Vec<Offering>>,
    offline: bool,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog whose every read fails.
    pub fn offline() -> Self {
        Self {
            offerings: HashMap::new(),
            offline: true,
        }
    }

    pub fn with_offering(mut self, offering: Offering) -> Self {
        self.insert(offering);
        self
    }

    pub fn insert(&mut self, offering: Offering) {
        self.offerings.entry(offering.mode).or_default().push(offering);
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn load(&self, mode: TravelMode) -> Result<Vec<Offering>, CoreError> {
        if self.offline {
            return Err(CoreError::SourceUnavailable(format!(
                "{} catalog is offline",
                mode.dataset()
            )));
        }
        Ok(self.offerings.get(&mode).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLIGHTS: &str = r#"[
        {
            "id": "FL001",
            "airline": "Atlantic Air",
            "flightNumber": "AA100",
            "from": "New York (NYC)",
            "fromCode": "JFK",
            "to": "London (LON)",
            "toCode": "LHR",
            "departure": "08:00",
            "arrival": "20:00",
            "duration": "7h 00m",
            "class": "Economy",
            "price": 500,
            "availableSeats": 42
        },
        {
            "id": 7,
            "airline": "Broken Air",
            "flightNumber": "BA0",
            "from": "Nowhere",
            "fromCode": "NWH",
            "to": "Elsewhere",
            "toCode": "ELS",
            "departure": "09:00",
            "arrival": "10:00",
            "duration": "1h",
            "class": "Economy",
            "price": 0,
            "availableSeats": 1
        }
    ]"#;

    const TRAINS: &str = r#"[
        {
            "id": "TR01",
            "trainName": "Rajdhani Express",
            "trainNumber": "12301",
            "from": "New Delhi",
            "fromCode": "NDLS",
            "to": "Howrah",
            "toCode": "HWH",
            "departure": "16:55",
            "arrival": "09:55",
            "duration": "17h 00m",
            "class": "3-AC",
            "price": 2500,
            "availableSeats": 0
        }
    ]"#;

    #[test]
    fn test_flight_dataset_parsing() {
        let offerings = Offering::parse_dataset(TravelMode::Flight, FLIGHTS.as_bytes()).unwrap();

        // Zero-priced row is dropped
        assert_eq!(offerings.len(), 1);
        let flight = &offerings[0];
        assert_eq!(flight.carrier, "Atlantic Air");
        assert_eq!(flight.service_number, "AA100");
        assert_eq!(flight.mode, TravelMode::Flight);
        assert_eq!(flight.price, 500.0);
    }

    #[test]
    fn test_train_dataset_parsing() {
        let offerings = Offering::parse_dataset(TravelMode::Train, TRAINS.as_bytes()).unwrap();
        assert_eq!(offerings[0].carrier, "Rajdhani Express");
        assert_eq!(offerings[0].service_number, "12301");
        assert_eq!(offerings[0].available_seats, 0);
        assert_eq!(offerings[0].mode, TravelMode::Train);
    }

    #[test]
    fn test_malformed_dataset_is_source_unavailable() {
        let result = Offering::parse_dataset(TravelMode::Flight, b"{not json");
        assert!(matches!(result, Err(CoreError::SourceUnavailable(_))));
    }

    #[test]
    fn test_duration_hours() {
        let mut offering = Offering::parse_dataset(TravelMode::Flight, FLIGHTS.as_bytes()).unwrap().remove(0);
        assert_eq!(offering.duration_hours(), Some(7));

        offering.duration = "12h".to_string();
        assert_eq!(offering.duration_hours(), Some(12));

        offering.duration = "overnight".to_string();
        assert_eq!(offering.duration_hours(), None);
    }

    #[tokio::test]
    async fn test_in_memory_catalog() {
        let offerings = Offering::parse_dataset(TravelMode::Flight, FLIGHTS.as_bytes()).unwrap();
        let catalog = InMemoryCatalog::new().with_offering(offerings[0].clone());

        assert_eq!(catalog.load(TravelMode::Flight).await.unwrap().len(), 1);
        assert!(catalog.load(TravelMode::Train).await.unwrap().is_empty());

        let offline = InMemoryCatalog::offline();
        assert!(matches!(
            offline.load(TravelMode::Flight).await,
            Err(CoreError::SourceUnavailable(_))
        ));
    }
}
