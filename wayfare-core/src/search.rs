use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// Which catalog a query runs against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Flight,
    Train,
}

impl TravelMode {
    /// Catalog file stem holding this mode's offerings.
    pub fn dataset(&self) -> &'static str {
        match self {
            TravelMode::Flight => "flights",
            TravelMode::Train => "trains",
        }
    }

    /// Classes the search form offers for this mode.
    pub fn classes(&self) -> &'static [&'static str] {
        match self {
            TravelMode::Flight => &["Economy", "Business", "First Class"],
            TravelMode::Train => &["Sleeper", "3-AC", "2-AC", "AC Chair Car", "Executive Chair"],
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelMode::Flight => f.write_str("flight"),
            TravelMode::Train => f.write_str("train"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchQuery {
    pub from: String,
    pub to: String,
    /// ISO date; `None` when the form was submitted without one.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "class")]
    pub travel_class: String,
    #[serde(rename = "type")]
    pub mode: TravelMode,
}

impl SearchQuery {
    /// Guard run before any catalog read.
    pub fn validate(&self, today: NaiveDate) -> CoreResult<NaiveDate> {
        if self.from.trim().is_empty()
            || self.to.trim().is_empty()
            || self.travel_class.trim().is_empty()
        {
            return Err(CoreError::validation("Please fill in all fields"));
        }
        let date = self
            .date
            .ok_or_else(|| CoreError::validation("Please fill in all fields"))?;
        if date < today {
            return Err(CoreError::Validation(format!(
                "Travel date {} is in the past",
                date
            )));
        }
        Ok(date)
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Presentation order for a result set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Price,
    Duration,
    Departure,
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(SortKey::Price),
            "duration" => Ok(SortKey::Duration),
            "departure" => Ok(SortKey::Departure),
            other => Err(CoreError::Validation(format!("Unknown sort key: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> SearchQuery {
        SearchQuery {
            from: "NYC".to_string(),
            to: "LON".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1),
            travel_class: "Economy".to_string(),
            mode: TravelMode::Flight,
        }
    }

    #[test]
    fn test_search_query_deserialization() {
        let json = r#"
            {
                "from": "NYC",
                "to": "LON",
                "date": "2025-06-01",
                "class": "Economy",
                "type": "flight"
            }
        "#;
        let parsed: SearchQuery = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(parsed, query());
    }

    #[test]
    fn test_blank_date_deserializes_as_missing() {
        let json = r#"{"from":"NYC","to":"LON","date":"","class":"Economy","type":"train"}"#;
        let parsed: SearchQuery = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.date, None);
        assert_eq!(parsed.mode, TravelMode::Train);
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let mut q = query();
        q.from = "  ".to_string();
        assert!(matches!(q.validate(today), Err(CoreError::Validation(_))));

        let mut q = query();
        q.to.clear();
        assert!(q.validate(today).is_err());

        let mut q = query();
        q.date = None;
        assert!(q.validate(today).is_err());

        let mut q = query();
        q.travel_class.clear();
        assert!(q.validate(today).is_err());
    }

    #[test]
    fn test_validate_date_window() {
        let q = query();
        let same_day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(q.validate(same_day).unwrap(), same_day);

        let later = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert!(q.validate(later).is_err());
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("duration".parse::<SortKey>().unwrap(), SortKey::Duration);
        assert_eq!(SortKey::default(), SortKey::Price);
        assert!("rating".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_mode_classes() {
        assert!(TravelMode::Flight.classes().contains(&"First Class"));
        assert!(TravelMode::Train.classes().contains(&"3-AC"));
        assert_eq!(TravelMode::Train.dataset(), "trains");
    }
}
