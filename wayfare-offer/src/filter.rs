use wayfare_catalog::Offering;
use wayfare_core::SearchQuery;

/// Match predicate for one query.
///
/// An offering matches when both route fragments are case-insensitive
/// substrings of its origin and destination, OR when its class equals the
/// requested class exactly. The OR means a class match alone is enough, even
/// on an unrelated route; callers rely on that, so it is kept as is.
#[derive(Debug, Clone)]
pub struct OfferingMatcher {
    from: String,
    to: String,
    travel_class: String,
}

impl OfferingMatcher {
    pub fn new(query: &SearchQuery) -> Self {
        Self {
            from: query.from.to_lowercase(),
            to: query.to.to_lowercase(),
            travel_class: query.travel_class.clone(),
        }
    }

    pub fn matches_route(&self, offering: &Offering) -> bool {
        offering.from.to_lowercase().contains(&self.from)
            && offering.to.to_lowercase().contains(&self.to)
    }

    pub fn matches_class(&self, offering: &Offering) -> bool {
        offering.travel_class == self.travel_class
    }

    pub fn matches(&self, offering: &Offering) -> bool {
        self.matches_route(offering) || self.matches_class(offering)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wayfare_core::TravelMode;

    pub(crate) fn offering(id: &str, from: &str, to: &str, class: &str, price: f64) -> Offering {
        Offering {
            id: id.to_string(),
            mode: TravelMode::Flight,
            carrier: "Atlantic Air".to_string(),
            service_number: format!("AA{}", id),
            from: from.to_string(),
            from_code: from.chars().take(3).collect::<String>().to_uppercase(),
            to: to.to_string(),
            to_code: to.chars().take(3).collect::<String>().to_uppercase(),
            departure: "08:00".to_string(),
            arrival: "16:00".to_string(),
            duration: "8h 00m".to_string(),
            travel_class: class.to_string(),
            price,
            available_seats: 50,
        }
    }

    pub(crate) fn query(from: &str, to: &str, class: &str) -> SearchQuery {
        SearchQuery {
            from: from.to_string(),
            to: to.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1),
            travel_class: class.to_string(),
            mode: TravelMode::Flight,
        }
    }

    #[test]
    fn test_route_match_is_case_insensitive_substring() {
        let matcher = OfferingMatcher::new(&query("nyc", "lon", "Business"));
        let flight = offering("1", "New York (NYC)", "London (LON)", "Economy", 500.0);
        assert!(matcher.matches_route(&flight));
        assert!(!matcher.matches_class(&flight));
        assert!(matcher.matches(&flight));
    }

    #[test]
    fn test_both_route_ends_must_match() {
        let matcher = OfferingMatcher::new(&query("NYC", "PAR", "Business"));
        let flight = offering("1", "New York (NYC)", "London (LON)", "Economy", 500.0);
        assert!(!matcher.matches(&flight));
    }

    #[test]
    fn test_class_alone_matches_unrelated_route() {
        let matcher = OfferingMatcher::new(&query("NYC", "LON", "Economy"));
        let unrelated = offering("2", "Tokyo (TYO)", "Sydney (SYD)", "Economy", 900.0);
        assert!(matcher.matches(&unrelated));

        // Class comparison is exact
        let matcher = OfferingMatcher::new(&query("NYC", "LON", "economy"));
        assert!(!matcher.matches(&unrelated));
    }
}
