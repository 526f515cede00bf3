use std::cmp::Ordering;
use wayfare_catalog::Offering;
use wayfare_core::SortKey;

/// Sorted copy of a result set. The input is left untouched.
///
/// Sorting is stable, so re-sorting by the same key is a no-op. Offerings
/// whose duration has no leading hour count sort after every parsed one.
pub fn sort_offerings(offerings: &[Offering], key: SortKey) -> Vec<Offering> {
    let mut sorted = offerings.to_vec();
    match key {
        SortKey::Price => sorted.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::Duration => sorted.sort_by(|a, b| compare_duration(a, b)),
        SortKey::Departure => sorted.sort_by(|a, b| a.departure.cmp(&b.departure)),
    }
    sorted
}

fn compare_duration(a: &Offering, b: &Offering) -> Ordering {
    match (a.duration_hours(), b.duration_hours()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
