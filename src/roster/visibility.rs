use std::collections::HashMap;

use crate::db::models::{Person, TravelSegment};

/// Departures whose person has at least one checked-in arrival.
///
/// A departure whose person is unknown, or who has no arrivals at all, is
/// never shown. Only the returned list is filtered; the inputs are untouched.
pub fn filter_departures_for_display(
    departures: &[TravelSegment],
    persons_by_key: &HashMap<&str, &Person>,
) -> Vec<TravelSegment> {
    departures
        .iter()
        .filter(|segment| {
            persons_by_key
                .get(segment.person_key.as_str())
                .is_some_and(|person| person.has_checked_in_arrival())
        })
        .cloned()
        .collect()
}
