use serde::{Deserialize, Serialize};

use crate::db::models::Person;

/// Head counts for the overview screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStats {
    pub total: usize,
    pub checked_in: usize,
    pub departed: usize,
    pub pending: usize,
}

pub fn roster_stats(persons: &[Person]) -> RosterStats {
    let total = persons.len();
    let checked_in = persons
        .iter()
        .filter(|person| person.is_any_segment_checked_in)
        .count();
    let departed = persons
        .iter()
        .filter(|person| person.is_any_segment_checked_out)
        .count();

    RosterStats {
        total,
        checked_in,
        departed,
        pending: total - checked_in,
    }
}
