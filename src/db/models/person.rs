//! Person aggregate.
//!
//! A person is never stored. It is rebuilt from the full segment set after
//! every write, so the name/photo/notes held here are a cache of what the
//! segments carry.

use serde::{Deserialize, Serialize};

use super::TravelSegment;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub person_key: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub arrival_segments: Vec<TravelSegment>,
    pub departure_segments: Vec<TravelSegment>,
    pub is_any_segment_checked_in: bool,
    pub is_any_segment_checked_out: bool,
}

impl Person {
    /// Seed a person from the first segment seen for its key.
    pub fn seeded_from(segment: &TravelSegment) -> Self {
        Self {
            person_key: segment.person_key.clone(),
            name: segment.name.clone(),
            photo_url: segment.photo_url.clone(),
            notes: segment.notes.clone(),
            arrival_segments: Vec::new(),
            departure_segments: Vec::new(),
            is_any_segment_checked_in: false,
            is_any_segment_checked_out: false,
        }
    }

    pub fn has_checked_in_arrival(&self) -> bool {
        self.arrival_segments.iter().any(|segment| segment.checked_in)
    }

    pub fn segments(&self) -> impl Iterator<Item = &TravelSegment> {
        self.arrival_segments
            .iter()
            .chain(self.departure_segments.iter())
    }
}
