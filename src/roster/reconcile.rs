use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::models::{Person, SegmentRecord, TravelSegment};
use crate::log_warn;
use crate::roster::{
    config::RosterConfig, identity::resolve_person_key,
    visibility::filter_departures_for_display,
};

const ENABLE_LOGS: bool = true;

/// Output of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    pub arrivals: Vec<TravelSegment>,
    /// Departure and cruise segments for display. Gated on arrival check-in
    /// unless the config turns gating off.
    pub departures: Vec<TravelSegment>,
    /// Every departure and cruise segment, never gated.
    pub all_departures: Vec<TravelSegment>,
    pub persons: Vec<Person>,
    /// Records that could not be placed: rows storage could not decode, and
    /// records with neither a person id nor a name.
    pub skipped: usize,
}

impl Roster {
    pub fn person(&self, person_key: &str) -> Option<&Person> {
        self.persons
            .iter()
            .find(|person| person.person_key == person_key)
    }

    pub fn persons_by_key(&self) -> HashMap<&str, &Person> {
        persons_by_key(&self.persons)
    }

    pub fn segment(&self, id: &str) -> Option<&TravelSegment> {
        self.arrivals
            .iter()
            .chain(self.all_departures.iter())
            .find(|segment| segment.id == id)
    }
}

fn persons_by_key(persons: &[Person]) -> HashMap<&str, &Person> {
    persons
        .iter()
        .map(|person| (person.person_key.as_str(), person))
        .collect()
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

/// Bring a stored record to its rest state.
///
/// Absent flags become `false`, blank photo/notes become `None`, and a
/// timestamp whose flag is not set is dropped.
pub fn normalize_record(record: &SegmentRecord, person_key: String) -> TravelSegment {
    let checked_in = record.checked_in.unwrap_or(false);
    let checked_out = record.checked_out.unwrap_or(false);
    let held = record.held.unwrap_or(false);
    let is_being_transported = record.is_being_transported.unwrap_or(false);

    TravelSegment {
        id: record.id.clone(),
        person_key,
        name: record.name.clone().unwrap_or_default(),
        flight_label: record.flight_label.clone(),
        time_label: record.time_label.clone(),
        kind: record.kind,
        checked_in,
        checked_out,
        check_in_time: record.check_in_time.filter(|_| checked_in),
        check_out_time: record.check_out_time.filter(|_| checked_out),
        overnight_hotel: record.overnight_hotel.unwrap_or(false),
        photo_url: non_blank(&record.photo_url),
        notes: non_blank(&record.notes),
        held,
        hold_time: record.hold_time.filter(|_| held),
        is_being_transported,
        transport_time: record.transport_time.filter(|_| is_being_transported),
    }
}

/// Reconcile with the default configuration.
pub fn reconcile(records: &[SegmentRecord]) -> Roster {
    reconcile_with(records, &RosterConfig::default())
}

/// Fold a flat list of stored segments into per-person aggregates.
///
/// Pure and deterministic: input order is preserved everywhere, there are no
/// clock reads and no I/O.
pub fn reconcile_with(records: &[SegmentRecord], config: &RosterConfig) -> Roster {
    let mut persons: Vec<Person> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut arrivals = Vec::new();
    let mut all_departures = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(person_key) =
            resolve_person_key(record.person_id.as_deref(), record.name.as_deref())
        else {
            skipped += 1;
            continue;
        };

        let segment = normalize_record(record, person_key);

        let slot = match slots.get(&segment.person_key) {
            Some(&slot) => slot,
            None => {
                persons.push(Person::seeded_from(&segment));
                slots.insert(segment.person_key.clone(), persons.len() - 1);
                persons.len() - 1
            }
        };

        let person = &mut persons[slot];
        if person.photo_url.is_none() {
            person.photo_url = segment.photo_url.clone();
        }
        if person.notes.is_none() {
            person.notes = segment.notes.clone();
        }

        if segment.kind.is_departure() {
            all_departures.push(segment.clone());
            person.departure_segments.push(segment);
        } else {
            arrivals.push(segment.clone());
            person.arrival_segments.push(segment);
        }
    }

    for person in &mut persons {
        let any_checked_in = person.segments().any(|segment| {
            segment.checked_in || (config.count_checked_out_as_checked_in && segment.checked_out)
        });
        person.is_any_segment_checked_in = any_checked_in;
        person.is_any_segment_checked_out = person
            .departure_segments
            .iter()
            .any(|segment| segment.checked_out);
    }

    if skipped > 0 {
        log_warn!("Skipped {skipped} segment record(s) with neither a person id nor a name");
    }

    let departures = if config.gate_departures_on_arrival_check_in {
        filter_departures_for_display(&all_departures, &persons_by_key(&persons))
    } else {
        all_departures.clone()
    };

    Roster {
        arrivals,
        departures,
        all_departures,
        persons,
        skipped,
    }
}

/// Stable sort by the raw time label, for list views that want it.
pub fn sort_by_time_label(segments: &mut [TravelSegment]) {
    segments.sort_by(|a, b| a.time_label.cmp(&b.time_label));
}
