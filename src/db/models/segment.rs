use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Arrival,
    Departure,
    Cruise,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Arrival => "arrival",
            SegmentKind::Departure => "departure",
            SegmentKind::Cruise => "cruise",
        }
    }

    /// Cruise legs aggregate exactly like departures.
    pub fn is_departure(&self) -> bool {
        matches!(self, SegmentKind::Departure | SegmentKind::Cruise)
    }
}

/// A travel segment as stored, before defaulting.
///
/// Older rows may lack the person id, optional flags, or the hold/transport
/// columns entirely, so everything except the identity fields is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRecord {
    pub id: String,
    pub person_id: Option<String>,
    pub name: Option<String>,
    pub flight_label: String,
    pub time_label: String,
    pub kind: SegmentKind,
    pub checked_in: Option<bool>,
    pub checked_out: Option<bool>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub overnight_hotel: Option<bool>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub held: Option<bool>,
    pub hold_time: Option<DateTime<Utc>>,
    pub is_being_transported: Option<bool>,
    pub transport_time: Option<DateTime<Utc>>,
}

impl SegmentRecord {
    /// Bare record with every optional column absent.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: SegmentKind,
        flight_label: impl Into<String>,
        time_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            person_id: None,
            name: Some(name.into()),
            flight_label: flight_label.into(),
            time_label: time_label.into(),
            kind,
            checked_in: None,
            checked_out: None,
            check_in_time: None,
            check_out_time: None,
            overnight_hotel: None,
            photo_url: None,
            notes: None,
            held: None,
            hold_time: None,
            is_being_transported: None,
            transport_time: None,
        }
    }

    pub fn with_person_id(mut self, person_id: impl Into<String>) -> Self {
        self.person_id = Some(person_id.into());
        self
    }
}

/// A segment after defaulting: no "maybe absent" fields remain, only
/// explicit `false` / `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TravelSegment {
    pub id: String,
    pub person_key: String,
    pub name: String,
    pub flight_label: String,
    pub time_label: String,
    pub kind: SegmentKind,
    pub checked_in: bool,
    pub checked_out: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub overnight_hotel: bool,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub held: bool,
    pub hold_time: Option<DateTime<Utc>>,
    pub is_being_transported: bool,
    pub transport_time: Option<DateTime<Utc>>,
}
