//! "Add individual" intake: one form produces a matched arrival/departure pair.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{SegmentKind, SegmentRecord};
use crate::error::{Error, Result};
use crate::roster::identity::key_from_name;

const MIN_NAME_LEN: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIndividual {
    pub name: String,
    pub arrival_flight: String,
    pub arrival_date: NaiveDate,
    pub arrival_time: String,
    pub departure_flight: String,
    pub departure_date: NaiveDate,
    pub departure_time: String,
    #[serde(default)]
    pub overnight_hotel: bool,
}

/// `2024-08-10 9:30 AM`: the date prefix keeps labels in day order under a
/// plain string sort.
pub fn time_label(date: NaiveDate, time: &str) -> String {
    format!("{} {}", date.format("%Y-%m-%d"), time.trim())
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

impl NewIndividual {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().chars().count() < MIN_NAME_LEN {
            return Err(Error::InvalidInput(format!(
                "name must be at least {MIN_NAME_LEN} characters"
            )));
        }
        require(&self.arrival_flight, "arrival flight")?;
        require(&self.arrival_time, "arrival time")?;
        require(&self.departure_flight, "departure flight")?;
        require(&self.departure_time, "departure time")?;
        Ok(())
    }

    pub fn person_key(&self) -> String {
        key_from_name(&self.name)
    }

    /// Validated arrival + departure records sharing one person key.
    pub fn into_segments(self) -> Result<(String, Vec<SegmentRecord>)> {
        self.validate()?;

        let person_key = self.person_key();
        let name = self.name.trim().to_string();

        let mut arrival = SegmentRecord::new(
            Uuid::new_v4().to_string(),
            name.clone(),
            SegmentKind::Arrival,
            self.arrival_flight.trim(),
            time_label(self.arrival_date, &self.arrival_time),
        )
        .with_person_id(person_key.clone());
        arrival.overnight_hotel = Some(self.overnight_hotel);

        let mut departure = SegmentRecord::new(
            Uuid::new_v4().to_string(),
            name,
            SegmentKind::Departure,
            self.departure_flight.trim(),
            time_label(self.departure_date, &self.departure_time),
        )
        .with_person_id(person_key.clone());
        departure.overnight_hotel = Some(false);

        for record in [&mut arrival, &mut departure] {
            record.checked_in = Some(false);
            record.checked_out = Some(false);
        }

        Ok((person_key, vec![arrival, departure]))
    }
}
