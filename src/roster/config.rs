use serde::{Deserialize, Serialize};

/// Behaviour switches for reconciliation.
///
/// Both flags cover product questions where earlier versions of the desk
/// behaved differently; the defaults are the later behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterConfig {
    /// Hide a person's departures until one of their arrivals is checked in.
    /// When false, the display list is every departure.
    pub gate_departures_on_arrival_check_in: bool,

    /// Count a checked-out segment as checked in for
    /// `Person::is_any_segment_checked_in`.
    pub count_checked_out_as_checked_in: bool,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            gate_departures_on_arrival_check_in: true,
            count_checked_out_as_checked_in: true,
        }
    }
}

impl RosterConfig {
    /// Every departure is listed, regardless of arrival check-in.
    pub fn ungated() -> Self {
        Self {
            gate_departures_on_arrival_check_in: false,
            ..Self::default()
        }
    }
}
