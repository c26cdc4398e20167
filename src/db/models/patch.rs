//! Partial segment updates.
//!
//! The four workflow flags (check-in, check-out, hold, transport) share one
//! shape: a boolean and the timestamp of its last activation. A
//! [`FlagChange`] always moves both together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FlagGroup {
    CheckIn,
    CheckOut,
    Hold,
    Transport,
}

impl FlagGroup {
    pub const ALL: [FlagGroup; 4] = [
        FlagGroup::CheckIn,
        FlagGroup::CheckOut,
        FlagGroup::Hold,
        FlagGroup::Transport,
    ];

    /// Storage columns as `(flag, timestamp)`.
    pub fn columns(&self) -> (&'static str, &'static str) {
        match self {
            FlagGroup::CheckIn => ("checked_in", "check_in_time"),
            FlagGroup::CheckOut => ("checked_out", "check_out_time"),
            FlagGroup::Hold => ("held", "hold_time"),
            FlagGroup::Transport => ("is_being_transported", "transport_time"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FlagChange {
    /// Set the flag and stamp it. Re-activating refreshes the stamp.
    Activate(DateTime<Utc>),
    /// Clear the flag and its stamp.
    Deactivate,
}

impl FlagChange {
    pub fn flag(&self) -> bool {
        matches!(self, FlagChange::Activate(_))
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FlagChange::Activate(at) => Some(*at),
            FlagChange::Deactivate => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPatch {
    pub checked_in: Option<FlagChange>,
    pub checked_out: Option<FlagChange>,
    pub held: Option<FlagChange>,
    pub transported: Option<FlagChange>,
    pub overnight_hotel: Option<bool>,
    /// `Some(None)` clears the stored value.
    pub photo_url: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl SegmentPatch {
    pub fn flag(group: FlagGroup, change: FlagChange) -> Self {
        let mut patch = Self::default();
        *patch.flag_slot(group) = Some(change);
        patch
    }

    pub fn activate(group: FlagGroup, at: DateTime<Utc>) -> Self {
        Self::flag(group, FlagChange::Activate(at))
    }

    pub fn deactivate(group: FlagGroup) -> Self {
        Self::flag(group, FlagChange::Deactivate)
    }

    /// Person-level fields, written to every segment of a person.
    pub fn person_fields(photo_url: Option<String>, notes: Option<String>) -> Self {
        Self {
            photo_url: Some(photo_url),
            notes: Some(notes),
            ..Self::default()
        }
    }

    pub fn photo(photo_url: impl Into<String>) -> Self {
        Self {
            photo_url: Some(Some(photo_url.into())),
            ..Self::default()
        }
    }

    pub fn change_for(&self, group: FlagGroup) -> Option<FlagChange> {
        match group {
            FlagGroup::CheckIn => self.checked_in,
            FlagGroup::CheckOut => self.checked_out,
            FlagGroup::Hold => self.held,
            FlagGroup::Transport => self.transported,
        }
    }

    pub fn flag_changes(&self) -> impl Iterator<Item = (FlagGroup, FlagChange)> + '_ {
        FlagGroup::ALL
            .into_iter()
            .filter_map(move |group| self.change_for(group).map(|change| (group, change)))
    }

    pub fn is_empty(&self) -> bool {
        self.flag_changes().next().is_none()
            && self.overnight_hotel.is_none()
            && self.photo_url.is_none()
            && self.notes.is_none()
    }

    fn flag_slot(&mut self, group: FlagGroup) -> &mut Option<FlagChange> {
        match group {
            FlagGroup::CheckIn => &mut self.checked_in,
            FlagGroup::CheckOut => &mut self.checked_out,
            FlagGroup::Hold => &mut self.held,
            FlagGroup::Transport => &mut self.transported,
        }
    }
}
