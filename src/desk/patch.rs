//! Pure optimistic-patch logic.
//!
//! The controller applies a [`SegmentPatch`] to its local copy of the stored
//! records before the write is confirmed. The patched record is then folded
//! through the same reconcile pass as a freshly read one, so a locally patched
//! segment and a re-read segment normalise identically.

use crate::db::models::{FlagChange, FlagGroup, SegmentPatch, SegmentRecord};

fn flag_fields(
    record: &mut SegmentRecord,
    group: FlagGroup,
) -> (&mut Option<bool>, &mut Option<chrono::DateTime<chrono::Utc>>) {
    match group {
        FlagGroup::CheckIn => (&mut record.checked_in, &mut record.check_in_time),
        FlagGroup::CheckOut => (&mut record.checked_out, &mut record.check_out_time),
        FlagGroup::Hold => (&mut record.held, &mut record.hold_time),
        FlagGroup::Transport => (&mut record.is_being_transported, &mut record.transport_time),
    }
}

fn apply_flag(record: &mut SegmentRecord, group: FlagGroup, change: FlagChange) {
    let (flag, time) = flag_fields(record, group);
    *flag = Some(change.flag());
    *time = change.timestamp();
}

/// `record` with `patch` applied. Fields the patch leaves alone are kept.
pub fn apply_patch(record: &SegmentRecord, patch: &SegmentPatch) -> SegmentRecord {
    let mut patched = record.clone();

    for (group, change) in patch.flag_changes() {
        apply_flag(&mut patched, group, change);
    }
    if let Some(overnight_hotel) = patch.overnight_hotel {
        patched.overnight_hotel = Some(overnight_hotel);
    }
    if let Some(photo_url) = &patch.photo_url {
        patched.photo_url = photo_url.clone();
    }
    if let Some(notes) = &patch.notes {
        patched.notes = notes.clone();
    }

    patched
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::db::models::SegmentKind;
    use crate::roster::reconcile;

    fn arrival() -> SegmentRecord {
        SegmentRecord::new("a1", "Ana Lee", SegmentKind::Arrival, "AL66", "2024-08-10")
    }

    #[test]
    fn activate_then_undo_couples_flag_and_time() {
        let at = Utc.with_ymd_and_hms(2024, 8, 10, 9, 0, 0).unwrap();
        let checked = apply_patch(&arrival(), &SegmentPatch::activate(FlagGroup::CheckIn, at));
        assert_eq!(checked.checked_in, Some(true));
        assert_eq!(checked.check_in_time, Some(at));

        let undone = apply_patch(&checked, &SegmentPatch::deactivate(FlagGroup::CheckIn));
        assert_eq!(undone.checked_in, Some(false));
        assert_eq!(undone.check_in_time, None);
    }

    #[test]
    fn reactivating_refreshes_the_timestamp() {
        let first = Utc.with_ymd_and_hms(2024, 8, 10, 9, 0, 0).unwrap();
        let second = first + Duration::minutes(5);

        let once = apply_patch(&arrival(), &SegmentPatch::activate(FlagGroup::Hold, first));
        let twice = apply_patch(&once, &SegmentPatch::activate(FlagGroup::Hold, second));
        assert_eq!(twice.held, Some(true));
        assert_eq!(twice.hold_time, Some(second));
    }

    #[test]
    fn patch_touches_only_its_own_group() {
        let at = Utc.with_ymd_and_hms(2024, 8, 10, 9, 0, 0).unwrap();
        let mut record = arrival();
        record.notes = Some("keep me".into());

        let patched = apply_patch(&record, &SegmentPatch::activate(FlagGroup::Transport, at));
        assert_eq!(patched.is_being_transported, Some(true));
        assert_eq!(patched.transport_time, Some(at));
        assert_eq!(patched.checked_in, None);
        assert_eq!(patched.notes.as_deref(), Some("keep me"));
    }

    #[test]
    fn person_fields_can_clear_values() {
        let mut record = arrival();
        record.photo_url = Some("http://old.jpg".into());
        let patched = apply_patch(&record, &SegmentPatch::person_fields(None, Some("late".into())));
        assert_eq!(patched.photo_url, None);
        assert_eq!(patched.notes.as_deref(), Some("late"));
    }

    #[test]
    fn patched_and_stored_records_reconcile_identically() {
        let at = Utc.with_ymd_and_hms(2024, 8, 10, 9, 0, 0).unwrap();
        let patched = apply_patch(&arrival(), &SegmentPatch::activate(FlagGroup::CheckIn, at));

        let mut stored = arrival();
        stored.checked_in = Some(true);
        stored.check_in_time = Some(at);
        stored.checked_out = Some(false);

        assert_eq!(reconcile(&[patched]), reconcile(&[stored]));
    }
}
