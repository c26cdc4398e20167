use std::collections::BTreeMap;

use crate::db::models::TravelSegment;

pub fn flight_group_key(segment: &TravelSegment) -> String {
    format!("{} - {}", segment.time_label, segment.flight_label)
}

/// Bucket segments by `"<time> - <flight>"`, ordered by plain string
/// comparison of that key. Segments keep their input order inside a bucket.
///
/// No calendar awareness: labels sort chronologically only when they are
/// written in a sortable form such as `2024-08-10`.
pub fn group_by_flight(segments: &[TravelSegment]) -> Vec<(String, Vec<TravelSegment>)> {
    let mut groups: BTreeMap<String, Vec<TravelSegment>> = BTreeMap::new();
    for segment in segments {
        groups
            .entry(flight_group_key(segment))
            .or_default()
            .push(segment.clone());
    }
    groups.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{SegmentKind, SegmentRecord};
    use crate::roster::reconcile;

    fn segments(specs: &[(&str, &str, &str, &str)]) -> Vec<TravelSegment> {
        let records: Vec<_> = specs
            .iter()
            .map(|(id, name, flight, time)| {
                SegmentRecord::new(*id, *name, SegmentKind::Arrival, *flight, *time)
            })
            .collect();
        reconcile(&records).arrivals
    }

    #[test]
    fn groups_sort_lexicographically() {
        let groups = group_by_flight(&segments(&[
            ("1", "Ana Lee", "AA66", "2024-08-10"),
            ("2", "Bo Chen", "BB12", "2024-08-09"),
        ]));

        let keys: Vec<_> = groups.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["2024-08-09 - BB12", "2024-08-10 - AA66"]);
    }

    #[test]
    fn same_flight_and_time_share_a_bucket_in_input_order() {
        let groups = group_by_flight(&segments(&[
            ("1", "Ana Lee", "AA66", "2024-08-10"),
            ("2", "Bo Chen", "AA66", "2024-08-10"),
            ("3", "Cy Diaz", "AA66", "2024-08-11"),
        ]));

        assert_eq!(groups.len(), 2);
        let ids: Vec<_> = groups[0].1.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn ordering_is_not_calendar_aware() {
        let groups = group_by_flight(&segments(&[
            ("1", "Ana Lee", "AA66", "August 9, 2024"),
            ("2", "Bo Chen", "BB12", "August 10, 2024"),
        ]));
        assert_eq!(groups[0].0, "August 10, 2024 - BB12");
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_flight(&[]).is_empty());
    }
}
