use std::future::Future;

use anyhow::Result;

use crate::db::models::{SegmentPatch, SegmentRecord};

/// Result of a full scan. Rows that cannot be decoded are left out and counted
/// so one bad row never hides the rest of the roster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentSnapshot {
    pub records: Vec<SegmentRecord>,
    pub unreadable: usize,
}

impl From<Vec<SegmentRecord>> for SegmentSnapshot {
    fn from(records: Vec<SegmentRecord>) -> Self {
        Self {
            records,
            unreadable: 0,
        }
    }
}

/// Storage boundary for travel segments.
///
/// Implementations are plain data access: they never apply the candidate-key
/// fallback themselves, callers decide which keys to pass. Every write
/// reports the number of rows it touched.
pub trait SegmentStore: Send + Sync + 'static {
    /// Full snapshot, in insertion order.
    fn list_all_segments(&self) -> impl Future<Output = Result<SegmentSnapshot>> + Send;

    /// Insert all records atomically.
    fn insert_segments(&self, records: &[SegmentRecord]) -> impl Future<Output = Result<()>> + Send;

    fn update_segment_fields(
        &self,
        id: &str,
        patch: &SegmentPatch,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Apply `patch` to every segment whose person id is one of `person_keys`.
    fn update_segments_by_person_keys(
        &self,
        person_keys: &[String],
        patch: &SegmentPatch,
    ) -> impl Future<Output = Result<usize>> + Send;

    fn delete_segments_by_person_keys(
        &self,
        person_keys: &[String],
    ) -> impl Future<Output = Result<usize>> + Send;
}
