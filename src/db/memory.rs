//! In-memory [`SegmentStore`] for controller tests, with failure and latency
//! injection.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard,
    },
    time::Duration,
};

use anyhow::{bail, Result};

use crate::db::{
    models::{SegmentPatch, SegmentRecord},
    store::{SegmentSnapshot, SegmentStore},
};
use crate::desk::patch::apply_patch;

#[derive(Default)]
pub(crate) struct MemoryStore {
    records: Mutex<Vec<SegmentRecord>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    read_delays: Mutex<VecDeque<Duration>>,
    write_delay: Mutex<Option<Duration>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MemoryStore {
    pub(crate) fn with_records(records: Vec<SegmentRecord>) -> Self {
        let store = Self::default();
        *lock(&store.records) = records;
        store
    }

    pub(crate) fn records(&self) -> Vec<SegmentRecord> {
        lock(&self.records).clone()
    }

    /// Write straight to the backing data, bypassing any controller.
    pub(crate) fn push_record(&self, record: SegmentRecord) {
        lock(&self.records).push(record);
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay for the next read; the snapshot is taken before the delay.
    pub(crate) fn delay_next_read(&self, delay: Duration) {
        lock(&self.read_delays).push_back(delay);
    }

    pub(crate) fn delay_writes(&self, delay: Duration) {
        *lock(&self.write_delay) = Some(delay);
    }

    async fn write_latency(&self) {
        let delay = *lock(&self.write_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("write rejected by store");
        }
        Ok(())
    }
}

impl SegmentStore for MemoryStore {
    async fn list_all_segments(&self) -> Result<SegmentSnapshot> {
        let snapshot = self.records();
        let delay = lock(&self.read_delays).pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("read rejected by store");
        }
        Ok(snapshot.into())
    }

    async fn insert_segments(&self, records: &[SegmentRecord]) -> Result<()> {
        self.write_latency().await;
        self.check_writable()?;
        lock(&self.records).extend(records.iter().cloned());
        Ok(())
    }

    async fn update_segment_fields(&self, id: &str, patch: &SegmentPatch) -> Result<usize> {
        self.write_latency().await;
        self.check_writable()?;
        let mut records = lock(&self.records);
        let mut rows = 0;
        for record in records.iter_mut().filter(|record| record.id == id) {
            *record = apply_patch(record, patch);
            rows += 1;
        }
        Ok(rows)
    }

    async fn update_segments_by_person_keys(
        &self,
        person_keys: &[String],
        patch: &SegmentPatch,
    ) -> Result<usize> {
        self.write_latency().await;
        self.check_writable()?;
        let mut records = lock(&self.records);
        let mut rows = 0;
        for record in records.iter_mut() {
            if record
                .person_id
                .as_ref()
                .is_some_and(|id| person_keys.contains(id))
            {
                *record = apply_patch(record, patch);
                rows += 1;
            }
        }
        Ok(rows)
    }

    async fn delete_segments_by_person_keys(&self, person_keys: &[String]) -> Result<usize> {
        self.write_latency().await;
        self.check_writable()?;
        let mut records = lock(&self.records);
        let before = records.len();
        records.retain(|record| {
            !record
                .person_id
                .as_ref()
                .is_some_and(|id| person_keys.contains(id))
        });
        Ok(before - records.len())
    }
}
