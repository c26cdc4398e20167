use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex as StdMutex,
    },
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    db::{
        models::{FlagGroup, SegmentPatch, SegmentRecord},
        store::{SegmentSnapshot, SegmentStore},
    },
    desk::{intake::NewIndividual, patch::apply_patch},
    error::{Error, Result},
    log_debug, log_error, log_info, log_warn,
    roster::{
        identity::{candidate_keys, canonicalize_id},
        photos::{person_key_from_photo_name, photo_object_name},
        reconcile::{reconcile_with, Roster},
        stats::{roster_stats, RosterStats},
        RosterConfig,
    },
};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchedBy {
    /// The canonical person key matched.
    Canonical,
    /// Only the historical key variants matched.
    Candidates,
    Nothing,
}

/// Result of a write addressed by person key. Matching nothing is a soft
/// outcome: local state believed the person existed but storage disagrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub rows_affected: usize,
    pub matched_by: MatchedBy,
}

impl MatchOutcome {
    pub fn is_no_match(&self) -> bool {
        self.matched_by == MatchedBy::Nothing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh was issued while this one was in flight.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSync {
    pub object_name: String,
    pub person_key: String,
    pub outcome: MatchOutcome,
}

#[derive(Default)]
struct LocalState {
    config: RosterConfig,
    records: Vec<SegmentRecord>,
    unreadable: usize,
    roster: Roster,
}

impl LocalState {
    fn replace(&mut self, snapshot: SegmentSnapshot) {
        self.records = snapshot.records;
        self.unreadable = snapshot.unreadable;
        self.rederive();
    }

    fn rederive(&mut self) {
        self.roster = reconcile_with(&self.records, &self.config);
        self.roster.skipped += self.unreadable;
    }

    fn apply_local(&mut self, id: &str, patch: &SegmentPatch) -> bool {
        let Some(record) = self.records.iter_mut().find(|record| record.id == id) else {
            return false;
        };
        *record = apply_patch(record, patch);
        self.rederive();
        true
    }
}

#[derive(Clone, Copy)]
enum PersonWrite<'a> {
    Update(&'a SegmentPatch),
    Delete,
}

/// Removes its segment id from the in-flight set when dropped.
struct PendingGuard {
    pending: Arc<StdMutex<HashSet<String>>>,
    id: String,
}

fn lock_pending(pending: &StdMutex<HashSet<String>>) -> std::sync::MutexGuard<'_, HashSet<String>> {
    match pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        lock_pending(&self.pending).remove(&self.id);
    }
}

/// Local roster state plus every mutation the desk can make.
///
/// Segment updates are optimistic: the patch lands in local state first and
/// the whole snapshot is re-read from storage if the write fails. Everything
/// else writes first and re-reads afterwards.
pub struct DeskController<S> {
    store: Arc<S>,
    state: Arc<Mutex<LocalState>>,
    issued: Arc<AtomicU64>,
    pending: Arc<StdMutex<HashSet<String>>>,
}

impl<S> Clone for DeskController<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
            issued: Arc::clone(&self.issued),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<S: SegmentStore> DeskController<S> {
    pub fn new(store: Arc<S>, config: RosterConfig) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(LocalState {
                config,
                ..LocalState::default()
            })),
            issued: Arc::new(AtomicU64::new(0)),
            pending: Arc::new(StdMutex::new(HashSet::new())),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn roster(&self) -> Roster {
        self.state.lock().await.roster.clone()
    }

    pub async fn stats(&self) -> RosterStats {
        roster_stats(&self.state.lock().await.roster.persons)
    }

    pub async fn config(&self) -> RosterConfig {
        self.state.lock().await.config.clone()
    }

    pub async fn set_config(&self, config: RosterConfig) {
        let mut state = self.state.lock().await;
        state.config = config;
        state.rederive();
    }

    /// Re-read every segment and rebuild the roster.
    ///
    /// Only the most recently issued refresh may land; an older response that
    /// arrives later is dropped. A failed read leaves an empty roster.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.store.list_all_segments().await;

        let mut state = self.state.lock().await;
        if token != self.issued.load(Ordering::SeqCst) {
            log_debug!("Discarding stale refresh #{token}");
            return Ok(RefreshOutcome::Stale);
        }

        match fetched {
            Ok(snapshot) => {
                if snapshot.unreadable > 0 {
                    log_warn!("{} stored row(s) could not be read", snapshot.unreadable);
                }
                state.replace(snapshot);
                Ok(RefreshOutcome::Applied)
            }
            Err(err) => {
                log_error!("Failed to load segments: {err:#}");
                state.replace(SegmentSnapshot::default());
                Err(Error::Persistence(err))
            }
        }
    }

    async fn resync(&self) {
        if let Err(err) = self.refresh().await {
            log_error!("Resync after failed write also failed: {err}");
        }
    }

    fn claim(&self, id: &str) -> Result<PendingGuard> {
        let mut pending = lock_pending(&self.pending);
        if !pending.insert(id.to_string()) {
            return Err(Error::MutationPending(id.to_string()));
        }
        Ok(PendingGuard {
            pending: Arc::clone(&self.pending),
            id: id.to_string(),
        })
    }

    /// Apply `patch` to one segment: locally first, then in storage.
    ///
    /// At most one update per segment id may be in flight.
    pub async fn update_segment(&self, id: &str, patch: SegmentPatch) -> Result<()> {
        if patch.is_empty() {
            return Err(Error::InvalidInput("patch has no fields".into()));
        }
        let _guard = self.claim(id)?;

        {
            let mut state = self.state.lock().await;
            if !state.apply_local(id, &patch) {
                log_debug!("Segment {id} is not in the local snapshot; writing through");
            }
        }

        match self.store.update_segment_fields(id, &patch).await {
            Ok(0) => {
                log_warn!("Segment {id} no longer exists in storage; resyncing");
                self.resync().await;
                Err(Error::SegmentNotFound(id.to_string()))
            }
            Ok(_) => {
                // A refresh may have landed while the write was in flight.
                // Older reads are void now, and the patch goes back on top.
                let mut state = self.state.lock().await;
                self.issued.fetch_add(1, Ordering::SeqCst);
                state.apply_local(id, &patch);
                Ok(())
            }
            Err(err) => {
                log_error!("Update of segment {id} failed, discarding local patch: {err:#}");
                self.resync().await;
                Err(Error::Persistence(err))
            }
        }
    }

    pub async fn activate(&self, id: &str, group: FlagGroup) -> Result<()> {
        self.update_segment(id, SegmentPatch::activate(group, Utc::now()))
            .await
    }

    pub async fn deactivate(&self, id: &str, group: FlagGroup) -> Result<()> {
        self.update_segment(id, SegmentPatch::deactivate(group)).await
    }

    pub async fn check_in(&self, id: &str) -> Result<()> {
        self.activate(id, FlagGroup::CheckIn).await
    }

    pub async fn undo_check_in(&self, id: &str) -> Result<()> {
        self.deactivate(id, FlagGroup::CheckIn).await
    }

    pub async fn check_out(&self, id: &str) -> Result<()> {
        self.activate(id, FlagGroup::CheckOut).await
    }

    pub async fn undo_check_out(&self, id: &str) -> Result<()> {
        self.deactivate(id, FlagGroup::CheckOut).await
    }

    pub async fn set_held(&self, id: &str, held: bool) -> Result<()> {
        if held {
            self.activate(id, FlagGroup::Hold).await
        } else {
            self.deactivate(id, FlagGroup::Hold).await
        }
    }

    pub async fn set_transported(&self, id: &str, transported: bool) -> Result<()> {
        if transported {
            self.activate(id, FlagGroup::Transport).await
        } else {
            self.deactivate(id, FlagGroup::Transport).await
        }
    }

    /// Store the arrival/departure pair for a new individual and return
    /// their person key.
    pub async fn add_individual(&self, form: NewIndividual) -> Result<String> {
        let (person_key, records) = form.into_segments()?;

        if let Err(err) = self.store.insert_segments(&records).await {
            log_error!("Failed to add {person_key}: {err:#}");
            self.resync().await;
            return Err(Error::Persistence(err));
        }
        log_info!("Added {person_key} with {} segment(s)", records.len());

        self.refresh().await?;
        Ok(person_key)
    }

    async fn write_person(
        &self,
        person_keys: &[String],
        write: PersonWrite<'_>,
    ) -> anyhow::Result<usize> {
        match write {
            PersonWrite::Update(patch) => {
                self.store
                    .update_segments_by_person_keys(person_keys, patch)
                    .await
            }
            PersonWrite::Delete => self.store.delete_segments_by_person_keys(person_keys).await,
        }
    }

    /// Canonical key first; historical variants only when that touched nothing.
    async fn write_with_fallback(
        &self,
        person_key: &str,
        write: PersonWrite<'_>,
    ) -> anyhow::Result<MatchOutcome> {
        let canonical = canonicalize_id(person_key);
        let rows = self
            .write_person(std::slice::from_ref(&canonical), write)
            .await?;
        if rows > 0 {
            return Ok(MatchOutcome {
                rows_affected: rows,
                matched_by: MatchedBy::Canonical,
            });
        }

        let mut candidates = candidate_keys(&canonical);
        let given = person_key.trim();
        if !candidates.iter().any(|candidate| candidate == given) {
            candidates.push(given.to_string());
        }
        log_info!("No rows under {canonical}; retrying with {candidates:?}");

        let rows = self.write_person(&candidates, write).await?;
        if rows == 0 {
            log_warn!("No stored segments matched person {person_key}");
            return Ok(MatchOutcome {
                rows_affected: 0,
                matched_by: MatchedBy::Nothing,
            });
        }

        Ok(MatchOutcome {
            rows_affected: rows,
            matched_by: MatchedBy::Candidates,
        })
    }

    async fn person_write(&self, person_key: &str, write: PersonWrite<'_>) -> Result<MatchOutcome> {
        let outcome = match self.write_with_fallback(person_key, write).await {
            Ok(outcome) => outcome,
            Err(err) => {
                log_error!("Write for person {person_key} failed: {err:#}");
                self.resync().await;
                return Err(Error::Persistence(err));
            }
        };

        self.refresh().await?;
        Ok(outcome)
    }

    /// Replace photo and notes on every segment of a person.
    pub async fn update_person(
        &self,
        person_key: &str,
        photo_url: Option<String>,
        notes: Option<String>,
    ) -> Result<MatchOutcome> {
        let patch = SegmentPatch::person_fields(photo_url, notes);
        self.person_write(person_key, PersonWrite::Update(&patch))
            .await
    }

    /// Point every segment of a person at an uploaded photo.
    pub async fn attach_photo(&self, person_key: &str, photo_url: &str) -> Result<MatchOutcome> {
        let patch = SegmentPatch::photo(photo_url);
        self.person_write(person_key, PersonWrite::Update(&patch))
            .await
    }

    /// Delete a person together with all of their segments.
    pub async fn delete_person(&self, person_key: &str) -> Result<MatchOutcome> {
        let outcome = self.person_write(person_key, PersonWrite::Delete).await?;
        log_info!(
            "Deleted {} segment(s) for {person_key}",
            outcome.rows_affected
        );
        Ok(outcome)
    }

    /// Object name an upload for this person should be stored under, so a
    /// later [`sync_photos`](Self::sync_photos) maps it back to them.
    pub fn photo_upload_name(&self, person_key: &str, extension: &str) -> String {
        photo_object_name(
            &canonicalize_id(person_key),
            Utc::now().timestamp_millis(),
            extension,
        )
    }

    /// Attach photos from a bucket listing of `(object name, public url)`.
    pub async fn sync_photos(&self, objects: &[(String, String)]) -> Result<Vec<PhotoSync>> {
        let mut synced = Vec::with_capacity(objects.len());

        for (object_name, public_url) in objects {
            let Some(person_key) = person_key_from_photo_name(object_name) else {
                log_debug!("Skipping bucket object {object_name}");
                continue;
            };

            let patch = SegmentPatch::photo(public_url.as_str());
            let outcome = match self
                .write_with_fallback(&person_key, PersonWrite::Update(&patch))
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    log_error!("Photo sync stopped at {object_name}: {err:#}");
                    self.resync().await;
                    return Err(Error::Persistence(err));
                }
            };

            synced.push(PhotoSync {
                object_name: object_name.clone(),
                person_key,
                outcome,
            });
        }

        self.refresh().await?;
        Ok(synced)
    }
}
