//! Edit buffer: uncommitted per-record overlays awaiting a save
//!
//! Each dirty record holds a full [`Draft`] of its mutable fields. Entries
//! are created or replaced on every edit and leave the buffer only through
//! a discard or a successful flush. The buffer never touches the
//! [`RecordStore`] except when a flush settles.

use std::collections::{btree_map, BTreeMap};
use std::future::Future;

use futures::future::join_all;
use thiserror::Error;

use crate::core::store::RecordStore;
use crate::entities::record::{Draft, FieldError, FieldValue, Record, RecordField, RecordId};

/// Errors from buffering an edit
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("Record {0} not found")]
    UnknownRecord(RecordId),

    #[error(transparent)]
    Field(#[from] FieldError),
}

#[derive(Debug, Clone)]
struct Entry {
    draft: Draft,
    revision: u64,
}

/// Snapshot of one dirty record taken when a flush begins
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub id: RecordId,
    /// Buffer revision the snapshot was taken at
    pub revision: u64,
    /// Full record (canonical + overlay) to persist
    pub record: Record,
}

/// Per-id result of a flush
#[derive(Debug)]
pub struct FlushReport<E> {
    /// Ids persisted and removed from the buffer
    pub saved: Vec<RecordId>,
    /// Ids whose persist call failed; they stay dirty
    pub failed: Vec<(RecordId, E)>,
    /// Ids persisted but edited again while in flight; they stay dirty
    pub redirtied: Vec<RecordId>,
}

/// Overall flush result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was buffered
    Nothing,
    /// Every persist call succeeded
    Complete,
    /// At least one persist call failed
    Partial,
}

impl<E> FlushReport<E> {
    fn empty() -> Self {
        Self {
            saved: Vec::new(),
            failed: Vec::new(),
            redirtied: Vec::new(),
        }
    }

    pub fn outcome(&self) -> FlushOutcome {
        if !self.failed.is_empty() {
            FlushOutcome::Partial
        } else if self.saved.is_empty() && self.redirtied.is_empty() {
            FlushOutcome::Nothing
        } else {
            FlushOutcome::Complete
        }
    }

    pub fn attempted(&self) -> usize {
        self.saved.len() + self.failed.len() + self.redirtied.len()
    }
}

/// Uncommitted edits keyed by record id
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    entries: BTreeMap<RecordId, Entry>,
    next_revision: u64,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer one field edit.
    ///
    /// The overlay is derived from the current effective record: the prior
    /// overlay when the record is already dirty, the canonical record
    /// otherwise. A rejected edit leaves the buffer untouched.
    pub fn set_field(
        &mut self,
        store: &RecordStore,
        id: RecordId,
        field: RecordField,
        value: FieldValue,
    ) -> Result<&Draft, EditError> {
        let canonical = store.get(id).ok_or(EditError::UnknownRecord(id))?;
        let mut draft = match self.entries.get(&id) {
            Some(entry) => entry.draft.clone(),
            None => Draft::from_record(canonical),
        };
        draft.set(field, value)?;

        self.next_revision += 1;
        let entry = Entry {
            draft,
            revision: self.next_revision,
        };
        let slot = match self.entries.entry(id) {
            btree_map::Entry::Occupied(mut occupied) => {
                occupied.insert(entry);
                occupied.into_mut()
            }
            btree_map::Entry::Vacant(vacant) => vacant.insert(entry),
        };
        Ok(&slot.draft)
    }

    pub fn entry(&self, id: RecordId) -> Option<&Draft> {
        self.entries.get(&id).map(|e| &e.draft)
    }

    pub fn is_dirty(&self, id: RecordId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Ids with unsaved changes, ascending
    pub fn dirty_ids(&self) -> Vec<RecordId> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the overlay for one record
    pub fn discard(&mut self, id: RecordId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drop every overlay. Returns how many were discarded.
    pub fn discard_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Drop overlays whose record no longer exists in the store
    pub fn retain_known(&mut self, store: &RecordStore) -> Vec<RecordId> {
        let orphans: Vec<RecordId> = self
            .entries
            .keys()
            .copied()
            .filter(|id| !store.contains(*id))
            .collect();
        for id in &orphans {
            self.entries.remove(id);
        }
        orphans
    }

    /// The record as it should be displayed: overlay applied if dirty
    pub fn effective(&self, canonical: &Record) -> Record {
        match self.entries.get(&canonical.id) {
            Some(entry) => entry.draft.overlay(canonical),
            None => canonical.clone(),
        }
    }

    /// Snapshot every dirty record for persisting
    pub fn begin_flush(&self, store: &RecordStore) -> Vec<PendingSave> {
        self.entries
            .iter()
            .filter_map(|(id, entry)| {
                store.get(*id).map(|canonical| PendingSave {
                    id: *id,
                    revision: entry.revision,
                    record: entry.draft.overlay(canonical),
                })
            })
            .collect()
    }

    /// Apply persist results.
    ///
    /// Successes merge into the store and leave the buffer unless the entry
    /// was edited again after its snapshot. Failures stay buffered.
    pub fn settle<E>(
        &mut self,
        store: &mut RecordStore,
        outcomes: Vec<(PendingSave, Result<Record, E>)>,
    ) -> FlushReport<E> {
        let mut report = FlushReport::empty();

        for (pending, result) in outcomes {
            match result {
                Ok(saved) => {
                    store.upsert(saved);
                    let unchanged = self
                        .entries
                        .get(&pending.id)
                        .is_some_and(|e| e.revision == pending.revision);
                    if unchanged {
                        self.entries.remove(&pending.id);
                        report.saved.push(pending.id);
                    } else if self.entries.contains_key(&pending.id) {
                        report.redirtied.push(pending.id);
                    } else {
                        report.saved.push(pending.id);
                    }
                }
                Err(e) => report.failed.push((pending.id, e)),
            }
        }

        report
    }

    /// Persist every dirty record concurrently and settle the results.
    ///
    /// One independent `persist` call is issued per dirty id; a failure
    /// never blocks the others.
    pub async fn flush<F, Fut, E>(&mut self, store: &mut RecordStore, persist: F) -> FlushReport<E>
    where
        F: Fn(Record) -> Fut,
        Fut: Future<Output = Result<Record, E>>,
    {
        let pending = self.begin_flush(store);
        if pending.is_empty() {
            return FlushReport::empty();
        }

        let results = join_all(pending.iter().map(|p| persist(p.record.clone()))).await;
        let outcomes = pending.into_iter().zip(results).collect();
        self.settle(store, outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::record::Scores;
    use std::time::Duration;

    fn store_with(records: &[(RecordId, [i64; 5])]) -> RecordStore {
        let mut store = RecordStore::new();
        store.replace_all(
            records
                .iter()
                .map(|(id, scores)| {
                    let mut r: Record = serde_json::from_value(serde_json::json!({
                        "id": id,
                        "service": format!("Idea {}", id),
                    }))
                    .unwrap();
                    r.scores = Scores::from_values(*scores);
                    r
                })
                .collect(),
        );
        store
    }

    #[test]
    fn test_set_field_creates_single_overlay() {
        let store = store_with(&[(1, [1, 1, 1, 1, 1]), (2, [0; 5])]);
        let mut buffer = EditBuffer::new();

        buffer
            .set_field(&store, 1, RecordField::Score(0), FieldValue::Score(4))
            .unwrap();

        assert_eq!(buffer.dirty_ids(), vec![1]);
        let draft = buffer.entry(1).unwrap();
        assert_eq!(draft.scores.as_slice(), &[4, 1, 1, 1, 1]);
        assert_eq!(draft.name, "Idea 1");
        // canonical untouched
        assert_eq!(store.get(1).unwrap().scores.get(0), 1);
    }

    #[test]
    fn test_edits_accumulate_on_prior_overlay() {
        let store = store_with(&[(1, [0; 5])]);
        let mut buffer = EditBuffer::new();

        buffer
            .set_field(&store, 1, RecordField::Score(0), FieldValue::Score(3))
            .unwrap();
        buffer
            .set_field(&store, 1, RecordField::Score(1), FieldValue::Score(-8))
            .unwrap();
        buffer
            .set_field(&store, 1, RecordField::Revenue, FieldValue::Revenue(250.0))
            .unwrap();

        let draft = buffer.entry(1).unwrap();
        assert_eq!(draft.scores.as_slice(), &[3, 0, 0, 0, 0]);
        assert_eq!(draft.revenue_estimate, 250.0);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_rejected_edits_leave_buffer_untouched() {
        let store = store_with(&[(1, [0; 5])]);
        let mut buffer = EditBuffer::new();

        let err = buffer
            .set_field(&store, 99, RecordField::Score(0), FieldValue::Score(3))
            .unwrap_err();
        assert_eq!(err, EditError::UnknownRecord(99));

        let err = buffer
            .set_field(&store, 1, RecordField::Score(0), FieldValue::Text("x".into()))
            .unwrap_err();
        assert!(matches!(err, EditError::Field(FieldError::KindMismatch { .. })));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_discard_all_returns_to_canonical() {
        let store = store_with(&[(1, [2; 5]), (2, [3; 5])]);
        let mut buffer = EditBuffer::new();
        buffer
            .set_field(&store, 1, RecordField::Score(0), FieldValue::Score(5))
            .unwrap();
        buffer
            .set_field(&store, 2, RecordField::Name, FieldValue::Text("Other".into()))
            .unwrap();

        assert_eq!(buffer.discard_all(), 2);
        for canonical in store.records() {
            assert_eq!(&buffer.effective(canonical), canonical);
        }
    }

    #[test]
    fn test_retain_known_drops_orphans() {
        let mut store = store_with(&[(1, [0; 5]), (2, [0; 5])]);
        let mut buffer = EditBuffer::new();
        buffer
            .set_field(&store, 2, RecordField::Score(0), FieldValue::Score(1))
            .unwrap();
        store.remove(2);
        assert_eq!(buffer.retain_known(&store), vec![2]);
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_flush_partial_failure_keeps_failed_entry() {
        let mut store = store_with(&[(1, [0; 5]), (2, [0; 5])]);
        let mut buffer = EditBuffer::new();
        buffer
            .set_field(&store, 1, RecordField::Score(0), FieldValue::Score(5))
            .unwrap();
        buffer
            .set_field(&store, 2, RecordField::Score(0), FieldValue::Score(4))
            .unwrap();

        let report = buffer
            .flush(&mut store, |record: Record| async move {
                if record.id == 2 {
                    Err("backend rejected".to_string())
                } else {
                    Ok(record)
                }
            })
            .await;

        assert_eq!(report.outcome(), FlushOutcome::Partial);
        assert_eq!(report.saved, vec![1]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 2);
        assert_eq!(buffer.dirty_ids(), vec![2]);
        // success merged, failure not
        assert_eq!(store.get(1).unwrap().scores.get(0), 5);
        assert_eq!(store.get(2).unwrap().scores.get(0), 0);
    }

    #[tokio::test]
    async fn test_flush_all_success_empties_buffer() {
        let mut store = store_with(&[(1, [0; 5]), (2, [0; 5])]);
        let mut buffer = EditBuffer::new();
        for id in [1, 2] {
            buffer
                .set_field(&store, id, RecordField::Score(2), FieldValue::Score(3))
                .unwrap();
        }

        // the slower call finishes last; order must not matter
        let report = buffer
            .flush(&mut store, |record: Record| async move {
                let delay = if record.id == 1 { 30 } else { 1 };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, String>(record)
            })
            .await;

        assert_eq!(report.outcome(), FlushOutcome::Complete);
        assert!(buffer.is_empty());
        assert!(store.records().iter().all(|r| r.scores.get(2) == 3));
    }

    #[tokio::test]
    async fn test_flush_with_empty_buffer_issues_no_calls() {
        let mut store = store_with(&[(1, [0; 5])]);
        let mut buffer = EditBuffer::new();
        let calls = std::cell::Cell::new(0);
        let report = buffer
            .flush(&mut store, |record: Record| {
                calls.set(calls.get() + 1);
                async move { Ok::<_, String>(record) }
            })
            .await;
        assert_eq!(report.outcome(), FlushOutcome::Nothing);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_edit_during_flight_redirties() {
        let mut store = store_with(&[(1, [0; 5])]);
        let mut buffer = EditBuffer::new();
        buffer
            .set_field(&store, 1, RecordField::Score(0), FieldValue::Score(2))
            .unwrap();

        let pending = buffer.begin_flush(&store);
        assert_eq!(pending.len(), 1);

        // user edits again while the call is in flight
        buffer
            .set_field(&store, 1, RecordField::Score(1), FieldValue::Score(5))
            .unwrap();

        let sent = pending[0].record.clone();
        let outcomes = pending
            .into_iter()
            .map(|p| (p, Ok::<_, String>(sent.clone())))
            .collect();
        let report = buffer.settle(&mut store, outcomes);

        assert_eq!(report.redirtied, vec![1]);
        assert!(buffer.is_dirty(1));
        assert_eq!(store.get(1).unwrap().scores.get(0), 2);
        assert_eq!(buffer.entry(1).unwrap().scores.as_slice(), &[2, 5, 0, 0, 0]);
    }
}
