//! Canonical in-memory record collection

use crate::entities::record::{Record, RecordId};

/// The canonical records as last confirmed by the backend, in backend order
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with a fresh backend listing
    pub fn replace_all(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    /// Insert or replace a record by id. New records are appended.
    pub fn upsert(&mut self, record: Record) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Remove a record, returning it if it was present
    pub fn remove(&mut self, id: RecordId) -> Option<Record> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.get(id).is_some()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct non-empty cluster names present in the store, sorted
    pub fn clusters(&self) -> Vec<String> {
        let mut clusters: Vec<String> = self
            .records
            .iter()
            .map(|r| r.cluster.clone())
            .filter(|c| !c.is_empty())
            .collect();
        clusters.sort();
        clusters.dedup();
        clusters
    }
}
