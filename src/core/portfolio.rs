//! Portfolio session: the single owner of store, buffer and view state
//!
//! All mutation goes through this type. Subscribers observe changes and
//! transient notices over a broadcast channel; reads hand out owned
//! snapshots.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::core::buffer::{EditBuffer, EditError, FlushOutcome, FlushReport};
use crate::core::diagnose::{self, Diagnosis};
use crate::core::export::{self, ExportError};
use crate::core::gateway::{Gateway, GatewayError};
use crate::core::ranking::{self, Filter, RankedRow, RankedView, SortKey, SortState, ViewState};
use crate::core::report::{self, ClusterSummary};
use crate::core::store::RecordStore;
use crate::entities::record::{FieldError, FieldValue, NewRecord, Record, RecordField, RecordId};

const EVENT_CAPACITY: usize = 64;

/// Severity of a transient notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Events published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum PortfolioEvent {
    /// A bulk load finished
    Loaded { count: usize },
    /// A bulk load failed; the view shows the diagnosis until the next load
    LoadFailed(Diagnosis),
    /// Store, buffer or view state changed
    Changed,
    /// Transient user-facing message
    Notice { level: NoticeLevel, message: String },
}

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("Record {0} not found")]
    UnknownRecord(RecordId),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

pub struct Portfolio {
    gateway: Arc<dyn Gateway>,
    store: RecordStore,
    buffer: EditBuffer,
    view: ViewState,
    load_error: Option<Diagnosis>,
    events: broadcast::Sender<PortfolioEvent>,
}

impl Portfolio {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            store: RecordStore::new(),
            buffer: EditBuffer::new(),
            view: ViewState::default(),
            load_error: None,
            events,
        }
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<PortfolioEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: PortfolioEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Pull the stored page back into range, then tell subscribers
    fn changed(&mut self) {
        let matched = ranking::rank_all(&self.store, &self.buffer, &self.view).len();
        self.view.page = ranking::clamp_page(self.view.page, ranking::page_count(matched));
        self.emit(PortfolioEvent::Changed);
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(PortfolioEvent::Notice {
            level,
            message: message.into(),
        });
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    /// Replace the store with a fresh backend listing.
    ///
    /// On failure the store is left as it was and the classified error is
    /// kept until the next successful load.
    pub async fn load(&mut self) -> Result<usize, Diagnosis> {
        tracing::debug!(backend = %self.gateway.describe(), "loading portfolio");
        match self.gateway.fetch_all().await {
            Ok(records) => {
                let count = records.len();
                self.store.replace_all(records);
                let orphans = self.buffer.retain_known(&self.store);
                if !orphans.is_empty() {
                    tracing::warn!(?orphans, "dropped edits for records no longer on the backend");
                }
                self.load_error = None;
                tracing::info!(count, "portfolio loaded");
                self.emit(PortfolioEvent::Loaded { count });
                self.changed();
                Ok(count)
            }
            Err(e) => {
                let diagnosis = diagnose::classify(&e);
                tracing::warn!(error = %e, category = %diagnosis.category, "portfolio load failed");
                self.load_error = Some(diagnosis.clone());
                self.emit(PortfolioEvent::LoadFailed(diagnosis.clone()));
                Err(diagnosis)
            }
        }
    }

    /// Reload and confirm with a notice
    pub async fn refresh(&mut self) -> Result<usize, Diagnosis> {
        let count = self.load().await?;
        self.notify(NoticeLevel::Success, "Data synchronized successfully");
        Ok(count)
    }

    /// Diagnosis of the last failed load, cleared by a successful one
    pub fn load_error(&self) -> Option<&Diagnosis> {
        self.load_error.as_ref()
    }

    fn fail<T>(&self, action: &str, error: impl Into<PortfolioError>) -> Result<T, PortfolioError> {
        let error = error.into();
        self.notify(NoticeLevel::Error, format!("Failed to {}: {}", action, error));
        Err(error)
    }

    /// Validate and create a record; validation failures never reach the backend
    pub async fn add(&mut self, new: NewRecord) -> Result<Record, PortfolioError> {
        let new = match new.validated() {
            Ok(new) => new,
            Err(e) => return self.fail("add the idea", e),
        };
        match self.gateway.create(new).await {
            Ok(record) => {
                tracing::info!(id = record.id, "idea added");
                self.store.upsert(record.clone());
                self.notify(NoticeLevel::Success, "Idea added successfully");
                self.changed();
                Ok(record)
            }
            Err(e) => self.fail("add the idea", e),
        }
    }

    /// Delete a record and any pending edits for it
    pub async fn delete(&mut self, id: RecordId) -> Result<(), PortfolioError> {
        if !self.store.contains(id) {
            return self.fail("delete the idea", PortfolioError::UnknownRecord(id));
        }
        match self.gateway.delete(id).await {
            Ok(_) => {
                self.store.remove(id);
                self.buffer.discard(id);
                tracing::info!(id, "idea deleted");
                self.notify(NoticeLevel::Success, "Idea deleted");
                self.changed();
                Ok(())
            }
            Err(e) => self.fail("delete the idea", e),
        }
    }

    /// Buffer a typed edit and return the record as now displayed
    pub fn set_field(
        &mut self,
        id: RecordId,
        field: RecordField,
        value: FieldValue,
    ) -> Result<Record, PortfolioError> {
        self.buffer.set_field(&self.store, id, field, value)?;
        self.changed();
        self.record(id).ok_or(PortfolioError::UnknownRecord(id))
    }

    /// Buffer an edit given as text, e.g. `("feasibility", "4")`
    pub fn set_field_str(
        &mut self,
        id: RecordId,
        field: &str,
        raw: &str,
    ) -> Result<Record, PortfolioError> {
        let field: RecordField = field.parse()?;
        let value = field.parse_value(raw)?;
        self.set_field(id, field, value)
    }

    pub fn discard(&mut self, id: RecordId) -> bool {
        let discarded = self.buffer.discard(id);
        if discarded {
            self.changed();
        }
        discarded
    }

    /// Drop every unsaved edit
    pub fn discard_all(&mut self) -> usize {
        let count = self.buffer.discard_all();
        if count > 0 {
            self.notify(NoticeLevel::Info, format!("Discarded changes to {} idea(s)", count));
            self.changed();
        }
        count
    }

    /// Flush the edit buffer through the gateway
    pub async fn save(&mut self) -> FlushReport<GatewayError> {
        let gateway = Arc::clone(&self.gateway);
        let report = self
            .buffer
            .flush(&mut self.store, |record| {
                let gateway = Arc::clone(&gateway);
                async move { gateway.update(record).await }
            })
            .await;

        match report.outcome() {
            FlushOutcome::Nothing => self.notify(NoticeLevel::Info, "No changes to save"),
            FlushOutcome::Complete => {
                tracing::info!(saved = report.saved.len(), "all changes saved");
                self.notify(
                    NoticeLevel::Success,
                    format!("Saved {} idea(s)", report.saved.len()),
                );
            }
            FlushOutcome::Partial => {
                tracing::warn!(
                    saved = report.saved.len(),
                    failed = report.failed.len(),
                    "some changes could not be saved"
                );
                for (id, error) in &report.failed {
                    self.notify(
                        NoticeLevel::Error,
                        format!("Failed to save idea {}: {}", id, error),
                    );
                }
            }
        }
        if report.attempted() > 0 {
            self.changed();
        }
        report
    }

    /// Send a record to the automation workflow; never touches the store
    pub async fn trigger_automation(&self, id: RecordId, note: &str) -> Result<(), PortfolioError> {
        let Some(record) = self.store.get(id) else {
            return self.fail("send to automation", PortfolioError::UnknownRecord(id));
        };
        match self.gateway.trigger_automation(record, note).await {
            Ok(()) => {
                self.notify(NoticeLevel::Success, "Idea sent to the automation workflow");
                Ok(())
            }
            Err(e) => self.fail("send to automation", e),
        }
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.view.set_filter(filter);
        self.changed();
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.view.toggle_sort(key);
        self.changed();
    }

    /// Select key and direction directly
    pub fn set_sort(&mut self, sort: SortState) {
        self.view.sort = sort;
        self.changed();
    }

    pub fn set_page(&mut self, page: usize) {
        self.view.set_page(page);
        self.changed();
    }

    /// Current page of the ranked view
    pub fn view(&self) -> RankedView {
        ranking::rank(&self.store, &self.buffer, &self.view)
    }

    /// Every row passing the filter, sorted, without paging
    pub fn ranked(&self) -> Vec<RankedRow> {
        ranking::rank_all(&self.store, &self.buffer, &self.view)
    }

    /// A record as displayed (edits applied)
    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.store.get(id).map(|r| self.buffer.effective(r))
    }

    /// Canonical records, buffer excluded
    pub fn snapshot(&self) -> Vec<Record> {
        self.store.records().to_vec()
    }

    pub fn clusters(&self) -> Vec<String> {
        self.store.clusters()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn is_dirty(&self, id: RecordId) -> bool {
        self.buffer.is_dirty(id)
    }

    pub fn dirty_ids(&self) -> Vec<RecordId> {
        self.buffer.dirty_ids()
    }

    /// CSV of the canonical store; refuses an empty portfolio
    pub fn export_csv(&self) -> Result<String, ExportError> {
        if self.store.is_empty() {
            return Err(ExportError::Empty);
        }
        export::to_csv(self.store.records())
    }

    pub fn export_to(&self, path: &Path) -> Result<usize, ExportError> {
        export::write_file(self.store.records(), path)
    }

    pub fn cluster_report(&self) -> Vec<ClusterSummary> {
        report::cluster_summaries(self.store.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::{Classification, Status};
    use crate::core::gateway::DemoGateway;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Demo backend that rejects updates for chosen ids and, optionally, every automation
    struct Flaky {
        inner: DemoGateway,
        reject: HashSet<RecordId>,
        webhook_down: bool,
    }

    #[async_trait]
    impl Gateway for Flaky {
        fn describe(&self) -> String {
            "flaky".to_string()
        }
        fn is_demo(&self) -> bool {
            true
        }
        async fn fetch_all(&self) -> Result<Vec<Record>, GatewayError> {
            self.inner.fetch_all().await
        }
        async fn create(&self, record: NewRecord) -> Result<Record, GatewayError> {
            self.inner.create(record).await
        }
        async fn update(&self, record: Record) -> Result<Record, GatewayError> {
            if self.reject.contains(&record.id) {
                return Err(GatewayError::Business {
                    message: format!("Service with id {} not found.", record.id),
                    code: None,
                });
            }
            self.inner.update(record).await
        }
        async fn delete(&self, id: RecordId) -> Result<RecordId, GatewayError> {
            self.inner.delete(id).await
        }
        async fn trigger_automation(&self, record: &Record, note: &str) -> Result<(), GatewayError> {
            if self.webhook_down {
                return Err(GatewayError::Webhook {
                    status: 502,
                    body: "Bad Gateway".to_string(),
                });
            }
            self.inner.trigger_automation(record, note).await
        }
    }

    /// Backend that is never reachable
    struct Offline;

    #[async_trait]
    impl Gateway for Offline {
        fn describe(&self) -> String {
            "offline".to_string()
        }
        fn is_demo(&self) -> bool {
            false
        }
        async fn fetch_all(&self) -> Result<Vec<Record>, GatewayError> {
            Err(GatewayError::Transport("TypeError: Failed to fetch".to_string()))
        }
        async fn create(&self, _: NewRecord) -> Result<Record, GatewayError> {
            Err(GatewayError::Transport("offline".to_string()))
        }
        async fn update(&self, _: Record) -> Result<Record, GatewayError> {
            Err(GatewayError::Transport("offline".to_string()))
        }
        async fn delete(&self, _: RecordId) -> Result<RecordId, GatewayError> {
            Err(GatewayError::Transport("offline".to_string()))
        }
        async fn trigger_automation(&self, _: &Record, _: &str) -> Result<(), GatewayError> {
            Err(GatewayError::Transport("offline".to_string()))
        }
    }

    async fn loaded(gateway: Arc<dyn Gateway>) -> Portfolio {
        let mut portfolio = Portfolio::new(gateway);
        portfolio.load().await.unwrap();
        portfolio
    }

    fn new_record(name: &str) -> NewRecord {
        NewRecord {
            name: name.to_string(),
            description: "Benefit".to_string(),
            target_audience: "Everyone".to_string(),
            business_model: "rental".to_string(),
            cluster: "Flexible Access".to_string(),
            status: Status::UnderReview,
            creator_name: "Dana".to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_and_default_view() {
        let portfolio = loaded(Arc::new(DemoGateway::seeded())).await;
        let view = portfolio.view();
        assert_eq!(view.matched, 3);
        assert_eq!(view.page, 1);
        // total descending: 21, 21, 18
        assert_eq!(view.rows[2].record.id, 3);
        assert_eq!(view.rows[2].classification, Classification::High);
    }

    #[tokio::test]
    async fn test_partial_save_keeps_failed_entry_dirty() {
        let gateway = Flaky {
            inner: DemoGateway::seeded(),
            reject: [2].into_iter().collect(),
            webhook_down: false,
        };
        let mut portfolio = loaded(Arc::new(gateway)).await;
        let mut events = portfolio.subscribe();

        portfolio.set_field_str(1, "feasibility", "1").unwrap();
        portfolio.set_field_str(2, "feasibility", "1").unwrap();

        let report = portfolio.save().await;
        assert_eq!(report.outcome(), FlushOutcome::Partial);
        assert_eq!(report.saved, vec![1]);
        assert_eq!(portfolio.dirty_ids(), vec![2]);

        // canonical store reflects only the success
        let snapshot = portfolio.snapshot();
        assert_eq!(snapshot.iter().find(|r| r.id == 1).unwrap().scores.get(3), 1);
        assert_eq!(snapshot.iter().find(|r| r.id == 2).unwrap().scores.get(3), 4);

        let mut saw_failure = false;
        while let Ok(event) = events.try_recv() {
            if let PortfolioEvent::Notice {
                level: NoticeLevel::Error,
                message,
            } = event
            {
                assert!(message.contains("idea 2"));
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    #[tokio::test]
    async fn test_full_save_empties_buffer() {
        let mut portfolio = loaded(Arc::new(DemoGateway::seeded())).await;
        portfolio.set_field_str(3, "score_0", "99").unwrap();
        portfolio.set_field_str(3, "revenue", "-5").unwrap();

        let shown = portfolio.record(3).unwrap();
        assert_eq!(shown.scores.get(0), 5);
        assert_eq!(shown.revenue_estimate, 0.0);

        let report = portfolio.save().await;
        assert_eq!(report.outcome(), FlushOutcome::Complete);
        assert!(portfolio.dirty_ids().is_empty());

        // the backend kept it too
        let fresh = loaded(Arc::clone(portfolio.gateway())).await;
        assert_eq!(fresh.record(3).unwrap().scores.get(0), 5);
    }

    #[tokio::test]
    async fn test_invalid_edits_are_rejected_locally() {
        let mut portfolio = loaded(Arc::new(DemoGateway::seeded())).await;
        assert!(matches!(
            portfolio.set_field_str(1, "colour", "red"),
            Err(PortfolioError::Field(FieldError::UnknownField(_)))
        ));
        assert!(matches!(
            portfolio.set_field_str(99, "name", "x"),
            Err(PortfolioError::Edit(EditError::UnknownRecord(99)))
        ));
        assert!(portfolio.dirty_ids().is_empty());
    }

    #[tokio::test]
    async fn test_add_validates_before_backend() {
        let mut portfolio = loaded(Arc::new(DemoGateway::seeded())).await;
        let err = portfolio
            .add(NewRecord {
                cluster: String::new(),
                ..new_record("No cluster")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioError::Field(FieldError::MissingField("cluster"))));
        assert_eq!(portfolio.len(), 3);

        let created = portfolio.add(new_record("Drone Repair")).await.unwrap();
        assert_eq!(created.id, 4);
        assert_eq!(portfolio.len(), 4);
    }

    #[tokio::test]
    async fn test_delete_drops_pending_edit() {
        let mut portfolio = loaded(Arc::new(DemoGateway::seeded())).await;
        portfolio.set_field_str(2, "name", "Renamed").unwrap();
        portfolio.delete(2).await.unwrap();

        assert!(portfolio.record(2).is_none());
        assert!(!portfolio.is_dirty(2));
        assert!(matches!(
            portfolio.delete(2).await,
            Err(PortfolioError::UnknownRecord(2))
        ));
    }

    #[tokio::test]
    async fn test_discard_all_restores_canonical_view() {
        let mut portfolio = loaded(Arc::new(DemoGateway::seeded())).await;
        let before = portfolio.view();
        portfolio.set_field_str(3, "alignment", "5").unwrap();
        portfolio.set_field_str(1, "status", "cancelled").unwrap();
        assert_ne!(portfolio.view(), before);

        assert_eq!(portfolio.discard_all(), 2);
        assert_eq!(portfolio.view().rows.len(), before.rows.len());
        for (a, b) in portfolio.view().rows.iter().zip(before.rows.iter()) {
            assert_eq!(a.record, b.record);
            assert!(!a.dirty);
        }
    }

    #[tokio::test]
    async fn test_load_failure_is_classified_and_kept() {
        let mut portfolio = Portfolio::new(Arc::new(Offline));
        let diagnosis = portfolio.load().await.unwrap_err();
        assert_eq!(
            diagnosis.category,
            crate::core::diagnose::ErrorCategory::Connectivity
        );
        assert!(portfolio.load_error().is_some());
        assert!(portfolio.is_empty());
    }

    #[tokio::test]
    async fn test_export_refuses_empty_store() {
        let portfolio = Portfolio::new(Arc::new(DemoGateway::with_records(Vec::new())));
        assert!(matches!(portfolio.export_csv(), Err(ExportError::Empty)));
    }

    #[tokio::test]
    async fn test_export_ignores_buffer() {
        let mut portfolio = loaded(Arc::new(DemoGateway::seeded())).await;
        portfolio.set_field_str(1, "name", "Unsaved Name").unwrap();
        let csv = portfolio.export_csv().unwrap();
        assert!(!csv.contains("Unsaved Name"));
        assert!(csv.contains("Smart Home Consulting"));
    }

    #[tokio::test]
    async fn test_automation_failure_leaves_store_untouched() {
        let gateway = Flaky {
            inner: DemoGateway::seeded(),
            reject: HashSet::new(),
            webhook_down: true,
        };
        let mut portfolio = loaded(Arc::new(gateway)).await;
        portfolio.set_field_str(2, "feasibility", "1").unwrap();
        let snapshot = portfolio.snapshot();
        let view = portfolio.view();
        let mut events = portfolio.subscribe();

        let err = portfolio.trigger_automation(1, "review please").await.unwrap_err();
        assert!(matches!(err, PortfolioError::Gateway(GatewayError::Webhook { status: 502, .. })));

        assert_eq!(portfolio.snapshot(), snapshot);
        assert_eq!(portfolio.view(), view);
        assert_eq!(portfolio.dirty_ids(), vec![2]);
        match events.try_recv() {
            Ok(PortfolioEvent::Notice { level, message }) => {
                assert_eq!(level, NoticeLevel::Error);
                assert!(message.starts_with("Failed to send to automation"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_automation_unknown_id_is_rejected() {
        let portfolio = loaded(Arc::new(DemoGateway::seeded())).await;
        assert!(matches!(
            portfolio.trigger_automation(99, "x").await,
            Err(PortfolioError::UnknownRecord(99))
        ));
        portfolio.trigger_automation(1, "review please").await.unwrap();
        assert_eq!(portfolio.len(), 3);
    }

    #[tokio::test]
    async fn test_stored_page_follows_shrinking_portfolio() {
        let records: Vec<Record> = (1..=11)
            .map(|id| {
                serde_json::from_value(serde_json::json!({
                    "id": id,
                    "service": format!("Idea {}", id),
                    "cluster": "Smart Home"
                }))
                .unwrap()
            })
            .collect();
        let mut portfolio = loaded(Arc::new(DemoGateway::with_records(records))).await;

        portfolio.set_page(2);
        assert_eq!(portfolio.view().page, 2);
        assert_eq!(portfolio.view().page_count, 2);

        portfolio.delete(11).await.unwrap();
        assert_eq!(portfolio.view_state().page, 1);
        assert_eq!(portfolio.view().page_count, 1);

        // growing back does not jump to the old page
        portfolio.add(new_record("Drone Repair")).await.unwrap();
        assert_eq!(portfolio.view().page_count, 2);
        assert_eq!(portfolio.view_state().page, 1);
        assert_eq!(portfolio.view().page, 1);

        portfolio.set_page(40);
        assert_eq!(portfolio.view_state().page, 2);
    }

    #[tokio::test]
    async fn test_filter_change_resets_page() {
        let mut portfolio = loaded(Arc::new(DemoGateway::seeded())).await;
        portfolio.set_page(3);
        portfolio.set_filter(Filter {
            cluster: Some("Tech Support".to_string()),
            ..Default::default()
        });
        assert_eq!(portfolio.view_state().page, 1);
        assert_eq!(portfolio.view().matched, 1);
    }
}
