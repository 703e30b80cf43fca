use crate::domain::estimate::recompute_expected_time;
use crate::domain::models::{
    JournalEntry, RecordFields, RichTextSpan, TaskDraft, TaskPhase, TaskRecord,
};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notion_client::RemoteStore;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileFailure {
    pub operation: &'static str,
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub archived: Vec<String>,
    pub struck_blocks: Vec<String>,
    pub failures: Vec<ReconcileFailure>,
}

impl ReconcileReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.archived.is_empty()
            && self.struck_blocks.is_empty()
            && self.failures.is_empty()
    }

    fn fail(&mut self, operation: &'static str, target: &str, message: String) {
        tracing::error!(operation, target, %message, "operation failed");
        self.failures.push(ReconcileFailure {
            operation,
            target: target.to_string(),
            message,
        });
    }
}

/// Records keyed by name, in the order the store returned them.
struct WorkingSet {
    records: Vec<TaskRecord>,
    by_name: HashMap<String, usize>,
}

impl WorkingSet {
    fn new(existing: Vec<TaskRecord>) -> Self {
        let mut set = Self {
            records: Vec::with_capacity(existing.len()),
            by_name: HashMap::new(),
        };
        for record in existing {
            if let Err(reason) = record.validate() {
                tracing::warn!(record_id = %record.id, %reason, "ignoring invalid record");
                continue;
            }
            if set.by_name.contains_key(&record.name) {
                tracing::warn!(
                    record_id = %record.id,
                    name = %record.name,
                    "duplicate task name in store; keeping the first record"
                );
                continue;
            }
            set.insert(record);
        }
        set
    }

    fn insert(&mut self, record: TaskRecord) {
        self.by_name.insert(record.name.clone(), self.records.len());
        self.records.push(record);
    }

    fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut TaskRecord> {
        let index = *self.by_name.get(name)?;
        self.records.get_mut(index)
    }
}

pub struct Reconciler<S>
where
    S: RemoteStore,
{
    store: Arc<S>,
    store_id: String,
}

impl<S> Reconciler<S>
where
    S: RemoteStore,
{
    pub fn new(store: Arc<S>, store_id: impl Into<String>) -> Self {
        Self {
            store,
            store_id: store_id.into(),
        }
    }

    /// Creates missing records, applies journal progress, then archives
    /// completed records. Remote failures are collected, not propagated.
    pub async fn reconcile(
        &self,
        drafts: &[TaskDraft],
        existing: Vec<TaskRecord>,
        journal: &BTreeMap<String, JournalEntry>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut working = WorkingSet::new(existing);

        self.create_missing(drafts, &mut working, &mut report).await;
        self.apply_progress(journal, &mut working, &mut report).await;
        self.archive_completed(drafts, &working, &mut report).await;

        report
    }

    async fn create_missing(
        &self,
        drafts: &[TaskDraft],
        working: &mut WorkingSet,
        report: &mut ReconcileReport,
    ) {
        for draft in drafts {
            if working.contains(&draft.name) {
                continue;
            }
            if draft.is_struck() {
                tracing::debug!(name = %draft.name, "skipping struck-through task");
                continue;
            }
            let fields = RecordFields::for_new_task(draft);
            match self.store.create_record(&self.store_id, &fields).await {
                Ok(id) => {
                    tracing::info!(name = %draft.name, record_id = %id, "created task record");
                    working.insert(TaskRecord {
                        id,
                        name: draft.name.clone(),
                        deadline: draft.deadline.clone(),
                        progress: 0,
                        expected_time: fields.expected_time.unwrap_or_default(),
                    });
                    report.created.push(draft.name.clone());
                }
                Err(error) => report.fail("create_record", &draft.name, error.to_string()),
            }
        }
    }

    async fn apply_progress(
        &self,
        journal: &BTreeMap<String, JournalEntry>,
        working: &mut WorkingSet,
        report: &mut ReconcileReport,
    ) {
        for entry in journal.values() {
            let Some(record) = working.get_mut(&entry.task_name) else {
                tracing::debug!(name = %entry.task_name, "journal entry has no matching record");
                continue;
            };
            let new_progress = entry.progress_percent;
            if !(0..=100).contains(&new_progress) {
                report.fail(
                    "patch_record",
                    &entry.task_name,
                    format!("progress {new_progress} is outside 0..=100"),
                );
                continue;
            }

            let expected_time =
                recompute_expected_time(record.progress, record.expected_time, new_progress);
            let fields = RecordFields::progress_update(new_progress, expected_time);
            match self.store.patch_record(&record.id, &fields).await {
                Ok(()) => {
                    tracing::info!(
                        name = %record.name,
                        from = record.progress,
                        to = new_progress,
                        time_spent = entry.time_spent,
                        expected_time,
                        phase = TaskPhase::from_progress(new_progress).as_str(),
                        "updated task progress"
                    );
                    record.progress = new_progress;
                    record.expected_time = expected_time;
                    report.updated.push(record.name.clone());
                }
                Err(error) => report.fail("patch_record", &entry.task_name, error.to_string()),
            }
        }
    }

    async fn archive_completed(
        &self,
        drafts: &[TaskDraft],
        working: &WorkingSet,
        report: &mut ReconcileReport,
    ) {
        for record in &working.records {
            if record.phase() != TaskPhase::Complete {
                continue;
            }
            if let Err(error) = self.strike_through(drafts, record, report).await {
                report.fail("patch_block", &record.name, error.to_string());
                continue;
            }
            match self.store.archive_record(&record.id).await {
                Ok(()) => {
                    tracing::info!(name = %record.name, record_id = %record.id, "archived task record");
                    report.archived.push(record.name.clone());
                }
                Err(error) => report.fail("archive_record", &record.name, error.to_string()),
            }
        }
    }

    /// Strikes through the heading and bullets the record was parsed from.
    /// Stops at the first failed block so the record is left for the next run.
    async fn strike_through(
        &self,
        drafts: &[TaskDraft],
        record: &TaskRecord,
        report: &mut ReconcileReport,
    ) -> Result<(), InfraError> {
        let Some(draft) = drafts.iter().find(|draft| draft.name == record.name) else {
            tracing::debug!(name = %record.name, "completed record has no source blocks");
            return Ok(());
        };
        for block in &draft.source_blocks {
            if block.text.trim().is_empty() {
                continue;
            }
            self.store
                .patch_block(&block.id, &block.kind, &[RichTextSpan::struck(block.text.clone())])
                .await?;
            report.struck_blocks.push(block.id.clone());
        }
        Ok(())
    }
}
