use crate::application::reconciler::{ReconcileReport, Reconciler};
use crate::domain::journal_parser::parse_journal;
use crate::domain::labels::{JournalMarkers, LabelSet};
use crate::domain::task_parser::{parse_tasks, parse_todos};
use crate::infrastructure::config::SyncConfig;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notion_client::RemoteStore;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;

/// The three Notion objects one run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTargets {
    pub task_page_id: String,
    pub journal_page_id: String,
    pub database_id: String,
}

impl From<&SyncConfig> for SyncTargets {
    fn from(config: &SyncConfig) -> Self {
        Self {
            task_page_id: config.task_page_id.clone(),
            journal_page_id: config.journal_page_id.clone(),
            database_id: config.database_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Also import unchecked to-do blocks of the task page as name-only tasks.
    pub include_todos: bool,
}

pub struct TaskSyncService<S>
where
    S: RemoteStore,
{
    store: Arc<S>,
    targets: SyncTargets,
    labels: LabelSet,
    markers: JournalMarkers,
}

impl<S> TaskSyncService<S>
where
    S: RemoteStore,
{
    pub fn new(store: Arc<S>, targets: SyncTargets) -> Self {
        Self {
            store,
            targets,
            labels: LabelSet::default(),
            markers: JournalMarkers::default(),
        }
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_markers(mut self, markers: JournalMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// One full pass. Reads and journal parsing fail the run; write failures
    /// are collected in the returned report.
    pub async fn run(
        &self,
        reference_date: NaiveDate,
        options: &SyncOptions,
    ) -> Result<ReconcileReport, InfraError> {
        let task_blocks = self.store.fetch_blocks(&self.targets.task_page_id).await?;
        let mut drafts = parse_tasks(&task_blocks, &self.labels);

        if options.include_todos {
            let mut known: HashSet<String> = drafts.iter().map(|draft| draft.name.clone()).collect();
            for todo in parse_todos(&task_blocks) {
                if todo.checked || !known.insert(todo.name.clone()) {
                    continue;
                }
                drafts.push(todo.to_draft());
            }
        }

        let journal_blocks = self.store.fetch_blocks(&self.targets.journal_page_id).await?;
        let journal = parse_journal(&journal_blocks, reference_date, &self.markers)?;

        let existing = self.store.query_records(&self.targets.database_id).await?;

        tracing::info!(
            date = %reference_date,
            drafts = drafts.len(),
            journal_entries = journal.len(),
            records = existing.len(),
            "starting reconciliation"
        );

        let reconciler = Reconciler::new(Arc::clone(&self.store), self.targets.database_id.clone());
        let report = reconciler.reconcile(&drafts, existing, &journal).await;

        tracing::info!(
            created = report.created.len(),
            updated = report.updated.len(),
            archived = report.archived.len(),
            failures = report.failures.len(),
            "reconciliation finished"
        );
        Ok(report)
    }
}
