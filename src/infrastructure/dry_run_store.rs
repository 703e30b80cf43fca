use crate::domain::models::{BlockKind, DocumentBlock, RecordFields, RichTextSpan, TaskRecord};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notion_client::{RemoteStore, StoreSummary};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Passes reads through and turns every write into a log line.
pub struct DryRunStore<S: RemoteStore> {
    inner: Arc<S>,
    next_id: AtomicU64,
}

impl<S: RemoteStore> DryRunStore<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for DryRunStore<S> {
    async fn fetch_blocks(&self, container_id: &str) -> Result<Vec<DocumentBlock>, InfraError> {
        self.inner.fetch_blocks(container_id).await
    }

    async fn query_records(&self, store_id: &str) -> Result<Vec<TaskRecord>, InfraError> {
        self.inner.query_records(store_id).await
    }

    async fn create_record(&self, store_id: &str, fields: &RecordFields) -> Result<String, InfraError> {
        let id = format!("dry-run-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::info!(
            store_id,
            name = fields.name.as_deref().unwrap_or_default(),
            deadline = fields.deadline.as_deref().unwrap_or_default(),
            expected_time = fields.expected_time.unwrap_or_default(),
            "dry run: would create record"
        );
        Ok(id)
    }

    async fn patch_record(&self, record_id: &str, fields: &RecordFields) -> Result<(), InfraError> {
        tracing::info!(
            record_id,
            progress = ?fields.progress,
            expected_time = ?fields.expected_time,
            "dry run: would patch record"
        );
        Ok(())
    }

    async fn archive_record(&self, record_id: &str) -> Result<(), InfraError> {
        tracing::info!(record_id, "dry run: would archive record");
        Ok(())
    }

    async fn patch_block(
        &self,
        block_id: &str,
        kind: &BlockKind,
        rich_text: &[RichTextSpan],
    ) -> Result<(), InfraError> {
        tracing::info!(
            block_id,
            kind = kind.type_tag(),
            spans = rich_text.len(),
            "dry run: would strike through block"
        );
        Ok(())
    }

    async fn retrieve_store(&self, store_id: &str) -> Result<StoreSummary, InfraError> {
        self.inner.retrieve_store(store_id).await
    }
}
