use crate::domain::models::{BlockKind, DocumentBlock, RecordFields, RichTextSpan, TaskRecord};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notion_client::{RemoteStore, StoreSummary};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct StoreState {
    pages: HashMap<String, Vec<DocumentBlock>>,
    records: Vec<(String, TaskRecord)>,
    archived: Vec<String>,
    block_patches: HashMap<String, Vec<RichTextSpan>>,
    failures: HashSet<(String, String)>,
    calls: Vec<String>,
    columns: Vec<String>,
    next_id: u64,
}

/// Remote store held in memory, with per-call failure injection.
#[derive(Debug, Default)]
pub struct InMemoryRemoteStore {
    state: Mutex<StoreState>,
}

impl InMemoryRemoteStore {
    pub fn with_page(self, page_id: &str, blocks: Vec<DocumentBlock>) -> Self {
        self.lock().pages.insert(page_id.to_string(), blocks);
        self
    }

    pub fn with_record(self, store_id: &str, record: TaskRecord) -> Self {
        self.lock().records.push((store_id.to_string(), record));
        self
    }

    pub fn with_columns(self, columns: &[&str]) -> Self {
        self.lock().columns = columns.iter().map(|column| column.to_string()).collect();
        self
    }

    /// Makes `operation` fail for `target` (a record, block, or store id).
    pub fn failing(self, operation: &str, target: &str) -> Self {
        self.lock()
            .failures
            .insert((operation.to_string(), target.to_string()));
        self
    }

    pub fn record(&self, record_id: &str) -> Option<TaskRecord> {
        self.lock()
            .records
            .iter()
            .find(|(_, record)| record.id == record_id)
            .map(|(_, record)| record.clone())
    }

    pub fn archived(&self) -> Vec<String> {
        self.lock().archived.clone()
    }

    pub fn block_patch(&self, block_id: &str) -> Option<Vec<RichTextSpan>> {
        self.lock().block_patches.get(block_id).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn write_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| !call.starts_with("fetch_blocks") && !call.starts_with("query_records"))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(state: &mut StoreState, operation: &'static str, target: &str) -> Result<(), InfraError> {
        state.calls.push(format!("{operation}:{target}"));
        if state
            .failures
            .contains(&(operation.to_string(), target.to_string()))
        {
            return Err(InfraError::Remote {
                operation,
                status: 500,
                body: format!("injected failure for {target}"),
            });
        }
        Ok(())
    }

    fn apply(record: &mut TaskRecord, fields: &RecordFields) {
        if let Some(name) = fields.name.as_ref() {
            record.name = name.clone();
        }
        if let Some(deadline) = fields.deadline.as_ref() {
            record.deadline = Some(deadline.clone());
        }
        if let Some(progress) = fields.progress {
            record.progress = progress;
        }
        if let Some(expected_time) = fields.expected_time {
            record.expected_time = expected_time;
        }
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch_blocks(&self, container_id: &str) -> Result<Vec<DocumentBlock>, InfraError> {
        let mut state = self.lock();
        Self::enter(&mut state, "fetch_blocks", container_id)?;
        let blocks = state.pages.get(container_id).cloned().unwrap_or_default();
        Ok(blocks
            .into_iter()
            .map(|mut block| {
                if let Some(spans) = state.block_patches.get(&block.id) {
                    block.text = spans.iter().map(|span| span.content.as_str()).collect();
                    block.struck = !spans.is_empty() && spans.iter().all(|span| span.strikethrough);
                }
                block
            })
            .collect())
    }

    async fn query_records(&self, store_id: &str) -> Result<Vec<TaskRecord>, InfraError> {
        let mut state = self.lock();
        Self::enter(&mut state, "query_records", store_id)?;
        Ok(state
            .records
            .iter()
            .filter(|(owner, record)| owner == store_id && !state.archived.contains(&record.id))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn create_record(&self, store_id: &str, fields: &RecordFields) -> Result<String, InfraError> {
        let mut state = self.lock();
        let target = fields.name.clone().unwrap_or_default();
        Self::enter(&mut state, "create_record", &target)?;
        state.next_id += 1;
        let mut record = TaskRecord {
            id: format!("rec-new-{}", state.next_id),
            name: String::new(),
            deadline: None,
            progress: 0,
            expected_time: 0.0,
        };
        Self::apply(&mut record, fields);
        let id = record.id.clone();
        state.records.push((store_id.to_string(), record));
        Ok(id)
    }

    async fn patch_record(&self, record_id: &str, fields: &RecordFields) -> Result<(), InfraError> {
        let mut state = self.lock();
        Self::enter(&mut state, "patch_record", record_id)?;
        let record = state
            .records
            .iter_mut()
            .map(|(_, record)| record)
            .find(|record| record.id == record_id)
            .ok_or_else(|| InfraError::Remote {
                operation: "patch_record",
                status: 404,
                body: format!("no record {record_id}"),
            })?;
        Self::apply(record, fields);
        Ok(())
    }

    async fn archive_record(&self, record_id: &str) -> Result<(), InfraError> {
        let mut state = self.lock();
        Self::enter(&mut state, "archive_record", record_id)?;
        state.archived.push(record_id.to_string());
        Ok(())
    }

    async fn patch_block(
        &self,
        block_id: &str,
        _kind: &BlockKind,
        rich_text: &[RichTextSpan],
    ) -> Result<(), InfraError> {
        let mut state = self.lock();
        Self::enter(&mut state, "patch_block", block_id)?;
        state
            .block_patches
            .insert(block_id.to_string(), rich_text.to_vec());
        Ok(())
    }

    async fn retrieve_store(&self, store_id: &str) -> Result<StoreSummary, InfraError> {
        let mut state = self.lock();
        Self::enter(&mut state, "retrieve_store", store_id)?;
        Ok(StoreSummary {
            id: store_id.to_string(),
            title: "Tasks".to_string(),
            columns: state.columns.clone(),
        })
    }
}
