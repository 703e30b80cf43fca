use crate::domain::models::{BlockKind, DocumentBlock, RecordFields, RichTextSpan, TaskRecord};
use crate::infrastructure::block_mapper::{decode_block, encode_rich_text_patch};
use crate::infrastructure::config::SyncConfig;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::record_schema::{RecordSchema, plain_text};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::{Value, json};
use url::Url;

const PAGE_SIZE: u32 = 100;
const NOTION_VERSION_HEADER: &str = "Notion-Version";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub id: String,
    pub title: String,
    pub columns: Vec<String>,
}

/// Reads and writes against the page and database endpoints.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_blocks(&self, container_id: &str) -> Result<Vec<DocumentBlock>, InfraError>;

    async fn query_records(&self, store_id: &str) -> Result<Vec<TaskRecord>, InfraError>;

    /// Returns the id of the created record.
    async fn create_record(&self, store_id: &str, fields: &RecordFields) -> Result<String, InfraError>;

    async fn patch_record(&self, record_id: &str, fields: &RecordFields) -> Result<(), InfraError>;

    async fn archive_record(&self, record_id: &str) -> Result<(), InfraError>;

    async fn patch_block(
        &self,
        block_id: &str,
        kind: &BlockKind,
        rich_text: &[RichTextSpan],
    ) -> Result<(), InfraError>;

    async fn retrieve_store(&self, store_id: &str) -> Result<StoreSummary, InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestNotionClient {
    client: Client,
    api_base: Url,
    api_key: String,
    notion_version: String,
    schema: RecordSchema,
}

impl ReqwestNotionClient {
    pub fn new(config: &SyncConfig) -> Result<Self, InfraError> {
        let api_base = Url::parse(&config.api_base)
            .map_err(|error| InfraError::InvalidConfig(format!("invalid api base url: {error}")))?;
        Ok(Self {
            client: Client::new(),
            api_base,
            api_key: config.api_key.clone(),
            notion_version: config.notion_version.clone(),
            schema: config.schema.clone(),
        })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), InfraError> {
        if value.trim().is_empty() {
            return Err(InfraError::InvalidConfig(format!("{field} must not be empty")));
        }
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, InfraError> {
        let mut url = self.api_base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                InfraError::InvalidConfig("notion api base URL cannot be a base".to_string())
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header(NOTION_VERSION_HEADER, &self.notion_version)
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Value, InfraError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|error| InfraError::Network {
                operation,
                message: error.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| InfraError::Network {
            operation,
            message: format!("failed reading response: {error}"),
        })?;

        if !status.is_success() {
            return Err(InfraError::Remote {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|error| InfraError::Payload(format!("{operation}: {error}; body={body}")))
    }
}

#[derive(Debug, serde::Deserialize)]
struct ListPage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

impl ListPage {
    fn from_value(operation: &str, value: Value) -> Result<Self, InfraError> {
        serde_json::from_value(value)
            .map_err(|error| InfraError::Payload(format!("{operation}: invalid list payload: {error}")))
    }

    fn next(&mut self) -> Option<String> {
        if self.has_more { self.next_cursor.take() } else { None }
    }
}

#[async_trait]
impl RemoteStore for ReqwestNotionClient {
    async fn fetch_blocks(&self, container_id: &str) -> Result<Vec<DocumentBlock>, InfraError> {
        Self::ensure_non_empty(container_id, "page id")?;

        let endpoint = self.endpoint(&["blocks", container_id, "children"])?;
        let mut cursor: Option<String> = None;
        let mut blocks = Vec::new();

        loop {
            let mut request = self
                .client
                .get(endpoint.clone())
                .query(&[("page_size", PAGE_SIZE.to_string())]);
            if let Some(cursor) = cursor.as_deref() {
                request = request.query(&[("start_cursor", cursor)]);
            }

            let mut page = ListPage::from_value("fetch_blocks", self.send("fetch_blocks", request).await?)?;
            for value in &page.results {
                blocks.push(decode_block(value)?);
            }

            match page.next() {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::debug!(container_id, count = blocks.len(), "fetched blocks");
        Ok(blocks)
    }

    async fn query_records(&self, store_id: &str) -> Result<Vec<TaskRecord>, InfraError> {
        Self::ensure_non_empty(store_id, "database id")?;

        let endpoint = self.endpoint(&["databases", store_id, "query"])?;
        let mut cursor: Option<String> = None;
        let mut records = Vec::new();

        loop {
            let mut body = json!({ "page_size": PAGE_SIZE });
            if let Some(cursor) = cursor.as_deref() {
                body["start_cursor"] = json!(cursor);
            }
            let request = self.client.post(endpoint.clone()).json(&body);

            let mut page = ListPage::from_value("query_records", self.send("query_records", request).await?)?;
            for value in &page.results {
                match self.schema.decode_record(value)? {
                    Some(record) => records.push(record),
                    None => tracing::warn!(
                        page_id = value.get("id").and_then(serde_json::Value::as_str).unwrap_or_default(),
                        column = %self.schema.name,
                        "skipping database page without a title"
                    ),
                }
            }

            match page.next() {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::debug!(store_id, count = records.len(), "queried records");
        Ok(records)
    }

    async fn create_record(&self, store_id: &str, fields: &RecordFields) -> Result<String, InfraError> {
        Self::ensure_non_empty(store_id, "database id")?;

        let body = json!({
            "parent": { "database_id": store_id },
            "properties": self.schema.encode_fields(fields),
        });
        let request = self.client.post(self.endpoint(&["pages"])?).json(&body);
        let created = self.send("create_record", request).await?;

        created
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
            .ok_or_else(|| InfraError::Payload("page create response did not include id".to_string()))
    }

    async fn patch_record(&self, record_id: &str, fields: &RecordFields) -> Result<(), InfraError> {
        Self::ensure_non_empty(record_id, "record id")?;

        let body = json!({ "properties": self.schema.encode_fields(fields) });
        let request = self.client.patch(self.endpoint(&["pages", record_id])?).json(&body);
        self.send("patch_record", request).await?;
        Ok(())
    }

    async fn archive_record(&self, record_id: &str) -> Result<(), InfraError> {
        Self::ensure_non_empty(record_id, "record id")?;

        let request = self
            .client
            .patch(self.endpoint(&["pages", record_id])?)
            .json(&json!({ "archived": true }));
        self.send("archive_record", request).await?;
        Ok(())
    }

    async fn patch_block(
        &self,
        block_id: &str,
        kind: &BlockKind,
        rich_text: &[RichTextSpan],
    ) -> Result<(), InfraError> {
        Self::ensure_non_empty(block_id, "block id")?;

        let body = encode_rich_text_patch(kind, rich_text)?;
        let request = self.client.patch(self.endpoint(&["blocks", block_id])?).json(&body);
        self.send("patch_block", request).await?;
        Ok(())
    }

    async fn retrieve_store(&self, store_id: &str) -> Result<StoreSummary, InfraError> {
        Self::ensure_non_empty(store_id, "database id")?;

        let request = self.client.get(self.endpoint(&["databases", store_id])?);
        let database = self.send("retrieve_store", request).await?;
        decode_store_summary(&database)
    }
}

fn decode_store_summary(database: &Value) -> Result<StoreSummary, InfraError> {
    let id = database
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| InfraError::Payload("database response did not include id".to_string()))?;
    let title = database.get("title").map(plain_text).unwrap_or_default();
    let mut columns: Vec<String> = database
        .get("properties")
        .and_then(Value::as_object)
        .map(|properties| properties.keys().cloned().collect())
        .unwrap_or_default();
    columns.sort();

    Ok(StoreSummary {
        id: id.to_string(),
        title,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(api_base: &str) -> ReqwestNotionClient {
        let config = SyncConfig::from_lookup(|name| match name {
            "NOTION_API_KEY" => Some("secret".to_string()),
            "NOTION_TASK_PAGE_ID" => Some("task-page".to_string()),
            "NOTION_JOURNAL_PAGE_ID" => Some("journal-page".to_string()),
            "NOTION_DATABASE_ID" => Some("db".to_string()),
            "NOTION_API_BASE" => Some(api_base.to_string()),
            _ => None,
        })
        .expect("config");
        ReqwestNotionClient::new(&config).expect("client")
    }

    #[test]
    fn endpoint_appends_segments_to_base_path() {
        let client = test_client("https://api.notion.com/v1/");
        let url = client
            .endpoint(&["blocks", "abc-123", "children"])
            .expect("endpoint");
        assert_eq!(url.as_str(), "https://api.notion.com/v1/blocks/abc-123/children");
    }

    #[test]
    fn endpoint_escapes_identifiers() {
        let client = test_client("http://127.0.0.1:9000/proxy/v1");
        let url = client.endpoint(&["pages", "a b/c"]).expect("endpoint");
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/proxy/v1/pages/a%20b%2Fc");
    }

    #[test]
    fn list_page_only_continues_when_has_more() {
        let mut page = ListPage::from_value(
            "test",
            json!({ "results": [], "has_more": false, "next_cursor": "ignored" }),
        )
        .expect("list page");
        assert_eq!(page.next(), None);

        let mut page = ListPage::from_value(
            "test",
            json!({ "results": [{}], "has_more": true, "next_cursor": "cursor-2" }),
        )
        .expect("list page");
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.next(), Some("cursor-2".to_string()));
    }

    #[test]
    fn store_summary_lists_sorted_columns() {
        let database = json!({
            "id": "db",
            "title": [{ "plain_text": "タスク" }],
            "properties": { "進捗": {}, "タスク名": {}, "期限": {} }
        });
        let summary = decode_store_summary(&database).expect("summary");
        assert_eq!(summary.title, "タスク");
        let mut expected = vec!["進捗".to_string(), "タスク名".to_string(), "期限".to_string()];
        expected.sort();
        assert_eq!(summary.columns, expected);
    }

    #[tokio::test]
    async fn empty_identifiers_are_rejected_before_any_request() {
        let client = test_client("http://127.0.0.1:9/v1/");
        assert!(matches!(
            client.fetch_blocks("  ").await,
            Err(InfraError::InvalidConfig(_))
        ));
        assert!(matches!(
            client.archive_record("").await,
            Err(InfraError::InvalidConfig(_))
        ));
    }
}
