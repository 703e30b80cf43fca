//! Run configuration, read once from the environment in `main`.
//!
//! Required:
//! - `NOTION_API_KEY`
//! - `NOTION_TASK_PAGE_ID` - page holding the task headings
//! - `NOTION_JOURNAL_PAGE_ID` - page holding the daily journal
//! - `NOTION_DATABASE_ID` - task database
//!
//! Optional:
//! - `NOTION_API_BASE` (default `https://api.notion.com/v1/`)
//! - `NOTION_VERSION` (default `2022-06-28`)
//! - `TASKSYNC_SCHEMA_VERSION` (`1` or `2`, default `2`)

use crate::infrastructure::error::InfraError;
use crate::infrastructure::record_schema::RecordSchema;

pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1/";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

const ENV_API_KEY: &str = "NOTION_API_KEY";
const ENV_TASK_PAGE_ID: &str = "NOTION_TASK_PAGE_ID";
const ENV_JOURNAL_PAGE_ID: &str = "NOTION_JOURNAL_PAGE_ID";
const ENV_DATABASE_ID: &str = "NOTION_DATABASE_ID";
const ENV_API_BASE: &str = "NOTION_API_BASE";
const ENV_NOTION_VERSION: &str = "NOTION_VERSION";
const ENV_SCHEMA_VERSION: &str = "TASKSYNC_SCHEMA_VERSION";

#[derive(Clone)]
pub struct SyncConfig {
    pub api_key: String,
    pub task_page_id: String,
    pub journal_page_id: String,
    pub database_id: String,
    pub api_base: String,
    pub notion_version: String,
    pub schema: RecordSchema,
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_key", &"<redacted>")
            .field("task_page_id", &self.task_page_id)
            .field("journal_page_id", &self.journal_page_id)
            .field("database_id", &self.database_id)
            .field("api_base", &self.api_base)
            .field("notion_version", &self.notion_version)
            .field("schema", &self.schema.version)
            .finish()
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any key lookup; every missing required key is
    /// reported in a single error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InfraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut missing = Vec::new();
        let mut required = |name: &'static str| {
            let value = read(name);
            if value.is_none() {
                missing.push(name.to_string());
            }
            value.unwrap_or_default()
        };

        let api_key = required(ENV_API_KEY);
        let task_page_id = required(ENV_TASK_PAGE_ID);
        let journal_page_id = required(ENV_JOURNAL_PAGE_ID);
        let database_id = required(ENV_DATABASE_ID);

        if !missing.is_empty() {
            return Err(InfraError::MissingConfig(missing));
        }

        let mut api_base = read(ENV_API_BASE).unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        if !api_base.ends_with('/') {
            api_base.push('/');
        }
        url::Url::parse(&api_base).map_err(|error| {
            InfraError::InvalidConfig(format!("{ENV_API_BASE} is not a valid url: {error}"))
        })?;

        let notion_version =
            read(ENV_NOTION_VERSION).unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string());

        let schema = match read(ENV_SCHEMA_VERSION) {
            None => RecordSchema::current(),
            Some(raw) => {
                let version = raw.parse::<u8>().map_err(|error| {
                    InfraError::InvalidConfig(format!("{ENV_SCHEMA_VERSION}={raw}: {error}"))
                })?;
                RecordSchema::for_version(version).ok_or_else(|| {
                    InfraError::InvalidConfig(format!("unsupported schema {version}"))
                })?
            }
        };

        Ok(Self {
            api_key,
            task_page_id,
            journal_page_id,
            database_id,
            api_base,
            notion_version,
            schema,
        })
    }
}
