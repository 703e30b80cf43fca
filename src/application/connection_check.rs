use crate::infrastructure::error::InfraError;
use crate::infrastructure::notion_client::{RemoteStore, StoreSummary};
use crate::infrastructure::record_schema::RecordSchema;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub store: StoreSummary,
    pub missing_columns: Vec<String>,
}

impl ConnectionReport {
    pub fn is_ready(&self) -> bool {
        self.missing_columns.is_empty()
    }
}

/// Fetches the database and reports which schema columns it lacks.
pub async fn check_connection<S>(
    store: &S,
    database_id: &str,
    schema: &RecordSchema,
) -> Result<ConnectionReport, InfraError>
where
    S: RemoteStore + ?Sized,
{
    let summary = store.retrieve_store(database_id).await?;
    let missing_columns: Vec<String> = schema
        .columns()
        .into_iter()
        .filter(|column| !summary.columns.iter().any(|existing| existing == column))
        .map(ToOwned::to_owned)
        .collect();

    if missing_columns.is_empty() {
        tracing::info!(database = %summary.title, schema = schema.version, "database is reachable");
    } else {
        tracing::warn!(
            database = %summary.title,
            schema = schema.version,
            missing = ?missing_columns,
            "database is missing schema columns"
        );
    }

    Ok(ConnectionReport {
        store: summary,
        missing_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory_store::InMemoryRemoteStore;

    #[tokio::test]
    async fn complete_schema_is_ready() {
        let store = InMemoryRemoteStore::default().with_columns(&["タスク名", "期限", "進捗", "想定時間"]);

        let report = check_connection(&store, "db", &RecordSchema::current())
            .await
            .expect("check");

        assert!(report.is_ready());
        assert_eq!(report.store.id, "db");
    }

    #[tokio::test]
    async fn legacy_database_lacks_current_columns() {
        let store = InMemoryRemoteStore::default().with_columns(&["Name", "期限"]);

        let report = check_connection(&store, "db", &RecordSchema::current())
            .await
            .expect("check");

        assert!(!report.is_ready());
        assert_eq!(
            report.missing_columns,
            vec!["タスク名".to_string(), "進捗".to_string(), "想定時間".to_string()]
        );
    }

    #[tokio::test]
    async fn unreachable_database_is_an_error() {
        let store = InMemoryRemoteStore::default().failing("retrieve_store", "db");

        let error = check_connection(&store, "db", &RecordSchema::current())
            .await
            .expect_err("unreachable");

        assert!(matches!(error, InfraError::Remote { operation: "retrieve_store", .. }));
    }
}
