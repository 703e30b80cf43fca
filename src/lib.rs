pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::connection_check::{ConnectionReport, check_connection};
pub use application::reconciler::{ReconcileFailure, ReconcileReport, Reconciler};
pub use application::task_sync::{SyncOptions, SyncTargets, TaskSyncService};
pub use infrastructure::config::SyncConfig;
pub use infrastructure::error::InfraError;
pub use infrastructure::notion_client::{RemoteStore, ReqwestNotionClient};
