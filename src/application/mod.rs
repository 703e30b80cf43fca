pub mod connection_check;
pub mod reconciler;
pub mod task_sync;
