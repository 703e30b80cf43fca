pub mod block_mapper;
pub mod config;
pub mod dry_run_store;
pub mod error;
#[cfg(test)]
pub mod in_memory_store;
pub mod notion_client;
pub mod record_schema;
