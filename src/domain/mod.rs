pub mod estimate;
pub mod journal_parser;
pub mod labels;
pub mod models;
pub mod task_parser;
