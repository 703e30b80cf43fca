use crate::domain::labels::{JournalField, JournalMarkers, strip_separator};
use crate::domain::models::{BlockKind, DocumentBlock, JournalEntry};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalParseError {
    #[error("invalid {field} value `{value}` for task `{task}` in block {block_id}")]
    InvalidNumber {
        block_id: String,
        task: String,
        field: &'static str,
        value: String,
    },
}

/// Collects today's journal entries.
///
/// Only level-3 headings under a level-2 heading containing `reference_date`
/// (as `YYYY-MM-DD`) open entries. A level-2 heading for any other date closes
/// today's section again. Numbers that fail to parse abort the whole parse.
pub fn parse_journal(
    blocks: &[DocumentBlock],
    reference_date: NaiveDate,
    markers: &JournalMarkers,
) -> Result<BTreeMap<String, JournalEntry>, JournalParseError> {
    let date_text = reference_date.format("%Y-%m-%d").to_string();
    let mut entries: BTreeMap<String, JournalEntry> = BTreeMap::new();
    let mut in_today = false;
    let mut current: Option<String> = None;

    for block in blocks {
        match block.kind {
            BlockKind::Heading2 => {
                in_today = block.text.contains(&date_text);
                current = None;
            }
            BlockKind::Heading3 if in_today => {
                let name = block.text.trim();
                if name.is_empty() {
                    current = None;
                    continue;
                }
                entries.insert(name.to_string(), JournalEntry::new(name));
                current = Some(name.to_string());
            }
            BlockKind::BulletedListItem => {
                let Some(entry) = current.as_ref().and_then(|name| entries.get_mut(name)) else {
                    continue;
                };
                for (field, rest) in markers.find_all(&block.text) {
                    let value = parse_leading_integer(rest).ok_or_else(|| {
                        JournalParseError::InvalidNumber {
                            block_id: block.id.clone(),
                            task: entry.task_name.clone(),
                            field: field_name(field),
                            value: leading_token(rest).to_string(),
                        }
                    })?;
                    match field {
                        JournalField::TimeSpent => entry.time_spent = value,
                        JournalField::ProgressPercent => entry.progress_percent = value,
                    }
                }
            }
            _ => {}
        }
    }

    Ok(entries)
}

fn field_name(field: JournalField) -> &'static str {
    match field {
        JournalField::TimeSpent => "time spent",
        JournalField::ProgressPercent => "progress",
    }
}

fn leading_token(rest: &str) -> &str {
    let rest = strip_separator(rest);
    let end = rest
        .find(|c: char| c.is_whitespace() || c == ',' || c == '、' || c == '，')
        .unwrap_or(rest.len());
    &rest[..end]
}

fn parse_leading_integer(rest: &str) -> Option<i64> {
    let token = leading_token(rest);
    let token = token
        .strip_suffix('%')
        .or_else(|| token.strip_suffix('％'))
        .unwrap_or(token);
    token.parse::<i64>().ok()
}
