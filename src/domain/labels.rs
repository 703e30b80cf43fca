//! Bullet labels and journal markers, kept as data.
//!
//! Task bullets look like `期限：2026-03-01` or `deadline: 2026-03-01`; journal
//! bullets look like `作業時間: 2` or `progress 60%`. Both sets are validated
//! once when built, so the parsers can assume every label is usable.

use std::collections::HashMap;
use thiserror::Error;

const SEPARATORS: [char; 2] = [':', '：'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Deadline,
    EstimatedTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JournalField {
    TimeSpent,
    ProgressPercent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("label for {0} must not be empty")]
    Empty(String),
    #[error("label `{0}` is mapped to more than one field")]
    Conflict(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<(String, TaskField)>,
}

impl LabelSet {
    pub fn new<I, S>(labels: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = (S, TaskField)>,
        S: Into<String>,
    {
        let labels = validate(labels, |field| format!("{field:?}"))?;
        Ok(Self { labels })
    }

    /// Matches `<label><separator><value>` at the start of a bullet.
    pub fn match_bullet<'a>(&self, text: &'a str) -> Option<(TaskField, &'a str)> {
        let text = text.trim_start();
        self.labels.iter().find_map(|(label, field)| {
            let rest = strip_prefix_ignore_ascii_case(text, label)?;
            let rest = rest.trim_start();
            let value = rest.strip_prefix(SEPARATORS)?;
            Some((*field, value.trim()))
        })
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            labels: vec![
                ("期限".to_string(), TaskField::Deadline),
                ("deadline".to_string(), TaskField::Deadline),
                ("想定時間".to_string(), TaskField::EstimatedTime),
                ("estimated-time".to_string(), TaskField::EstimatedTime),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalMarkers {
    markers: Vec<(String, JournalField)>,
}

impl JournalMarkers {
    pub fn new<I, S>(markers: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = (S, JournalField)>,
        S: Into<String>,
    {
        let markers = validate(markers, |field| format!("{field:?}"))?;
        Ok(Self { markers })
    }

    /// Returns, per field, the text following the first marker found in `text`.
    pub fn find_all<'a>(&self, text: &'a str) -> Vec<(JournalField, &'a str)> {
        let mut found: Vec<(JournalField, &'a str)> = Vec::new();
        for (marker, field) in &self.markers {
            if found.iter().any(|(seen, _)| seen == field) {
                continue;
            }
            if let Some(start) = find_ignore_ascii_case(text, marker) {
                found.push((*field, &text[start + marker.len()..]));
            }
        }
        found
    }
}

impl Default for JournalMarkers {
    fn default() -> Self {
        Self {
            markers: vec![
                ("作業時間".to_string(), JournalField::TimeSpent),
                ("time spent".to_string(), JournalField::TimeSpent),
                ("進捗".to_string(), JournalField::ProgressPercent),
                ("progress".to_string(), JournalField::ProgressPercent),
            ],
        }
    }
}

/// Strips a leading separator and whitespace from the text following a marker.
pub fn strip_separator(text: &str) -> &str {
    let text = text.trim_start();
    text.strip_prefix(SEPARATORS).unwrap_or(text).trim_start()
}

fn validate<I, S, F>(entries: I, describe: impl Fn(&F) -> String) -> Result<Vec<(String, F)>, LabelError>
where
    I: IntoIterator<Item = (S, F)>,
    S: Into<String>,
    F: Copy + Eq + std::hash::Hash,
{
    let mut seen: HashMap<String, F> = HashMap::new();
    let mut validated = Vec::new();
    for (label, field) in entries {
        let label = label.into().trim().to_string();
        if label.is_empty() {
            return Err(LabelError::Empty(describe(&field)));
        }
        let key = label.to_lowercase();
        match seen.get(&key) {
            Some(existing) if *existing != field => return Err(LabelError::Conflict(label)),
            Some(_) => continue,
            None => {
                seen.insert(key, field);
                validated.push((label, field));
            }
        }
    }
    Ok(validated)
}

fn strip_prefix_ignore_ascii_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

fn find_ignore_ascii_case(text: &str, needle: &str) -> Option<usize> {
    text.char_indices()
        .map(|(index, _)| index)
        .find(|&index| {
            text.get(index..index + needle.len())
                .is_some_and(|window| window.eq_ignore_ascii_case(needle))
        })
}
