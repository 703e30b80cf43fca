use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading2,
    Heading3,
    BulletedListItem,
    ToDo,
    Unsupported(String),
}

impl BlockKind {
    pub fn from_type_tag(tag: &str) -> Self {
        match tag {
            "heading_2" => Self::Heading2,
            "heading_3" => Self::Heading3,
            "bulleted_list_item" => Self::BulletedListItem,
            "to_do" => Self::ToDo,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn type_tag(&self) -> &str {
        match self {
            Self::Heading2 => "heading_2",
            Self::Heading3 => "heading_3",
            Self::BulletedListItem => "bulleted_list_item",
            Self::ToDo => "to_do",
            Self::Unsupported(tag) => tag.as_str(),
        }
    }

    pub fn carries_rich_text(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

/// One child block of a page, reduced to what the parsers need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentBlock {
    pub id: String,
    pub kind: BlockKind,
    pub text: String,
    pub checked: bool,
    /// Every span of the block's text is struck through.
    pub struck: bool,
}

impl DocumentBlock {
    pub fn new(id: impl Into<String>, kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
            checked: false,
            struck: false,
        }
    }

    pub fn heading_2(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, BlockKind::Heading2, text)
    }

    pub fn heading_3(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, BlockKind::Heading3, text)
    }

    pub fn bullet(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, BlockKind::BulletedListItem, text)
    }

    pub fn to_do(id: impl Into<String>, text: impl Into<String>, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(id, BlockKind::ToDo, text)
        }
    }
}

/// A block a draft was parsed from, kept so it can be struck through later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceBlock {
    pub id: String,
    pub kind: BlockKind,
    pub text: String,
    #[serde(default)]
    pub struck: bool,
}

impl From<&DocumentBlock> for SourceBlock {
    fn from(block: &DocumentBlock) -> Self {
        Self {
            id: block.id.clone(),
            kind: block.kind.clone(),
            text: block.text.clone(),
            struck: block.struck,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub deadline: Option<String>,
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub source_blocks: Vec<SourceBlock>,
}

impl TaskDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deadline: None,
            estimated_time: None,
            source_blocks: Vec::new(),
        }
    }

    /// Estimated hours for a new record; absent or unparseable text counts as zero.
    pub fn estimated_hours(&self) -> f64 {
        self.estimated_time
            .as_deref()
            .map(str::trim)
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(0.0)
    }

    /// The heading was already struck through by an earlier archive pass.
    pub fn is_struck(&self) -> bool {
        self.source_blocks.first().is_some_and(|block| block.struck)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub id: String,
    pub name: String,
    pub deadline: Option<String>,
    pub progress: i64,
    pub expected_time: f64,
}

impl TaskRecord {
    pub fn phase(&self) -> TaskPhase {
        TaskPhase::from_progress(self.progress)
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "record.id")?;
        validate_non_empty(&self.name, "record.name")?;
        if !self.expected_time.is_finite() {
            return Err("record.expected_time must be finite".to_string());
        }
        Ok(())
    }
}

/// Column values written to the store for one record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordFields {
    pub name: Option<String>,
    pub deadline: Option<String>,
    pub progress: Option<i64>,
    pub expected_time: Option<f64>,
}

impl RecordFields {
    pub fn for_new_task(draft: &TaskDraft) -> Self {
        Self {
            name: Some(draft.name.clone()),
            deadline: draft.deadline.clone(),
            progress: Some(0),
            expected_time: Some(draft.estimated_hours()),
        }
    }

    pub fn progress_update(progress: i64, expected_time: f64) -> Self {
        Self {
            progress: Some(progress),
            expected_time: Some(expected_time),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.deadline.is_none()
            && self.progress.is_none()
            && self.expected_time.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct JournalEntry {
    pub task_name: String,
    pub time_spent: i64,
    pub progress_percent: i64,
}

impl JournalEntry {
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            time_spent: 0,
            progress_percent: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    pub name: String,
    pub checked: bool,
    pub source: SourceBlock,
}

impl TodoItem {
    /// A name-only draft, struck through via the to-do block once complete.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            source_blocks: vec![self.source.clone()],
            ..TaskDraft::named(self.name.clone())
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    Pending,
    InProgress,
    Complete,
}

impl TaskPhase {
    pub fn from_progress(progress: i64) -> Self {
        if progress >= 100 {
            Self::Complete
        } else if progress > 0 {
            Self::InProgress
        } else {
            Self::Pending
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }
}

/// A run of text with the one annotation this tool ever writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RichTextSpan {
    pub content: String,
    pub strikethrough: bool,
}

impl RichTextSpan {
    pub fn struck(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            strikethrough: true,
        }
    }
}

fn validate_non_empty(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_record() -> TaskRecord {
        TaskRecord {
            id: "rec-1".to_string(),
            name: "Write report".to_string(),
            deadline: Some("2026-02-20".to_string()),
            progress: 40,
            expected_time: 10.0,
        }
    }

    #[test]
    fn block_kind_maps_known_and_unknown_tags() {
        assert_eq!(BlockKind::from_type_tag("heading_3"), BlockKind::Heading3);
        assert_eq!(BlockKind::from_type_tag("to_do"), BlockKind::ToDo);
        let paragraph = BlockKind::from_type_tag("paragraph");
        assert_eq!(paragraph, BlockKind::Unsupported("paragraph".to_string()));
        assert_eq!(paragraph.type_tag(), "paragraph");
        assert!(!paragraph.carries_rich_text());
    }

    #[test]
    fn estimated_hours_defaults_to_zero() {
        let mut draft = TaskDraft::named("A");
        assert_eq!(draft.estimated_hours(), 0.0);

        draft.estimated_time = Some("about three".to_string());
        assert_eq!(draft.estimated_hours(), 0.0);

        draft.estimated_time = Some(" 2.5 ".to_string());
        assert_eq!(draft.estimated_hours(), 2.5);
    }

    #[test]
    fn struck_heading_marks_draft_struck() {
        let mut heading = DocumentBlock::heading_3("h-a", "A");
        let mut draft = TaskDraft::named("A");
        assert!(!draft.is_struck());

        heading.struck = true;
        draft.source_blocks.push(SourceBlock::from(&heading));
        assert!(draft.is_struck());
    }

    #[test]
    fn new_task_fields_start_at_zero_progress() {
        let mut draft = TaskDraft::named("A");
        draft.deadline = Some("2026-03-01".to_string());
        draft.estimated_time = Some("4".to_string());

        let fields = RecordFields::for_new_task(&draft);
        assert_eq!(fields.name.as_deref(), Some("A"));
        assert_eq!(fields.deadline.as_deref(), Some("2026-03-01"));
        assert_eq!(fields.progress, Some(0));
        assert_eq!(fields.expected_time, Some(4.0));
        assert!(RecordFields::default().is_empty());
    }

    #[test]
    fn record_validate_rejects_empty_name() {
        let mut record = sample_record();
        assert!(record.validate().is_ok());
        record.name = "  ".to_string();
        assert!(record.validate().is_err());
    }

    #[test]
    fn phase_follows_progress() {
        let mut record = sample_record();
        assert_eq!(record.phase(), TaskPhase::InProgress);
        record.progress = 0;
        assert_eq!(record.phase(), TaskPhase::Pending);
        record.progress = 100;
        assert_eq!(record.phase(), TaskPhase::Complete);
    }

    proptest! {
        #[test]
        fn phase_is_complete_only_at_or_above_one_hundred(progress in -50i64..200i64) {
            let phase = TaskPhase::from_progress(progress);
            prop_assert_eq!(phase == TaskPhase::Complete, progress >= 100);
        }
    }

    #[test]
    fn drafts_support_serde_roundtrip() {
        let mut draft = TaskDraft::named("A");
        draft.source_blocks.push(SourceBlock::from(&DocumentBlock::heading_3("b-1", "A")));

        let roundtrip: TaskDraft =
            serde_json::from_str(&serde_json::to_string(&draft).expect("serialize draft"))
                .expect("deserialize draft");
        assert_eq!(roundtrip, draft);
    }
}
