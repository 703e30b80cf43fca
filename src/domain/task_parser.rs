use crate::domain::labels::{LabelSet, TaskField};
use crate::domain::models::{BlockKind, DocumentBlock, SourceBlock, TaskDraft, TodoItem};

/// Groups a flat block list into drafts, one per level-3 heading.
///
/// Bullets under a heading fill the draft's fields when they start with a
/// known label; anything else is kept only as a source block. Bullets before
/// the first heading belong to no draft. Missing fields stay `None`.
pub fn parse_tasks(blocks: &[DocumentBlock], labels: &LabelSet) -> Vec<TaskDraft> {
    let mut drafts = Vec::new();
    let mut current: Option<TaskDraft> = None;

    for block in blocks {
        match block.kind {
            BlockKind::Heading3 => {
                if let Some(draft) = current.take() {
                    drafts.push(draft);
                }
                let name = block.text.trim();
                if name.is_empty() {
                    continue;
                }
                let mut draft = TaskDraft::named(name);
                draft.source_blocks.push(SourceBlock::from(block));
                current = Some(draft);
            }
            BlockKind::BulletedListItem => {
                let Some(draft) = current.as_mut() else {
                    continue;
                };
                draft.source_blocks.push(SourceBlock::from(block));
                match labels.match_bullet(&block.text) {
                    Some((TaskField::Deadline, value)) => draft.deadline = Some(value.to_string()),
                    Some((TaskField::EstimatedTime, value)) => {
                        draft.estimated_time = Some(value.to_string())
                    }
                    None => {}
                }
            }
            _ => {}
        }
    }

    if let Some(draft) = current {
        drafts.push(draft);
    }
    drafts
}

pub fn parse_todos(blocks: &[DocumentBlock]) -> Vec<TodoItem> {
    blocks
        .iter()
        .filter(|block| block.kind == BlockKind::ToDo)
        .filter_map(|block| {
            let name = block.text.trim();
            if name.is_empty() {
                return None;
            }
            Some(TodoItem {
                name: name.to_string(),
                checked: block.checked,
                source: SourceBlock::from(block),
            })
        })
        .collect()
}
