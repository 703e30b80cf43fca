use crate::domain::models::{BlockKind, DocumentBlock, RichTextSpan};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::record_schema::plain_text;
use serde_json::{Value, json};

pub fn decode_block(block: &Value) -> Result<DocumentBlock, InfraError> {
    let id = block
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| InfraError::Payload("block without id".to_string()))?;
    let type_tag = block
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| InfraError::Payload(format!("block {id} has no type")))?;

    let kind = BlockKind::from_type_tag(type_tag);
    let payload = block.get(type_tag);
    let rich_text = payload
        .filter(|_| kind.carries_rich_text())
        .and_then(|payload| payload.get("rich_text"));
    let text = rich_text.map(plain_text).unwrap_or_default();
    let struck = rich_text.is_some_and(all_struck);
    let checked = payload
        .and_then(|payload| payload.get("checked"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(DocumentBlock {
        id: id.to_string(),
        kind,
        text,
        checked,
        struck,
    })
}

fn all_struck(rich_text: &Value) -> bool {
    rich_text.as_array().is_some_and(|spans| {
        !spans.is_empty()
            && spans.iter().all(|span| {
                span.get("annotations")
                    .and_then(|annotations| annotations.get("strikethrough"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
            })
    })
}

/// Body for `PATCH /blocks/{id}` replacing the block's rich text.
pub fn encode_rich_text_patch(kind: &BlockKind, spans: &[RichTextSpan]) -> Result<Value, InfraError> {
    if !kind.carries_rich_text() {
        return Err(InfraError::Payload(format!(
            "cannot replace rich text of {} block",
            kind.type_tag()
        )));
    }
    let rich_text: Vec<Value> = spans
        .iter()
        .map(|span| {
            json!({
                "type": "text",
                "text": { "content": span.content },
                "annotations": { "strikethrough": span.strikethrough }
            })
        })
        .collect();

    let mut body = serde_json::Map::new();
    body.insert(kind.type_tag().to_string(), json!({ "rich_text": rich_text }));
    Ok(Value::Object(body))
}
