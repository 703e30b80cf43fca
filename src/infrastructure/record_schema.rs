use crate::domain::models::{RecordFields, TaskRecord};
use crate::infrastructure::error::InfraError;
use serde_json::{Map, Value, json};

pub const CURRENT_SCHEMA_VERSION: u8 = 2;

/// Column names of the task database, versioned as one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    pub version: u8,
    pub name: String,
    pub deadline: String,
    pub progress: String,
    pub estimated_time: String,
}

impl RecordSchema {
    /// Localized columns used by the production database.
    pub fn current() -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            name: "タスク名".to_string(),
            deadline: "期限".to_string(),
            progress: "進捗".to_string(),
            estimated_time: "想定時間".to_string(),
        }
    }

    pub fn legacy() -> Self {
        Self {
            version: 1,
            name: "Name".to_string(),
            deadline: "Deadline".to_string(),
            progress: "Progress".to_string(),
            estimated_time: "Estimated Time".to_string(),
        }
    }

    pub fn for_version(version: u8) -> Option<Self> {
        match version {
            1 => Some(Self::legacy()),
            CURRENT_SCHEMA_VERSION => Some(Self::current()),
            _ => None,
        }
    }

    pub fn columns(&self) -> [&str; 4] {
        [
            self.name.as_str(),
            self.deadline.as_str(),
            self.progress.as_str(),
            self.estimated_time.as_str(),
        ]
    }

    pub fn encode_fields(&self, fields: &RecordFields) -> Value {
        let mut properties = Map::new();
        if let Some(name) = fields.name.as_deref() {
            properties.insert(
                self.name.clone(),
                json!({ "title": [{ "type": "text", "text": { "content": name } }] }),
            );
        }
        if let Some(deadline) = fields
            .deadline
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            properties.insert(self.deadline.clone(), json!({ "date": { "start": deadline } }));
        }
        if let Some(progress) = fields.progress {
            properties.insert(self.progress.clone(), json!({ "number": progress }));
        }
        if let Some(expected_time) = fields.expected_time {
            properties.insert(
                self.estimated_time.clone(),
                json!({ "number": round_hours(expected_time) }),
            );
        }
        Value::Object(properties)
    }

    /// Reads one database page. Pages without a title yield `Ok(None)`.
    pub fn decode_record(&self, page: &Value) -> Result<Option<TaskRecord>, InfraError> {
        let id = page
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| InfraError::Payload("database page without id".to_string()))?;
        let properties = page
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| InfraError::Payload(format!("page {id} has no properties")))?;

        let name = properties
            .get(&self.name)
            .and_then(|property| property.get("title"))
            .map(plain_text)
            .unwrap_or_default();
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let deadline = properties
            .get(&self.deadline)
            .and_then(|property| property.get("date"))
            .and_then(|date| date.get("start"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        let progress = number_property(properties, &self.progress)
            .map(|value| value.round() as i64)
            .unwrap_or(0);
        let expected_time = number_property(properties, &self.estimated_time).unwrap_or(0.0);

        Ok(Some(TaskRecord {
            id: id.to_string(),
            name: name.to_string(),
            deadline,
            progress,
            expected_time,
        }))
    }
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self::current()
    }
}

/// Concatenates the plain text of a rich text array.
pub fn plain_text(rich_text: &Value) -> String {
    rich_text
        .as_array()
        .map(|spans| {
            spans
                .iter()
                .filter_map(|span| {
                    span.get("plain_text")
                        .or_else(|| span.get("text").and_then(|text| text.get("content")))
                        .and_then(Value::as_str)
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn number_property(properties: &Map<String, Value>, column: &str) -> Option<f64> {
    properties
        .get(column)
        .and_then(|property| property.get("number"))
        .and_then(Value::as_f64)
        .filter(|value| value.is_finite())
}

fn round_hours(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
