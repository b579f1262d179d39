use crate::error::PayloadError;
use serde_json::{Map, Value};

pub const EMPTY_TASKS_LABEL: &str = "No active tasks.";
const MISSING_FIELD_TEXT: &str = "-";

/// One submitted task as reported by the bot. The dashboard never edits
/// these; every field is kept as display text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: String,
    pub proof: String,
    pub kind: String,
    pub status: String,
    pub user: String,
    pub submitting: String,
    pub message: String,
}

impl TaskRecord {
    fn from_entry(id: &str, value: &Value) -> Self {
        let fields = value.as_object();
        let field = |keys: &[&str]| -> String {
            fields
                .and_then(|map| keys.iter().find_map(|key| map.get(*key)))
                .map(display_text)
                .unwrap_or_else(|| MISSING_FIELD_TEXT.to_string())
        };
        Self {
            id: id.to_string(),
            proof: field(&["proof"]),
            kind: field(&["type"]),
            status: field(&["status"]),
            user: field(&["user"]),
            submitting: field(&["submiting", "submitting"]),
            message: field(&["message"]),
        }
    }
}

/// Full task listing in the order the keys were received.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskListing {
    tasks: Vec<TaskRecord>,
}

impl TaskListing {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn received_order(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.iter()
    }

    /// Newest-first: the reverse of received key order.
    pub fn render_order(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.iter().rev()
    }

    pub fn render_ids(&self) -> Vec<&str> {
        self.render_order().map(|task| task.id.as_str()).collect()
    }
}

pub fn parse_task_listing(body: &str) -> Result<TaskListing, PayloadError> {
    let value: Value = serde_json::from_str(body)?;
    let object = value.as_object().ok_or(PayloadError::NotAnObject)?;
    let message = object
        .get("message")
        .ok_or(PayloadError::MissingField("message"))?;
    let entries: &Map<String, Value> =
        message.as_object().ok_or_else(|| PayloadError::InvalidField {
            field: "message",
            reason: "expected an object keyed by task id".to_string(),
        })?;
    Ok(TaskListing {
        tasks: entries
            .iter()
            .map(|(id, entry)| TaskRecord::from_entry(id, entry))
            .collect(),
    })
}

fn display_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
