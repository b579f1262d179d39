use crate::error::PayloadError;
use serde_json::{Map, Value};
use std::fmt;

pub const UPTIME_PLACEHOLDER: &str = "--:--:--";
pub const POSTED_TASK_PLACEHOLDER: &str = "---";
pub const USAGE_PLACEHOLDER: &str = "--";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotStatus {
    Active,
    Inactive,
    Idle,
    Running,
    Error,
    Other(String),
}

impl BotStatus {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "active" => BotStatus::Active,
            "inactive" => BotStatus::Inactive,
            "idle" => BotStatus::Idle,
            "running" => BotStatus::Running,
            "error" => BotStatus::Error,
            _ => BotStatus::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BotStatus::Active => "active",
            BotStatus::Inactive => "inactive",
            BotStatus::Idle => "idle",
            BotStatus::Running => "running",
            BotStatus::Error => "error",
            BotStatus::Other(raw) => raw.as_str(),
        }
    }

    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }

    pub fn is_live(&self) -> bool {
        matches!(self, BotStatus::Active | BotStatus::Running)
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest-wins textual metrics. Every event replaces the whole record.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusSnapshot {
    pub tasks_completed: u64,
    pub uptime: String,
    pub cpu_usage: String,
    pub ram_usage: String,
    pub status: BotStatus,
    pub posted_task: Option<String>,
}

impl StatusSnapshot {
    pub fn posted_task_label(&self) -> &str {
        self.posted_task.as_deref().unwrap_or(POSTED_TASK_PLACEHOLDER)
    }
}

pub fn parse_context_metrics(data: &str) -> Result<StatusSnapshot, PayloadError> {
    let value: Value = serde_json::from_str(data)?;
    let object = value.as_object().ok_or(PayloadError::NotAnObject)?;

    let status = match object.get("status") {
        Some(Value::String(raw)) => BotStatus::parse(raw),
        Some(other) => {
            return Err(PayloadError::InvalidField {
                field: "status",
                reason: format!("expected string, got {other}"),
            })
        }
        None => return Err(PayloadError::MissingField("status")),
    };

    Ok(StatusSnapshot {
        tasks_completed: tasks_completed(object)?,
        uptime: text_field(object, "uptime").unwrap_or_else(|| UPTIME_PLACEHOLDER.to_string()),
        cpu_usage: text_field(object, "cpu_usage").unwrap_or_else(|| USAGE_PLACEHOLDER.to_string()),
        ram_usage: text_field(object, "ram_usage").unwrap_or_else(|| USAGE_PLACEHOLDER.to_string()),
        status,
        posted_task: text_field(object, "posted_task"),
    })
}

fn tasks_completed(object: &Map<String, Value>) -> Result<u64, PayloadError> {
    match object.get("tasks_completed") {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(number)) => number.as_u64().ok_or_else(|| PayloadError::InvalidField {
            field: "tasks_completed",
            reason: format!("expected non-negative integer, got {number}"),
        }),
        Some(Value::String(raw)) => {
            raw.trim()
                .parse::<u64>()
                .map_err(|err| PayloadError::InvalidField {
                    field: "tasks_completed",
                    reason: err.to_string(),
                })
        }
        Some(other) => Err(PayloadError::InvalidField {
            field: "tasks_completed",
            reason: format!("expected integer, got {other}"),
        }),
    }
}

/// Scalar field as display text; `null`, blank strings and absence yield `None`.
fn text_field(object: &Map<String, Value>, field: &str) -> Option<String> {
    match object.get(field)? {
        Value::String(raw) if raw.trim().is_empty() => None,
        Value::String(raw) => Some(raw.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
