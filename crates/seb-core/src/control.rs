use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Start,
    Stop,
    ResetTasks,
}

impl ControlAction {
    pub const ALL: [ControlAction; 3] = [
        ControlAction::Start,
        ControlAction::Stop,
        ControlAction::ResetTasks,
    ];

    pub fn path(self) -> &'static str {
        match self {
            ControlAction::Start => "/start",
            ControlAction::Stop => "/shutdown",
            ControlAction::ResetTasks => "/api/task/reset",
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            ControlAction::Start => "Bot started",
            ControlAction::Stop => "Bot stopped",
            ControlAction::ResetTasks => "Tasks reset",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ControlAction::Start => "start",
            ControlAction::Stop => "stop",
            ControlAction::ResetTasks => "reset_tasks",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned by every control endpoint. Failures carry `error` instead
/// of, or next to, `message`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ActionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Toast text for a finished control request. A server `message` wins, then
/// a server `error`, then the action default; transport failures show their
/// detail.
pub fn outcome_message(action: ControlAction, result: &Result<ActionResponse, String>) -> String {
    match result {
        Ok(response) => {
            if let Some(message) = non_blank(response.message.as_deref()) {
                message.to_string()
            } else if let Some(error) = non_blank(response.error.as_deref()) {
                format!("Error: {error}")
            } else {
                action.default_message().to_string()
            }
        }
        Err(detail) => format!("Error: {detail}"),
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|text| !text.is_empty())
}
