use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_OPEN: &str = "OPEN";
pub const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const STATUS_DONE: &str = "DONE";

/// Statuses in the order the UI cycles through them
const STATUS_CYCLE: [&str; 3] = [STATUS_OPEN, STATUS_IN_PROGRESS, STATUS_DONE];

/// A to-do entry. Status is free text owned by the backend; fields this
/// client does not know about are carried in `extra` and survive a
/// serialize round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TodoItem {
    pub fn display_status(&self) -> &str {
        match self.status.as_str() {
            STATUS_OPEN => "Open",
            STATUS_IN_PROGRESS => "In progress",
            STATUS_DONE => "Done",
            "" => "-",
            other => other,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == STATUS_DONE
    }
}

/// The status after `current` in the UI cycle. Unknown statuses restart at open.
pub fn next_status(current: &str) -> &'static str {
    match STATUS_CYCLE.iter().position(|s| *s == current) {
        Some(i) => STATUS_CYCLE[(i + 1) % STATUS_CYCLE.len()],
        None => STATUS_OPEN,
    }
}

/// Body of `POST /todo`
#[derive(Debug, Clone, Serialize)]
pub struct NewTodo<'a> {
    pub title: &'a str,
    pub description: &'a str,
}

/// Body of `PATCH /todo/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate<'a> {
    pub status: &'a str,
}

/// Body of `DELETE /todo/{id}`. A missing flag reads as failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
}
