use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priority {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub date_created: NaiveDate,
    pub date_finished: Option<NaiveDate>,
    pub timestamp: Option<DateTime<Utc>>,
    pub priority: Priority,
}

impl Task {
    pub fn is_finished(&self) -> bool {
        self.date_finished.is_some()
    }

    /// One-line summary for list rows
    pub fn summary(&self) -> String {
        let state = if self.is_finished() { "done" } else { "open" };
        format!("{} [{}] ({})", self.name, self.priority.name, state)
    }
}
