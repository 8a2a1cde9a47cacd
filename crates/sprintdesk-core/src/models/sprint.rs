use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Task;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: i64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Sprint {
    pub fn date_range(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => format!("{} - {}", start, end),
            (Some(start), None) => format!("from {}", start),
            (None, Some(end)) => format!("until {}", end),
            (None, None) => "unscheduled".to_string(),
        }
    }

    pub fn finished_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_finished()).count()
    }
}
