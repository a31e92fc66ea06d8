use crate::types::TaskStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmTask {
    pub id: String,
    pub farm_id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl FarmTask {
    /// Overdue when not completed and the due date is strictly in the past.
    pub fn days_overdue(&self, today: NaiveDate) -> Option<i64> {
        if self.status == TaskStatus::Completed {
            return None;
        }
        let due = self.due_date?;
        let days = (today - due).num_days();
        (days > 0).then_some(days)
    }
}
