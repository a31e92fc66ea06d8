use crate::types::Sector;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One vaccination/treatment entry in a batch health program. Universal
/// entries are cross-batch templates and never fire on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSchedule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub vaccine_name: String,
    pub scheduled_date: NaiveDate,
    /// Day-of-life the program prescribes this entry for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<Sector>,
    #[serde(default)]
    pub is_compulsory: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_universal: bool,
}

impl HealthSchedule {
    /// Entries the due-date evaluator considers: scheduled against a concrete
    /// batch and not yet done.
    pub fn is_actionable(&self) -> bool {
        !self.is_completed && !self.is_universal && self.batch_id.is_some()
    }

    /// Signed days until the scheduled date; negative means overdue.
    pub fn days_until(&self, today: NaiveDate) -> i64 {
        (self.scheduled_date - today).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn entry() -> HealthSchedule {
        HealthSchedule {
            id: "h1".into(),
            batch_id: Some("b1".into()),
            vaccine_name: "Gumboro".into(),
            scheduled_date: d(2025, 3, 10),
            day_number: Some(14),
            dosage: None,
            method: None,
            sector: Some(Sector::Broiler),
            is_compulsory: true,
            is_completed: false,
            is_universal: false,
        }
    }

    #[test]
    fn actionable_filters() {
        assert!(entry().is_actionable());
        let mut done = entry();
        done.is_completed = true;
        assert!(!done.is_actionable());
        let mut template = entry();
        template.is_universal = true;
        assert!(!template.is_actionable());
        let mut orphan = entry();
        orphan.batch_id = None;
        assert!(!orphan.is_actionable());
    }

    #[test]
    fn days_until_signs() {
        let e = entry();
        assert_eq!(e.days_until(d(2025, 3, 8)), 2);
        assert_eq!(e.days_until(d(2025, 3, 10)), 0);
        assert_eq!(e.days_until(d(2025, 3, 11)), -1);
    }
}
