use crate::types::Sector;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub farm_id: String,
    pub name: String,
    pub sector: Sector,
    /// Current stock count (birds or fish).
    pub bird_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Free-form age at intake, e.g. "3 weeks" or "18d". Used only when no
    /// start date was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    pub is_active: bool,
}

impl Batch {
    /// Age of the batch in whole weeks as of `today`.
    ///
    /// Prefers the recorded start date (floor of elapsed days / 7). Falls
    /// back to parsing the free-form age string. `None` when neither source
    /// is usable.
    pub fn age_in_weeks(&self, today: NaiveDate) -> Option<u32> {
        if let Some(start) = self.start_date {
            let days = (today - start).num_days();
            if days < 0 {
                return None;
            }
            return Some((days / 7) as u32);
        }
        self.age.as_deref().and_then(parse_age_weeks)
    }
}

static AGE_RE: OnceLock<Regex> = OnceLock::new();

fn age_re() -> &'static Regex {
    AGE_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\d+)\s*(weeks?|wks?|w|days?|d|months?|mo|m)\b").unwrap()
    })
}

/// Parse a free-form age string into whole weeks: a leading integer plus a
/// unit token (week/wk/w, day/d, month/mo/m). Months convert at 4 weeks each.
pub fn parse_age_weeks(age: &str) -> Option<u32> {
    let caps = age_re().captures(age)?;
    let n: u32 = caps[1].parse().ok()?;
    let unit = caps[2].to_ascii_lowercase();
    if unit.starts_with("mo") || unit == "m" {
        Some(n * 4)
    } else if unit.starts_with('w') {
        Some(n)
    } else {
        // days
        Some(n / 7)
    }
}
