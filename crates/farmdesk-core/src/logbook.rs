//! Daily log records and the window helpers the evaluators lean on.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLog {
    pub id: String,
    pub batch_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub mortality_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eggs_collected: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_weight_grams: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Most recent log across all batches, by log date.
pub fn latest(logs: &[DailyLog]) -> Option<&DailyLog> {
    logs.iter().max_by_key(|l| l.date)
}

/// Logs for one batch whose date falls within the trailing `hours` window.
/// Log dates are calendar days; a day counts when its midnight is inside the
/// window.
pub fn for_batch_within_hours<'a>(
    logs: &'a [DailyLog],
    batch_id: &str,
    now: DateTime<Utc>,
    hours: i64,
) -> Vec<&'a DailyLog> {
    let cutoff = (now - Duration::hours(hours)).date_naive();
    logs.iter()
        .filter(|l| l.batch_id == batch_id && l.date >= cutoff)
        .collect()
}

/// Logs for one batch within the trailing `days` window, sorted by date
/// ascending.
pub fn for_batch_within_days<'a>(
    logs: &'a [DailyLog],
    batch_id: &str,
    today: NaiveDate,
    days: i64,
) -> Vec<&'a DailyLog> {
    let cutoff = today - Duration::days(days);
    let mut out: Vec<&DailyLog> = logs
        .iter()
        .filter(|l| l.batch_id == batch_id && l.date >= cutoff)
        .collect();
    out.sort_by_key(|l| l.date);
    out
}

/// Latest log for a batch that carries weight data.
pub fn latest_weight_log<'a>(logs: &'a [DailyLog], batch_id: &str) -> Option<&'a DailyLog> {
    logs.iter()
        .filter(|l| l.batch_id == batch_id && l.avg_weight_grams.is_some())
        .max_by_key(|l| l.date)
}
