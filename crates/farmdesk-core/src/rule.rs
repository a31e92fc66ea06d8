//! Declarative rule definitions and their condition parameters.
//!
//! Rules are authored outside the engine (seeded or user-maintained); the
//! engine only reads them. The `params` bag is opaque JSON in the store and
//! is deserialized into a typed struct per condition kind at evaluation time.

use crate::error::{FarmdeskError, Result};
use crate::types::{Sector, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    /// Stable human-assigned key, unique across the rule set.
    pub key: String,
    pub title: String,
    pub description: String,
    /// Imperative text shown on the action card ("Restock feed today").
    pub action_text: String,
    /// Restricts the rule to batches of one sector; None means global.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<Sector>,
    pub severity: Severity,
    /// Condition kind token as stored; parsed by the engine per cycle.
    pub condition: String,
    #[serde(default)]
    pub params: Value,
    pub is_active: bool,
}

impl Rule {
    /// Deserialize this rule's params into the evaluator's typed shape,
    /// tolerating an absent bag (serde defaults fill in).
    pub fn params_as<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let value = if self.params.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            self.params.clone()
        };
        serde_json::from_value(value).map_err(|e| FarmdeskError::InvalidParams {
            rule: self.key.clone(),
            reason: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Per-kind parameter shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryParams {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogGapParams {
    #[serde(default = "default_log_gap_days")]
    pub days: i64,
}

fn default_log_gap_days() -> i64 {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub struct MortalityParams {
    #[serde(default = "default_mortality_hours")]
    pub hours: i64,
    #[serde(default = "default_mortality_threshold")]
    pub threshold_percent: f64,
}

fn default_mortality_hours() -> i64 {
    24
}

fn default_mortality_threshold() -> f64 {
    2.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleDueParams {
    #[serde(default)]
    pub days_tolerance: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgeWindowParams {
    pub min_weeks: u32,
    pub max_weeks: u32,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EggDropParams {
    #[serde(default = "default_egg_days")]
    pub days: i64,
    #[serde(default = "default_egg_drop_percent")]
    pub drop_percent: f64,
}

fn default_egg_days() -> i64 {
    3
}

fn default_egg_drop_percent() -> f64 {
    10.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightParams {
    /// Expected average weight in grams keyed by age week ("5" -> 2200.0).
    pub weights_by_week: BTreeMap<String, f64>,
    #[serde(default = "default_weight_tolerance")]
    pub tolerance_percent: f64,
}

fn default_weight_tolerance() -> f64 {
    15.0
}

impl WeightParams {
    pub fn expected_for_week(&self, week: u32) -> Option<f64> {
        self.weights_by_week.get(&week.to_string()).copied()
    }
}

// ---------------------------------------------------------------------------
// Starter catalogue
// ---------------------------------------------------------------------------

/// The rule set a fresh deployment is seeded with. Embedders may replace or
/// extend it; the engine treats these like any stored rules.
pub fn default_rules() -> Vec<Rule> {
    fn rule(
        key: &str,
        title: &str,
        description: &str,
        action_text: &str,
        sector: Option<Sector>,
        severity: Severity,
        condition: &str,
        params: Value,
    ) -> Rule {
        Rule {
            id: format!("rule-{key}"),
            key: key.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            action_text: action_text.to_string(),
            sector,
            severity,
            condition: condition.to_string(),
            params,
            is_active: true,
        }
    }

    vec![
        rule(
            "feed-low",
            "Inventory running low",
            "An inventory item has fallen to or below its minimum threshold.",
            "Restock before the next feeding cycle.",
            None,
            Severity::Warning,
            "inventory_below_threshold",
            Value::Null,
        ),
        rule(
            "log-gap",
            "Daily logs missing",
            "No daily log has been recorded recently.",
            "Record today's log for each batch.",
            None,
            Severity::Info,
            "days_since_last_log",
            serde_json::json!({ "days": 2 }),
        ),
        rule(
            "mortality-spike",
            "Mortality spike",
            "Mortality in the last 24 hours exceeds the safe percentage of stock.",
            "Inspect the batch and isolate sick birds now.",
            None,
            Severity::Critical,
            "mortality_rate",
            serde_json::json!({ "hours": 24, "threshold_percent": 2 }),
        ),
        rule(
            "vaccine-due",
            "Vaccination due",
            "A scheduled vaccination is due or overdue.",
            "Administer the scheduled vaccine.",
            None,
            Severity::Critical,
            "health_schedule_due",
            serde_json::json!({ "days_tolerance": 0 }),
        ),
        rule(
            "layer-point-of-lay",
            "Batch approaching point of lay",
            "Layer batch age is in the point-of-lay window.",
            "Prepare nest boxes and switch to layer feed.",
            Some(Sector::Layer),
            Severity::Info,
            "age_in_weeks",
            serde_json::json!({ "min_weeks": 16, "max_weeks": 20 }),
        ),
        rule(
            "egg-drop",
            "Egg production drop",
            "Egg collection has dropped sharply over the last few days.",
            "Check feed, water, lighting, and signs of disease.",
            Some(Sector::Layer),
            Severity::Warning,
            "egg_production_drop",
            serde_json::json!({ "days": 3, "drop_percent": 10 }),
        ),
        rule(
            "broiler-underweight",
            "Broilers under target weight",
            "Average weight is below the expected curve for the batch age.",
            "Review feed quality and quantity.",
            Some(Sector::Broiler),
            Severity::Warning,
            "weight_below_expected",
            serde_json::json!({
                "tolerance_percent": 15,
                "weights_by_week": {
                    "1": 180, "2": 450, "3": 850, "4": 1350, "5": 1900, "6": 2500
                }
            }),
        ),
        rule(
            "task-overdue",
            "Task overdue",
            "A farm task is past its due date.",
            "Complete or reschedule the task.",
            None,
            Severity::Info,
            "task_overdue",
            Value::Null,
        ),
        rule(
            "batch-no-start-date",
            "Batch missing start date",
            "A batch has no start date, so age-based checks cannot run.",
            "Record the batch start date.",
            None,
            Severity::Info,
            "batch_missing_start_date",
            Value::Null,
        ),
    ]
}
