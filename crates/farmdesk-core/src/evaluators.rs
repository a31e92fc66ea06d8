//! Condition evaluators — one pure function per `ConditionKind`.
//!
//! Each evaluator reads the context, never mutates it, and returns the
//! candidates that should fire. Facts are typed per kind (`TriggerFacts`)
//! and flatten to the loose metadata map only at the persistence boundary.

use crate::action::Metadata;
use crate::context::EvalContext;
use crate::error::Result;
use crate::logbook;
use crate::rule::{
    AgeWindowParams, EggDropParams, InventoryParams, LogGapParams, MortalityParams, Rule,
    ScheduleDueParams, WeightParams,
};
use crate::types::{ConditionKind, Sector};
use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Candidates and facts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TriggerCandidate {
    /// Set when the condition is batch-scoped; farm-wide conditions leave it
    /// empty.
    pub batch_id: Option<String>,
    pub facts: TriggerFacts,
}

impl TriggerCandidate {
    fn farm_wide(facts: TriggerFacts) -> Self {
        Self { batch_id: None, facts }
    }

    fn for_batch(batch_id: impl Into<String>, facts: TriggerFacts) -> Self {
        Self {
            batch_id: Some(batch_id.into()),
            facts,
        }
    }
}

/// Closed union of the facts each condition kind emits. Serializes untagged,
/// so the metadata map holds just the fields.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TriggerFacts {
    InventoryLow {
        item_name: String,
        quantity: f64,
        threshold: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    LogGap {
        /// None when no log has ever been recorded.
        days_since: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_log_date: Option<NaiveDate>,
    },
    MortalitySpike {
        batch_name: String,
        mortality_count: u32,
        bird_count: u32,
        percent: f64,
    },
    ScheduleDue {
        vaccine_name: String,
        scheduled_date: NaiveDate,
        batch_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        sector: Option<Sector>,
        #[serde(skip_serializing_if = "Option::is_none")]
        day_number: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        dosage: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        is_compulsory: bool,
        is_overdue: bool,
        days_overdue: i64,
    },
    AgeWindow {
        batch_name: String,
        age_weeks: u32,
        min_weeks: u32,
        max_weeks: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    EggDrop {
        batch_name: String,
        drop_percent: f64,
        previous_production: f64,
        current_production: f64,
    },
    Underweight {
        batch_name: String,
        age_weeks: u32,
        actual_weight: f64,
        expected_weight: f64,
        percent_below: f64,
    },
    TaskOverdue {
        task_title: String,
        due_date: NaiveDate,
        days_overdue: i64,
    },
    MissingStartDate {
        batch_name: String,
        sector: Sector,
    },
}

impl TriggerFacts {
    /// Flatten to the loose map stored on the triggered action.
    pub fn into_metadata(self) -> Metadata {
        match serde_json::to_value(&self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Metadata::new(),
        }
    }
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Run the evaluator for one parsed condition kind. The match is exhaustive:
/// adding a kind without an evaluator fails to compile.
pub fn evaluate_condition(
    kind: ConditionKind,
    rule: &Rule,
    ctx: &EvalContext,
) -> Result<Vec<TriggerCandidate>> {
    match kind {
        ConditionKind::InventoryBelowThreshold => inventory_below_threshold(rule, ctx),
        ConditionKind::DaysSinceLastLog => days_since_last_log(rule, ctx),
        ConditionKind::MortalityRate => mortality_rate(rule, ctx),
        ConditionKind::HealthScheduleDue => health_schedule_due(rule, ctx),
        ConditionKind::AgeInWeeks => age_in_weeks(rule, ctx),
        ConditionKind::EggProductionDrop => egg_production_drop(rule, ctx),
        ConditionKind::WeightBelowExpected => weight_below_expected(rule, ctx),
        ConditionKind::TaskOverdue => task_overdue(rule, ctx),
        ConditionKind::BatchMissingStartDate => batch_missing_start_date(rule, ctx),
    }
}

// ---------------------------------------------------------------------------
// Evaluators
// ---------------------------------------------------------------------------

fn inventory_below_threshold(rule: &Rule, ctx: &EvalContext) -> Result<Vec<TriggerCandidate>> {
    let params: InventoryParams = rule.params_as()?;
    let out = ctx
        .inventory
        .iter()
        .filter(|item| {
            params
                .category
                .as_deref()
                .map_or(true, |c| item.category.as_deref() == Some(c))
        })
        .filter(|item| item.is_low())
        .map(|item| {
            TriggerCandidate::farm_wide(TriggerFacts::InventoryLow {
                item_name: item.name.clone(),
                quantity: item.quantity,
                threshold: item.min_threshold,
                category: item.category.clone(),
            })
        })
        .collect();
    Ok(out)
}

fn days_since_last_log(rule: &Rule, ctx: &EvalContext) -> Result<Vec<TriggerCandidate>> {
    let params: LogGapParams = rule.params_as()?;
    let facts = match logbook::latest(&ctx.logs) {
        None => TriggerFacts::LogGap {
            days_since: None,
            last_log_date: None,
        },
        Some(last) => {
            let days_since = (ctx.today - last.date).num_days();
            if days_since <= params.days {
                return Ok(Vec::new());
            }
            TriggerFacts::LogGap {
                days_since: Some(days_since),
                last_log_date: Some(last.date),
            }
        }
    };
    Ok(vec![TriggerCandidate::farm_wide(facts)])
}

fn mortality_rate(rule: &Rule, ctx: &EvalContext) -> Result<Vec<TriggerCandidate>> {
    let params: MortalityParams = rule.params_as()?;
    let mut out = Vec::new();
    for batch in ctx.batches_in(rule.sector) {
        if batch.bird_count == 0 {
            continue;
        }
        let recent = logbook::for_batch_within_hours(&ctx.logs, &batch.id, ctx.now, params.hours);
        let mortality: u32 = recent.iter().map(|l| l.mortality_count).sum();
        let percent = round_to(f64::from(mortality) / f64::from(batch.bird_count) * 100.0, 2);
        if percent > params.threshold_percent {
            out.push(TriggerCandidate::for_batch(
                batch.id.clone(),
                TriggerFacts::MortalitySpike {
                    batch_name: batch.name.clone(),
                    mortality_count: mortality,
                    bird_count: batch.bird_count,
                    percent,
                },
            ));
        }
    }
    Ok(out)
}

fn health_schedule_due(rule: &Rule, ctx: &EvalContext) -> Result<Vec<TriggerCandidate>> {
    let params: ScheduleDueParams = rule.params_as()?;
    let mut out = Vec::new();
    for entry in ctx.schedules.iter().filter(|e| e.is_actionable()) {
        let days_until = entry.days_until(ctx.today);
        if days_until > params.days_tolerance {
            continue;
        }
        // is_actionable guarantees a batch id
        let Some(batch_id) = entry.batch_id.as_deref() else {
            continue;
        };
        let batch_name = ctx
            .batches
            .iter()
            .find(|b| b.id == batch_id)
            .map_or_else(|| batch_id.to_string(), |b| b.name.clone());
        out.push(TriggerCandidate::for_batch(
            batch_id,
            TriggerFacts::ScheduleDue {
                vaccine_name: entry.vaccine_name.clone(),
                scheduled_date: entry.scheduled_date,
                batch_name,
                sector: entry.sector,
                day_number: entry.day_number,
                dosage: entry.dosage.clone(),
                method: entry.method.clone(),
                is_compulsory: entry.is_compulsory,
                is_overdue: days_until < 0,
                days_overdue: (-days_until).max(0),
            },
        ));
    }
    Ok(out)
}

fn age_in_weeks(rule: &Rule, ctx: &EvalContext) -> Result<Vec<TriggerCandidate>> {
    let params: AgeWindowParams = rule.params_as()?;
    let mut out = Vec::new();
    for batch in ctx.active_batches_in(rule.sector) {
        let Some(age) = batch.age_in_weeks(ctx.today) else {
            continue;
        };
        if age >= params.min_weeks && age <= params.max_weeks {
            out.push(TriggerCandidate::for_batch(
                batch.id.clone(),
                TriggerFacts::AgeWindow {
                    batch_name: batch.name.clone(),
                    age_weeks: age,
                    min_weeks: params.min_weeks,
                    max_weeks: params.max_weeks,
                    message: params.message.clone(),
                },
            ));
        }
    }
    Ok(out)
}

fn egg_production_drop(rule: &Rule, ctx: &EvalContext) -> Result<Vec<TriggerCandidate>> {
    let params: EggDropParams = rule.params_as()?;
    let mut out = Vec::new();
    for batch in ctx.active_batches_in(Some(Sector::Layer)) {
        let recent = logbook::for_batch_within_days(&ctx.logs, &batch.id, ctx.today, params.days);
        if recent.len() < 2 {
            continue;
        }
        let mid = recent.len() / 2;
        let avg = |logs: &[&crate::logbook::DailyLog]| -> f64 {
            let total: u32 = logs.iter().filter_map(|l| l.eggs_collected).sum();
            total as f64 / logs.len() as f64
        };
        let previous = avg(&recent[..mid]);
        let current = avg(&recent[mid..]);
        if previous == 0.0 {
            continue;
        }
        let drop_percent = round_to((previous - current) / previous * 100.0, 1);
        if drop_percent > params.drop_percent {
            out.push(TriggerCandidate::for_batch(
                batch.id.clone(),
                TriggerFacts::EggDrop {
                    batch_name: batch.name.clone(),
                    drop_percent,
                    previous_production: round_to(previous, 1),
                    current_production: round_to(current, 1),
                },
            ));
        }
    }
    Ok(out)
}

fn weight_below_expected(rule: &Rule, ctx: &EvalContext) -> Result<Vec<TriggerCandidate>> {
    let params: WeightParams = rule.params_as()?;
    let mut out = Vec::new();
    for batch in ctx.active_batches_in(Some(Sector::Broiler)) {
        let Some(age) = batch.age_in_weeks(ctx.today) else {
            continue;
        };
        let Some(expected) = params.expected_for_week(age) else {
            continue;
        };
        let Some(log) = logbook::latest_weight_log(&ctx.logs, &batch.id) else {
            continue;
        };
        let Some(actual) = log.avg_weight_grams else {
            continue;
        };
        let floor = expected * (1.0 - params.tolerance_percent / 100.0);
        if actual < floor {
            out.push(TriggerCandidate::for_batch(
                batch.id.clone(),
                TriggerFacts::Underweight {
                    batch_name: batch.name.clone(),
                    age_weeks: age,
                    actual_weight: actual,
                    expected_weight: expected,
                    percent_below: round_to((expected - actual) / expected * 100.0, 1),
                },
            ));
        }
    }
    Ok(out)
}

fn task_overdue(_rule: &Rule, ctx: &EvalContext) -> Result<Vec<TriggerCandidate>> {
    let mut out = Vec::new();
    for task in &ctx.tasks {
        let Some(days) = task.days_overdue(ctx.today) else {
            continue;
        };
        // days_overdue only returns Some when a due date exists
        let Some(due) = task.due_date else { continue };
        out.push(TriggerCandidate::farm_wide(TriggerFacts::TaskOverdue {
            task_title: task.title.clone(),
            due_date: due,
            days_overdue: days,
        }));
    }
    Ok(out)
}

fn batch_missing_start_date(rule: &Rule, ctx: &EvalContext) -> Result<Vec<TriggerCandidate>> {
    let out = ctx
        .active_batches_in(rule.sector)
        .filter(|b| b.start_date.is_none())
        .map(|b| {
            TriggerCandidate::for_batch(
                b.id.clone(),
                TriggerFacts::MissingStartDate {
                    batch_name: b.name.clone(),
                    sector: b.sector,
                },
            )
        })
        .collect();
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
