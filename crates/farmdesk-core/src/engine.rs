//! Rule evaluation engine — runs the active rule set over one context,
//! suppresses triggers that already have a live action, and ranks the rest.

use crate::action::{DedupKey, Metadata, TriggeredAction};
use crate::context::EvalContext;
use crate::evaluators::evaluate_condition;
use crate::rule::Rule;
use crate::types::{ConditionKind, Severity};
use std::collections::HashSet;

/// One trigger the engine decided should become (or already describes) a new
/// triggered action.
#[derive(Debug, Clone)]
pub struct EmittedTrigger {
    pub rule_id: String,
    pub rule_key: String,
    pub severity: Severity,
    pub batch_id: Option<String>,
    pub metadata: Metadata,
}

impl EmittedTrigger {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.rule_id, self.batch_id.as_deref())
    }
}

/// Evaluate `rules` against `ctx`, suppressing any trigger whose dedup key is
/// already occupied by one of `existing`.
///
/// Guarantees:
/// - at most one emission per (rule, batch) key per call;
/// - no emission for a key held by a live existing action;
/// - output sorted by severity, critical first, ties in rule order (stable).
///
/// A rule that fails to evaluate (unknown condition token, bad params,
/// evaluator error) is logged and skipped; the rest of the cycle proceeds.
pub fn evaluate(
    rules: &[Rule],
    ctx: &EvalContext,
    existing: &[TriggeredAction],
) -> Vec<EmittedTrigger> {
    let mut occupied: HashSet<DedupKey> = existing
        .iter()
        .filter(|a| a.blocks_retrigger(ctx.now))
        .map(TriggeredAction::dedup_key)
        .collect();

    let mut emitted = Vec::new();
    for rule in rules.iter().filter(|r| r.is_active) {
        // Sector-restricted rules are skipped outright when the farm has no
        // batch in that sector.
        if let Some(sector) = rule.sector {
            if !ctx.has_batch_in(sector) {
                continue;
            }
        }

        let kind: ConditionKind = match rule.condition.parse() {
            Ok(kind) => kind,
            Err(_) => {
                tracing::warn!(rule = %rule.key, condition = %rule.condition, "unknown condition kind, skipping rule");
                continue;
            }
        };

        let candidates = match evaluate_condition(kind, rule, ctx) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(rule = %rule.key, error = %e, "evaluator failed, skipping rule");
                continue;
            }
        };

        for candidate in candidates {
            let key = DedupKey::new(&rule.id, candidate.batch_id.as_deref());
            if !occupied.insert(key) {
                continue;
            }
            emitted.push(EmittedTrigger {
                rule_id: rule.id.clone(),
                rule_key: rule.key.clone(),
                severity: rule.severity,
                batch_id: candidate.batch_id,
                metadata: candidate.facts.into_metadata(),
            });
        }
    }

    emitted.sort_by_key(|t| t.severity.rank());
    emitted
}
