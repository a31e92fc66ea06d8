//! Triggered actions — persisted instances of a rule having fired.
//!
//! Records are never deleted; dismiss/snooze/resolve flip the status and the
//! audit trail is the status history. At most one action per (rule, batch)
//! pair may be active at a time.

use crate::types::ActionStatus;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use serde_json::Value;

pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggeredAction {
    pub id: String,
    pub farm_id: String,
    pub rule_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub status: ActionStatus,
    pub triggered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snoozed_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Facts captured at trigger time, for rendering.
    #[serde(default)]
    pub metadata: Metadata,
}

impl TriggeredAction {
    /// Dedup key: at most one active action may exist per key.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.rule_id, self.batch_id.as_deref())
    }

    /// Whether this action still occupies its dedup key at `now`. A snoozed
    /// action whose `snoozed_until` has elapsed no longer blocks a fresh
    /// trigger.
    pub fn blocks_retrigger(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            ActionStatus::Active => true,
            ActionStatus::Snoozed => self.snoozed_until.is_some_and(|until| until > now),
            ActionStatus::Dismissed | ActionStatus::Resolved => false,
        }
    }

    pub fn dismiss(&mut self) {
        self.status = ActionStatus::Dismissed;
    }

    pub fn snooze(&mut self, hours: i64, now: DateTime<Utc>) {
        self.status = ActionStatus::Snoozed;
        self.snoozed_until = Some(now + Duration::hours(hours));
    }

    pub fn resolve(&mut self, now: DateTime<Utc>) {
        self.status = ActionStatus::Resolved;
        self.resolved_at = Some(now);
    }
}

/// (rule id, batch id) identity of a trigger; `batch` is None for farm-wide
/// conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub rule_id: String,
    pub batch_id: Option<String>,
}

impl DedupKey {
    pub fn new(rule_id: &str, batch_id: Option<&str>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            batch_id: batch_id.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action() -> TriggeredAction {
        TriggeredAction {
            id: "a1".into(),
            farm_id: "f1".into(),
            rule_id: "r1".into(),
            batch_id: Some("b1".into()),
            status: ActionStatus::Active,
            triggered_at: Utc::now(),
            snoozed_until: None,
            resolved_at: None,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn lifecycle_transitions() {
        let now = Utc::now();

        let mut a = action();
        a.dismiss();
        assert_eq!(a.status, ActionStatus::Dismissed);
        assert!(!a.blocks_retrigger(now));

        let mut a = action();
        a.resolve(now);
        assert_eq!(a.status, ActionStatus::Resolved);
        assert_eq!(a.resolved_at, Some(now));
        assert!(!a.blocks_retrigger(now));
    }

    #[test]
    fn snooze_blocks_until_expiry() {
        let now = Utc::now();
        let mut a = action();
        a.snooze(4, now);
        assert_eq!(a.status, ActionStatus::Snoozed);
        assert!(a.blocks_retrigger(now + Duration::hours(3)));
        assert!(!a.blocks_retrigger(now + Duration::hours(5)));
    }

    #[test]
    fn dedup_key_distinguishes_batchless() {
        let mut a = action();
        let keyed = a.dedup_key();
        a.batch_id = None;
        let farm_wide = a.dedup_key();
        assert_ne!(keyed, farm_wide);
        assert_eq!(farm_wide, DedupKey::new("r1", None));
    }
}
