//! Data accessor seam. The engine and lifecycle manager only ever talk to a
//! `DataStore`; the hosted backend lives behind this trait, and tests (or
//! embedders without a backend) use `MemoryStore`.

use crate::action::{Metadata, TriggeredAction};
use crate::batch::Batch;
use crate::error::{FarmdeskError, Result};
use crate::farm::Farm;
use crate::inventory::InventoryItem;
use crate::logbook::DailyLog;
use crate::rule::Rule;
use crate::schedule::HealthSchedule;
use crate::task::FarmTask;
use crate::types::ActionStatus;
use chrono::{DateTime, Utc};

/// Field updates applied to a triggered action by the lifecycle operations.
#[derive(Debug, Clone)]
pub struct ActionUpdate {
    pub status: ActionStatus,
    pub snoozed_until: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[allow(async_fn_in_trait)]
pub trait DataStore {
    async fn list_active_rules(&self) -> Result<Vec<Rule>>;
    async fn get_farm(&self, farm_id: &str) -> Result<Option<Farm>>;
    async fn list_batches(&self, farm_id: &str) -> Result<Vec<Batch>>;
    async fn list_logs(&self, farm_id: &str) -> Result<Vec<DailyLog>>;
    async fn list_inventory(&self, farm_id: &str) -> Result<Vec<InventoryItem>>;
    async fn list_tasks(&self, farm_id: &str) -> Result<Vec<FarmTask>>;
    /// Schedules across all of the farm's batches, universal templates
    /// included.
    async fn list_schedules(&self, farm_id: &str) -> Result<Vec<HealthSchedule>>;
    async fn list_active_actions(&self, farm_id: &str) -> Result<Vec<TriggeredAction>>;
    /// Insert a new active action. Implementations must enforce the
    /// (rule, batch, active) uniqueness: when a live action already holds
    /// the key, return it instead of inserting a duplicate.
    async fn create_action(
        &mut self,
        farm_id: &str,
        rule_id: &str,
        batch_id: Option<&str>,
        metadata: Metadata,
    ) -> Result<TriggeredAction>;
    async fn update_action(&mut self, action_id: &str, update: ActionUpdate)
        -> Result<TriggeredAction>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub rules: Vec<Rule>,
    pub farms: Vec<Farm>,
    pub batches: Vec<Batch>,
    pub logs: Vec<DailyLog>,
    pub inventory: Vec<InventoryItem>,
    pub tasks: Vec<FarmTask>,
    pub schedules: Vec<HealthSchedule>,
    pub actions: Vec<TriggeredAction>,
    /// Test hook: when set, all writes fail with a store error.
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn farm_batch_ids(&self, farm_id: &str) -> Vec<&str> {
        self.batches
            .iter()
            .filter(|b| b.farm_id == farm_id)
            .map(|b| b.id.as_str())
            .collect()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(FarmdeskError::Store("write rejected".into()));
        }
        Ok(())
    }
}

impl DataStore for MemoryStore {
    async fn list_active_rules(&self) -> Result<Vec<Rule>> {
        Ok(self.rules.iter().filter(|r| r.is_active).cloned().collect())
    }

    async fn get_farm(&self, farm_id: &str) -> Result<Option<Farm>> {
        Ok(self.farms.iter().find(|f| f.id == farm_id).cloned())
    }

    async fn list_batches(&self, farm_id: &str) -> Result<Vec<Batch>> {
        Ok(self
            .batches
            .iter()
            .filter(|b| b.farm_id == farm_id)
            .cloned()
            .collect())
    }

    async fn list_logs(&self, farm_id: &str) -> Result<Vec<DailyLog>> {
        let ids = self.farm_batch_ids(farm_id);
        Ok(self
            .logs
            .iter()
            .filter(|l| ids.contains(&l.batch_id.as_str()))
            .cloned()
            .collect())
    }

    async fn list_inventory(&self, farm_id: &str) -> Result<Vec<InventoryItem>> {
        Ok(self
            .inventory
            .iter()
            .filter(|i| i.farm_id == farm_id)
            .cloned()
            .collect())
    }

    async fn list_tasks(&self, farm_id: &str) -> Result<Vec<FarmTask>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.farm_id == farm_id)
            .cloned()
            .collect())
    }

    async fn list_schedules(&self, farm_id: &str) -> Result<Vec<HealthSchedule>> {
        let ids = self.farm_batch_ids(farm_id);
        Ok(self
            .schedules
            .iter()
            .filter(|s| {
                s.is_universal
                    || s.batch_id
                        .as_deref()
                        .map_or(true, |b| ids.contains(&b))
            })
            .cloned()
            .collect())
    }

    async fn list_active_actions(&self, farm_id: &str) -> Result<Vec<TriggeredAction>> {
        Ok(self
            .actions
            .iter()
            .filter(|a| a.farm_id == farm_id && a.status == ActionStatus::Active)
            .cloned()
            .collect())
    }

    async fn create_action(
        &mut self,
        farm_id: &str,
        rule_id: &str,
        batch_id: Option<&str>,
        metadata: Metadata,
    ) -> Result<TriggeredAction> {
        self.check_writable()?;
        let now = Utc::now();
        // Conditional insert: the (rule, batch, active) key is unique.
        if let Some(held) = self.actions.iter().find(|a| {
            a.farm_id == farm_id
                && a.rule_id == rule_id
                && a.batch_id.as_deref() == batch_id
                && a.blocks_retrigger(now)
        }) {
            return Ok(held.clone());
        }
        let action = TriggeredAction {
            id: uuid::Uuid::new_v4().to_string(),
            farm_id: farm_id.to_string(),
            rule_id: rule_id.to_string(),
            batch_id: batch_id.map(str::to_string),
            status: ActionStatus::Active,
            triggered_at: now,
            snoozed_until: None,
            resolved_at: None,
            metadata,
        };
        self.actions.push(action.clone());
        Ok(action)
    }

    async fn update_action(
        &mut self,
        action_id: &str,
        update: ActionUpdate,
    ) -> Result<TriggeredAction> {
        self.check_writable()?;
        let action = self
            .actions
            .iter_mut()
            .find(|a| a.id == action_id)
            .ok_or_else(|| FarmdeskError::ActionNotFound(action_id.to_string()))?;
        action.status = update.status;
        action.snoozed_until = update.snoozed_until;
        action.resolved_at = update.resolved_at;
        Ok(action.clone())
    }
}
