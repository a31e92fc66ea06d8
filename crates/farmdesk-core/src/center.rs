//! Triggered-action lifecycle manager — the surface the presentation layer
//! talks to. Owns a `DataStore`, runs refresh cycles through the engine, and
//! exposes dismiss/snooze/resolve plus the sorted, rule-joined active list.

use crate::action::TriggeredAction;
use crate::context::EvalContext;
use crate::engine;
use crate::error::{FarmdeskError, Result};
use crate::rule::Rule;
use crate::store::{ActionUpdate, DataStore};
use crate::types::{ActionStatus, Sector, Severity};
use chrono::{Duration, Utc};

/// Who is asking, and for which farm. Threaded explicitly into every refresh
/// so the engine stays free of ambient session state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user_id: Option<String>,
    pub farm_id: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, farm_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            farm_id: Some(farm_id.into()),
        }
    }
}

/// A triggered action joined with the rule details the card renders.
#[derive(Debug, Clone)]
pub struct ActionView {
    pub action: TriggeredAction,
    pub rule_key: String,
    pub title: String,
    pub description: String,
    pub action_text: String,
    pub sector: Option<Sector>,
    pub severity: Severity,
}

impl ActionView {
    fn join(action: TriggeredAction, rule: &Rule) -> Self {
        Self {
            action,
            rule_key: rule.key.clone(),
            title: rule.title.clone(),
            description: rule.description.clone(),
            action_text: rule.action_text.clone(),
            sector: rule.sector,
            severity: rule.severity,
        }
    }
}

pub struct ActionCenter<S> {
    store: S,
    actions: Vec<ActionView>,
    loading: bool,
    last_error: Option<String>,
}

impl<S: DataStore> ActionCenter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            actions: Vec::new(),
            loading: false,
            last_error: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active actions, severity-sorted, joined with their rule.
    pub fn actions(&self) -> &[ActionView] {
        &self.actions
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Error from the last refresh, if it failed. Cleared by the next
    /// successful refresh.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Highest-priority action, or None when the list is clear.
    pub fn top_action(&self) -> Option<&ActionView> {
        self.actions.first()
    }

    /// Actions whose rule is scoped to `sector` or global. `None` returns
    /// everything.
    pub fn filter_by_sector(&self, sector: Option<Sector>) -> Vec<&ActionView> {
        self.actions
            .iter()
            .filter(|v| sector.map_or(true, |s| v.sector.is_none() || v.sector == Some(s)))
            .collect()
    }

    /// "1 critical, 2 warning, 3 info"
    pub fn summarize(&self) -> String {
        let count = |s: Severity| self.actions.iter().filter(|v| v.severity == s).count();
        format!(
            "{} critical, {} warning, {} info",
            count(Severity::Critical),
            count(Severity::Warning),
            count(Severity::Info)
        )
    }

    /// Run one full evaluation cycle for the session's farm.
    ///
    /// Without an authenticated user and a selected farm this is a no-op that
    /// leaves an empty list. On a fetch failure the previous list is kept and
    /// the error is both recorded and returned.
    pub async fn refresh(&mut self, session: &Session) -> Result<()> {
        let (Some(_user), Some(farm_id)) = (session.user_id.as_deref(), session.farm_id.as_deref())
        else {
            self.actions.clear();
            return Ok(());
        };
        let farm_id = farm_id.to_string();

        self.loading = true;
        match self.run_cycle(&farm_id).await {
            Ok(views) => {
                self.actions = views;
                self.loading = false;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.loading = false;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_cycle(&mut self, farm_id: &str) -> Result<Vec<ActionView>> {
        let rules = self.store.list_active_rules().await?;
        let farm = self
            .store
            .get_farm(farm_id)
            .await?
            .ok_or_else(|| FarmdeskError::FarmNotFound(farm_id.to_string()))?;
        let batches = self.store.list_batches(farm_id).await?;
        let logs = self.store.list_logs(farm_id).await?;
        let inventory = self.store.list_inventory(farm_id).await?;
        let tasks = self.store.list_tasks(farm_id).await?;
        let schedules = self.store.list_schedules(farm_id).await?;
        let existing = self.store.list_active_actions(farm_id).await?;

        let ctx = EvalContext::new(farm, batches, logs, inventory, tasks, schedules, Utc::now());
        let emitted = engine::evaluate(&rules, &ctx, &existing);
        tracing::debug!(farm = %farm_id, new = emitted.len(), "evaluation cycle complete");

        for trigger in emitted {
            self.store
                .create_action(
                    farm_id,
                    &trigger.rule_id,
                    trigger.batch_id.as_deref(),
                    trigger.metadata,
                )
                .await?;
        }

        let active = self.store.list_active_actions(farm_id).await?;
        let mut views = Vec::new();
        for action in active {
            match rules.iter().find(|r| r.id == action.rule_id) {
                Some(rule) => views.push(ActionView::join(action, rule)),
                None => {
                    tracing::debug!(action = %action.id, rule = %action.rule_id, "active action for inactive rule, hidden");
                }
            }
        }
        views.sort_by_key(|v| v.severity.rank());
        Ok(views)
    }

    /// Dismiss: terminal for this record; the key frees up for future cycles.
    /// The local list is updated optimistically before the store write; a
    /// write failure propagates and the caller decides whether to re-refresh.
    pub async fn dismiss(&mut self, action_id: &str) -> Result<()> {
        self.remove_local(action_id);
        self.store
            .update_action(
                action_id,
                ActionUpdate {
                    status: ActionStatus::Dismissed,
                    snoozed_until: None,
                    resolved_at: None,
                },
            )
            .await?;
        Ok(())
    }

    /// Snooze for `hours`; the action leaves the active list now and its key
    /// frees up once the snooze lapses.
    pub async fn snooze(&mut self, action_id: &str, hours: i64) -> Result<()> {
        self.remove_local(action_id);
        self.store
            .update_action(
                action_id,
                ActionUpdate {
                    status: ActionStatus::Snoozed,
                    snoozed_until: Some(Utc::now() + Duration::hours(hours)),
                    resolved_at: None,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn resolve(&mut self, action_id: &str) -> Result<()> {
        self.remove_local(action_id);
        self.store
            .update_action(
                action_id,
                ActionUpdate {
                    status: ActionStatus::Resolved,
                    snoozed_until: None,
                    resolved_at: Some(Utc::now()),
                },
            )
            .await?;
        Ok(())
    }

    fn remove_local(&mut self, action_id: &str) {
        self.actions.retain(|v| v.action.id != action_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Batch;
    use crate::farm::Farm;
    use crate::inventory::InventoryItem;
    use crate::rule::default_rules;
    use crate::store::MemoryStore;
    use crate::types::TaskStatus;

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.rules = default_rules();
        store.farms = vec![Farm::new("f1", "Sunrise Farm")];
        store.batches = vec![Batch {
            id: "b1".into(),
            farm_id: "f1".into(),
            name: "Coop A".into(),
            sector: Sector::Layer,
            bird_count: 200,
            start_date: None,
            age: Some("10 weeks".into()),
            is_active: true,
        }];
        store.inventory = vec![InventoryItem {
            id: "i1".into(),
            farm_id: "f1".into(),
            name: "Layer mash".into(),
            category: Some("feed".into()),
            quantity: 2.0,
            unit: Some("kg".into()),
            min_threshold: 10.0,
        }];
        store
    }

    fn session() -> Session {
        Session::new("u1", "f1")
    }

    #[tokio::test]
    async fn refresh_requires_user_and_farm() {
        let mut center = ActionCenter::new(seeded_store());
        center.refresh(&Session::default()).await.unwrap();
        assert!(center.actions().is_empty());
        assert!(center.last_error().is_none());

        let half = Session {
            user_id: Some("u1".into()),
            farm_id: None,
        };
        center.refresh(&half).await.unwrap();
        assert!(center.actions().is_empty());
    }

    #[tokio::test]
    async fn refresh_persists_and_sorts() {
        let mut center = ActionCenter::new(seeded_store());
        center.refresh(&session()).await.unwrap();

        // feed-low (warning) + log-gap and batch-no-start-date (info).
        assert!(center.actions().len() >= 3);
        assert_eq!(center.top_action().unwrap().rule_key, "feed-low");
        let ranks: Vec<u8> = center.actions().iter().map(|v| v.severity.rank()).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
        assert!(!center.is_loading());

        // Second refresh does not duplicate records.
        let count = center.store().actions.len();
        center.refresh(&session()).await.unwrap();
        assert_eq!(center.store().actions.len(), count);
    }

    #[tokio::test]
    async fn missing_farm_is_hard_failure() {
        let mut center = ActionCenter::new(seeded_store());
        center.refresh(&session()).await.unwrap();
        let before = center.actions().len();

        let gone = Session::new("u1", "f404");
        let err = center.refresh(&gone).await.unwrap_err();
        assert!(matches!(err, FarmdeskError::FarmNotFound(_)));
        assert!(center.last_error().is_some());
        // Previous list survives the failed cycle.
        assert_eq!(center.actions().len(), before);
        assert!(!center.is_loading());

        // A good refresh clears the error.
        center.refresh(&session()).await.unwrap();
        assert!(center.last_error().is_none());
    }

    #[tokio::test]
    async fn lifecycle_ops_remove_from_list() {
        let mut center = ActionCenter::new(seeded_store());
        center.refresh(&session()).await.unwrap();

        let top = center.top_action().unwrap().action.id.clone();
        center.dismiss(&top).await.unwrap();
        assert!(center.actions().iter().all(|v| v.action.id != top));
        assert!(center
            .top_action()
            .map_or(true, |v| v.action.id != top));

        let next = center.top_action().unwrap().action.id.clone();
        center.snooze(&next, 4).await.unwrap();
        assert!(center.actions().iter().all(|v| v.action.id != next));

        let last = center.top_action().unwrap().action.id.clone();
        center.resolve(&last).await.unwrap();
        assert!(center.actions().iter().all(|v| v.action.id != last));
        let stored = center
            .store()
            .actions
            .iter()
            .find(|a| a.id == last)
            .unwrap();
        assert_eq!(stored.status, ActionStatus::Resolved);
        assert!(stored.resolved_at.is_some());
    }

    #[tokio::test]
    async fn resolved_key_retriggers_next_cycle() {
        let mut center = ActionCenter::new(seeded_store());
        center.refresh(&session()).await.unwrap();
        let top = center.top_action().unwrap();
        assert_eq!(top.rule_key, "feed-low");
        let id = top.action.id.clone();

        center.resolve(&id).await.unwrap();
        center.refresh(&session()).await.unwrap();

        // Feed is still low, so the rule fires again as a fresh record.
        let again = center
            .actions()
            .iter()
            .find(|v| v.rule_key == "feed-low")
            .unwrap();
        assert_ne!(again.action.id, id);
    }

    #[tokio::test]
    async fn snoozed_key_stays_quiet_until_expiry() {
        let mut center = ActionCenter::new(seeded_store());
        center.refresh(&session()).await.unwrap();
        let id = center.top_action().unwrap().action.id.clone();

        center.snooze(&id, 6).await.unwrap();
        center.refresh(&session()).await.unwrap();
        assert!(center.actions().iter().all(|v| v.rule_key != "feed-low"));
    }

    #[tokio::test]
    async fn filter_by_sector_keeps_globals() {
        let mut center = ActionCenter::new(seeded_store());
        center.refresh(&session()).await.unwrap();

        let layer = center.filter_by_sector(Some(Sector::Layer));
        assert!(!layer.is_empty());
        assert!(layer
            .iter()
            .all(|v| v.sector.is_none() || v.sector == Some(Sector::Layer)));

        let broiler = center.filter_by_sector(Some(Sector::Broiler));
        assert!(broiler.iter().all(|v| v.sector != Some(Sector::Layer)));
        assert!(broiler.iter().all(|v| v.sector != Some(Sector::Fish)));

        assert_eq!(center.filter_by_sector(None).len(), center.actions().len());
    }

    #[tokio::test]
    async fn write_failure_propagates_after_local_removal() {
        let mut center = ActionCenter::new(seeded_store());
        center.refresh(&session()).await.unwrap();
        let id = center.top_action().unwrap().action.id.clone();
        let before = center.actions().len();

        center.store.fail_writes = true;
        let err = center.dismiss(&id).await.unwrap_err();
        assert!(matches!(err, FarmdeskError::Store(_)));
        // Optimistic removal already happened; reconciliation is on the caller.
        assert_eq!(center.actions().len(), before - 1);

        center.store.fail_writes = false;
        center.refresh(&session()).await.unwrap();
        assert!(center.actions().iter().any(|v| v.action.id == id));
    }

    #[tokio::test]
    async fn summarize_counts() {
        let mut center = ActionCenter::new(seeded_store());
        center.refresh(&session()).await.unwrap();
        let s = center.summarize();
        assert!(s.contains("critical"));
        assert!(s.contains("warning"));
    }

    #[tokio::test]
    async fn overdue_task_surfaces_with_metadata() {
        let mut store = seeded_store();
        store.tasks = vec![crate::task::FarmTask {
            id: "t1".into(),
            farm_id: "f1".into(),
            title: "Order feed".into(),
            status: TaskStatus::Pending,
            due_date: Some(Utc::now().date_naive() - Duration::days(3)),
            assigned_to: None,
        }];
        let mut center = ActionCenter::new(store);
        center.refresh(&session()).await.unwrap();

        let view = center
            .actions()
            .iter()
            .find(|v| v.rule_key == "task-overdue")
            .unwrap();
        assert_eq!(
            view.action.metadata.get("task_title").and_then(|v| v.as_str()),
            Some("Order feed")
        );
        assert_eq!(
            view.action.metadata.get("days_overdue").and_then(|v| v.as_i64()),
            Some(3)
        );
    }
}
