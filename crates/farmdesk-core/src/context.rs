use crate::batch::Batch;
use crate::farm::Farm;
use crate::inventory::InventoryItem;
use crate::logbook::DailyLog;
use crate::schedule::HealthSchedule;
use crate::task::FarmTask;
use crate::types::Sector;
use chrono::{DateTime, NaiveDate, Utc};

/// Everything the evaluators may look at during one evaluation cycle.
///
/// Built fresh per cycle, owned by the engine for the duration of one
/// `evaluate` call, and read-only throughout. `now`/`today` are captured
/// once so every evaluator sees the same clock.
pub struct EvalContext {
    pub farm: Farm,
    pub batches: Vec<Batch>,
    pub logs: Vec<DailyLog>,
    pub inventory: Vec<InventoryItem>,
    pub tasks: Vec<FarmTask>,
    pub schedules: Vec<HealthSchedule>,
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

impl EvalContext {
    pub fn new(
        farm: Farm,
        batches: Vec<Batch>,
        logs: Vec<DailyLog>,
        inventory: Vec<InventoryItem>,
        tasks: Vec<FarmTask>,
        schedules: Vec<HealthSchedule>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            farm,
            batches,
            logs,
            inventory,
            tasks,
            schedules,
            today: now.date_naive(),
            now,
        }
    }

    /// Batches matching an optional sector restriction.
    pub fn batches_in(&self, sector: Option<Sector>) -> impl Iterator<Item = &Batch> {
        self.batches
            .iter()
            .filter(move |b| sector.map_or(true, |s| b.sector == s))
    }

    /// Active batches matching an optional sector restriction.
    pub fn active_batches_in(&self, sector: Option<Sector>) -> impl Iterator<Item = &Batch> {
        self.batches_in(sector).filter(|b| b.is_active)
    }

    pub fn has_batch_in(&self, sector: Sector) -> bool {
        self.batches.iter().any(|b| b.sector == sector)
    }
}
