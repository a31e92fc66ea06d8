use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Sector
// ---------------------------------------------------------------------------

/// Farming domain a batch or rule belongs to. A rule without a sector is
/// global and applies everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Layer,
    Broiler,
    Fish,
}

impl Sector {
    pub fn as_str(self) -> &'static str {
        match self {
            Sector::Layer => "layer",
            Sector::Broiler => "broiler",
            Sector::Fish => "fish",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Sector {
    type Err = crate::error::FarmdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "layer" => Ok(Sector::Layer),
            "broiler" => Ok(Sector::Broiler),
            "fish" => Ok(Sector::Fish),
            _ => Err(crate::error::FarmdeskError::InvalidSector(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Display priority of a rule. `rank()` gives the sort key: critical first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::error::FarmdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(crate::error::FarmdeskError::InvalidSeverity(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a triggered action. Actions are never deleted; the
/// audit trail lives in the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Active,
    Dismissed,
    Snoozed,
    Resolved,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::Active => "active",
            ActionStatus::Dismissed => "dismissed",
            ActionStatus::Snoozed => "snoozed",
            ActionStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionStatus {
    type Err = crate::error::FarmdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ActionStatus::Active),
            "dismissed" => Ok(ActionStatus::Dismissed),
            "snoozed" => Ok(ActionStatus::Snoozed),
            "resolved" => Ok(ActionStatus::Resolved),
            _ => Err(crate::error::FarmdeskError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConditionKind
// ---------------------------------------------------------------------------

/// Closed set of conditions the engine knows how to evaluate. Stored rules
/// carry the token as a string; the engine parses it once per cycle so that
/// dispatch stays an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    InventoryBelowThreshold,
    DaysSinceLastLog,
    MortalityRate,
    HealthScheduleDue,
    AgeInWeeks,
    EggProductionDrop,
    WeightBelowExpected,
    TaskOverdue,
    BatchMissingStartDate,
}

impl ConditionKind {
    pub fn all() -> &'static [ConditionKind] {
        &[
            ConditionKind::InventoryBelowThreshold,
            ConditionKind::DaysSinceLastLog,
            ConditionKind::MortalityRate,
            ConditionKind::HealthScheduleDue,
            ConditionKind::AgeInWeeks,
            ConditionKind::EggProductionDrop,
            ConditionKind::WeightBelowExpected,
            ConditionKind::TaskOverdue,
            ConditionKind::BatchMissingStartDate,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionKind::InventoryBelowThreshold => "inventory_below_threshold",
            ConditionKind::DaysSinceLastLog => "days_since_last_log",
            ConditionKind::MortalityRate => "mortality_rate",
            ConditionKind::HealthScheduleDue => "health_schedule_due",
            ConditionKind::AgeInWeeks => "age_in_weeks",
            ConditionKind::EggProductionDrop => "egg_production_drop",
            ConditionKind::WeightBelowExpected => "weight_below_expected",
            ConditionKind::TaskOverdue => "task_overdue",
            ConditionKind::BatchMissingStartDate => "batch_missing_start_date",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConditionKind {
    type Err = crate::error::FarmdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionKind::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| crate::error::FarmdeskError::UnknownCondition(s.to_string()))
    }
}
