use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub farm_id: String,
    pub name: String,
    /// Coarse grouping, e.g. "feed", "medicine". Free-form on purpose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub min_threshold: f64,
}

impl InventoryItem {
    /// Inclusive: an item sitting exactly at its threshold counts as low.
    pub fn is_low(&self) -> bool {
        self.quantity <= self.min_threshold
    }
}
