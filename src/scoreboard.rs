//! Category score audit log
//!
//! Records every adjustment made while categorizing an item so the final
//! totals can be explained afterwards. Not synchronized: share it across
//! tasks only behind a lock.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Reason recorded when `demote` drops a category
pub const REMOVED_NONPOSITIVE: &str = "removed-nonpositive";

/// One logged adjustment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBoardEntry {
    pub category: String,
    pub delta: f64,
    pub running_total: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    totals: BTreeMap<String, f64>,
    log: Vec<ScoreBoardEntry>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, category: &str, delta: f64, running_total: f64, reason: &str) {
        self.log.push(ScoreBoardEntry {
            category: category.to_string(),
            delta,
            running_total,
            reason: reason.to_string(),
        });
    }

    /// Adds `points`, starting the category at zero if unseen
    pub fn add(&mut self, category: &str, points: f64, reason: &str) {
        let total = self.totals.entry(category.to_string()).or_insert(0.0);
        *total += points;
        let total = *total;
        self.record(category, points, total, reason);
    }

    /// Subtracts `points`, dropping the category once it reaches zero or below
    pub fn demote(&mut self, category: &str, points: f64, reason: &str) {
        let total = self.totals.entry(category.to_string()).or_insert(0.0);
        *total -= points;
        let total = *total;
        self.record(category, -points, total, reason);

        if total <= 0.0 {
            self.totals.remove(category);
            self.record(category, 0.0, total, REMOVED_NONPOSITIVE);
        }
    }

    /// Overwrites the category's total
    pub fn set(&mut self, category: &str, value: f64, reason: &str) {
        let previous = self
            .totals
            .insert(category.to_string(), value)
            .unwrap_or(0.0);
        self.record(category, value - previous, value, reason);
    }

    /// Drops the category; a no-op if it is not present
    pub fn remove(&mut self, category: &str, reason: &str) {
        if let Some(previous) = self.totals.remove(category) {
            self.record(category, -previous, 0.0, reason);
        }
    }

    /// Sets every numeric entry of `scores`; other values are ignored
    pub fn import_final(&mut self, scores: &Map<String, Value>) {
        for (category, value) in scores {
            if let Some(value) = value.as_f64() {
                self.set(category, value, "import-final");
            }
        }
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.totals.get(category).copied()
    }

    /// Copy of the current totals
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.totals.clone()
    }

    /// Every adjustment, oldest first
    pub fn trace(&self) -> &[ScoreBoardEntry] {
        &self.log
    }
}
