//! Per-run working memory
//!
//! Scratch storage for cross-task artifacts. Validation verdicts live under
//! the `validations` key as a map from task id to verdict text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const VALIDATIONS_KEY: &str = "validations";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkingMemory {
    entries: BTreeMap<String, Value>,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store the verdict for a task, replacing any earlier one
    pub fn record_validation(&mut self, task_id: &str, verdict: impl Into<String>) {
        let slot = self
            .entries
            .entry(VALIDATIONS_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(map) = slot {
            map.insert(task_id.to_string(), Value::String(verdict.into()));
        }
    }

    pub fn validation(&self, task_id: &str) -> Option<&str> {
        self.entries
            .get(VALIDATIONS_KEY)
            .and_then(|v| v.get(task_id))
            .and_then(Value::as_str)
    }
}
