//! Immutable modification events.
//!
//! # Invariants
//! - Events are never edited after append; the log order is the history.
//! - `old_value` is `null` when the property was absent before the change.
//! - `path` is stored in canonical form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of one modification event.
pub type EventId = Uuid;

/// Attribute map attached to events for semantic queries.
pub type SemanticAttributes = BTreeMap<String, Value>;

/// One accepted property change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationEvent {
    pub id: EventId,
    /// Unix epoch milliseconds, non-decreasing across the log.
    pub timestamp: i64,
    pub path: String,
    pub property: String,
    pub old_value: Value,
    pub new_value: Value,
    #[serde(default)]
    pub semantic_attributes: SemanticAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl ModificationEvent {
    /// True when both sides of the change are `null`, which carries no history.
    pub fn is_null_change(&self) -> bool {
        self.old_value.is_null() && self.new_value.is_null()
    }
}

/// Input for appending one event; id and timestamp are assigned by the log.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendRequest {
    pub path: String,
    pub property: String,
    pub old_value: Value,
    pub new_value: Value,
    pub semantic_attributes: SemanticAttributes,
    pub context: Option<Value>,
}

impl AppendRequest {
    pub fn new(
        path: impl Into<String>,
        property: impl Into<String>,
        old_value: Value,
        new_value: Value,
    ) -> Self {
        Self {
            path: path.into(),
            property: property.into(),
            old_value,
            new_value,
            semantic_attributes: SemanticAttributes::new(),
            context: None,
        }
    }

    pub fn with_semantic_attributes(mut self, attributes: SemanticAttributes) -> Self {
        self.semantic_attributes = attributes;
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
