//! Event-sourced modification history.
//!
//! # Responsibility
//! - Append events write-ahead: storage first, in-memory index second.
//! - Answer history queries and rebuild historical trees by replay.
//! - Report integrity problems without failing.
//!
//! # Invariants
//! - Events are totally ordered by append; timestamps never decrease.
//! - The in-memory index only ever holds events the store accepted.
//! - Replay applies `new_value` at `path`/`property`, in append order.

use crate::model::event::{now_epoch_ms, AppendRequest, EventId, ModificationEvent};
use crate::model::path::{GenomePath, NavigationError};
use crate::model::tree::GenomeTree;
use crate::repo::event_store::{EventStore, StoreResult};
use log::{info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError, RwLock};
use uuid::Uuid;

/// Diagnostic finding from [`ModificationLog::integrity_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// Event timestamp is earlier than its predecessor's.
    NonMonotonicTimestamp {
        event_id: EventId,
        previous: i64,
        current: i64,
    },
    /// Event carries `null` on both sides of the change.
    NullValues { event_id: EventId },
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonMonotonicTimestamp {
                event_id,
                previous,
                current,
            } => write!(
                f,
                "event {event_id} timestamp {current} is earlier than previous {previous}"
            ),
            Self::NullValues { event_id } => {
                write!(f, "event {event_id} has null old and new values")
            }
        }
    }
}

impl Error for IntegrityError {}

/// Replay hit an event whose path no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayError {
    pub event_id: EventId,
    pub source: NavigationError,
}

impl Display for ReplayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot replay event {}: {}", self.event_id, self.source)
    }
}

impl Error for ReplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Append-only, time-ordered log of modification events.
pub struct ModificationLog<S: EventStore> {
    store: Mutex<S>,
    events: RwLock<Vec<ModificationEvent>>,
}

impl<S: EventStore> ModificationLog<S> {
    /// Opens the log over `store`, indexing events it already holds.
    pub fn open(store: S) -> StoreResult<Self> {
        let events = store.load_all()?;
        info!(
            "event=log_open module=modification_log status=ok events={}",
            events.len()
        );
        Ok(Self {
            store: Mutex::new(store),
            events: RwLock::new(events),
        })
    }

    /// Appends one event and returns its id once the store has committed it.
    ///
    /// The path is stored in canonical form.
    pub fn append(&self, request: AppendRequest) -> StoreResult<EventId> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);

        let last_timestamp = self.read(|events| events.last().map(|event| event.timestamp));
        let timestamp = match last_timestamp {
            Some(last) => now_epoch_ms().max(last),
            None => now_epoch_ms(),
        };

        // unparsable paths are kept verbatim; replay reports them
        let path = GenomePath::parse(&request.path)
            .map(|parsed| parsed.to_string())
            .unwrap_or(request.path);
        let event = ModificationEvent {
            id: Uuid::new_v4(),
            timestamp,
            path,
            property: request.property,
            old_value: request.old_value,
            new_value: request.new_value,
            semantic_attributes: request.semantic_attributes,
            context: request.context,
        };

        if let Err(err) = store.append(&event) {
            warn!(
                "event=log_append module=modification_log status=error path={} property={} error={}",
                event.path, event.property, err
            );
            return Err(err);
        }

        let id = event.id;
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.read(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every event in append order.
    pub fn all(&self) -> Vec<ModificationEvent> {
        self.read(|events| events.to_vec())
    }

    pub fn last(&self) -> Option<ModificationEvent> {
        self.read(|events| events.last().cloned())
    }

    /// Events with `timestamp >= since`.
    pub fn since(&self, since: i64) -> Vec<ModificationEvent> {
        self.filtered(|event| event.timestamp >= since)
    }

    /// Events whose path equals `path` once both are canonical.
    ///
    /// An unparsable `path` matches nothing.
    pub fn for_path(&self, path: &str) -> Vec<ModificationEvent> {
        let Ok(canonical) = GenomePath::parse(path).map(|parsed| parsed.to_string()) else {
            return Vec::new();
        };
        self.filtered(|event| event.path == canonical)
    }

    pub fn for_property(&self, property: &str) -> Vec<ModificationEvent> {
        self.filtered(|event| event.property == property)
    }

    /// The latest `limit` events, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ModificationEvent> {
        self.read(|events| events[events.len().saturating_sub(limit)..].to_vec())
    }

    /// Events with `start <= timestamp <= end`.
    pub fn between(&self, start: i64, end: i64) -> Vec<ModificationEvent> {
        self.filtered(|event| (start..=end).contains(&event.timestamp))
    }

    pub fn with_semantic_attribute(&self, key: &str, value: &Value) -> Vec<ModificationEvent> {
        self.filtered(|event| event.semantic_attributes.get(key) == Some(value))
    }

    /// Rebuilds the tree as of `timestamp` by replaying onto `base`.
    ///
    /// Replay stops at the first event whose timestamp exceeds `timestamp`.
    /// `base` itself is never modified.
    pub fn reconstruct_state_at(
        &self,
        timestamp: i64,
        base: &GenomeTree,
    ) -> Result<GenomeTree, ReplayError> {
        self.read(|events| {
            let mut tree = base.clone();
            for event in events.iter().take_while(|event| event.timestamp <= timestamp) {
                tree = apply_event(&tree, event)?;
            }
            Ok(tree)
        })
    }

    /// Rebuilds the tree after every logged event.
    pub fn reconstruct_latest(&self, base: &GenomeTree) -> Result<GenomeTree, ReplayError> {
        self.reconstruct_state_at(i64::MAX, base)
    }

    /// `true` when [`integrity_report`](Self::integrity_report) finds nothing.
    pub fn validate_integrity(&self) -> bool {
        let findings = self.integrity_report();
        for finding in &findings {
            warn!("event=log_integrity module=modification_log status=error finding={finding}");
        }
        findings.is_empty()
    }

    pub fn integrity_report(&self) -> Vec<IntegrityError> {
        self.read(|events| {
            let mut findings = Vec::new();
            let mut previous: Option<i64> = None;
            for event in events {
                if let Some(previous) = previous.filter(|previous| event.timestamp < *previous) {
                    findings.push(IntegrityError::NonMonotonicTimestamp {
                        event_id: event.id,
                        previous,
                        current: event.timestamp,
                    });
                }
                if event.is_null_change() {
                    findings.push(IntegrityError::NullValues { event_id: event.id });
                }
                previous = Some(event.timestamp);
            }
            findings
        })
    }

    /// Events strictly after `event_id`, or `None` if the id is unknown.
    ///
    /// The log is not changed; applying inverses is the caller's decision.
    pub fn rollback_to_event(&self, event_id: EventId) -> Option<Vec<ModificationEvent>> {
        self.read(|events| {
            events
                .iter()
                .position(|event| event.id == event_id)
                .map(|position| events[position + 1..].to_vec())
        })
    }

    fn filtered(&self, keep: impl Fn(&ModificationEvent) -> bool) -> Vec<ModificationEvent> {
        self.read(|events| events.iter().filter(|event| keep(event)).cloned().collect())
    }

    fn read<T>(&self, f: impl FnOnce(&Vec<ModificationEvent>) -> T) -> T {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        f(&events)
    }
}

/// Applies one event's `new_value` to `tree`, yielding a new tree.
pub(crate) fn apply_event(
    tree: &GenomeTree,
    event: &ModificationEvent,
) -> Result<GenomeTree, ReplayError> {
    let replay_error = |source: NavigationError| ReplayError {
        event_id: event.id,
        source,
    };
    let path = GenomePath::parse(&event.path).map_err(replay_error)?;
    tree.with_property(&path, &event.property, event.new_value.clone())
        .map(|(next, _)| next)
        .map_err(replay_error)
}
