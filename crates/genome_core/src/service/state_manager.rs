//! Authoritative genome state for one editing session.
//!
//! # Responsibility
//! - Run validate -> apply -> log as one atomic step per modification.
//! - Own the base tree, the current tree pointer and the snapshot set.
//!
//! # Invariants
//! - A modification either commits (new tree + exactly one logged event) or
//!   rejects (old tree, no event); nothing in between is observable.
//! - The event is durably appended before the current pointer moves.
//! - Trees and snapshots are never mutated; readers need no writer lock.
//! - Snapshots are only removed on explicit caller request.

use crate::model::event::{now_epoch_ms, AppendRequest, EventId, SemanticAttributes};
use crate::model::path::{GenomePath, NavigationError};
use crate::model::tree::GenomeTree;
use crate::repo::event_store::{EventStore, StoreError};
use crate::semantic::validator::{SemanticPropertySystem, ValidationError};
use crate::service::modification_log::{ModificationLog, ReplayError};
use log::{info, warn};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

/// Default number of accepted modifications between automatic snapshots.
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 50;

/// Ordered snapshot identifier; later snapshots compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(pub u64);

impl Display for SnapshotId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "snapshot-{:06}", self.0)
    }
}

/// Why a snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotTrigger {
    Automatic,
    Checkpoint,
}

/// Immutable copy of a tree at one point in the session.
#[derive(Debug, Clone)]
pub struct GenomeSnapshot {
    pub id: SnapshotId,
    pub tree: Arc<GenomeTree>,
    /// Accepted modifications counted when the snapshot was taken.
    pub modification_count: u64,
    pub created_at: i64,
    pub trigger: SnapshotTrigger,
}

/// Session tuning. Passed in at construction; there is no global config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateManagerConfig {
    /// Take a snapshot after every `snapshot_interval` accepted modifications.
    /// `0` disables automatic snapshots.
    pub snapshot_interval: u64,
}

impl Default for StateManagerConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
        }
    }
}

/// Result of an accepted modification.
#[derive(Debug, Clone)]
pub struct ModificationOutcome {
    pub tree: Arc<GenomeTree>,
    pub event_id: EventId,
    /// Set when this modification triggered an automatic snapshot.
    pub snapshot_id: Option<SnapshotId>,
    pub warnings: Vec<String>,
}

/// Summary returned by [`GenomeStateManager::reconstruct_state`].
#[derive(Debug, Clone)]
pub struct StateSummary {
    pub tree: Arc<GenomeTree>,
    pub modification_count: u64,
    pub last_snapshot_id: Option<SnapshotId>,
    /// Epoch ms of the last accepted modification.
    pub last_modified: Option<i64>,
}

/// Rejected modification. The current tree is unchanged in every case.
#[derive(Debug)]
pub enum ModificationError {
    Navigation(NavigationError),
    Validation(ValidationError),
    /// The event could not be recorded; the change was not applied.
    Persistence(StoreError),
}

impl Display for ModificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Navigation(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "modification not recorded: {err}"),
        }
    }
}

impl Error for ModificationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Navigation(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<NavigationError> for ModificationError {
    fn from(value: NavigationError) -> Self {
        Self::Navigation(value)
    }
}

impl From<ValidationError> for ModificationError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ModificationError {
    fn from(value: StoreError) -> Self {
        Self::Persistence(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackError {
    UnknownSnapshot(SnapshotId),
}

impl Display for RollbackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSnapshot(id) => write!(f, "snapshot not found: {id}"),
        }
    }
}

impl Error for RollbackError {}

struct WriterState {
    snapshots: BTreeMap<SnapshotId, GenomeSnapshot>,
    next_snapshot: u64,
    modification_count: u64,
    last_snapshot_id: Option<SnapshotId>,
    last_modified: Option<i64>,
}

impl WriterState {
    fn take_snapshot(
        &mut self,
        tree: Arc<GenomeTree>,
        trigger: SnapshotTrigger,
    ) -> SnapshotId {
        self.next_snapshot += 1;
        let id = SnapshotId(self.next_snapshot);
        self.snapshots.insert(
            id,
            GenomeSnapshot {
                id,
                tree,
                modification_count: self.modification_count,
                created_at: now_epoch_ms(),
                trigger,
            },
        );
        self.last_snapshot_id = Some(id);
        id
    }
}

/// One genome editing session: validator, log, trees and snapshots.
pub struct GenomeStateManager<S: EventStore> {
    validator: SemanticPropertySystem,
    log: ModificationLog<S>,
    config: StateManagerConfig,
    base: Arc<GenomeTree>,
    current: RwLock<Arc<GenomeTree>>,
    writer: Mutex<WriterState>,
}

impl<S: EventStore> GenomeStateManager<S> {
    /// Starts a session over `base`, replaying whatever `log` already holds.
    ///
    /// # Errors
    /// - A stored event no longer resolves against `base`.
    pub fn open(
        base: GenomeTree,
        log: ModificationLog<S>,
        validator: SemanticPropertySystem,
        config: StateManagerConfig,
    ) -> Result<Self, ReplayError> {
        let started_at = Instant::now();
        let base = Arc::new(base);
        let current = Arc::new(log.reconstruct_latest(&base)?);
        let last = log.last();

        info!(
            "event=session_open module=state_manager status=ok replayed={} duration_ms={}",
            log.len(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            writer: Mutex::new(WriterState {
                snapshots: BTreeMap::new(),
                next_snapshot: 0,
                modification_count: log.len() as u64,
                last_snapshot_id: None,
                last_modified: last.map(|event| event.timestamp),
            }),
            current: RwLock::new(current),
            base,
            validator,
            log,
            config,
        })
    }

    /// Validates and applies one property change.
    ///
    /// # Errors
    /// - `Validation` for forbidden properties or out-of-domain values.
    /// - `Navigation` when `path` is malformed or does not resolve.
    /// - `Persistence` when the event could not be recorded; the change is
    ///   then not applied either.
    pub fn apply_modification(
        &self,
        path: &str,
        property: &str,
        value: Value,
    ) -> Result<ModificationOutcome, ModificationError> {
        self.apply_with_context(path, property, value, None)
    }

    /// Same as [`apply_modification`](Self::apply_modification), attaching
    /// caller context to the logged event.
    pub fn apply_with_context(
        &self,
        path: &str,
        property: &str,
        value: Value,
        context: Option<Value>,
    ) -> Result<ModificationOutcome, ModificationError> {
        let mut writer = self.lock_writer();

        let report = self.validator.validate(property, &value);
        let warnings = match report.into_result() {
            Ok(warnings) => warnings,
            Err(error) => {
                warn!(
                    "event=apply_modification module=state_manager status=rejected path={path} property={property} reason=validation"
                );
                return Err(ModificationError::Validation(error));
            }
        };

        let parsed = GenomePath::parse(path).inspect_err(|_| {
            warn!(
                "event=apply_modification module=state_manager status=rejected path={path} property={property} reason=malformed_path"
            );
        })?;
        let current = self.get_current();
        let (next, previous) = current
            .with_property(&parsed, property, value.clone())
            .inspect_err(|_| {
                warn!(
                    "event=apply_modification module=state_manager status=rejected path={parsed} property={property} reason=navigation"
                );
            })?;

        let mut request = AppendRequest::new(
            parsed.to_string(),
            property,
            previous.unwrap_or(Value::Null),
            value,
        )
        .with_semantic_attributes(self.semantic_attributes(property));
        if let Some(context) = context {
            request = request.with_context(context);
        }
        let event_id = self.log.append(request)?;

        let next = Arc::new(next);
        self.replace_current(Arc::clone(&next));
        writer.modification_count += 1;
        writer.last_modified = self.log.last().map(|event| event.timestamp);

        let interval = self.config.snapshot_interval;
        let snapshot_id = (interval > 0 && writer.modification_count % interval == 0)
            .then(|| writer.take_snapshot(Arc::clone(&next), SnapshotTrigger::Automatic));

        info!(
            "event=apply_modification module=state_manager status=ok path={parsed} property={property} event_id={event_id} count={} snapshot={}",
            writer.modification_count,
            snapshot_id.map_or("none".to_string(), |id| id.to_string())
        );

        Ok(ModificationOutcome {
            tree: next,
            event_id,
            snapshot_id,
            warnings,
        })
    }

    /// Current tree. The returned tree never changes.
    pub fn get_current(&self) -> Arc<GenomeTree> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Tree the session started from, before any logged event.
    pub fn base(&self) -> Arc<GenomeTree> {
        Arc::clone(&self.base)
    }

    pub fn log(&self) -> &ModificationLog<S> {
        &self.log
    }

    pub fn validator(&self) -> &SemanticPropertySystem {
        &self.validator
    }

    /// Snapshots the current tree on caller request.
    pub fn save_checkpoint(&self) -> SnapshotId {
        let mut writer = self.lock_writer();
        let id = writer.take_snapshot(self.get_current(), SnapshotTrigger::Checkpoint);
        info!("event=save_checkpoint module=state_manager status=ok snapshot={id}");
        id
    }

    /// Points the current tree at snapshot `id`.
    ///
    /// Neither the snapshot nor the log is changed; later snapshots are kept.
    ///
    /// The rollback lives only in this session: [`Self::open`] replays the full
    /// log, so a reopened manager comes back at the pre-rollback tree.
    pub fn rollback_to(&self, id: SnapshotId) -> Result<(), RollbackError> {
        let writer = self.lock_writer();
        let Some(snapshot) = writer.snapshots.get(&id) else {
            warn!("event=rollback module=state_manager status=rejected snapshot={id}");
            return Err(RollbackError::UnknownSnapshot(id));
        };
        self.replace_current(Arc::clone(&snapshot.tree));
        info!(
            "event=rollback module=state_manager status=ok snapshot={id} snapshot_count={}",
            snapshot.modification_count
        );
        Ok(())
    }

    pub fn reconstruct_state(&self) -> StateSummary {
        let writer = self.lock_writer();
        StateSummary {
            tree: self.get_current(),
            modification_count: writer.modification_count,
            last_snapshot_id: writer.last_snapshot_id,
            last_modified: writer.last_modified,
        }
    }

    pub fn snapshot(&self, id: SnapshotId) -> Option<GenomeSnapshot> {
        self.lock_writer().snapshots.get(&id).cloned()
    }

    /// Snapshot ids in creation order.
    pub fn snapshot_ids(&self) -> Vec<SnapshotId> {
        self.lock_writer().snapshots.keys().copied().collect()
    }

    /// Drops one snapshot. Retention is entirely up to the caller.
    pub fn remove_snapshot(&self, id: SnapshotId) -> Option<GenomeSnapshot> {
        self.lock_writer().snapshots.remove(&id)
    }

    /// Rebuilds the tree as of `timestamp` from the base tree and the log.
    pub fn reconstruct_state_at(&self, timestamp: i64) -> Result<GenomeTree, ReplayError> {
        self.log.reconstruct_state_at(timestamp, &self.base)
    }

    fn semantic_attributes(&self, property: &str) -> SemanticAttributes {
        let mut attributes = SemanticAttributes::new();
        match self.validator.definition(property) {
            Some(definition) => {
                attributes.insert("category".to_string(), json!(definition.category.as_str()));
                attributes.insert("known".to_string(), json!(true));
            }
            None => {
                attributes.insert("category".to_string(), json!("unknown"));
                attributes.insert("known".to_string(), json!(false));
            }
        }
        attributes
    }

    fn replace_current(&self, tree: Arc<GenomeTree>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = tree;
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, WriterState> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
