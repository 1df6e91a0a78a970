//! Core of the design genome: a versioned four-level tree of semantic
//! properties.
//! This crate is the single source of truth for genome invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod repo;
pub mod resolve;
pub mod semantic;
pub mod service;
pub mod similarity;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::event::{AppendRequest, EventId, ModificationEvent, SemanticAttributes};
pub use model::level::{validate_level_table, Level, MAX_DEPTH};
pub use model::loader::{load_genome_file, load_genome_str, load_genome_value, LoadError};
pub use model::path::{GenomePath, NavResult, NavigationError};
pub use model::tree::{Atome, Cellule, Corps, GenomeTree, NodeRef, Organe, Properties};
pub use navigation::drill_down::{
    BreadcrumbEntry, DrillDownManager, NavigationContext, NavigationTreeNode, NodeSummary,
};
pub use repo::event_store::{
    EventStore, InMemoryEventStore, SqliteEventStore, StoreError, StoreResult,
};
pub use resolve::catalog::{
    AdaptableTemplate, CatalogEntry, ComponentCatalog, InMemoryComponentCatalog,
    TemplateCatalog, TemplateLibrary,
};
pub use resolve::contextualizer::{
    CatalogStatistics, ComponentContext, ComponentContextualizer, GenerationRequest,
    MatchedEntity, Tier, TierStrategy,
};
pub use semantic::catalog::{
    ForbiddenPropertySet, PropertyCatalog, PropertyCategory, PropertyDefinition, ValueDomain,
};
pub use semantic::validator::{SemanticPropertySystem, ValidationError, ValidationReport};
pub use service::modification_log::{IntegrityError, ModificationLog, ReplayError};
pub use service::state_manager::{
    GenomeSnapshot, GenomeStateManager, ModificationError, ModificationOutcome, RollbackError,
    SnapshotId, SnapshotTrigger, StateManagerConfig, StateSummary,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
