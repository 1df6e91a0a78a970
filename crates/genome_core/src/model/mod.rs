//! Genome domain model.
//!
//! # Responsibility
//! - Define the four-level tree, its path grammar and modification events.
//! - Load base documents into typed trees.
//!
//! # Invariants
//! - Trees are persistent: every change yields a new tree, old trees never change.
//! - Paths are always rendered canonically.

pub mod event;
pub mod level;
pub mod loader;
pub mod path;
pub mod tree;
