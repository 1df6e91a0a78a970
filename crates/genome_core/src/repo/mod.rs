//! Persistence contracts and implementations.
//!
//! # Invariants
//! - Stores only append; nothing here rewrites history.

pub mod event_store;
