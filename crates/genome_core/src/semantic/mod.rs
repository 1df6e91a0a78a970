//! Semantic property system.
//!
//! # Responsibility
//! - Hold the catalog of meaning-bearing properties and the forbidden
//!   presentation set.
//! - Decide legality of every property change before it reaches a tree.
//!
//! # Invariants
//! - Semantic intent and presentation never mix in the genome store.

pub mod catalog;
pub mod validator;
