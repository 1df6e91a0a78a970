//! Component resolution.
//!
//! # Responsibility
//! - Turn genome nodes into tier strategies a rendering layer can act on.
//! - Keep catalog maintenance outside the core behind lookup traits.

pub mod catalog;
pub mod contextualizer;
