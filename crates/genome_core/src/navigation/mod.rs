//! Read-only navigation over genome trees.
//!
//! # Responsibility
//! - Resolve paths into breadcrumbs, children, siblings and ancestors.
//! - Keep no per-consumer session; callers re-query per request.

pub mod drill_down;

pub use crate::model::path::{NavResult, NavigationError};
