//! Genome session services.
//!
//! # Responsibility
//! - Combine validation, tree updates and event logging into atomic
//!   modifications.
//! - Keep storage details behind the `EventStore` contract.

pub mod modification_log;
pub mod state_manager;
