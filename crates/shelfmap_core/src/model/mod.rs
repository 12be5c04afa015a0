//! Warehouse domain model consumed by the core services.
//!
//! # Responsibility
//! - Define the flat, id-referencing input records fetched by callers.
//! - Define the derived tree shapes produced by the services.
//!
//! # Invariants
//! - Input records are read-only snapshots for one build pass.
//! - Derived trees own their data and carry no identity beyond one call.

pub mod audit;
pub mod instance;
pub mod topology;

/// Stable identifier shared by every warehouse record.
pub type NodeId = uuid::Uuid;
