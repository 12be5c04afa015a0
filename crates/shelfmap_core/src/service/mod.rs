//! Pure derived-view services.
//!
//! # Responsibility
//! - Turn flat, id-referencing collections into trees and diffs for display.
//! - Stay synchronous and stateless: every call starts from scratch.

pub mod history_service;
pub mod placement_service;
pub mod topology_service;
