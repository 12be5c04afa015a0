//! Tree search entry points.
//!
//! # Responsibility
//! - Match free-text queries against built topology and placement trees.
//! - Keep visibility/expansion decisions inside core.

pub mod matcher;
