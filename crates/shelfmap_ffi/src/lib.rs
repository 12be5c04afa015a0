//! UI bridge for shelfmap core.

pub mod api;
