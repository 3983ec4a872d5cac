//! Catalog domain model.
//!
//! # Responsibility
//! - Define catalog entities (facts, metrics, attributes, insights, workspaces).
//! - Define the selection snapshot and the execution request derived from it.
//!
//! # Invariants
//! - Selections match catalog objects through the canonical `ObjId` string,
//!   never through the raw catalog id.
//! - Validity responses are keyed by raw catalog id.

pub mod catalog;
pub mod execution;
pub mod selection;
