//! Catalog use-case services.
//!
//! # Responsibility
//! - Reconcile the full catalog with the current selection.
//! - Derive ordered selection views from a reconciled snapshot.
//! - Keep hosts decoupled from the backend behind `CatalogSource`.

pub mod catalog_service;
pub mod projector;
pub mod reconciler;
