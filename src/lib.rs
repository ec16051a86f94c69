//! Storefront Catalog Service
//!
//! Catalog back end for a small phone and electronics storefront.
//!
//! ## Features
//! - Product, category, status, brand, condition and supplier management
//! - Bulk CSV export and reconciling import
//! - Linked product financials (USD cost, BRL cost, markup, price, profit)
//! - Category hierarchy flattening
//! - Banners, content pages and store configuration

pub mod catalog;
pub mod config;
pub mod domain;
pub mod http;

pub use catalog::store::{CatalogStore, ImportSummary};
pub use catalog::Catalog;
pub use domain::aggregates::EntityKind;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("CSV parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Setting parent {parent_id} on category {id} would create a cycle")]
    CategoryCycle { id: String, parent_id: String },

    #[error("Slug already in use: {0}")]
    DuplicateSlug(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
