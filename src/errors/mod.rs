//! Centralized error handling for the catalog sync core
//!
//! All fallible operations in the crate surface one of the typed errors
//! defined in [`types`]. The fetch engine and the mutation reconciler
//! never leave the view cache partially applied on failure; retries are
//! the caller's responsibility.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using CatalogError
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Convenience type alias for backend call Results
pub type BackendResult<T> = Result<T, BackendError>;

/// Convenience type alias for local store Results
pub type StoreResult<T> = Result<T, StoreError>;
