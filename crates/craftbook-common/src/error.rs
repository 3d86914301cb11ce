//! Error types for Craftbook.

use thiserror::Error;

/// Top-level error type for Craftbook operations.
#[derive(Debug, Error)]
pub enum CraftbookError {
    /// Recipe resolution errors
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Store mutation and load errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Named backup does not exist
    #[error("Backup not found: {0}")]
    BackupNotFound(String),
}

/// Errors raised while expanding or walking the recipe graph.
///
/// Cycles are not listed here: a cycle only prunes the offending branch and
/// is reported as a diagnostic alongside the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The ingredient chain grew longer than the configured maximum.
    #[error("Recursion limit of {max_depth} exceeded while resolving '{item}'")]
    RecursionLimitExceeded {
        /// Item being resolved when the limit was hit
        item: String,
        /// Configured limit
        max_depth: usize,
    },

    /// A scaled quantity no longer fits in 64 bits.
    #[error("Quantity overflow while resolving '{item}'")]
    QuantityOverflow {
        /// Item whose quantity overflowed
        item: String,
    },
}

/// Errors raised by store operations that can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Deserialized store data is not well-formed.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Named item does not exist.
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    /// Target name is already taken.
    #[error("Item already exists: {0}")]
    AlreadyExists(String),

    /// A recipe lists itself as an ingredient.
    #[error("Recipe '{0}' cannot use itself as an ingredient")]
    SelfReference(String),
}

/// Result type alias for Craftbook operations.
pub type CraftbookResult<T> = Result<T, CraftbookError>;

/// Result type alias for graph resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
