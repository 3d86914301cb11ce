//! # Craftbook Common
//!
//! Shared types for the Craftbook workspace.
//!
//! This crate provides the pieces every other crate agrees on:
//! - The error taxonomy (store, resolution, top-level)
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
}

pub use prelude::*;
