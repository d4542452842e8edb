//! Shared foundational types used across the Weft fabric generator.
//!
//! This crate provides the common error type, content hashing used for
//! structural deduplication, device sides, and the configuration-memory
//! organization shared by the builder and the bit accountant.

#![warn(missing_docs)]

pub mod error;
pub mod hash;
pub mod organization;
pub mod side;

pub use error::{FabricError, FabricResult};
pub use hash::{ContentHash, ContentHasher};
pub use organization::ConfigOrganization;
pub use side::Side;
