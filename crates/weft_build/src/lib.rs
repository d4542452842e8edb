//! Hierarchical module builder for Weft fabrics.
//!
//! [`FabricBuilder`] turns a device description into a module graph. It
//! builds library leaves first, then walks the logic-cluster hierarchy
//! depth first, post order, so every child block type exists before its
//! parent is wired. Each block type, tile border variant and routing-block
//! structure is built once and shared by all of its physical occurrences.
//!
//! Multiplexer inputs are wired in driver order. The [`BlockPortResolver`]
//! re-derives that order and the port names from the [`naming`] scheme, so
//! readers of the finished graph can map routing nodes back to ports
//! without a lookup table.

#![warn(missing_docs)]

mod builder;
mod cluster;
mod library;
pub mod naming;
mod resolve;
mod rollup;
mod routing;
mod tile;

pub use builder::{BuildOptions, FabricBuilder, FabricModules, FabricPlacement};
pub use resolve::{BlockPortResolver, DriverPort};
