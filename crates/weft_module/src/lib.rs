//! Hierarchical module graph for generated FPGA fabrics.
//!
//! A [`ModuleGraph`] holds one [`Module`] per distinct block type. Modules
//! own their ports and nets and instantiate other modules as children. Each
//! child instance carries a dense per-(parent, child) index assigned when it
//! is added, and a subset of instances is marked configurable, in the order
//! configuration bits are laid out.
//!
//! The graph has two phases. Builders mutate a [`ModuleGraph`]; once done,
//! [`ModuleGraph::freeze`] validates it and returns a [`FrozenModuleGraph`],
//! which only exposes read access and may be shared between threads.

#![warn(missing_docs)]

pub mod arena;
pub mod graph;
pub mod ids;
pub mod module;
pub mod net;
pub mod port;

pub use arena::{Arena, ArenaId};
pub use graph::{FrozenModuleGraph, ModuleGraph};
pub use ids::{ModuleId, NetId, PortId};
pub use module::{Instance, Module, ModuleKind};
pub use net::{InstanceRef, Net, PinRef, PortRef};
pub use port::{Port, PortDirection};
