//! FPGA device description consumed by the Weft fabric generator.
//!
//! Everything in this crate is an input owned upstream of fabric generation:
//! the circuit library, the precomputed multiplexer library, the routing
//! switch table, the logic-cluster hierarchy, tile types, the device grid,
//! and the routing-resource graph partitioned into switch and connection
//! blocks. All of it is bundled into one immutable [`DeviceContext`] that is
//! passed explicitly through every generation stage.
//!
//! The cluster hierarchy is only reachable through the [`ClusterHierarchy`]
//! capability trait so that builders never depend on how it is stored.

#![warn(missing_docs)]

pub mod circuit;
pub mod cluster;
pub mod device;
pub mod grid;
pub mod ids;
pub mod mux_lib;
pub mod routing;
pub mod switch;
pub mod tile;

pub use circuit::{CircuitLibrary, CircuitModel, CircuitModelKind, CircuitPort, CircuitPortKind};
pub use cluster::{
    BlockPort, BlockType, ChildSlot, ClusterHierarchy, ClusterLibrary, Interconnect,
    InterconnectEdge, InterconnectKind, Mode, PinOwner, PinSpec, PortClass,
};
pub use device::{load_device, load_device_from_str, DeviceContext};
pub use grid::{DeviceGrid, Placement};
pub use ids::{BlockTypeId, CircuitModelId, RrNodeId, SwitchId, TileTypeId};
pub use mux_lib::{MuxEntry, MuxLibrary};
pub use routing::{
    CbIpin, CbKind, ConnectionBlock, RoutingGraph, RrEdge, RrNode, RrNodeKind, SbSide, SbTrack,
    SwitchBlock, TrackDirection,
};
pub use switch::SwitchInf;
pub use tile::{PinLocation, TileType};
