//! Configuration bits of a generated fabric.
//!
//! This crate runs over a frozen module graph. The [`ConfigBitAccountant`]
//! counts the independent and shared configuration bits of every module.
//! From those counts, [`build_device_bitstream`] lays out an
//! architecture-independent bitstream: a tree that mirrors the module
//! hierarchy, with one block per configurable child and bit slots on every
//! memory leaf. [`build_fabric_bitstream`] then flattens that tree into the
//! bit order of the fabric's configuration protocol, and
//! [`render_bitstream_xml`] serializes it for downstream tools.

#![warn(missing_docs)]

pub mod accountant;
pub mod fabric;
pub mod ids;
pub mod tree;
pub mod xml;

pub use accountant::{ConfigBitAccountant, ConfigBits};
pub use fabric::{build_fabric_bitstream, FabricBit, FabricBitstream};
pub use ids::ConfigBlockId;
pub use tree::{build_device_bitstream, BitstreamManager, ConfigBlock};
pub use xml::{render_bitstream_xml, write_bitstream_file, write_bitstream_xml};
