//! Fabric-dependent bitstream: the tree flattened into programming order.

use crate::ids::ConfigBlockId;
use crate::tree::BitstreamManager;
use serde::Serialize;
use weft_common::{ConfigOrganization, FabricResult};

/// One bit of the fabric bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FabricBit {
    /// Leaf block the bit belongs to.
    pub block: ConfigBlockId,
    /// Offset within that block.
    pub offset: u32,
    /// Bit value.
    pub value: bool,
}

/// Bits in the order the configuration protocol loads them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FabricBitstream {
    /// The bits.
    pub bits: Vec<FabricBit>,
}

impl FabricBitstream {
    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the bitstream is empty.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit values as a `0`/`1` string.
    pub fn to_bit_string(&self) -> String {
        self.bits
            .iter()
            .map(|b| if b.value { '1' } else { '0' })
            .collect()
    }
}

/// Flattens the bitstream tree depth-first in configurable-child order.
///
/// A scan chain shifts bits in from its head, so the first bit of the
/// chain is loaded last and the order is reversed.
pub fn build_fabric_bitstream(
    manager: &BitstreamManager,
    organization: ConfigOrganization,
) -> FabricResult<FabricBitstream> {
    let mut bits = Vec::with_capacity(manager.total_bits());
    let mut stack: Vec<ConfigBlockId> = manager.roots().iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        let block = manager.block(id)?;
        for (offset, &value) in block.bits.iter().enumerate() {
            bits.push(FabricBit {
                block: id,
                offset: offset as u32,
                value,
            });
        }
        stack.extend(block.children.iter().rev().copied());
    }
    if organization == ConfigOrganization::ScanChain {
        bits.reverse();
    }
    Ok(FabricBitstream { bits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_module::ModuleId;

    /// Two roots: `a` with leaves `a.x` (2 bits) and `a.y` (1 bit), `b` with
    /// leaf `b.z` (1 bit). `a.x[1]` and `b.z[0]` are set.
    fn manager() -> BitstreamManager {
        let m = ModuleId::from_raw(0);
        let mut mgr = BitstreamManager::new();
        let a = mgr.add_block("a", m, None).unwrap();
        let b = mgr.add_block("b", m, None).unwrap();
        let x = mgr.add_block("x", m, Some(a)).unwrap();
        let y = mgr.add_block("y", m, Some(a)).unwrap();
        let z = mgr.add_block("z", m, Some(b)).unwrap();
        mgr.reserve_bits(x, 2).unwrap();
        mgr.reserve_bits(y, 1).unwrap();
        mgr.reserve_bits(z, 1).unwrap();
        mgr.set_bits(x, &[false, true]).unwrap();
        mgr.set_bits(z, &[true]).unwrap();
        mgr
    }

    #[test]
    fn depth_first_order() {
        let fabric = build_fabric_bitstream(&manager(), ConfigOrganization::Standalone).unwrap();
        assert_eq!(fabric.len(), 4);
        assert_eq!(fabric.to_bit_string(), "0101");
        assert_eq!(fabric.bits[1].offset, 1);
    }

    #[test]
    fn scan_chain_is_reversed() {
        let fabric = build_fabric_bitstream(&manager(), ConfigOrganization::ScanChain).unwrap();
        assert_eq!(fabric.to_bit_string(), "1010");
        assert_eq!(fabric.bits[0].offset, 0);
    }

    #[test]
    fn empty_tree() {
        let fabric =
            build_fabric_bitstream(&BitstreamManager::new(), ConfigOrganization::MemoryBank)
                .unwrap();
        assert!(fabric.is_empty());
    }
}
