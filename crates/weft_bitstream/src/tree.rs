//! Architecture-independent bitstream: a tree mirroring the module hierarchy.

use crate::accountant::ConfigBitAccountant;
use crate::ids::ConfigBlockId;
use serde::Serialize;
use weft_common::{FabricError, FabricResult};
use weft_module::{ModuleGraph, ModuleId};

/// One block of the bitstream tree.
///
/// A block stands for one configurable instance. Memory leaves carry bit
/// slots; every other block only groups its children.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigBlock {
    /// Instance binding name, or the physical block name for a root.
    pub name: String,
    /// The instantiated module.
    pub module: ModuleId,
    /// Parent block, `None` for a root.
    pub parent: Option<ConfigBlockId>,
    /// Children in configurable-child order.
    pub children: Vec<ConfigBlockId>,
    /// Bit values. Empty for non-leaf blocks.
    pub bits: Vec<bool>,
}

/// Owner of all bitstream blocks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BitstreamManager {
    blocks: Vec<ConfigBlock>,
    roots: Vec<ConfigBlockId>,
}

impl BitstreamManager {
    /// Creates an empty bitstream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block under `parent`, or as a new root.
    pub fn add_block(
        &mut self,
        name: impl Into<String>,
        module: ModuleId,
        parent: Option<ConfigBlockId>,
    ) -> FabricResult<ConfigBlockId> {
        let id = ConfigBlockId::from_raw(self.blocks.len() as u32);
        match parent {
            Some(p) => self.block_mut(p)?.children.push(id),
            None => self.roots.push(id),
        }
        self.blocks.push(ConfigBlock {
            name: name.into(),
            module,
            parent,
            children: Vec::new(),
            bits: Vec::new(),
        });
        Ok(id)
    }

    /// Gives a block `width` bit slots, all zero.
    pub fn reserve_bits(&mut self, block: ConfigBlockId, width: usize) -> FabricResult<()> {
        self.block_mut(block)?.bits = vec![false; width];
        Ok(())
    }

    /// Sets the bit values of a leaf block. The length must match its slots.
    pub fn set_bits(&mut self, block: ConfigBlockId, bits: &[bool]) -> FabricResult<()> {
        let b = self.block_mut(block)?;
        if b.bits.len() != bits.len() {
            return Err(FabricError::consistency(format!(
                "block '{}' has {} bits, got {} values",
                b.name,
                b.bits.len(),
                bits.len()
            )));
        }
        b.bits.copy_from_slice(bits);
        Ok(())
    }

    /// Returns a block.
    pub fn block(&self, id: ConfigBlockId) -> FabricResult<&ConfigBlock> {
        self.blocks
            .get(id.as_raw() as usize)
            .ok_or_else(|| missing_block(id))
    }

    /// Root blocks in insertion order.
    pub fn roots(&self) -> &[ConfigBlockId] {
        &self.roots
    }

    /// Finds a root block by name.
    pub fn find_root(&self, name: &str) -> Option<ConfigBlockId> {
        self.roots
            .iter()
            .copied()
            .find(|&r| self.blocks[r.as_raw() as usize].name == name)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if there are no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of bit slots over all blocks.
    pub fn total_bits(&self) -> usize {
        self.blocks.iter().map(|b| b.bits.len()).sum()
    }

    /// Dotted hierarchical name of a block, from its root down.
    pub fn path(&self, id: ConfigBlockId) -> FabricResult<String> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let block = self.block(c)?;
            names.push(block.name.as_str());
            current = block.parent;
        }
        names.reverse();
        Ok(names.join("."))
    }

    fn block_mut(&mut self, id: ConfigBlockId) -> FabricResult<&mut ConfigBlock> {
        self.blocks
            .get_mut(id.as_raw() as usize)
            .ok_or_else(|| missing_block(id))
    }
}

fn missing_block(id: ConfigBlockId) -> FabricError {
    FabricError::lookup(format!("no bitstream block {}", id.as_raw()))
}

/// Lays out the bitstream of the given physical blocks.
///
/// Each root is a `(name, module)` pair naming one physical tile, switch
/// block, or connection block. Roots without configuration bits are left
/// out. Every configurable child becomes a block named after its instance;
/// memory leaves get one zero bit per independent configuration bit.
pub fn build_device_bitstream(
    graph: &ModuleGraph,
    accountant: &ConfigBitAccountant,
    roots: &[(String, ModuleId)],
) -> FabricResult<BitstreamManager> {
    let mut manager = BitstreamManager::new();
    for (name, module) in roots {
        if accountant.independent_bits(*module)? == 0 {
            continue;
        }
        let block = manager.add_block(name.clone(), *module, None)?;
        add_children(graph, accountant, &mut manager, block, *module)?;
    }
    log::debug!(
        "bitstream tree: {} blocks, {} bits",
        manager.len(),
        manager.total_bits()
    );
    Ok(manager)
}

fn add_children(
    graph: &ModuleGraph,
    accountant: &ConfigBitAccountant,
    manager: &mut BitstreamManager,
    block: ConfigBlockId,
    module: ModuleId,
) -> FabricResult<()> {
    let owner = graph.try_module(module)?;
    if owner.is_memory() {
        let width = accountant.independent_bits(module)? as usize;
        manager.reserve_bits(block, width)?;
        return Ok(());
    }
    for &child in owner.configurable_children() {
        if accountant.independent_bits(child.module)? == 0 {
            continue;
        }
        let name = graph.instance_name(module, child)?;
        let child_block = manager.add_block(name, child.module, Some(block))?;
        add_children(graph, accountant, manager, child_block, child.module)?;
    }
    Ok(())
}
