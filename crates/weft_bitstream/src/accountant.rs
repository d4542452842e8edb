//! Configuration-bit accounting over the module graph.
//!
//! A memory leaf knows its own width: a multiplexer memory looks it up in the
//! mux library, a primitive memory takes it from its circuit model. Every
//! other module is counted over its configurable children. Independent bits
//! add up across children. Shared bits do not: all multiplexers of a block
//! read the same reserved bank, so the block carries the bank's width once,
//! which is the widest request of any child.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use weft_arch::DeviceContext;
use weft_common::{ConfigOrganization, FabricError, FabricResult};
use weft_module::{ModuleGraph, ModuleId, ModuleKind};

/// Configuration bits of one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfigBits {
    /// Bits owned by this module alone.
    pub independent: u32,
    /// Width of the shared reserved bank. Zero unless the organization is
    /// a memory bank.
    pub shared: u32,
}

/// Per-module configuration-bit counts of a finished module graph.
#[derive(Debug, Clone)]
pub struct ConfigBitAccountant {
    organization: ConfigOrganization,
    bits: BTreeMap<ModuleId, ConfigBits>,
}

impl ConfigBitAccountant {
    /// Counts the bits of every module in `graph`.
    pub fn new(
        graph: &ModuleGraph,
        device: &DeviceContext,
        organization: ConfigOrganization,
    ) -> FabricResult<Self> {
        let mut counter = BitCounter {
            graph,
            device,
            organization,
            memo: BTreeMap::new(),
            visiting: HashSet::new(),
        };
        for (id, _) in graph.modules() {
            counter.count(id)?;
        }
        let total: u64 = counter.memo.values().map(|b| u64::from(b.independent)).sum();
        log::debug!(
            "counted configuration bits of {} modules ({total} independent bits over all module types)",
            counter.memo.len()
        );
        Ok(Self {
            organization,
            bits: counter.memo,
        })
    }

    /// The organization the counts were made for.
    pub fn organization(&self) -> ConfigOrganization {
        self.organization
    }

    /// Bits of a module.
    pub fn bits(&self, module: ModuleId) -> FabricResult<ConfigBits> {
        self.bits.get(&module).copied().ok_or_else(|| {
            FabricError::lookup(format!(
                "no configuration-bit count for module {}",
                module.as_raw()
            ))
        })
    }

    /// Independent bits of a module.
    pub fn independent_bits(&self, module: ModuleId) -> FabricResult<u32> {
        Ok(self.bits(module)?.independent)
    }

    /// Shared bits of a module.
    pub fn shared_bits(&self, module: ModuleId) -> FabricResult<u32> {
        Ok(self.bits(module)?.shared)
    }

    /// All counts in module-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, ConfigBits)> + '_ {
        self.bits.iter().map(|(&id, &bits)| (id, bits))
    }
}

struct BitCounter<'a> {
    graph: &'a ModuleGraph,
    device: &'a DeviceContext,
    organization: ConfigOrganization,
    memo: BTreeMap<ModuleId, ConfigBits>,
    visiting: HashSet<ModuleId>,
}

impl BitCounter<'_> {
    fn count(&mut self, id: ModuleId) -> FabricResult<ConfigBits> {
        if let Some(&bits) = self.memo.get(&id) {
            return Ok(bits);
        }
        if !self.visiting.insert(id) {
            return Err(FabricError::structural(format!(
                "module '{}' contains itself",
                self.graph.try_module(id)?.name
            )));
        }
        let graph = self.graph;
        let module = graph.try_module(id)?;
        let bits = match module.kind {
            ModuleKind::MuxMemory { model, fan_in } => {
                let entry = self.device.mux_library.lookup(model, fan_in)?;
                self.leaf(entry.num_config_bits, entry.num_shared_config_bits)
            }
            ModuleKind::PrimitiveMemory { model } => {
                let model = self.device.circuits.model(model)?;
                self.leaf(model.num_config_bits(), model.shared_config_bits)
            }
            ModuleKind::Container
            | ModuleKind::Logic { .. }
            | ModuleKind::Wire { .. }
            | ModuleKind::Mux { .. } => {
                let mut total = ConfigBits::default();
                for child in module.configurable_children() {
                    let child_bits = self.count(child.module)?;
                    total.independent += child_bits.independent;
                    total.shared = total.shared.max(child_bits.shared);
                }
                total
            }
        };
        self.visiting.remove(&id);
        self.memo.insert(id, bits);
        Ok(bits)
    }

    fn leaf(&self, independent: u32, shared: u32) -> ConfigBits {
        ConfigBits {
            independent,
            shared: if self.organization.has_shared_bits() {
                shared
            } else {
                0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_module::{InstanceRef, PortDirection};
    use weft_test_helpers::{fixture_device, LUT4, MUX_TREE};

    fn mux_memory(g: &mut ModuleGraph, fan_in: u32) -> ModuleId {
        let name = format!("mux_tree_size{fan_in}_mem");
        if let Some(id) = g.find_module(&name) {
            return id;
        }
        let id = g
            .add_module(
                name,
                ModuleKind::MuxMemory {
                    model: MUX_TREE,
                    fan_in,
                },
            )
            .unwrap();
        g.add_port(id, "mem_out", PortDirection::Output, 1).unwrap();
        id
    }

    fn configurable(g: &mut ModuleGraph, parent: ModuleId, child: ModuleId) {
        let index = g.add_child(parent, child).unwrap();
        g.add_configurable_child(parent, InstanceRef::new(child, index))
            .unwrap();
    }

    /// `sb` holds two 2-input mux memories and one 5-input mux memory;
    /// `top` holds two `sb`s and one LUT memory.
    fn graph() -> (ModuleGraph, ModuleId, ModuleId) {
        let mut g = ModuleGraph::new();
        let mem2 = mux_memory(&mut g, 2);
        let mem5 = mux_memory(&mut g, 5);
        let sb = g.add_module("sb_1__1_", ModuleKind::Container).unwrap();
        configurable(&mut g, sb, mem2);
        configurable(&mut g, sb, mem2);
        configurable(&mut g, sb, mem5);
        let lut_mem = g
            .add_module("lut4_mem", ModuleKind::PrimitiveMemory { model: LUT4 })
            .unwrap();
        let top = g.add_module("top", ModuleKind::Container).unwrap();
        configurable(&mut g, top, sb);
        configurable(&mut g, top, sb);
        configurable(&mut g, top, lut_mem);
        (g, sb, top)
    }

    #[test]
    fn independent_bits_add_up() {
        let (g, sb, top) = graph();
        let acc = ConfigBitAccountant::new(&g, &fixture_device(), ConfigOrganization::Standalone)
            .unwrap();
        // 1 + 1 + 3
        assert_eq!(acc.independent_bits(sb).unwrap(), 5);
        assert_eq!(acc.independent_bits(top).unwrap(), 5 + 5 + 16);
        assert_eq!(acc.shared_bits(top).unwrap(), 0);
    }

    #[test]
    fn shared_bank_is_counted_once() {
        let (g, sb, top) = graph();
        let acc = ConfigBitAccountant::new(&g, &fixture_device(), ConfigOrganization::MemoryBank)
            .unwrap();
        assert_eq!(acc.shared_bits(sb).unwrap(), 2);
        assert_eq!(acc.shared_bits(top).unwrap(), 2);
        assert_eq!(acc.independent_bits(sb).unwrap(), 5);
    }

    #[test]
    fn unconfigured_children_are_ignored() {
        let (mut g, sb, _) = graph();
        let mem2 = g.module_id("mux_tree_size2_mem").unwrap();
        let plain = g.add_module("plain", ModuleKind::Container).unwrap();
        g.add_child(plain, mem2).unwrap();
        g.add_child(plain, sb).unwrap();
        let acc = ConfigBitAccountant::new(&g, &fixture_device(), ConfigOrganization::ScanChain)
            .unwrap();
        assert_eq!(acc.bits(plain).unwrap(), ConfigBits::default());
    }

    #[test]
    fn missing_mux_entry_is_lookup_error() {
        let mut g = ModuleGraph::new();
        let mem = mux_memory(&mut g, 9);
        let sb = g.add_module("sb", ModuleKind::Container).unwrap();
        configurable(&mut g, sb, mem);
        let err = ConfigBitAccountant::new(&g, &fixture_device(), ConfigOrganization::Standalone)
            .unwrap_err();
        assert!(matches!(err, FabricError::Lookup(_)));
    }

    #[test]
    fn unknown_module_is_lookup_error() {
        let (g, _, _) = graph();
        let acc = ConfigBitAccountant::new(&g, &fixture_device(), ConfigOrganization::Standalone)
            .unwrap();
        assert!(matches!(
            acc.bits(ModuleId::from_raw(99)),
            Err(FabricError::Lookup(_))
        ));
        assert_eq!(acc.iter().count(), g.len());
    }
}
