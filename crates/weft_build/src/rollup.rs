//! Propagation of global, GPIO, and configuration ports up the hierarchy.
//!
//! After a container has its children wired, every port its children
//! expect from outside is exposed on the container itself:
//!
//! - global ports are merged by name, widest width wins, and every pin
//!   fans out to every child declaring it;
//! - GPIO ports are concatenated over the children in instance order;
//! - `config[n]` is sliced over the configurable children in order, or
//!   `ccff_head`/`ccff_tail` is chained through them;
//! - `reserved_sram[w]` is fanned out unsliced.

use crate::builder::FabricBuilder;
use weft_common::{ConfigOrganization, FabricResult};
use weft_module::{InstanceRef, ModuleId, PinRef, PortDirection, PortId, PortRef};

impl FabricBuilder<'_> {
    /// Exposes the children's global, GPIO, and configuration ports on `parent`.
    pub(crate) fn rollup_ports(&mut self, parent: ModuleId) -> FabricResult<()> {
        let module = self.graph.try_module(parent)?;
        let children: Vec<InstanceRef> =
            module.children().iter().map(|i| i.instance_ref()).collect();
        let configurable = module.configurable_children().to_vec();

        self.merge_by_name(parent, &children, PortDirection::Global)?;
        self.merge_by_name(parent, &children, PortDirection::SharedConfig)?;
        self.concat_gpio(parent, &children)?;
        match self.options.organization {
            ConfigOrganization::ScanChain => self.chain_config(parent, &configurable),
            ConfigOrganization::Standalone | ConfigOrganization::MemoryBank => {
                self.slice_config(parent, &configurable)
            }
        }
    }

    /// Ports of `direction` on a child, as `(id, name, width)`.
    fn ports_of(
        &self,
        child: ModuleId,
        direction: PortDirection,
    ) -> FabricResult<Vec<(PortId, String, u32)>> {
        Ok(self
            .graph
            .try_module(child)?
            .ports()
            .filter(|(_, p)| p.direction == direction)
            .map(|(id, p)| (id, p.name.clone(), p.width))
            .collect())
    }

    fn merge_by_name(
        &mut self,
        parent: ModuleId,
        children: &[InstanceRef],
        direction: PortDirection,
    ) -> FabricResult<()> {
        let mut merged: Vec<(String, u32)> = Vec::new();
        let mut sinks_by_port: Vec<Vec<(InstanceRef, PortId, u32)>> = Vec::new();
        for &child in children {
            for (port, name, width) in self.ports_of(child.module, direction)? {
                let slot = match merged.iter().position(|(n, _)| *n == name) {
                    Some(i) => i,
                    None => {
                        merged.push((name, 0));
                        sinks_by_port.push(Vec::new());
                        merged.len() - 1
                    }
                };
                merged[slot].1 = merged[slot].1.max(width);
                sinks_by_port[slot].push((child, port, width));
            }
        }
        for ((name, width), sinks) in merged.into_iter().zip(sinks_by_port) {
            let port = self.graph.add_port(parent, name, direction, width)?;
            for pin in 0..width {
                let pins: Vec<PinRef> = sinks
                    .iter()
                    .filter(|(_, _, w)| pin < *w)
                    .map(|&(inst, p, _)| PinRef::child(inst, p, pin))
                    .collect();
                self.graph.fan_out(parent, PinRef::local(port, pin), &pins)?;
            }
        }
        Ok(())
    }

    fn concat_gpio(&mut self, parent: ModuleId, children: &[InstanceRef]) -> FabricResult<()> {
        let mut merged: Vec<(String, Vec<(InstanceRef, PortId, u32)>)> = Vec::new();
        for &child in children {
            for (port, name, width) in self.ports_of(child.module, PortDirection::InOut)? {
                match merged.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, parts)) => parts.push((child, port, width)),
                    None => merged.push((name, vec![(child, port, width)])),
                }
            }
        }
        for (name, parts) in merged {
            let total = parts.iter().map(|&(_, _, w)| w).sum();
            let port = self
                .graph
                .add_port(parent, name, PortDirection::InOut, total)?;
            let mut offset = 0;
            for (inst, child_port, width) in parts {
                for pin in 0..width {
                    self.graph.connect(
                        parent,
                        PinRef::local(port, offset + pin),
                        PinRef::child(inst, child_port, pin),
                    )?;
                }
                offset += width;
            }
        }
        Ok(())
    }

    fn slice_config(&mut self, parent: ModuleId, configurable: &[InstanceRef]) -> FabricResult<()> {
        let mut parts = Vec::new();
        for &child in configurable {
            let m = self.graph.try_module(child.module)?;
            if let Some(port) = m.find_port("config") {
                let width = m.port(port).map_or(0, |p| p.width);
                parts.push((child, port, width));
            }
        }
        let total: u32 = parts.iter().map(|&(_, _, w)| w).sum();
        if total == 0 {
            return Ok(());
        }
        let port = self
            .graph
            .add_port(parent, "config", PortDirection::Config, total)?;
        let mut offset = 0;
        for (child, child_port, width) in parts {
            for pin in 0..width {
                self.graph.connect(
                    parent,
                    PinRef::local(port, offset + pin),
                    PinRef::child(child, child_port, pin),
                )?;
            }
            offset += width;
        }
        Ok(())
    }

    fn chain_config(&mut self, parent: ModuleId, configurable: &[InstanceRef]) -> FabricResult<()> {
        let mut links = Vec::new();
        for &child in configurable {
            let m = self.graph.try_module(child.module)?;
            if let (Some(head), Some(tail)) = (m.find_port("ccff_head"), m.find_port("ccff_tail")) {
                links.push((child, head, tail));
            }
        }
        if links.is_empty() {
            return Ok(());
        }
        let head = self
            .graph
            .add_port(parent, "ccff_head", PortDirection::Config, 1)?;
        let tail = self
            .graph
            .add_port(parent, "ccff_tail", PortDirection::ConfigOut, 1)?;
        let mut previous = PortRef::local(head);
        for (child, child_head, child_tail) in links {
            self.graph
                .connect(parent, previous.pin(0), PinRef::child(child, child_head, 0))?;
            previous = PortRef::child(child, child_tail);
        }
        self.graph
            .connect(parent, previous.pin(0), PinRef::local(tail, 0))?;
        Ok(())
    }
}
