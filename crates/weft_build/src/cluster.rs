//! Modules of the logic-cluster hierarchy.
//!
//! Blocks are built depth first, post order: every child block type of the
//! physical mode is complete before its parent is assembled. A block type
//! is built once and shared by every parent that instantiates it.

use crate::builder::FabricBuilder;
use crate::naming;
use weft_arch::{
    BlockPort, BlockTypeId, CircuitModelId, CircuitModelKind, CircuitPortKind,
    InterconnectEdge, PinOwner, PinSpec, PortClass,
};
use weft_common::{FabricError, FabricResult};
use weft_module::{InstanceRef, ModuleId, PinRef, PortDirection, PortRef};

fn port_direction(class: PortClass) -> PortDirection {
    match class {
        PortClass::Input => PortDirection::Input,
        PortClass::Output => PortDirection::Output,
        PortClass::Clock => PortDirection::Clock,
    }
}

impl FabricBuilder<'_> {
    /// Finds or creates the module of a block type.
    ///
    /// A block type that contains itself is a Structural error.
    pub fn build_block(&mut self, block: BlockTypeId) -> FabricResult<ModuleId> {
        if let Some(&module) = self.blocks.get(&block) {
            return Ok(module);
        }
        let clusters = self.clusters();
        let def = clusters.block(block)?;
        if self.visiting.contains(&block) {
            let path = self
                .visiting
                .iter()
                .map(|&b| clusters.block(b).map(|d| d.name.as_str()))
                .collect::<FabricResult<Vec<_>>>()?
                .join(" -> ");
            return Err(FabricError::structural(format!(
                "block '{}' instantiates itself ({path} -> {})",
                def.name, def.name
            )));
        }
        self.visiting.push(block);
        let built = if def.is_primitive() {
            self.build_primitive(block)
        } else {
            self.build_composite(block)
        };
        self.visiting.pop();
        let module = built?;
        self.blocks.insert(block, module);
        Ok(module)
    }

    fn add_block_ports(&mut self, module: ModuleId, ports: &[BlockPort]) -> FabricResult<()> {
        for port in ports {
            self.graph
                .add_port(module, port.name.clone(), port_direction(port.class), port.width)?;
        }
        Ok(())
    }

    fn build_primitive(&mut self, block: BlockTypeId) -> FabricResult<ModuleId> {
        let def = self.clusters().block(block)?;
        let name = naming::pb_leaf(&def.name);
        let model_id = def.circuit_model.ok_or_else(|| {
            FabricError::structural(format!("primitive block '{}' has no circuit model", def.name))
        })?;
        let device = self.device;
        let model = device.circuits.model(model_id)?;
        if matches!(
            model.kind,
            CircuitModelKind::Mux | CircuitModelKind::Wire | CircuitModelKind::Sram
        ) {
            return Err(FabricError::structural(format!(
                "primitive block '{}' cannot be implemented by routing model '{}'",
                def.name, model.name
            )));
        }
        let logic = self.logic_module(model_id)?;
        let memory = if model.num_config_bits() > 0 {
            Some(self.primitive_memory_module(model_id)?)
        } else {
            None
        };

        let module = self.add_type_module(name, &format!("block '{}'", def.name))?;
        self.add_block_ports(module, &def.ports)?;
        let logic_inst = self.instantiate(module, logic, Some(model.name.clone()))?;
        for port in &def.ports {
            let outer = PortRef::local(self.port_of(module, &port.name)?);
            let inner = PortRef::child(logic_inst, self.port_of(logic, &port.name)?);
            match port.class {
                PortClass::Output => self.graph.connect_ports(module, inner, outer)?,
                PortClass::Input | PortClass::Clock => {
                    self.graph.connect_ports(module, outer, inner)?
                }
            }
        }

        if let Some(memory) = memory {
            let mem_inst =
                self.instantiate(module, memory, Some(naming::primitive_memory_module(&model.name)))?;
            let mem_out = self.port_of(memory, "mem_out")?;
            let mut offset = 0;
            for sram in model.ports_of_kind(CircuitPortKind::Sram) {
                let sram_port = self.port_of(logic, &sram.name)?;
                for pin in 0..sram.size {
                    self.graph.connect(
                        module,
                        PinRef::child(mem_inst, mem_out, offset + pin),
                        PinRef::child(logic_inst, sram_port, pin),
                    )?;
                }
                offset += sram.size;
            }
            self.graph.add_configurable_child(module, mem_inst)?;
        }

        self.rollup_ports(module)?;
        log::debug!("built primitive block '{}'", self.graph.try_module(module)?.name);
        Ok(module)
    }

    fn build_composite(&mut self, block: BlockTypeId) -> FabricResult<ModuleId> {
        let clusters = self.clusters();
        let def = clusters.block(block)?;
        let mode_index = clusters.physical_mode(block)?;
        let mode = &def.modes[mode_index];
        let name = naming::pb_composite(&def.name, &mode.name);
        let owner = format!("block '{}'", def.name);
        if self.graph.find_module(&name).is_some() {
            return Err(FabricError::consistency(format!(
                "{owner} would be built as module '{name}', which already exists for another type"
            )));
        }

        let slots = clusters.children_of(block, mode_index)?;
        let mut slot_modules = Vec::with_capacity(slots.len());
        for slot in slots {
            slot_modules.push(self.build_block(slot.block)?);
        }

        let module = self.add_type_module(name, &owner)?;
        self.add_block_ports(module, &def.ports)?;

        // instances[slot][k] is the k-th instance of that slot
        let mut instances: Vec<Vec<InstanceRef>> = Vec::with_capacity(slots.len());
        for (slot, &child_module) in slots.iter().zip(&slot_modules) {
            let child_name = &clusters.block(slot.block)?.name;
            let mut row = Vec::with_capacity(slot.count as usize);
            for k in 0..slot.count {
                let inst = self.graph.add_named_child(
                    module,
                    child_module,
                    naming::block_instance(child_name, k),
                )?;
                self.mark_if_configurable(module, inst)?;
                row.push(inst);
            }
            instances.push(row);
        }

        // Destinations: the parent's outputs, then every child's inputs and clocks.
        let mut destinations: Vec<(PinSpec, PinRef)> = Vec::new();
        for port in def.ports.iter().filter(|p| p.class == PortClass::Output) {
            let id = self.port_of(module, &port.name)?;
            for pin in 0..port.width {
                destinations.push((PinSpec::parent(port.name.clone(), pin), PinRef::local(id, pin)));
            }
        }
        for (slot_index, (slot, row)) in slots.iter().zip(&instances).enumerate() {
            let child_ports = clusters.pins_of(slot.block)?;
            for (k, &inst) in row.iter().enumerate() {
                for port in child_ports.iter().filter(|p| p.class != PortClass::Output) {
                    let id = self.port_of(inst.module, &port.name)?;
                    for pin in 0..port.width {
                        destinations.push((
                            PinSpec::child(slot_index, k as u32, port.name.clone(), pin),
                            PinRef::child(inst, id, pin),
                        ));
                    }
                }
            }
        }

        for (dest, sink) in destinations {
            let edges = clusters.input_edges(block, mode_index, &dest)?;
            if edges.is_empty() {
                continue;
            }
            let sources = edges
                .iter()
                .map(|e| self.resolve_source(module, &instances, &e.source))
                .collect::<FabricResult<Vec<_>>>()?;
            if sources.len() == 1 {
                let model = self.interconnect_wire(&edges[0])?;
                let wire = self.wire_module(model)?;
                self.wire_through(module, wire, sources[0], sink)?;
            } else {
                let model = self.interconnect_mux(&def.name, &edges)?;
                self.mux_into(module, model, &sources, sink, None)?;
            }
        }

        self.rollup_ports(module)?;
        log::debug!("built composite block '{}'", self.graph.try_module(module)?.name);
        Ok(module)
    }

    fn resolve_source(
        &self,
        module: ModuleId,
        instances: &[Vec<InstanceRef>],
        source: &PinSpec,
    ) -> FabricResult<PinRef> {
        match source.owner {
            PinOwner::Parent => Ok(PinRef::local(self.port_of(module, &source.port)?, source.pin)),
            PinOwner::Child { slot, instance } => {
                let inst = instances
                    .get(slot)
                    .and_then(|row| row.get(instance as usize))
                    .copied()
                    .ok_or_else(|| {
                        FabricError::lookup(format!(
                            "interconnect source refers to missing instance {instance} of slot {slot}"
                        ))
                    })?;
                Ok(PinRef::child(inst, self.port_of(inst.module, &source.port)?, source.pin))
            }
        }
    }

    /// Wire model of a single-driver interconnect.
    ///
    /// A multiplexer interconnect left with one driver degenerates to the
    /// default wire.
    fn interconnect_wire(&self, edge: &InterconnectEdge) -> FabricResult<CircuitModelId> {
        let Some(model) = edge.circuit_model else {
            return self.device.circuits.default_wire();
        };
        match self.device.circuits.model(model)?.kind {
            CircuitModelKind::Wire => Ok(model),
            CircuitModelKind::Mux => self.device.circuits.default_wire(),
            _ => Err(FabricError::structural(format!(
                "interconnect edge uses circuit model {} which is neither a wire nor a multiplexer",
                model.as_raw()
            ))),
        }
    }

    /// Multiplexer model shared by all edges into one destination.
    fn interconnect_mux(
        &self,
        block: &str,
        edges: &[InterconnectEdge],
    ) -> FabricResult<CircuitModelId> {
        let first = edges[0].circuit_model;
        if edges.iter().any(|e| e.circuit_model != first) {
            return Err(FabricError::structural(format!(
                "edges into one pin of block '{block}' use different circuit models"
            )));
        }
        let model = first.ok_or_else(|| {
            FabricError::structural(format!(
                "multi-driver interconnect in block '{block}' has no circuit model"
            ))
        })?;
        if self.device.circuits.model(model)?.kind != CircuitModelKind::Mux {
            return Err(FabricError::structural(format!(
                "multi-driver interconnect in block '{block}' is not implemented by a multiplexer"
            )));
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use crate::{BuildOptions, FabricBuilder};
    use weft_arch::ClusterHierarchy;
    use weft_common::{ConfigOrganization, FabricError};
    use weft_module::PortDirection;
    use weft_test_helpers::{
        fixture_device, BLOCK_CLB, BLOCK_DFF, BLOCK_FLE, BLOCK_IO, BLOCK_LUT4,
    };

    fn builder(device: &weft_arch::DeviceContext) -> FabricBuilder<'_> {
        FabricBuilder::new(
            device,
            BuildOptions {
                organization: ConfigOrganization::Standalone,
                compact_routing: true,
                duplicate_grid_pin: false,
            },
        )
    }

    fn width(b: &FabricBuilder<'_>, module: weft_module::ModuleId, port: &str) -> u32 {
        let m = b.graph().module(module);
        m.port(m.find_port(port).unwrap()).unwrap().width
    }

    #[test]
    fn building_twice_yields_the_same_module() {
        let device = fixture_device();
        let mut b = builder(&device);
        let first = b.build_block(BLOCK_CLB).unwrap();
        let count = b.graph().len();
        assert_eq!(b.build_block(BLOCK_CLB).unwrap(), first);
        assert_eq!(b.graph().len(), count);
        assert_eq!(b.graph().module(first).name, "pb_clb_mode_default");
        assert!(b.graph().find_module("pb_fle_mode_n1_lut4").is_some());
        assert!(b.graph().find_module("pb_fle_mode_lut_only").is_none());
    }

    #[test]
    fn primitive_with_memory() {
        let device = fixture_device();
        let mut b = builder(&device);
        let lut = b.build_block(BLOCK_LUT4).unwrap();
        let m = b.graph().module(lut);
        assert_eq!(m.name, "pb_lut4");
        assert_eq!(m.children().len(), 2);
        assert_eq!(m.configurable_children().len(), 1);
        assert_eq!(width(&b, lut, "config"), 16);
        // in[4] + out + 16 memory bits
        assert_eq!(m.nets().count(), 4 + 1 + 16 + 16);
    }

    #[test]
    fn fle_uses_physical_mode_only() {
        let device = fixture_device();
        let mut b = builder(&device);
        let fle = b.build_block(BLOCK_FLE).unwrap();
        let g = b.graph();
        let m = g.module(fle);
        let mux2 = g.module_id("mux_tree_size2").unwrap();
        let wire = g.module_id("wire").unwrap();
        assert_eq!(m.instance_count(mux2), 1);
        // lut in[0..4], dff D, dff clk
        assert_eq!(m.instance_count(wire), 6);
        // lut4 block, then the output mux memory
        let configurable: Vec<_> = m
            .configurable_children()
            .iter()
            .map(|i| g.module(i.module).name.clone())
            .collect();
        assert_eq!(configurable, vec!["pb_lut4", "mux_tree_size2_mem"]);
        assert_eq!(width(&b, fle, "reset"), 1);
        assert_eq!(width(&b, fle, "config"), 17);
    }

    #[test]
    fn crossbar_muxes_follow_edge_order() {
        let device = fixture_device();
        let mut b = builder(&device);
        let clb = b.build_block(BLOCK_CLB).unwrap();
        let g = b.graph();
        let m = g.module(clb);
        let mux6 = g.module_id("mux_tree_size6").unwrap();
        assert_eq!(m.instance_count(mux6), 8);
        assert_eq!(
            m.children()
                .iter()
                .filter(|i| i.module == g.module_id("pb_fle_mode_n1_lut4").unwrap())
                .map(|i| i.name.clone().unwrap())
                .collect::<Vec<_>>(),
            vec!["fle_0", "fle_1"]
        );

        // Every input of the first crossbar mux is driven in edge order:
        // I[0..4], then fle_0.out, then fle_1.out.
        let first = m
            .children()
            .iter()
            .find(|i| i.module == mux6)
            .unwrap()
            .instance_ref();
        let mux_in = g.module(mux6).find_port("in").unwrap();
        let i_port = m.find_port("I").unwrap();
        let mut drivers = vec![None; 6];
        for (_, net) in m.nets() {
            for sink in &net.sinks {
                if sink.instance == Some(first) && sink.port == mux_in {
                    drivers[sink.pin as usize] = net.source;
                }
            }
        }
        for pin in 0..4 {
            let src = drivers[pin].unwrap();
            assert_eq!(src.instance, None);
            assert_eq!(src.port, i_port);
            assert_eq!(src.pin, pin as u32);
        }
        let fle = g.module_id("pb_fle_mode_n1_lut4").unwrap();
        assert_eq!(drivers[4].unwrap().instance.unwrap().module, fle);
        assert_eq!(drivers[4].unwrap().instance.unwrap().index, 0);
        assert_eq!(drivers[5].unwrap().instance.unwrap().index, 1);
        assert_eq!(width(&b, clb, "config"), 58);
    }

    #[test]
    fn io_block_exposes_gpio() {
        let device = fixture_device();
        let mut b = builder(&device);
        let io = b.build_block(BLOCK_IO).unwrap();
        let m = b.graph().module(io);
        let pad = m.port(m.find_port("pad").unwrap()).unwrap();
        assert_eq!(pad.direction, PortDirection::InOut);
        assert_eq!(pad.width, 1);
        assert_eq!(width(&b, io, "config"), 1);
    }

    #[test]
    fn several_modes_without_physical_mode_is_structural_error() {
        let mut device = fixture_device();
        device.clusters.blocks[BLOCK_FLE.index()].physical_mode = None;
        assert!(device.clusters.physical_mode(BLOCK_FLE).is_err());
        let mut b = builder(&device);
        assert!(matches!(
            b.build_block(BLOCK_CLB),
            Err(FabricError::Structural(_))
        ));
    }

    #[test]
    fn multi_driver_wire_interconnect_is_structural_error() {
        let mut device = fixture_device();
        let clb = &mut device.clusters.blocks[BLOCK_CLB.index()];
        clb.modes[0].interconnects[0].circuit_model = Some(weft_test_helpers::WIRE);
        let mut b = builder(&device);
        assert!(matches!(
            b.build_block(BLOCK_CLB),
            Err(FabricError::Structural(_))
        ));
    }

    #[test]
    fn nesting_a_block_inside_itself_is_structural_error() {
        let mut device = fixture_device();
        let fle = &mut device.clusters.blocks[BLOCK_FLE.index()];
        let mode = fle.physical_mode.unwrap_or(0);
        fle.modes[mode].children[0].block = BLOCK_CLB;
        let mut b = builder(&device);
        match b.build_block(BLOCK_CLB) {
            Err(FabricError::Structural(msg)) => {
                assert!(msg.contains("block 'clb' instantiates itself"), "{msg}");
                assert!(msg.contains("clb -> fle -> clb"), "{msg}");
            }
            other => panic!("expected structural error, got {other:?}"),
        }
        // the failed attempt leaves nothing half-visited
        assert!(b.visiting.is_empty());
    }

    #[test]
    fn block_types_sharing_a_name_are_consistency_error() {
        let mut device = fixture_device();
        device.clusters.blocks[BLOCK_DFF.index()].name = "lut4".to_string();
        let mut b = builder(&device);
        let lut = b.build_block(BLOCK_LUT4).unwrap();
        match b.build_block(BLOCK_DFF) {
            Err(FabricError::Consistency(msg)) => assert!(msg.contains("'pb_lut4'"), "{msg}"),
            other => panic!("expected consistency error, got {other:?}"),
        }
        // the first type keeps its module
        assert_eq!(b.build_block(BLOCK_LUT4).unwrap(), lut);
        assert_eq!(b.graph().module(lut).name, "pb_lut4");
    }

    #[test]
    fn cache_is_keyed_by_block_type() {
        let device = fixture_device();
        let mut b = builder(&device);
        let lut = b.build_block(BLOCK_LUT4).unwrap();
        let dff = b.build_block(BLOCK_DFF).unwrap();
        assert_ne!(lut, dff);
        assert_eq!(b.blocks.get(&BLOCK_LUT4), Some(&lut));
        assert_eq!(b.blocks.get(&BLOCK_DFF), Some(&dff));
    }
}
