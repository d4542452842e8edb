//! Library leaf modules: logic primitives, wires, multiplexers, and memories.

use crate::builder::FabricBuilder;
use crate::naming;
use weft_arch::{CircuitModelId, CircuitModelKind, CircuitPortKind};
use weft_common::{ConfigOrganization, FabricError, FabricResult};
use weft_module::{ModuleId, ModuleKind, PortDirection, PortId};

impl FabricBuilder<'_> {
    /// Builds one leaf per circuit model, one multiplexer and memory per
    /// mux-library entry, and one memory per configurable primitive.
    pub fn build_library(&mut self) -> FabricResult<()> {
        let device = self.device;
        for (id, model) in device.circuits.iter() {
            match model.kind {
                CircuitModelKind::Mux | CircuitModelKind::Sram => {}
                CircuitModelKind::Wire => {
                    self.wire_module(id)?;
                }
                _ => {
                    self.logic_module(id)?;
                    if model.num_config_bits() > 0 {
                        self.primitive_memory_module(id)?;
                    }
                }
            }
        }
        for entry in device.mux_library.entries() {
            self.mux_module(entry.model, entry.fan_in)?;
            self.mux_memory_module(entry.model, entry.fan_in)?;
        }
        log::debug!("library holds {} modules", self.graph.len());
        Ok(())
    }

    /// Finds or creates the logic leaf of a circuit model.
    ///
    /// Ports mirror the model's ports. Configuration ports become plain
    /// inputs fed by the primitive's memory; inputs marked global become
    /// global ports.
    pub fn logic_module(&mut self, model: CircuitModelId) -> FabricResult<ModuleId> {
        let m = self.device.circuits.model(model)?;
        if let Some(id) = self.graph.find_module(&m.name) {
            return Ok(id);
        }
        let id = self.graph.add_module(m.name.clone(), ModuleKind::Logic { model })?;
        for port in &m.ports {
            let direction = match port.kind {
                CircuitPortKind::Input | CircuitPortKind::Clock if port.global => {
                    PortDirection::Global
                }
                CircuitPortKind::Input | CircuitPortKind::Sram => PortDirection::Input,
                CircuitPortKind::Output => PortDirection::Output,
                CircuitPortKind::Inout => PortDirection::InOut,
                CircuitPortKind::Clock => PortDirection::Clock,
            };
            self.graph
                .add_port(id, port.name.clone(), direction, port.size)?;
        }
        Ok(id)
    }

    /// Finds or creates the module of a wire model.
    pub fn wire_module(&mut self, model: CircuitModelId) -> FabricResult<ModuleId> {
        let m = self.device.circuits.model(model)?;
        if m.kind != CircuitModelKind::Wire {
            return Err(FabricError::structural(format!(
                "circuit model '{}' is not a wire",
                m.name
            )));
        }
        if let Some(id) = self.graph.find_module(&m.name) {
            return Ok(id);
        }
        let id = self.graph.add_module(m.name.clone(), ModuleKind::Wire { model })?;
        for port in &m.ports {
            let direction = match port.kind {
                CircuitPortKind::Output => PortDirection::Output,
                _ => PortDirection::Input,
            };
            self.graph
                .add_port(id, port.name.clone(), direction, port.size)?;
        }
        self.wire_ports(id)?;
        Ok(id)
    }

    /// First input and first output port of a wire module.
    pub(crate) fn wire_ports(&self, wire: ModuleId) -> FabricResult<(PortId, PortId)> {
        let m = self.graph.try_module(wire)?;
        let find = |direction: PortDirection| {
            m.ports()
                .find(|(_, p)| p.direction == direction)
                .map(|(id, _)| id)
        };
        match (find(PortDirection::Input), find(PortDirection::Output)) {
            (Some(i), Some(o)) => Ok((i, o)),
            _ => Err(FabricError::structural(format!(
                "wire '{}' needs one input and one output port",
                m.name
            ))),
        }
    }

    /// Finds or creates the multiplexer module of `fan_in` inputs.
    ///
    /// Ports: `in[fan_in]`, `out[1]` and, when the implementation has
    /// configuration bits, `sram[bits]`.
    pub fn mux_module(&mut self, model: CircuitModelId, fan_in: u32) -> FabricResult<ModuleId> {
        let entry = self.device.mux_library.lookup(model, fan_in)?;
        let m = self.device.circuits.model(model)?;
        let name = naming::mux_module(&m.name, fan_in);
        if let Some(id) = self.graph.find_module(&name) {
            return Ok(id);
        }
        let id = self.graph.add_module(name, ModuleKind::Mux { model, fan_in })?;
        self.graph.add_port(id, "in", PortDirection::Input, fan_in)?;
        self.graph.add_port(id, "out", PortDirection::Output, 1)?;
        if entry.num_config_bits > 0 {
            self.graph
                .add_port(id, "sram", PortDirection::Input, entry.num_config_bits)?;
        }
        Ok(id)
    }

    /// Finds or creates the configuration memory of a multiplexer.
    pub fn mux_memory_module(
        &mut self,
        model: CircuitModelId,
        fan_in: u32,
    ) -> FabricResult<ModuleId> {
        let entry = self.device.mux_library.lookup(model, fan_in)?;
        let m = self.device.circuits.model(model)?;
        let name = naming::mux_memory_module(&m.name, fan_in);
        if let Some(id) = self.graph.find_module(&name) {
            return Ok(id);
        }
        let id = self
            .graph
            .add_module(name, ModuleKind::MuxMemory { model, fan_in })?;
        self.add_memory_ports(id, entry.num_config_bits, entry.num_shared_config_bits)?;
        Ok(id)
    }

    /// Finds or creates the configuration memory of a logic primitive.
    pub fn primitive_memory_module(&mut self, model: CircuitModelId) -> FabricResult<ModuleId> {
        let m = self.device.circuits.model(model)?;
        let name = naming::primitive_memory_module(&m.name);
        if let Some(id) = self.graph.find_module(&name) {
            return Ok(id);
        }
        let id = self
            .graph
            .add_module(name, ModuleKind::PrimitiveMemory { model })?;
        self.add_memory_ports(id, m.num_config_bits(), m.shared_config_bits)?;
        Ok(id)
    }

    /// `mem_out[bits]` plus the configuration interface of the organization.
    fn add_memory_ports(&mut self, id: ModuleId, bits: u32, shared: u32) -> FabricResult<()> {
        if bits == 0 {
            return Ok(());
        }
        self.graph
            .add_port(id, "mem_out", PortDirection::Output, bits)?;
        match self.options.organization {
            ConfigOrganization::ScanChain => {
                self.graph
                    .add_port(id, "ccff_head", PortDirection::Config, 1)?;
                self.graph
                    .add_port(id, "ccff_tail", PortDirection::ConfigOut, 1)?;
            }
            ConfigOrganization::Standalone | ConfigOrganization::MemoryBank => {
                self.graph
                    .add_port(id, "config", PortDirection::Config, bits)?;
            }
        }
        if self.options.organization.has_shared_bits() && shared > 0 {
            self.graph
                .add_port(id, "reserved_sram", PortDirection::SharedConfig, shared)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{BuildOptions, FabricBuilder};
    use weft_common::ConfigOrganization;
    use weft_module::{ModuleKind, PortDirection};
    use weft_test_helpers::{fixture_device, DFF, LUT4, MUX_TREE, WIRE};

    fn options(organization: ConfigOrganization) -> BuildOptions {
        BuildOptions {
            organization,
            compact_routing: true,
            duplicate_grid_pin: false,
        }
    }

    #[test]
    fn library_is_built_once() {
        let device = fixture_device();
        let mut b = FabricBuilder::new(&device, options(ConfigOrganization::ScanChain));
        b.build_library().unwrap();
        let count = b.graph().len();
        b.build_library().unwrap();
        assert_eq!(b.graph().len(), count);
        // wire, lut4 + mem, dff, iopad + mem, 7 muxes + 7 memories
        assert_eq!(count, 1 + 2 + 1 + 2 + 14);
        assert_eq!(b.logic_module(LUT4).unwrap(), b.graph().module_id("lut4").unwrap());
    }

    #[test]
    fn logic_ports_mirror_the_model() {
        let device = fixture_device();
        let mut b = FabricBuilder::new(&device, options(ConfigOrganization::ScanChain));
        let dff = b.logic_module(DFF).unwrap();
        let m = b.graph().module(dff);
        let ports: Vec<_> = m
            .ports()
            .map(|(_, p)| (p.name.as_str(), p.direction))
            .collect();
        assert_eq!(
            ports,
            vec![
                ("D", PortDirection::Input),
                ("Q", PortDirection::Output),
                ("clk", PortDirection::Clock),
                ("reset", PortDirection::Global),
            ]
        );
        assert_eq!(m.kind, ModuleKind::Logic { model: DFF });
    }

    #[test]
    fn mux_and_memory_ports() {
        let device = fixture_device();
        let mut b = FabricBuilder::new(&device, options(ConfigOrganization::MemoryBank));
        let mux = b.mux_module(MUX_TREE, 6).unwrap();
        let mem = b.mux_memory_module(MUX_TREE, 6).unwrap();
        let g = b.graph();
        assert_eq!(g.module(mux).name, "mux_tree_size6");
        let width = |m, name| {
            let module = g.module(m);
            module.port(module.find_port(name).unwrap()).unwrap().width
        };
        assert_eq!(width(mux, "in"), 6);
        assert_eq!(width(mux, "sram"), 3);
        assert_eq!(width(mem, "mem_out"), 3);
        assert_eq!(width(mem, "config"), 3);
        assert_eq!(width(mem, "reserved_sram"), 2);
    }

    #[test]
    fn scan_chain_memory_has_head_and_tail() {
        let device = fixture_device();
        let mut b = FabricBuilder::new(&device, options(ConfigOrganization::ScanChain));
        let mem = b.primitive_memory_module(LUT4).unwrap();
        let m = b.graph().module(mem);
        assert_eq!(m.name, "lut4_mem");
        assert!(m.find_port("ccff_head").is_some());
        assert!(m.find_port("ccff_tail").is_some());
        assert!(m.find_port("config").is_none());
        assert!(m.find_port("reserved_sram").is_none());
    }

    #[test]
    fn non_wire_model_is_rejected_as_wire() {
        let device = fixture_device();
        let mut b = FabricBuilder::new(&device, options(ConfigOrganization::ScanChain));
        assert!(b.wire_module(WIRE).is_ok());
        assert!(matches!(
            b.wire_module(LUT4),
            Err(weft_common::FabricError::Structural(_))
        ));
        assert!(matches!(
            b.mux_module(MUX_TREE, 1),
            Err(weft_common::FabricError::Structural(_))
        ));
    }
}
