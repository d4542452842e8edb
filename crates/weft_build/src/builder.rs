//! The fabric builder and its result.

use crate::naming;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;
use weft_arch::{BlockTypeId, CbKind, CircuitModelId, ClusterHierarchy, DeviceContext, TileTypeId};
use weft_common::{ConfigOrganization, FabricError, FabricResult, Side};
use weft_module::{InstanceRef, ModuleGraph, ModuleId, ModuleKind, PinRef, PortId};

/// Options of one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    /// Configuration-memory organization.
    pub organization: ConfigOrganization,
    /// Share one module between structurally identical routing blocks.
    pub compact_routing: bool,
    /// Expose every tile output pin twice, as `_upper` and `_lower` ports.
    pub duplicate_grid_pin: bool,
}

/// Builds the module graph of a device.
///
/// All `build_*` operations find-or-create: asking twice for the same block
/// type, tile type and border side, or routing-block structure yields the
/// same [`ModuleId`]. Two different block or tile types that would get the
/// same module name are a Consistency error.
pub struct FabricBuilder<'a> {
    pub(crate) device: &'a DeviceContext,
    pub(crate) options: BuildOptions,
    pub(crate) graph: ModuleGraph,
    pub(crate) blocks: HashMap<BlockTypeId, ModuleId>,
    pub(crate) tiles: HashMap<(TileTypeId, Option<Side>), ModuleId>,
    /// Block types whose module is being built, innermost last.
    pub(crate) visiting: Vec<BlockTypeId>,
}

impl<'a> FabricBuilder<'a> {
    /// Creates a builder with an empty module graph.
    pub fn new(device: &'a DeviceContext, options: BuildOptions) -> Self {
        Self {
            device,
            options,
            graph: ModuleGraph::new(),
            blocks: HashMap::new(),
            tiles: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    /// The device being built.
    pub fn device(&self) -> &'a DeviceContext {
        self.device
    }

    /// The build options.
    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// The graph built so far.
    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Ends the build and hands over the graph.
    pub fn into_graph(self) -> ModuleGraph {
        self.graph
    }

    /// Builds every module of the device: library leaves, one tile module
    /// per tile type and border side, and every non-empty switch and
    /// connection block.
    pub fn build_all(mut self) -> FabricResult<FabricModules> {
        let start = Instant::now();
        log::info!("building library modules...");
        self.build_library()?;

        log::info!("building grid modules...");
        let mut tiles = Vec::new();
        for placement in self.device.grid.sorted_placements() {
            let tile = self.device.tile(placement.tile)?;
            let border = if tile.is_io {
                self.device.grid.border_side(placement.x, placement.y)
            } else {
                None
            };
            let module = self.build_tile(placement.tile, border)?;
            tiles.push((placement.x, placement.y, module));
        }

        log::info!("building routing modules...");
        let switch_blocks = self.build_switch_blocks()?;
        let connection_blocks = self.build_connection_blocks()?;

        log::info!(
            "built {} modules ({} tiles, {} switch blocks, {} connection blocks) in {:.3}s",
            self.graph.len(),
            tiles.len(),
            switch_blocks.len(),
            connection_blocks.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(FabricModules {
            graph: self.graph,
            placement: FabricPlacement {
                tiles,
                switch_blocks,
                connection_blocks,
            },
        })
    }

    /// Creates the container module of a block or tile type, failing if
    /// another type already produced a module of that name.
    pub(crate) fn add_type_module(&mut self, name: String, owner: &str) -> FabricResult<ModuleId> {
        if self.graph.find_module(&name).is_some() {
            return Err(FabricError::consistency(format!(
                "{owner} would be built as module '{name}', which already exists for another type"
            )));
        }
        self.graph.add_module(name, ModuleKind::Container)
    }

    /// Returns the named port of `module`, failing if it does not exist.
    pub(crate) fn port_of(&self, module: ModuleId, name: &str) -> FabricResult<PortId> {
        let m = self.graph.try_module(module)?;
        m.find_port(name).ok_or_else(|| {
            FabricError::lookup(format!(
                "module '{}' has no port '{name}'",
                m.name
            ))
        })
    }

    /// Instantiates a child, names it, and returns the instance.
    pub(crate) fn instantiate(
        &mut self,
        parent: ModuleId,
        child: ModuleId,
        name: Option<String>,
    ) -> FabricResult<InstanceRef> {
        let index = self.graph.add_child(parent, child)?;
        let instance = InstanceRef::new(child, index);
        if let Some(name) = name {
            self.graph.set_instance_name(parent, instance, name)?;
        }
        Ok(instance)
    }

    /// Marks `instance` configurable if its module carries configuration.
    pub(crate) fn mark_if_configurable(
        &mut self,
        parent: ModuleId,
        instance: InstanceRef,
    ) -> FabricResult<()> {
        let child = self.graph.try_module(instance.module)?;
        if child.is_memory() || !child.configurable_children().is_empty() {
            self.graph.add_configurable_child(parent, instance)?;
        }
        Ok(())
    }

    /// Connects a wire instance between `source` and `sink`.
    pub(crate) fn wire_through(
        &mut self,
        parent: ModuleId,
        wire: ModuleId,
        source: PinRef,
        sink: PinRef,
    ) -> FabricResult<()> {
        let (wire_in, wire_out) = self.wire_ports(wire)?;
        let instance = self.instantiate(parent, wire, None)?;
        self.graph
            .connect(parent, source, PinRef::child(instance, wire_in, 0))?;
        self.graph
            .connect(parent, PinRef::child(instance, wire_out, 0), sink)?;
        Ok(())
    }

    /// Instantiates a multiplexer of `sources.len()` inputs with its memory.
    ///
    /// Source `i` drives multiplexer input `i`. The memory is marked
    /// configurable.
    pub(crate) fn mux_into(
        &mut self,
        parent: ModuleId,
        model: CircuitModelId,
        sources: &[PinRef],
        sink: PinRef,
        names: Option<(String, String)>,
    ) -> FabricResult<()> {
        let fan_in = sources.len() as u32;
        let mux = self.mux_module(model, fan_in)?;
        let mem = self.mux_memory_module(model, fan_in)?;
        let (mux_name, mem_name) = match names {
            Some((a, b)) => (Some(a), Some(b)),
            None => (None, None),
        };
        let mux_inst = self.instantiate(parent, mux, mux_name)?;
        let mem_inst = self.instantiate(parent, mem, mem_name)?;

        let mux_in = self.port_of(mux, "in")?;
        let mux_out = self.port_of(mux, "out")?;
        let mut wired = 0;
        for (i, &source) in sources.iter().enumerate() {
            self.graph
                .connect(parent, source, PinRef::child(mux_inst, mux_in, i as u32))?;
            wired += 1;
        }
        let mux_module = self.graph.try_module(mux)?;
        let width = mux_module.port(mux_in).map_or(0, |p| p.width);
        if wired != width {
            return Err(FabricError::consistency(format!(
                "multiplexer '{}' has {width} inputs but {wired} were wired",
                mux_module.name
            )));
        }
        let sram = mux_module.find_port("sram");
        self.graph
            .connect(parent, PinRef::child(mux_inst, mux_out, 0), sink)?;

        let mem_module = self.graph.try_module(mem)?;
        if let (Some(sram), Some(mem_out)) = (sram, mem_module.find_port("mem_out")) {
            let bits = mem_module.port(mem_out).map_or(0, |p| p.width);
            for bit in 0..bits {
                self.graph.connect(
                    parent,
                    PinRef::child(mem_inst, mem_out, bit),
                    PinRef::child(mux_inst, sram, bit),
                )?;
            }
        }
        self.graph.add_configurable_child(parent, mem_inst)?;
        Ok(())
    }

    /// Hierarchy view of the device's clusters.
    pub(crate) fn clusters(&self) -> &'a dyn ClusterHierarchy {
        &self.device.clusters
    }
}

/// The finished module graph and where its modules are placed.
#[derive(Debug, Clone)]
pub struct FabricModules {
    /// The module graph, still in its build phase.
    pub graph: ModuleGraph,
    /// Module at every grid position.
    pub placement: FabricPlacement,
}

/// Module placed at every tile, switch-block, and connection-block position.
#[derive(Debug, Clone, Default)]
pub struct FabricPlacement {
    /// Tile module at every occupied grid coordinate, in `(x, y)` order.
    pub tiles: Vec<(u32, u32, ModuleId)>,
    /// Switch-block module at every coordinate with a non-empty switch block.
    pub switch_blocks: BTreeMap<(u32, u32), ModuleId>,
    /// Connection-block module at every coordinate with a non-empty connection block.
    pub connection_blocks: BTreeMap<(CbKind, u32, u32), ModuleId>,
}

impl FabricPlacement {
    /// Distinct switch-block modules, in order of first placement.
    pub fn unique_switch_blocks(&self) -> Vec<((u32, u32), ModuleId)> {
        first_occurrences(self.switch_blocks.iter().map(|(&k, &m)| (k, m)))
    }

    /// Distinct connection-block modules, in order of first placement.
    pub fn unique_connection_blocks(&self) -> Vec<((CbKind, u32, u32), ModuleId)> {
        first_occurrences(self.connection_blocks.iter().map(|(&k, &m)| (k, m)))
    }

    /// Every placed tile, switch block, and connection block as a
    /// `(physical name, module)` pair.
    ///
    /// A tile module missing from `graph` is a Lookup error.
    pub fn physical_blocks(&self, graph: &ModuleGraph) -> FabricResult<Vec<(String, ModuleId)>> {
        let mut blocks = Vec::new();
        for &(x, y, module) in &self.tiles {
            let name = &graph.try_module(module)?.name;
            blocks.push((naming::grid_instance(name, x, y), module));
        }
        for (&(x, y), &module) in &self.switch_blocks {
            blocks.push((naming::switch_block(x, y), module));
        }
        for (&(kind, x, y), &module) in &self.connection_blocks {
            blocks.push((naming::connection_block(kind, x, y), module));
        }
        Ok(blocks)
    }
}

fn first_occurrences<K>(items: impl Iterator<Item = (K, ModuleId)>) -> Vec<(K, ModuleId)> {
    let mut seen = HashSet::new();
    items.filter(|(_, m)| seen.insert(*m)).collect()
}
