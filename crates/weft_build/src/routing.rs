//! Switch-block and connection-block modules.
//!
//! Each routing block is first turned into a [`BlockPlan`]: its ports and,
//! for every output, how it is driven. The plan both names the block's
//! structure for compact sharing and drives module creation, so two blocks
//! share a module exactly when they would have built the same one.

use crate::builder::FabricBuilder;
use crate::naming;
use crate::resolve::{BlockPortResolver, DriverPort};
use std::collections::{BTreeMap, HashMap};
use weft_arch::{CbKind, CircuitModelId, ConnectionBlock, SwitchBlock, SwitchId, TrackDirection};
use weft_common::{ContentHash, ContentHasher, FabricResult};
use weft_module::{ModuleId, ModuleKind, PinRef, PortDirection};

/// How one output port of a routing block is driven.
#[derive(Debug, Clone)]
enum Drive {
    /// A net from an input port.
    Direct { source: String, switch: Option<SwitchId> },
    /// A multiplexer over input ports, with its memory.
    Mux {
        model: CircuitModelId,
        sources: Vec<String>,
        switches: Vec<SwitchId>,
        mux: String,
        mem: String,
    },
}

#[derive(Debug, Default)]
struct BlockPlan {
    ports: Vec<(String, PortDirection)>,
    drives: Vec<(String, Drive)>,
}

impl BlockPlan {
    fn port(&mut self, name: String, direction: PortDirection) {
        self.ports.push((name, direction));
    }

    fn signature(&self) -> ContentHash {
        let mut h = ContentHasher::new();
        for (name, direction) in &self.ports {
            h.str(name).u64(*direction as u64);
        }
        for (sink, drive) in &self.drives {
            h.str(sink);
            match drive {
                Drive::Direct { source, switch } => {
                    h.u64(0).str(source);
                    h.u64(switch.map_or(u64::MAX, |s| u64::from(s.as_raw())));
                }
                Drive::Mux {
                    model,
                    sources,
                    switches,
                    mux,
                    mem,
                } => {
                    h.u64(1).u64(u64::from(model.as_raw())).str(mux).str(mem);
                    for (source, switch) in sources.iter().zip(switches) {
                        h.str(source).u64(u64::from(switch.as_raw()));
                    }
                }
            }
        }
        h.finish()
    }
}

impl FabricBuilder<'_> {
    /// Builds a module for every non-empty switch block, in `(x, y)` order.
    ///
    /// With compact routing, blocks of identical structure share the module
    /// named after the first of them.
    pub fn build_switch_blocks(&mut self) -> FabricResult<BTreeMap<(u32, u32), ModuleId>> {
        let device = self.device;
        let resolver = BlockPortResolver::new(&device.routing);
        let mut blocks: Vec<&SwitchBlock> = device.routing.switch_blocks.iter().collect();
        blocks.sort_by_key(|sb| (sb.x, sb.y));

        let mut shared: HashMap<ContentHash, ModuleId> = HashMap::new();
        let mut placed = BTreeMap::new();
        for sb in blocks {
            if sb.is_empty() {
                log::debug!("skipping empty switch block ({}, {})", sb.x, sb.y);
                continue;
            }
            let plan = self.plan_switch_block(&resolver, sb)?;
            let module = self.place_plan(naming::switch_block(sb.x, sb.y), plan, &mut shared)?;
            placed.insert((sb.x, sb.y), module);
        }
        Ok(placed)
    }

    /// Builds a module for every non-empty connection block, in
    /// `(kind, x, y)` order.
    pub fn build_connection_blocks(
        &mut self,
    ) -> FabricResult<BTreeMap<(CbKind, u32, u32), ModuleId>> {
        let device = self.device;
        let resolver = BlockPortResolver::new(&device.routing);
        let mut blocks: Vec<&ConnectionBlock> =
            device.routing.connection_blocks.iter().collect();
        blocks.sort_by_key(|cb| (cb.kind, cb.x, cb.y));

        let mut shared: HashMap<ContentHash, ModuleId> = HashMap::new();
        let mut placed = BTreeMap::new();
        for cb in blocks {
            if cb.is_empty() {
                log::debug!(
                    "skipping empty connection block {}",
                    naming::connection_block(cb.kind, cb.x, cb.y)
                );
                continue;
            }
            let plan = self.plan_connection_block(&resolver, cb)?;
            let name = naming::connection_block(cb.kind, cb.x, cb.y);
            let module = self.place_plan(name, plan, &mut shared)?;
            placed.insert((cb.kind, cb.x, cb.y), module);
        }
        Ok(placed)
    }

    fn place_plan(
        &mut self,
        name: String,
        plan: BlockPlan,
        shared: &mut HashMap<ContentHash, ModuleId>,
    ) -> FabricResult<ModuleId> {
        if !self.options.compact_routing {
            return self.build_plan(name, plan);
        }
        let signature = plan.signature();
        if let Some(&module) = shared.get(&signature) {
            log::debug!(
                "{name} shares module '{}'",
                self.graph.try_module(module)?.name
            );
            return Ok(module);
        }
        let module = self.build_plan(name, plan)?;
        shared.insert(signature, module);
        Ok(module)
    }

    /// Chooses how an output is driven from its resolved drivers.
    fn drive_of(
        &self,
        drivers: Vec<DriverPort>,
        names: impl FnOnce() -> (String, String),
    ) -> FabricResult<Option<Drive>> {
        match drivers.len() {
            0 => Ok(None),
            1 => {
                let driver = &drivers[0];
                Ok(Some(Drive::Direct {
                    source: driver.port.clone(),
                    switch: Some(driver.switch),
                }))
            }
            _ => {
                let model = self.device.switch(drivers[0].switch)?.circuit_model;
                let (mux, mem) = names();
                let (sources, switches): (Vec<String>, Vec<SwitchId>) =
                    drivers.into_iter().map(|d| (d.port, d.switch)).unzip();
                Ok(Some(Drive::Mux {
                    model,
                    sources,
                    switches,
                    mux,
                    mem,
                }))
            }
        }
    }

    fn plan_switch_block(
        &self,
        resolver: &BlockPortResolver<'_>,
        sb: &SwitchBlock,
    ) -> FabricResult<BlockPlan> {
        let mut plan = BlockPlan::default();
        for side in &sb.sides {
            for track in &side.tracks {
                let name = match track.direction {
                    TrackDirection::In => resolver.sb_input_port(sb, track.node)?,
                    TrackDirection::Out => resolver.sb_output_port(sb, track.node)?,
                };
                plan.port(name, direction_of(track.direction));
            }
        }
        for side in &sb.sides {
            for &opin in &side.opins {
                plan.port(resolver.sb_input_port(sb, opin)?, PortDirection::Input);
            }
        }

        for side in &sb.sides {
            for (position, track) in side.tracks.iter().enumerate() {
                if track.direction != TrackDirection::Out {
                    continue;
                }
                let sink = resolver.sb_output_port(sb, track.node)?;
                if resolver.is_passing(sb, track.node) {
                    let source = resolver.sb_input_port(sb, track.node)?;
                    plan.drives.push((sink, Drive::Direct { source, switch: None }));
                    continue;
                }
                let drivers = resolver.sb_driver_ports(sb, track.node)?;
                let names = || {
                    (
                        naming::sb_mux_instance(side.side, position),
                        naming::sb_mem_instance(side.side, position),
                    )
                };
                match self.drive_of(drivers, names)? {
                    Some(drive) => plan.drives.push((sink, drive)),
                    None => log::debug!(
                        "track {sink} of switch block ({}, {}) has no driver",
                        sb.x,
                        sb.y
                    ),
                }
            }
        }
        Ok(plan)
    }

    fn plan_connection_block(
        &self,
        resolver: &BlockPortResolver<'_>,
        cb: &ConnectionBlock,
    ) -> FabricResult<BlockPlan> {
        let chan = cb.kind.chan_prefix();
        let mut plan = BlockPlan::default();
        for index in 0..cb.tracks.len() {
            let input = naming::cb_track_port(chan, TrackDirection::In, index);
            let output = naming::cb_track_port(chan, TrackDirection::Out, index);
            plan.port(input.clone(), PortDirection::Input);
            plan.port(output.clone(), PortDirection::Output);
            plan.drives.push((output, Drive::Direct { source: input, switch: None }));
        }
        for ipin in &cb.ipins {
            if resolver.is_direct_ipin(ipin.node)? {
                log::debug!(
                    "input pin {} of {} is driven directly by a grid output",
                    ipin.node.as_raw(),
                    naming::connection_block(cb.kind, cb.x, cb.y)
                );
                continue;
            }
            let sink = resolver.cb_ipin_port(cb, ipin.node)?;
            let ptc = self.device.routing.node(ipin.node)?.ptc;
            let drivers = resolver.cb_driver_ports(cb, ipin.node)?;
            let names = || {
                (
                    naming::cb_mux_instance(ipin.side, ptc),
                    naming::cb_mem_instance(ipin.side, ptc),
                )
            };
            match self.drive_of(drivers, names)? {
                Some(drive) => {
                    plan.port(sink.clone(), PortDirection::Output);
                    plan.drives.push((sink, drive));
                }
                None => log::debug!(
                    "input pin {sink} of {} has no driver",
                    naming::connection_block(cb.kind, cb.x, cb.y)
                ),
            }
        }
        Ok(plan)
    }

    fn build_plan(&mut self, name: String, plan: BlockPlan) -> FabricResult<ModuleId> {
        if let Some(id) = self.graph.find_module(&name) {
            return Ok(id);
        }
        let module = self.graph.add_module(name, ModuleKind::Container)?;
        for (port, direction) in plan.ports {
            self.graph.add_port(module, port, direction, 1)?;
        }
        for (sink, drive) in plan.drives {
            let sink = PinRef::local(self.port_of(module, &sink)?, 0);
            match drive {
                Drive::Direct { source, .. } => {
                    let source = PinRef::local(self.port_of(module, &source)?, 0);
                    self.graph.connect(module, source, sink)?;
                }
                Drive::Mux {
                    model,
                    sources,
                    mux,
                    mem,
                    ..
                } => {
                    let sources = sources
                        .iter()
                        .map(|s| Ok(PinRef::local(self.port_of(module, s)?, 0)))
                        .collect::<FabricResult<Vec<_>>>()?;
                    self.mux_into(module, model, &sources, sink, Some((mux, mem)))?;
                }
            }
        }
        self.rollup_ports(module)?;
        Ok(module)
    }
}

fn direction_of(direction: TrackDirection) -> PortDirection {
    match direction {
        TrackDirection::In => PortDirection::Input,
        TrackDirection::Out => PortDirection::Output,
    }
}
