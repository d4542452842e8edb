//! The immutable device context and its JSON loader.

use crate::circuit::{CircuitLibrary, CircuitModelKind};
use crate::cluster::ClusterLibrary;
use crate::grid::DeviceGrid;
use crate::ids::{CircuitModelId, RrNodeId, SwitchId, TileTypeId};
use crate::mux_lib::MuxLibrary;
use crate::routing::RoutingGraph;
use crate::switch::SwitchInf;
use crate::tile::TileType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use weft_common::{FabricError, FabricResult};

/// Everything fabric generation reads about a device.
///
/// Built once, then shared by reference through every stage. No stage
/// mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceContext {
    /// Device name.
    pub name: String,
    /// Circuit models.
    pub circuits: CircuitLibrary,
    /// Multiplexer implementations.
    pub mux_library: MuxLibrary,
    /// Routing switch table, indexed by [`SwitchId`].
    pub switches: Vec<SwitchInf>,
    /// Logic-cluster hierarchy.
    pub clusters: ClusterLibrary,
    /// Tile types, indexed by [`TileTypeId`].
    pub tiles: Vec<TileType>,
    /// Device grid.
    pub grid: DeviceGrid,
    /// Routing-resource graph.
    pub routing: RoutingGraph,
}

impl DeviceContext {
    /// Returns the switch with the given ID.
    pub fn switch(&self, id: SwitchId) -> FabricResult<&SwitchInf> {
        self.switches
            .get(id.index())
            .ok_or_else(|| FabricError::lookup(format!("no routing switch with id {}", id.as_raw())))
    }

    /// Returns the tile type with the given ID.
    pub fn tile(&self, id: TileTypeId) -> FabricResult<&TileType> {
        self.tiles
            .get(id.index())
            .ok_or_else(|| FabricError::lookup(format!("no tile type with id {}", id.as_raw())))
    }

    /// Checks that every cross-reference in the description resolves.
    pub fn validate(&self) -> FabricResult<()> {
        for entry in self.mux_library.entries() {
            let model = self.circuit_ref(entry.model, "mux-library entry")?;
            if self.circuits.models[model].kind != CircuitModelKind::Mux {
                return Err(FabricError::structural(format!(
                    "mux-library entry references non-mux model '{}'",
                    self.circuits.models[model].name
                )));
            }
        }
        if let Some(wire) = self.circuits.default_wire {
            self.circuit_ref(wire, "default wire")?;
        }
        for sw in &self.switches {
            self.circuit_ref(sw.circuit_model, &format!("switch '{}'", sw.name))?;
        }
        for (_, block) in self.clusters.iter() {
            if let Some(model) = block.circuit_model {
                self.circuit_ref(model, &format!("block '{}'", block.name))?;
            }
            for mode in &block.modes {
                for slot in &mode.children {
                    if slot.block.index() >= self.clusters.blocks.len() {
                        return Err(FabricError::structural(format!(
                            "mode '{}' of block '{}' references missing block {}",
                            mode.name,
                            block.name,
                            slot.block.as_raw()
                        )));
                    }
                }
                for interc in &mode.interconnects {
                    if let Some(model) = interc.circuit_model {
                        self.circuit_ref(model, &format!("interconnect '{}'", interc.name))?;
                    }
                }
            }
        }
        self.clusters.check_acyclic()?;
        for tile in &self.tiles {
            if tile.block.index() >= self.clusters.blocks.len() {
                return Err(FabricError::structural(format!(
                    "tile '{}' references missing block {}",
                    tile.name,
                    tile.block.as_raw()
                )));
            }
        }
        for p in &self.grid.placements {
            if p.x >= self.grid.width || p.y >= self.grid.height {
                return Err(FabricError::structural(format!(
                    "placement ({}, {}) lies outside the {}x{} grid",
                    p.x, p.y, self.grid.width, self.grid.height
                )));
            }
            self.tile(p.tile)
                .map_err(|e| FabricError::structural(e.to_string()))?;
        }
        for node in &self.routing.nodes {
            for edge in &node.drivers {
                self.node_ref(edge.node)?;
                self.switch(edge.switch)
                    .map_err(|e| FabricError::structural(e.to_string()))?;
            }
        }
        for sb in &self.routing.switch_blocks {
            for side in &sb.sides {
                for track in &side.tracks {
                    self.node_ref(track.node)?;
                }
                for &opin in &side.opins {
                    self.node_ref(opin)?;
                }
            }
        }
        for cb in &self.routing.connection_blocks {
            for &track in &cb.tracks {
                self.node_ref(track)?;
            }
            for ipin in &cb.ipins {
                self.node_ref(ipin.node)?;
            }
        }
        Ok(())
    }

    fn circuit_ref(&self, id: CircuitModelId, what: &str) -> FabricResult<usize> {
        if id.index() < self.circuits.models.len() {
            Ok(id.index())
        } else {
            Err(FabricError::structural(format!(
                "{what} references missing circuit model {}",
                id.as_raw()
            )))
        }
    }

    fn node_ref(&self, id: RrNodeId) -> FabricResult<()> {
        if id.index() < self.routing.nodes.len() {
            Ok(())
        } else {
            Err(FabricError::structural(format!(
                "reference to missing routing node {}",
                id.as_raw()
            )))
        }
    }
}

/// Loads and validates a JSON device description from a file.
pub fn load_device(path: &Path) -> FabricResult<DeviceContext> {
    let content = std::fs::read_to_string(path).map_err(|e| FabricError::io(path, e))?;
    log::debug!("loaded device description from {}", path.display());
    load_device_from_str(&content)
}

/// Parses and validates a JSON device description from a string.
pub fn load_device_from_str(content: &str) -> FabricResult<DeviceContext> {
    let device: DeviceContext = serde_json::from_str(content)
        .map_err(|e| FabricError::structural(format!("malformed device description: {e}")))?;
    device.validate()?;
    log::debug!(
        "device '{}': {} circuit models, {} block types, {} routing nodes",
        device.name,
        device.circuits.models.len(),
        device.clusters.blocks.len(),
        device.routing.nodes.len()
    );
    Ok(device)
}
