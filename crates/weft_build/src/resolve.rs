//! Mapping from routing nodes to the ports of routing-block modules.
//!
//! The resolver re-derives port names from the naming scheme instead of
//! consulting a table. Driver order is the node's driver-list order, which
//! is also the order the builder wires multiplexer inputs in.

use crate::naming;
use weft_arch::{
    ConnectionBlock, RoutingGraph, RrNodeId, RrNodeKind, SwitchBlock, SwitchId, TrackDirection,
};
use weft_common::{FabricError, FabricResult, Side};

/// One driver of a routing node, as seen from a routing-block module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverPort {
    /// Port of the block module the driver enters through.
    pub port: String,
    /// The driving node.
    pub node: RrNodeId,
    /// Switch of the driving edge.
    pub switch: SwitchId,
}

/// Resolves routing nodes to switch- and connection-block ports.
#[derive(Debug, Clone, Copy)]
pub struct BlockPortResolver<'a> {
    routing: &'a RoutingGraph,
}

impl<'a> BlockPortResolver<'a> {
    /// Creates a resolver over a routing graph.
    pub fn new(routing: &'a RoutingGraph) -> Self {
        Self { routing }
    }

    fn chan(&self, node: RrNodeId) -> FabricResult<&'static str> {
        self.routing.node(node)?.kind.chan_prefix().ok_or_else(|| {
            FabricError::structural(format!(
                "routing node {} is listed as a track but is not a channel",
                node.as_raw()
            ))
        })
    }

    fn find_track(
        sb: &SwitchBlock,
        node: RrNodeId,
        direction: TrackDirection,
    ) -> Option<(Side, usize)> {
        sb.sides.iter().find_map(|side| {
            side.tracks
                .iter()
                .position(|t| t.node == node && t.direction == direction)
                .map(|position| (side.side, position))
        })
    }

    /// Port of the output track `node` of a switch block.
    pub fn sb_output_port(&self, sb: &SwitchBlock, node: RrNodeId) -> FabricResult<String> {
        let (side, position) = Self::find_track(sb, node, TrackDirection::Out).ok_or_else(|| {
            FabricError::lookup(format!(
                "node {} is not an output track of switch block ({}, {})",
                node.as_raw(),
                sb.x,
                sb.y
            ))
        })?;
        Ok(naming::sb_track_port(
            self.chan(node)?,
            side,
            TrackDirection::Out,
            position,
        ))
    }

    /// Port through which `node` enters a switch block: an input track or
    /// a grid output pin.
    pub fn sb_input_port(&self, sb: &SwitchBlock, node: RrNodeId) -> FabricResult<String> {
        if let Some((side, position)) = Self::find_track(sb, node, TrackDirection::In) {
            return Ok(naming::sb_track_port(
                self.chan(node)?,
                side,
                TrackDirection::In,
                position,
            ));
        }
        let side = sb
            .sides
            .iter()
            .find(|s| s.opins.contains(&node))
            .map(|s| s.side)
            .ok_or_else(|| {
                FabricError::lookup(format!(
                    "node {} does not enter switch block ({}, {})",
                    node.as_raw(),
                    sb.x,
                    sb.y
                ))
            })?;
        Ok(naming::grid_pin_port(side, self.routing.node(node)?.ptc))
    }

    /// Returns `true` if the output track `node` also enters the block as an
    /// input track, i.e. passes straight through it.
    pub fn is_passing(&self, sb: &SwitchBlock, node: RrNodeId) -> bool {
        Self::find_track(sb, node, TrackDirection::In).is_some()
    }

    /// Drivers of the output track `node`, in multiplexer-input order.
    pub fn sb_driver_ports(
        &self,
        sb: &SwitchBlock,
        node: RrNodeId,
    ) -> FabricResult<Vec<DriverPort>> {
        self.routing
            .node(node)?
            .drivers
            .iter()
            .map(|edge| {
                Ok(DriverPort {
                    port: self.sb_input_port(sb, edge.node)?,
                    node: edge.node,
                    switch: edge.switch,
                })
            })
            .collect()
    }

    /// Port of the grid input pin `node` on a connection block.
    pub fn cb_ipin_port(&self, cb: &ConnectionBlock, node: RrNodeId) -> FabricResult<String> {
        let ipin = cb.ipins.iter().find(|p| p.node == node).ok_or_else(|| {
            FabricError::lookup(format!(
                "node {} is not an input pin of {}",
                node.as_raw(),
                naming::connection_block(cb.kind, cb.x, cb.y)
            ))
        })?;
        Ok(naming::grid_pin_port(ipin.side, self.routing.node(node)?.ptc))
    }

    /// Returns `true` if the input pin `node` is driven by a single grid
    /// output pin, leaving nothing for the connection block to build.
    pub fn is_direct_ipin(&self, node: RrNodeId) -> FabricResult<bool> {
        let drivers = &self.routing.node(node)?.drivers;
        Ok(match drivers.as_slice() {
            [only] => self.routing.node(only.node)?.kind == RrNodeKind::Opin,
            _ => false,
        })
    }

    /// Drivers of the input pin `node`, in multiplexer-input order.
    pub fn cb_driver_ports(
        &self,
        cb: &ConnectionBlock,
        node: RrNodeId,
    ) -> FabricResult<Vec<DriverPort>> {
        let chan = cb.kind.chan_prefix();
        self.routing
            .node(node)?
            .drivers
            .iter()
            .map(|edge| {
                let index = cb.tracks.iter().position(|&t| t == edge.node).ok_or_else(|| {
                    FabricError::lookup(format!(
                        "driver {} of node {} is not a track of {}",
                        edge.node.as_raw(),
                        node.as_raw(),
                        naming::connection_block(cb.kind, cb.x, cb.y)
                    ))
                })?;
                Ok(DriverPort {
                    port: naming::cb_track_port(chan, TrackDirection::In, index),
                    node: edge.node,
                    switch: edge.switch,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_arch::CbKind;
    use weft_test_helpers::{fixture_device, nodes, SW_CB, SW_FAST, SW_SLOW};

    #[test]
    fn switch_block_ports() {
        let device = fixture_device();
        let r = BlockPortResolver::new(&device.routing);
        let sb = device.routing.switch_block_at(1, 1).unwrap();
        assert_eq!(
            r.sb_output_port(sb, nodes::SB11_A).unwrap(),
            "chanx_right_out_0"
        );
        assert_eq!(r.sb_input_port(sb, nodes::SB11_X).unwrap(), "chanx_left_in_0");
        assert_eq!(
            r.sb_input_port(sb, nodes::SB11_OPIN).unwrap(),
            "bottom_grid_pin_4"
        );
        assert!(r.is_passing(sb, nodes::SB11_PASS));
        assert!(!r.is_passing(sb, nodes::SB11_A));
        assert!(matches!(
            r.sb_output_port(sb, nodes::SB11_X),
            Err(FabricError::Lookup(_))
        ));
    }

    #[test]
    fn driver_order_is_edge_order() {
        let device = fixture_device();
        let r = BlockPortResolver::new(&device.routing);
        let sb = device.routing.switch_block_at(1, 1).unwrap();
        let drivers = r.sb_driver_ports(sb, nodes::SB11_A).unwrap();
        assert_eq!(
            drivers,
            vec![
                DriverPort {
                    port: "chanx_left_in_0".to_string(),
                    node: nodes::SB11_X,
                    switch: SW_FAST,
                },
                DriverPort {
                    port: "chany_bottom_in_0".to_string(),
                    node: nodes::SB11_Y,
                    switch: SW_SLOW,
                },
            ]
        );
        let top = r.sb_driver_ports(sb, nodes::SB11_TOP3).unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[2].port, "bottom_grid_pin_4");
    }

    #[test]
    fn connection_block_ports() {
        let device = fixture_device();
        let r = BlockPortResolver::new(&device.routing);
        let cbx = device.routing.connection_block_at(CbKind::X, 1, 1).unwrap();
        assert_eq!(
            r.cb_ipin_port(cbx, nodes::CBX11_MUX).unwrap(),
            "bottom_grid_pin_0"
        );
        let drivers = r.cb_driver_ports(cbx, nodes::CBX11_MUX).unwrap();
        let ports: Vec<_> = drivers.iter().map(|d| d.port.as_str()).collect();
        assert_eq!(ports, vec!["chanx_in_0", "chanx_in_1"]);
        assert!(drivers.iter().all(|d| d.switch == SW_CB));

        assert!(r.is_direct_ipin(nodes::CBX11_OPIN_ONLY).unwrap());
        assert!(!r.is_direct_ipin(nodes::CBX11_SINGLE).unwrap());
        assert!(matches!(
            r.cb_driver_ports(cbx, nodes::CBX11_OPIN_ONLY),
            Err(FabricError::Lookup(_))
        ));
    }
}
