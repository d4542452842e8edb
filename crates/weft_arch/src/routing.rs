//! Routing-resource graph, partitioned into switch and connection blocks.

use crate::ids::{RrNodeId, SwitchId};
use serde::{Deserialize, Serialize};
use weft_common::{FabricError, FabricResult, Side};

/// Kind of a routing-resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RrNodeKind {
    /// Horizontal track segment.
    Chanx,
    /// Vertical track segment.
    Chany,
    /// Logic-block input pin.
    Ipin,
    /// Logic-block output pin.
    Opin,
}

impl RrNodeKind {
    /// Channel prefix used in port names, `None` for pins.
    pub fn chan_prefix(self) -> Option<&'static str> {
        match self {
            RrNodeKind::Chanx => Some("chanx"),
            RrNodeKind::Chany => Some("chany"),
            RrNodeKind::Ipin | RrNodeKind::Opin => None,
        }
    }
}

/// A driving edge into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrEdge {
    /// The driving node.
    pub node: RrNodeId,
    /// The switch the edge goes through.
    pub switch: SwitchId,
}

/// A routing-resource node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RrNode {
    /// Node kind.
    pub kind: RrNodeKind,
    /// Track or pin number.
    pub ptc: u32,
    /// Side of the grid tile a pin sits on. Unused for tracks.
    #[serde(default)]
    pub side: Option<Side>,
    /// Driving edges in routing-graph order.
    #[serde(default)]
    pub drivers: Vec<RrEdge>,
}

/// Direction of a track relative to a switch block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackDirection {
    /// The track enters the switch block.
    In,
    /// The track leaves the switch block and is driven by it.
    Out,
}

impl TrackDirection {
    /// Name used in port names.
    pub fn as_str(self) -> &'static str {
        match self {
            TrackDirection::In => "in",
            TrackDirection::Out => "out",
        }
    }
}

/// A track on one side of a switch block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbTrack {
    /// The track node.
    pub node: RrNodeId,
    /// Its direction.
    pub direction: TrackDirection,
}

/// One side of a switch block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbSide {
    /// Which side.
    pub side: Side,
    /// Tracks in channel order.
    #[serde(default)]
    pub tracks: Vec<SbTrack>,
    /// Grid output pins on this side that may drive tracks.
    #[serde(default)]
    pub opins: Vec<RrNodeId>,
}

/// A switch block at a channel crossing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchBlock {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Populated sides.
    pub sides: Vec<SbSide>,
}

impl SwitchBlock {
    /// Returns `true` if no side carries a track.
    pub fn is_empty(&self) -> bool {
        self.sides.iter().all(|s| s.tracks.is_empty())
    }
}

/// Orientation of a connection block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CbKind {
    /// Connects a horizontal channel to grid pins.
    X,
    /// Connects a vertical channel to grid pins.
    Y,
}

impl CbKind {
    /// Module-name prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            CbKind::X => "cbx",
            CbKind::Y => "cby",
        }
    }

    /// Channel prefix of the tracks passing through.
    pub fn chan_prefix(self) -> &'static str {
        match self {
            CbKind::X => "chanx",
            CbKind::Y => "chany",
        }
    }
}

/// A grid input pin served by a connection block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CbIpin {
    /// Side of the connection block the pin is on.
    pub side: Side,
    /// The input-pin node.
    pub node: RrNodeId,
}

/// A connection block beside a channel segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionBlock {
    /// Orientation.
    pub kind: CbKind,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Tracks passing through, in channel order.
    #[serde(default)]
    pub tracks: Vec<RrNodeId>,
    /// Grid input pins it drives.
    #[serde(default)]
    pub ipins: Vec<CbIpin>,
}

impl ConnectionBlock {
    /// Returns `true` if the block has no tracks or drives no pins.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() || self.ipins.is_empty()
    }
}

/// The routing-resource graph of a device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingGraph {
    /// All nodes, indexed by [`RrNodeId`].
    pub nodes: Vec<RrNode>,
    /// Switch blocks.
    #[serde(default)]
    pub switch_blocks: Vec<SwitchBlock>,
    /// Connection blocks. Heterogeneous tiles leave some coordinates without one.
    #[serde(default)]
    pub connection_blocks: Vec<ConnectionBlock>,
}

impl RoutingGraph {
    /// Returns the node with the given ID.
    pub fn node(&self, id: RrNodeId) -> FabricResult<&RrNode> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| FabricError::lookup(format!("no routing node with id {}", id.as_raw())))
    }

    /// Returns the switch block at `(x, y)`, if any.
    pub fn switch_block_at(&self, x: u32, y: u32) -> Option<&SwitchBlock> {
        self.switch_blocks.iter().find(|sb| sb.x == x && sb.y == y)
    }

    /// Returns the connection block of the given orientation at `(x, y)`, if any.
    pub fn connection_block_at(&self, kind: CbKind, x: u32, y: u32) -> Option<&ConnectionBlock> {
        self.connection_blocks
            .iter()
            .find(|cb| cb.kind == kind && cb.x == x && cb.y == y)
    }
}
