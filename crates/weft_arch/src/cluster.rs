//! Logic-cluster hierarchy: block types, their modes, and mode interconnect.
//!
//! A block type is either a primitive (no modes, implemented by one circuit
//! model) or a composite whose modes each list child slots and the
//! interconnect wiring them. Exactly one mode of a composite is physical;
//! only its children and interconnect are materialized in the fabric.

use crate::ids::{BlockTypeId, CircuitModelId};
use serde::{Deserialize, Serialize};
use weft_common::{FabricError, FabricResult};

/// Class of a block pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortClass {
    /// Data input.
    Input,
    /// Data output.
    Output,
    /// Clock input.
    Clock,
}

impl PortClass {
    /// Classes in pin-enumeration order.
    pub const ORDER: [PortClass; 3] = [PortClass::Input, PortClass::Output, PortClass::Clock];
}

/// A port of a block type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockPort {
    /// Port name.
    pub name: String,
    /// Port class.
    pub class: PortClass,
    /// Number of pins.
    pub width: u32,
}

/// Who owns a pin referenced by an interconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinOwner {
    /// The block whose mode declares the interconnect.
    Parent,
    /// One instance of one child slot of that mode.
    Child {
        /// Index into [`Mode::children`].
        slot: usize,
        /// Instance within the slot, `0..count`.
        instance: u32,
    },
}

/// A single pin referenced by an interconnect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinSpec {
    /// Owner of the pin.
    pub owner: PinOwner,
    /// Port name on the owner's block type.
    pub port: String,
    /// Pin index within the port.
    #[serde(default)]
    pub pin: u32,
}

impl PinSpec {
    /// A pin on the parent block.
    pub fn parent(port: impl Into<String>, pin: u32) -> Self {
        Self {
            owner: PinOwner::Parent,
            port: port.into(),
            pin,
        }
    }

    /// A pin on a child instance.
    pub fn child(slot: usize, instance: u32, port: impl Into<String>, pin: u32) -> Self {
        Self {
            owner: PinOwner::Child { slot, instance },
            port: port.into(),
            pin,
        }
    }
}

/// How an interconnect maps its inputs onto its outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterconnectKind {
    /// Input `i` drives output `i`.
    Direct,
    /// Every input drives every output through a multiplexer.
    Mux,
    /// Every input can reach every output (crossbar).
    Complete,
}

/// An interconnect declared by a mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interconnect {
    /// Interconnect name.
    pub name: String,
    /// Mapping kind.
    pub kind: InterconnectKind,
    /// Wire or multiplexer circuit model implementing it.
    #[serde(default)]
    pub circuit_model: Option<CircuitModelId>,
    /// Source pins.
    pub inputs: Vec<PinSpec>,
    /// Destination pins.
    pub outputs: Vec<PinSpec>,
}

impl Interconnect {
    /// Returns the source pins of this interconnect that drive `dest`, in
    /// declaration order.
    pub fn sources_for(&self, dest: &PinSpec) -> FabricResult<Vec<PinSpec>> {
        let Some(position) = self.outputs.iter().position(|o| o == dest) else {
            return Ok(Vec::new());
        };
        match self.kind {
            InterconnectKind::Direct => {
                if self.inputs.len() != self.outputs.len() {
                    return Err(FabricError::structural(format!(
                        "direct interconnect '{}' has {} inputs but {} outputs",
                        self.name,
                        self.inputs.len(),
                        self.outputs.len()
                    )));
                }
                Ok(vec![self.inputs[position].clone()])
            }
            InterconnectKind::Mux | InterconnectKind::Complete => Ok(self.inputs.clone()),
        }
    }
}

/// One child slot of a mode: `count` instances of one block type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChildSlot {
    /// The child block type.
    pub block: BlockTypeId,
    /// Multiplicity.
    pub count: u32,
}

/// An operating mode of a composite block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mode {
    /// Mode name.
    pub name: String,
    /// Child slots.
    #[serde(default)]
    pub children: Vec<ChildSlot>,
    /// Interconnect between the parent's pins and the children's pins.
    #[serde(default)]
    pub interconnects: Vec<Interconnect>,
}

/// A block type of the cluster hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockType {
    /// Block name.
    pub name: String,
    /// Ports in declaration order.
    pub ports: Vec<BlockPort>,
    /// Implementing circuit model of a primitive.
    #[serde(default)]
    pub circuit_model: Option<CircuitModelId>,
    /// Modes of a composite. Empty for primitives.
    #[serde(default)]
    pub modes: Vec<Mode>,
    /// Index of the physical mode. May be omitted when there is only one mode.
    #[serde(default)]
    pub physical_mode: Option<usize>,
}

impl BlockType {
    /// Returns `true` if this block has no modes.
    pub fn is_primitive(&self) -> bool {
        self.modes.is_empty()
    }

    /// Returns the port with the given name.
    pub fn port(&self, name: &str) -> Option<&BlockPort> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Total number of pins over all ports.
    pub fn num_pins(&self) -> u32 {
        self.ports.iter().map(|p| p.width).sum()
    }

    /// Returns the port and pin behind a flat pin number.
    ///
    /// Pins are numbered over input ports first, then output ports, then
    /// clock ports, each group in declaration order.
    pub fn pin(&self, index: u32) -> Option<(&BlockPort, u32)> {
        let mut base = 0;
        for class in PortClass::ORDER {
            for port in self.ports.iter().filter(|p| p.class == class) {
                if index < base + port.width {
                    return Some((port, index - base));
                }
                base += port.width;
            }
        }
        None
    }
}

/// One filtered edge into a destination pin.
#[derive(Debug, Clone)]
pub struct InterconnectEdge {
    /// Driving pin.
    pub source: PinSpec,
    /// Index of the interconnect within its mode.
    pub interconnect: usize,
    /// Mapping kind of that interconnect.
    pub kind: InterconnectKind,
    /// Circuit model of that interconnect.
    pub circuit_model: Option<CircuitModelId>,
}

/// Read-only access to the logic-cluster hierarchy.
///
/// Builders only ever see the hierarchy through this trait. It hands out
/// borrowed views and never transfers ownership.
pub trait ClusterHierarchy {
    /// Returns the block type with the given ID.
    fn block(&self, id: BlockTypeId) -> FabricResult<&BlockType>;

    /// Ports of a block type.
    fn pins_of(&self, id: BlockTypeId) -> FabricResult<&[BlockPort]> {
        Ok(&self.block(id)?.ports)
    }

    /// Modes of a block type.
    fn modes_of(&self, id: BlockTypeId) -> FabricResult<&[Mode]> {
        Ok(&self.block(id)?.modes)
    }

    /// Child slots of one mode of a block type.
    fn children_of(&self, id: BlockTypeId, mode: usize) -> FabricResult<&[ChildSlot]> {
        let block = self.block(id)?;
        block
            .modes
            .get(mode)
            .map(|m| m.children.as_slice())
            .ok_or_else(|| {
                FabricError::structural(format!("block '{}' has no mode {mode}", block.name))
            })
    }

    /// Index of the physical mode of a composite block.
    ///
    /// A block with a single mode defaults to it; a block with several modes
    /// must name one.
    fn physical_mode(&self, id: BlockTypeId) -> FabricResult<usize> {
        let block = self.block(id)?;
        match (block.physical_mode, block.modes.len()) {
            (_, 0) => Err(FabricError::structural(format!(
                "primitive block '{}' has no modes",
                block.name
            ))),
            (Some(m), n) if m < n => Ok(m),
            (Some(m), _) => Err(FabricError::structural(format!(
                "block '{}' names physical mode {m} but has {} modes",
                block.name,
                block.modes.len()
            ))),
            (None, 1) => Ok(0),
            (None, _) => Err(FabricError::structural(format!(
                "block '{}' has several modes but no physical mode",
                block.name
            ))),
        }
    }

    /// Edges of one mode that drive `dest`, in interconnect declaration
    /// order and then input order. Edges of other modes are never seen.
    fn input_edges(
        &self,
        id: BlockTypeId,
        mode: usize,
        dest: &PinSpec,
    ) -> FabricResult<Vec<InterconnectEdge>> {
        let block = self.block(id)?;
        let mode_def = block.modes.get(mode).ok_or_else(|| {
            FabricError::structural(format!("block '{}' has no mode {mode}", block.name))
        })?;
        let mut edges = Vec::new();
        for (i, interc) in mode_def.interconnects.iter().enumerate() {
            for source in interc.sources_for(dest)? {
                edges.push(InterconnectEdge {
                    source,
                    interconnect: i,
                    kind: interc.kind,
                    circuit_model: interc.circuit_model,
                });
            }
        }
        Ok(edges)
    }
}

/// Table-backed cluster hierarchy, as loaded from a device description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterLibrary {
    /// All block types, indexed by [`BlockTypeId`].
    pub blocks: Vec<BlockType>,
}

impl ClusterLibrary {
    /// Iterates over `(ID, &BlockType)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (BlockTypeId, &BlockType)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (BlockTypeId::from_raw(i as u32), b))
    }

    /// Fails if a block type contains itself through any of its modes.
    ///
    /// Every child slot must reference an existing block type.
    pub fn check_acyclic(&self) -> FabricResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unseen,
            Open,
            Done,
        }
        let mut marks = vec![Mark::Unseen; self.blocks.len()];
        for root in 0..self.blocks.len() {
            if marks[root] != Mark::Unseen {
                continue;
            }
            // (block, next child to visit) in mode order
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::Open;
            while let Some((block, next)) = stack.pop() {
                let children: Vec<usize> = self.blocks[block]
                    .modes
                    .iter()
                    .flat_map(|m| m.children.iter().map(|slot| slot.block.index()))
                    .collect();
                let Some(&child) = children.get(next) else {
                    marks[block] = Mark::Done;
                    continue;
                };
                stack.push((block, next + 1));
                match marks.get(child).copied() {
                    None => {
                        return Err(FabricError::structural(format!(
                            "block '{}' references missing block {child}",
                            self.blocks[block].name
                        )))
                    }
                    Some(Mark::Open) => {
                        return Err(FabricError::structural(format!(
                            "block '{}' instantiates itself through block '{}'",
                            self.blocks[child].name, self.blocks[block].name
                        )))
                    }
                    Some(Mark::Done) => {}
                    Some(Mark::Unseen) => {
                        marks[child] = Mark::Open;
                        stack.push((child, 0));
                    }
                }
            }
        }
        Ok(())
    }
}

impl ClusterHierarchy for ClusterLibrary {
    fn block(&self, id: BlockTypeId) -> FabricResult<&BlockType> {
        self.blocks.get(id.index()).ok_or_else(|| {
            FabricError::structural(format!("no block type with id {}", id.as_raw()))
        })
    }
}
