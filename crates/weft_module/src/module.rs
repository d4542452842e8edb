//! Modules: the nodes of the module graph.

use crate::arena::Arena;
use crate::ids::{ModuleId, NetId, PortId};
use crate::net::{InstanceRef, Net};
use crate::port::Port;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weft_arch::CircuitModelId;

/// What a module implements.
///
/// The kind tells the bit accountant how to count a configurable child:
/// memories are leaves with a known width, everything else is summed over
/// its own configurable children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    /// A hierarchical block: cluster, tile, switch block, connection block.
    Container,
    /// A logic leaf implementing a circuit model (LUT, flip-flop, pad).
    Logic {
        /// The implemented model.
        model: CircuitModelId,
    },
    /// A pass-through wire.
    Wire {
        /// The wire model.
        model: CircuitModelId,
    },
    /// A routing or cluster multiplexer.
    Mux {
        /// The multiplexer model.
        model: CircuitModelId,
        /// Number of data inputs.
        fan_in: u32,
    },
    /// The configuration memory of one multiplexer.
    MuxMemory {
        /// The multiplexer model.
        model: CircuitModelId,
        /// Number of data inputs of the multiplexer.
        fan_in: u32,
    },
    /// The configuration memory of one logic primitive.
    PrimitiveMemory {
        /// The primitive's model.
        model: CircuitModelId,
    },
}

/// A child instance inside a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// The instantiated module.
    pub module: ModuleId,
    /// Dense index among the parent's instances of `module`, fixed at creation.
    pub index: u32,
    /// Optional binding name of this physical occurrence.
    pub name: Option<String>,
}

impl Instance {
    /// The reference form of this instance.
    pub fn instance_ref(&self) -> InstanceRef {
        InstanceRef::new(self.module, self.index)
    }
}

/// A module of the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Graph-wide ID.
    pub id: ModuleId,
    /// Graph-wide unique name.
    pub name: String,
    /// What the module implements.
    pub kind: ModuleKind,
    pub(crate) ports: Arena<PortId, Port>,
    pub(crate) port_index: HashMap<String, PortId>,
    pub(crate) children: Vec<Instance>,
    pub(crate) configurable_children: Vec<InstanceRef>,
    pub(crate) nets: Arena<NetId, Net>,
}

impl Module {
    pub(crate) fn new(id: ModuleId, name: String, kind: ModuleKind) -> Self {
        Self {
            id,
            name,
            kind,
            ports: Arena::new(),
            port_index: HashMap::new(),
            children: Vec::new(),
            configurable_children: Vec::new(),
            nets: Arena::new(),
        }
    }

    /// Ports in creation order.
    pub fn ports(&self) -> impl Iterator<Item = (PortId, &Port)> {
        self.ports.iter()
    }

    /// Returns the port with the given ID, if it belongs to this module.
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id)
    }

    /// Finds a port by name.
    pub fn find_port(&self, name: &str) -> Option<PortId> {
        self.port_index.get(name).copied()
    }

    /// Child instances in creation order.
    pub fn children(&self) -> &[Instance] {
        &self.children
    }

    /// Number of instances of `child` in this module.
    pub fn instance_count(&self, child: ModuleId) -> u32 {
        self.children.iter().filter(|i| i.module == child).count() as u32
    }

    /// Returns one child instance.
    pub fn instance(&self, instance: InstanceRef) -> Option<&Instance> {
        self.children
            .iter()
            .find(|i| i.module == instance.module && i.index == instance.index)
    }

    /// Configurable children in configuration-bit order.
    pub fn configurable_children(&self) -> &[InstanceRef] {
        &self.configurable_children
    }

    /// Nets in creation order.
    pub fn nets(&self) -> impl Iterator<Item = (NetId, &Net)> {
        self.nets.iter()
    }

    /// Returns the net with the given ID, if it belongs to this module.
    pub fn net(&self, id: NetId) -> Option<&Net> {
        self.nets.get(id)
    }

    /// Returns `true` if this module is a configuration memory.
    pub fn is_memory(&self) -> bool {
        matches!(
            self.kind,
            ModuleKind::MuxMemory { .. } | ModuleKind::PrimitiveMemory { .. }
        )
    }
}
