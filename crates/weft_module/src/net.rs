//! Nets and pin references.
//!
//! A net lives inside one module. Its pins are either ports of that module
//! (`instance == None`) or ports of one of its child instances. Two children
//! are connected only through a net of their common parent.

use crate::ids::{ModuleId, PortId};
use serde::{Deserialize, Serialize};

/// One child instance: the child module and its dense index among the
/// parent's instances of that module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceRef {
    /// The instantiated module.
    pub module: ModuleId,
    /// Dense index among the parent's instances of `module`.
    pub index: u32,
}

impl InstanceRef {
    /// Creates a reference to instance `index` of `module`.
    pub fn new(module: ModuleId, index: u32) -> Self {
        Self { module, index }
    }
}

/// A single pin of a port, either on the net's own module or on a child instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    /// `None` for the owning module's own port.
    pub instance: Option<InstanceRef>,
    /// Port on the referenced module.
    pub port: PortId,
    /// Pin within the port.
    pub pin: u32,
}

impl PinRef {
    /// A pin of the owning module's own port.
    pub fn local(port: PortId, pin: u32) -> Self {
        Self {
            instance: None,
            port,
            pin,
        }
    }

    /// A pin of a child instance's port.
    pub fn child(instance: InstanceRef, port: PortId, pin: u32) -> Self {
        Self {
            instance: Some(instance),
            port,
            pin,
        }
    }
}

/// A net: one source pin driving one or more sink pins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Net {
    /// The driving pin. Set exactly once.
    pub source: Option<PinRef>,
    /// Driven pins in attachment order.
    pub sinks: Vec<PinRef>,
}

/// A whole port, either on the net's own module or on a child instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// `None` for the owning module's own port.
    pub instance: Option<InstanceRef>,
    /// Port on the referenced module.
    pub port: PortId,
}

impl PortRef {
    /// The owning module's own port.
    pub fn local(port: PortId) -> Self {
        Self {
            instance: None,
            port,
        }
    }

    /// A child instance's port.
    pub fn child(instance: InstanceRef, port: PortId) -> Self {
        Self {
            instance: Some(instance),
            port,
        }
    }

    /// One pin of this port.
    pub fn pin(self, pin: u32) -> PinRef {
        PinRef {
            instance: self.instance,
            port: self.port,
            pin,
        }
    }
}
