//! Module ports.

use serde::{Deserialize, Serialize};

/// Direction and role of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Data flows into the module.
    Input,
    /// Data flows out of the module.
    Output,
    /// Bidirectional pad pin (GPIO), concatenated up to the fabric boundary.
    InOut,
    /// Clock input.
    Clock,
    /// Global input shared by name across the whole fabric.
    Global,
    /// Independent configuration input: `config[n]`, or the scan-chain head.
    Config,
    /// Scan-chain tail.
    ConfigOut,
    /// Shared (reserved) configuration bits of a memory bank.
    SharedConfig,
}

impl PortDirection {
    /// Returns `true` if the port drives nets inside its own module.
    ///
    /// These are the ports whose pins may be a net source when referenced
    /// from the owning module, and a net sink when referenced on a child
    /// instance.
    pub fn is_inward(self) -> bool {
        !matches!(self, PortDirection::Output | PortDirection::ConfigOut)
    }
}

/// A port of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port name, unique within its module.
    pub name: String,
    /// Direction and role.
    pub direction: PortDirection,
    /// Width in bits. Always at least one.
    pub width: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inward_directions() {
        assert!(PortDirection::Input.is_inward());
        assert!(PortDirection::Global.is_inward());
        assert!(PortDirection::Config.is_inward());
        assert!(PortDirection::InOut.is_inward());
        assert!(!PortDirection::Output.is_inward());
        assert!(!PortDirection::ConfigOut.is_inward());
    }

    #[test]
    fn serde_roundtrip() {
        let port = Port {
            name: "sram".to_string(),
            direction: PortDirection::Config,
            width: 4,
        };
        let json = serde_json::to_string(&port).unwrap();
        let back: Port = serde_json::from_str(&json).unwrap();
        assert_eq!(back, port);
    }
}
