//! Circuit models: the transistor-level building blocks the fabric is made of.

use crate::ids::CircuitModelId;
use serde::{Deserialize, Serialize};
use weft_common::{FabricError, FabricResult};

/// What kind of circuit a model implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitModelKind {
    /// A pass-through wire used for single-driver interconnect.
    Wire,
    /// A routing multiplexer. Its configuration bits come from the [`MuxLibrary`](crate::MuxLibrary).
    Mux,
    /// A look-up table.
    Lut,
    /// A flip-flop.
    Ff,
    /// An I/O pad with a bidirectional pin towards the package.
    IoPad,
    /// Any other hard block (adders, memories, DSPs).
    HardLogic,
    /// A configuration memory cell.
    Sram,
}

/// The role of a circuit-model port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitPortKind {
    /// A data input.
    Input,
    /// A data output.
    Output,
    /// A bidirectional pad pin exposed up to the fabric boundary.
    Inout,
    /// A clock input.
    Clock,
    /// A configuration-memory input; its width counts towards the model's bits.
    Sram,
}

/// A port declared by a circuit model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitPort {
    /// Port name, reused verbatim for the generated module port.
    pub name: String,
    /// Port role.
    pub kind: CircuitPortKind,
    /// Port width in bits.
    #[serde(default = "default_size")]
    pub size: u32,
    /// Global ports (e.g. reset, set, scan enable) are routed straight to
    /// the fabric top instead of through the cluster interconnect.
    #[serde(default)]
    pub global: bool,
}

fn default_size() -> u32 {
    1
}

/// A circuit model from the circuit library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitModel {
    /// Model name, used as the generated module name for logic models.
    pub name: String,
    /// Circuit kind.
    pub kind: CircuitModelKind,
    /// Declared ports in declaration order.
    #[serde(default)]
    pub ports: Vec<CircuitPort>,
    /// Reserved configuration bits shared across a memory bank.
    #[serde(default)]
    pub shared_config_bits: u32,
}

impl CircuitModel {
    /// Returns the number of independent configuration bits, the total width
    /// of all `sram` ports.
    pub fn num_config_bits(&self) -> u32 {
        self.ports_of_kind(CircuitPortKind::Sram)
            .map(|p| p.size)
            .sum()
    }

    /// Returns the port with the given name, if declared.
    pub fn port(&self, name: &str) -> Option<&CircuitPort> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Iterates over ports of one kind in declaration order.
    pub fn ports_of_kind(&self, kind: CircuitPortKind) -> impl Iterator<Item = &CircuitPort> {
        self.ports.iter().filter(move |p| p.kind == kind)
    }
}

/// The circuit library of a device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitLibrary {
    /// All models, indexed by [`CircuitModelId`].
    pub models: Vec<CircuitModel>,
    /// Wire model used when an interconnect without its own wire model
    /// degenerates to a single driver.
    #[serde(default)]
    pub default_wire: Option<CircuitModelId>,
}

impl CircuitLibrary {
    /// Returns the model with the given ID.
    pub fn model(&self, id: CircuitModelId) -> FabricResult<&CircuitModel> {
        self.models
            .get(id.index())
            .ok_or_else(|| FabricError::lookup(format!("no circuit model with id {}", id.as_raw())))
    }

    /// Finds a model by name.
    pub fn find(&self, name: &str) -> Option<CircuitModelId> {
        self.models
            .iter()
            .position(|m| m.name == name)
            .map(|i| CircuitModelId::from_raw(i as u32))
    }

    /// Returns the default wire model.
    pub fn default_wire(&self) -> FabricResult<CircuitModelId> {
        self.default_wire
            .ok_or_else(|| FabricError::lookup("circuit library declares no default wire model"))
    }

    /// Iterates over `(ID, &CircuitModel)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (CircuitModelId, &CircuitModel)> {
        self.models
            .iter()
            .enumerate()
            .map(|(i, m)| (CircuitModelId::from_raw(i as u32), m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lut4() -> CircuitModel {
        serde_json::from_str(
            r#"{
                "name": "lut4",
                "kind": "lut",
                "ports": [
                    {"name": "in", "kind": "input", "size": 4},
                    {"name": "out", "kind": "output"},
                    {"name": "sram", "kind": "sram", "size": 16}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn config_bits_sum_sram_ports() {
        let model = lut4();
        assert_eq!(model.num_config_bits(), 16);
        assert_eq!(model.shared_config_bits, 0);
    }

    #[test]
    fn port_defaults() {
        let model = lut4();
        let out = model.port("out").unwrap();
        assert_eq!(out.size, 1);
        assert!(!out.global);
        assert!(model.port("missing").is_none());
    }

    #[test]
    fn library_lookup() {
        let lib = CircuitLibrary {
            models: vec![lut4()],
            default_wire: None,
        };
        let id = lib.find("lut4").unwrap();
        assert_eq!(lib.model(id).unwrap().kind, CircuitModelKind::Lut);
        assert!(matches!(
            lib.model(CircuitModelId::from_raw(5)),
            Err(FabricError::Lookup(_))
        ));
        assert!(matches!(lib.default_wire(), Err(FabricError::Lookup(_))));
    }
}
