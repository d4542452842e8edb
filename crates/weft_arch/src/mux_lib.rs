//! Precomputed multiplexer implementation library.

use crate::ids::CircuitModelId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weft_common::{FabricError, FabricResult};

/// Configuration-bit requirements of one multiplexer implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuxEntry {
    /// The multiplexer circuit model.
    pub model: CircuitModelId,
    /// Number of data inputs.
    pub fan_in: u32,
    /// Bits owned by this multiplexer alone.
    pub num_config_bits: u32,
    /// Reserved bits shared with every other multiplexer of the same bank.
    #[serde(default)]
    pub num_shared_config_bits: u32,
}

/// Catalogue of multiplexer implementations keyed by `(circuit model, fan-in)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<MuxEntry>", into = "Vec<MuxEntry>")]
pub struct MuxLibrary {
    entries: Vec<MuxEntry>,
    index: HashMap<(CircuitModelId, u32), usize>,
}

impl MuxLibrary {
    /// Builds a library from its entries. A later duplicate replaces an earlier one.
    pub fn new(entries: Vec<MuxEntry>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| ((e.model, e.fan_in), i))
            .collect();
        Self { entries, index }
    }

    /// Looks up the implementation for a multiplexer of `fan_in` inputs.
    ///
    /// Fan-in below two never yields a multiplexer and is rejected as a
    /// structural error.
    pub fn lookup(&self, model: CircuitModelId, fan_in: u32) -> FabricResult<&MuxEntry> {
        if fan_in < 2 {
            return Err(FabricError::structural(format!(
                "multiplexer requested with fan-in {fan_in}"
            )));
        }
        self.index
            .get(&(model, fan_in))
            .map(|&i| &self.entries[i])
            .ok_or_else(|| {
                FabricError::lookup(format!(
                    "no mux-library entry for circuit model {} with fan-in {fan_in}",
                    model.as_raw()
                ))
            })
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[MuxEntry] {
        &self.entries
    }
}

impl From<Vec<MuxEntry>> for MuxLibrary {
    fn from(entries: Vec<MuxEntry>) -> Self {
        Self::new(entries)
    }
}

impl From<MuxLibrary> for Vec<MuxEntry> {
    fn from(lib: MuxLibrary) -> Self {
        lib.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(model: u32, fan_in: u32, bits: u32) -> MuxEntry {
        MuxEntry {
            model: CircuitModelId::from_raw(model),
            fan_in,
            num_config_bits: bits,
            num_shared_config_bits: 0,
        }
    }

    #[test]
    fn lookup_by_model_and_fan_in() {
        let lib = MuxLibrary::new(vec![entry(0, 2, 1), entry(0, 4, 2), entry(1, 4, 4)]);
        let model = CircuitModelId::from_raw(0);
        assert_eq!(lib.lookup(model, 4).unwrap().num_config_bits, 2);
        assert_eq!(
            lib.lookup(CircuitModelId::from_raw(1), 4)
                .unwrap()
                .num_config_bits,
            4
        );
    }

    #[test]
    fn missing_entry_is_lookup_error() {
        let lib = MuxLibrary::new(vec![entry(0, 2, 1)]);
        let err = lib.lookup(CircuitModelId::from_raw(0), 3).unwrap_err();
        assert!(matches!(err, FabricError::Lookup(_)));
    }

    #[test]
    fn fan_in_below_two_is_structural_error() {
        let lib = MuxLibrary::new(vec![entry(0, 2, 1)]);
        let err = lib.lookup(CircuitModelId::from_raw(0), 1).unwrap_err();
        assert!(matches!(err, FabricError::Structural(_)));
    }

    #[test]
    fn deserializes_from_list() {
        let lib: MuxLibrary = serde_json::from_str(
            r#"[{"model": 2, "fan_in": 3, "num_config_bits": 2, "num_shared_config_bits": 1}]"#,
        )
        .unwrap();
        let e = lib.lookup(CircuitModelId::from_raw(2), 3).unwrap();
        assert_eq!(e.num_shared_config_bits, 1);
        assert_eq!(lib.entries().len(), 1);
    }
}
