//! Routing switch electrical model.

use crate::ids::CircuitModelId;
use serde::{Deserialize, Serialize};

/// One entry of the routing switch table.
///
/// Resistance and capacitance are expressed in units whose product is in
/// nanoseconds, and `tdel` is in nanoseconds, so [`SwitchInf::delay`] is
/// directly usable in a timing constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchInf {
    /// Switch name.
    pub name: String,
    /// Equivalent output resistance.
    pub r: f64,
    /// Output capacitance.
    pub cout: f64,
    /// Intrinsic delay.
    pub tdel: f64,
    /// Multiplexer circuit model implementing this switch.
    pub circuit_model: CircuitModelId,
}

impl SwitchInf {
    /// Closed-form switch delay `R * Cout + Tdel`.
    pub fn delay(&self) -> f64 {
        self.r * self.cout + self.tdel
    }
}
