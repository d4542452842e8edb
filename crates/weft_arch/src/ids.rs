//! Opaque ID newtypes for device-description entities.
//!
//! Each ID is a thin `u32` wrapper indexing one of the tables held by
//! [`DeviceContext`](crate::DeviceContext). In JSON they appear as bare integers.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub const fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index as a `usize` for table access.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a circuit model in the [`CircuitLibrary`](crate::CircuitLibrary).
    CircuitModelId
);

define_id!(
    /// Opaque, copyable ID for a block type in the cluster hierarchy.
    BlockTypeId
);

define_id!(
    /// Opaque, copyable ID for a tile type placed on the device grid.
    TileTypeId
);

define_id!(
    /// Opaque, copyable ID for a routing switch in the switch table.
    SwitchId
);

define_id!(
    /// Opaque, copyable ID for a node of the routing-resource graph.
    RrNodeId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip() {
        let id = RrNodeId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn ids_are_bare_integers_in_json() {
        let id: SwitchId = serde_json::from_str("7").unwrap();
        assert_eq!(id, SwitchId::from_raw(7));
        assert_eq!(serde_json::to_string(&BlockTypeId::from_raw(3)).unwrap(), "3");
    }
}
