//! Opaque ID newtypes for module-graph entities.
//!
//! Module IDs are global to a [`ModuleGraph`](crate::ModuleGraph). Port and
//! net IDs are scoped to the module that allocated them.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a module in a [`ModuleGraph`](crate::ModuleGraph).
    ModuleId
);

define_id!(
    /// Opaque, copyable ID for a port, scoped to its module.
    PortId
);

define_id!(
    /// Opaque, copyable ID for a net, scoped to its module.
    NetId
);
