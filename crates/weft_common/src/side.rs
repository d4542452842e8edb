//! The four sides of a tile or routing block.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A side of a grid tile, switch block, or connection block.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The top side (towards larger y).
    Top,
    /// The right side (towards larger x).
    Right,
    /// The bottom side (towards smaller y).
    Bottom,
    /// The left side (towards smaller x).
    Left,
}

impl Side {
    /// All sides in clockwise order starting at the top.
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Returns the side facing this one.
    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }

    /// Returns the lowercase name used in generated port and module names.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
