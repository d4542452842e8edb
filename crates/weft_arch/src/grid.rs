//! The device grid: which tile type sits at each coordinate.

use crate::ids::TileTypeId;
use serde::{Deserialize, Serialize};
use weft_common::Side;

/// A tile placed at a grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Tile type placed here.
    pub tile: TileTypeId,
}

/// The device grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceGrid {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Placed tiles. Coordinates without a placement are empty.
    pub placements: Vec<Placement>,
}

impl DeviceGrid {
    /// Border side of a coordinate, if it lies on the device boundary.
    ///
    /// Corners resolve in the order top, right, bottom, left.
    pub fn border_side(&self, x: u32, y: u32) -> Option<Side> {
        if self.height > 0 && y == self.height - 1 {
            Some(Side::Top)
        } else if self.width > 0 && x == self.width - 1 {
            Some(Side::Right)
        } else if y == 0 {
            Some(Side::Bottom)
        } else if x == 0 {
            Some(Side::Left)
        } else {
            None
        }
    }

    /// Placements sorted by `(x, y)`.
    pub fn sorted_placements(&self) -> Vec<Placement> {
        let mut placements = self.placements.clone();
        placements.sort_by_key(|p| (p.x, p.y));
        placements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> DeviceGrid {
        DeviceGrid {
            width: 4,
            height: 4,
            placements: vec![
                Placement {
                    x: 2,
                    y: 1,
                    tile: TileTypeId::from_raw(1),
                },
                Placement {
                    x: 1,
                    y: 1,
                    tile: TileTypeId::from_raw(1),
                },
            ],
        }
    }

    #[test]
    fn border_sides() {
        let g = grid();
        assert_eq!(g.border_side(1, 3), Some(Side::Top));
        assert_eq!(g.border_side(3, 1), Some(Side::Right));
        assert_eq!(g.border_side(1, 0), Some(Side::Bottom));
        assert_eq!(g.border_side(0, 2), Some(Side::Left));
        assert_eq!(g.border_side(1, 2), None);
    }

    #[test]
    fn placements_sort_by_column_then_row() {
        let sorted = grid().sorted_placements();
        assert_eq!((sorted[0].x, sorted[0].y), (1, 1));
        assert_eq!((sorted[1].x, sorted[1].y), (2, 1));
    }
}
