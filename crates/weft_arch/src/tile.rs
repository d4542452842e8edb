//! Tile types: physical placement sites wrapping a top-level cluster block.

use crate::ids::BlockTypeId;
use serde::{Deserialize, Serialize};
use weft_common::Side;

/// Where one cluster pin sits on the tile boundary.
///
/// I/O pins are typically placed on every side; only the side facing the
/// core is kept once the tile's border is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinLocation {
    /// Tile sides carrying the pin.
    pub sides: Vec<Side>,
    /// Row offset within a tile taller than one grid unit.
    #[serde(default)]
    pub height: u32,
}

/// A tile type of the device grid.
///
/// `pins` gives the location of each cluster pin of one capacity slot, in
/// cluster pin order. Every slot of a tile shares the same placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileType {
    /// Tile name.
    pub name: String,
    /// Top-level cluster block.
    pub block: BlockTypeId,
    /// Number of cluster instances per tile.
    #[serde(default = "default_one")]
    pub capacity: u32,
    /// Height in grid units.
    #[serde(default = "default_one")]
    pub height: u32,
    /// I/O tiles sit on the device border and face the core with one side only.
    #[serde(default)]
    pub is_io: bool,
    /// Pin placement of one capacity slot.
    pub pins: Vec<PinLocation>,
}

fn default_one() -> u32 {
    1
}

impl TileType {
    /// Sides whose pins are exposed for an instance on the given border.
    ///
    /// An I/O tile on border side `S` exposes only the pins placed on the
    /// side facing the core, `S.opposite()`. Every other tile exposes all
    /// sides.
    pub fn exposed_sides(&self, border: Option<Side>) -> Vec<Side> {
        match (self.is_io, border) {
            (true, Some(side)) => vec![side.opposite()],
            _ => Side::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_tile() -> TileType {
        TileType {
            name: "io".to_string(),
            block: BlockTypeId::from_raw(0),
            capacity: 8,
            height: 1,
            is_io: true,
            pins: vec![
                PinLocation {
                    sides: Side::ALL.to_vec(),
                    height: 0,
                },
                PinLocation {
                    sides: vec![Side::Bottom],
                    height: 0,
                },
            ],
        }
    }

    #[test]
    fn io_tile_faces_core() {
        let tile = io_tile();
        assert_eq!(tile.exposed_sides(Some(Side::Top)), vec![Side::Bottom]);
        assert_eq!(tile.exposed_sides(Some(Side::Left)), vec![Side::Right]);
    }

    #[test]
    fn core_tile_exposes_all_sides() {
        let mut tile = io_tile();
        tile.is_io = false;
        assert_eq!(tile.exposed_sides(Some(Side::Top)).len(), 4);
        assert_eq!(tile.exposed_sides(None).len(), 4);
    }

    #[test]
    fn defaults_from_json() {
        let tile: TileType = serde_json::from_str(
            r#"{"name": "clb", "block": 1, "pins": [{"sides": ["left"]}]}"#,
        )
        .unwrap();
        assert_eq!(tile.capacity, 1);
        assert_eq!(tile.height, 1);
        assert!(!tile.is_io);
        assert_eq!(tile.pins[0].sides, vec![Side::Left]);
        assert_eq!(tile.pins[0].height, 0);
    }
}
