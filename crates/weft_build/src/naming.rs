//! Deterministic names of generated modules, ports, and instances.
//!
//! The builder and the [`BlockPortResolver`](crate::BlockPortResolver) both
//! derive names from here, so a routing node always maps to the same port
//! without a lookup table.

use weft_arch::{CbKind, TrackDirection};
use weft_common::Side;

/// Module of a primitive block.
pub fn pb_leaf(block: &str) -> String {
    format!("pb_{block}")
}

/// Module of a composite block in its physical mode.
pub fn pb_composite(block: &str, mode: &str) -> String {
    format!("pb_{block}_mode_{mode}")
}

/// Instance of a child block or tile replica.
pub fn block_instance(block: &str, index: u32) -> String {
    format!("{block}_{index}")
}

/// Module of a tile type, per border side for I/O tiles.
pub fn tile_module(tile: &str, border: Option<Side>) -> String {
    match border {
        Some(side) => format!("grid_{tile}_{side}"),
        None => format!("grid_{tile}"),
    }
}

/// Physical name of a tile, switch block, or connection block module placed at `(x, y)`.
pub fn grid_instance(module: &str, x: u32, y: u32) -> String {
    format!("{module}_{x}__{y}_")
}

/// Tile port of one cluster pin.
pub fn tile_pin(side: Side, height: u32, pin: u32) -> String {
    format!("{side}_height_{height}__pin_{pin}_")
}

/// One copy of a duplicated tile output pin.
pub fn duplicated_pin(pin: &str, upper: bool) -> String {
    format!("{pin}{}", if upper { "upper" } else { "lower" })
}

/// Switch block at `(x, y)`.
pub fn switch_block(x: u32, y: u32) -> String {
    format!("sb_{x}__{y}_")
}

/// Connection block at `(x, y)`.
pub fn connection_block(kind: CbKind, x: u32, y: u32) -> String {
    format!("{}_{x}__{y}_", kind.prefix())
}

/// Switch-block port of the track at `position` on `side`.
pub fn sb_track_port(chan: &str, side: Side, direction: TrackDirection, position: usize) -> String {
    format!("{chan}_{side}_{}_{position}", direction.as_str())
}

/// Port of a grid pin seen from a routing block.
pub fn grid_pin_port(side: Side, ptc: u32) -> String {
    format!("{side}_grid_pin_{ptc}")
}

/// Connection-block port of track `index`.
pub fn cb_track_port(chan: &str, direction: TrackDirection, index: usize) -> String {
    format!("{chan}_{}_{index}", direction.as_str())
}

/// Multiplexer instance driving the track at `position` on `side` of a switch block.
pub fn sb_mux_instance(side: Side, position: usize) -> String {
    format!("mux_{side}_track_{position}")
}

/// Memory instance of [`sb_mux_instance`].
pub fn sb_mem_instance(side: Side, position: usize) -> String {
    format!("mem_{side}_track_{position}")
}

/// Multiplexer instance driving a grid input pin in a connection block.
pub fn cb_mux_instance(side: Side, ptc: u32) -> String {
    format!("mux_{side}_ipin_{ptc}")
}

/// Memory instance of [`cb_mux_instance`].
pub fn cb_mem_instance(side: Side, ptc: u32) -> String {
    format!("mem_{side}_ipin_{ptc}")
}

/// Multiplexer module of `fan_in` inputs.
pub fn mux_module(model: &str, fan_in: u32) -> String {
    format!("{model}_size{fan_in}")
}

/// Configuration memory of [`mux_module`].
pub fn mux_memory_module(model: &str, fan_in: u32) -> String {
    format!("{model}_size{fan_in}_mem")
}

/// Configuration memory of a logic primitive.
pub fn primitive_memory_module(model: &str) -> String {
    format!("{model}_mem")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_names() {
        assert_eq!(pb_leaf("lut4"), "pb_lut4");
        assert_eq!(pb_composite("clb", "default"), "pb_clb_mode_default");
        assert_eq!(tile_module("io", Some(Side::Left)), "grid_io_left");
        assert_eq!(tile_module("clb", None), "grid_clb");
        assert_eq!(grid_instance("grid_clb", 1, 2), "grid_clb_1__2_");
        assert_eq!(switch_block(0, 3), "sb_0__3_");
        assert_eq!(connection_block(CbKind::Y, 2, 1), "cby_2__1_");
        assert_eq!(mux_module("mux_tree", 4), "mux_tree_size4");
        assert_eq!(mux_memory_module("mux_tree", 4), "mux_tree_size4_mem");
        assert_eq!(primitive_memory_module("lut4"), "lut4_mem");
    }

    #[test]
    fn port_names() {
        assert_eq!(tile_pin(Side::Top, 0, 6), "top_height_0__pin_6_");
        assert_eq!(
            duplicated_pin(&tile_pin(Side::Right, 0, 4), true),
            "right_height_0__pin_4_upper"
        );
        assert_eq!(
            sb_track_port("chanx", Side::Left, TrackDirection::In, 1),
            "chanx_left_in_1"
        );
        assert_eq!(grid_pin_port(Side::Bottom, 4), "bottom_grid_pin_4");
        assert_eq!(
            cb_track_port("chany", TrackDirection::Out, 0),
            "chany_out_0"
        );
        assert_eq!(sb_mux_instance(Side::Right, 0), "mux_right_track_0");
        assert_eq!(cb_mem_instance(Side::Bottom, 2), "mem_bottom_ipin_2");
    }
}
