//! Fixture device shared by the Weft test suites.
//!
//! The fixture is a 4x4 grid with a small k4-style logic cluster in the core
//! and single-pad I/O tiles on the borders:
//!
//! - circuit models `wire`, `mux_tree`, `lut4`, `dff` (with a global `reset`),
//!   `iopad` (with a bidirectional `pad`) and an unused `sram`;
//! - a mux library for `mux_tree` sizes 2 to 8, each with two shared bits;
//! - cluster `clb` holding two `fle`s behind a 6-input crossbar, each `fle`
//!   holding a `lut4` and a `dff` in its physical mode plus a second,
//!   non-physical mode;
//! - routing with two structurally identical switch blocks, a block with a
//!   single short connection, an empty one, connection blocks with an
//!   OPIN-only pin and a single-driver pin, and coordinates with no
//!   connection block at all.

use weft_arch::{
    BlockPort, BlockType, BlockTypeId, CbIpin, CbKind, ChildSlot, CircuitLibrary, CircuitModel,
    CircuitModelId, CircuitModelKind, CircuitPort, CircuitPortKind, ClusterLibrary,
    ConnectionBlock, DeviceContext, DeviceGrid, Interconnect, InterconnectKind, Mode, MuxEntry,
    MuxLibrary, PinLocation, PinSpec, Placement, PortClass, RoutingGraph, RrEdge, RrNode,
    RrNodeId, RrNodeKind, SbSide, SbTrack, SwitchBlock, SwitchId, SwitchInf, TileType, TileTypeId,
    TrackDirection,
};
use weft_common::Side;

/// `wire` circuit model.
pub const WIRE: CircuitModelId = model(0);
/// `mux_tree` circuit model.
pub const MUX_TREE: CircuitModelId = model(1);
/// `lut4` circuit model.
pub const LUT4: CircuitModelId = model(2);
/// `dff` circuit model.
pub const DFF: CircuitModelId = model(3);
/// `iopad` circuit model.
pub const IOPAD: CircuitModelId = model(4);

/// Switch with `R = 2, Cout = 3, Tdel = 1`, delay 7.
pub const SW_SLOW: SwitchId = switch(0);
/// Connection-block switch, delay 5.
pub const SW_CB: SwitchId = switch(1);
/// Direct OPIN-to-IPIN switch, delay 0.5.
pub const SW_DIRECT: SwitchId = switch(2);
/// Switch with `R = 1, Cout = 2, Tdel = 3`, delay 5.
pub const SW_FAST: SwitchId = switch(3);

/// Block type `lut4`.
pub const BLOCK_LUT4: BlockTypeId = block(0);
/// Block type `dff`.
pub const BLOCK_DFF: BlockTypeId = block(1);
/// Block type `fle`.
pub const BLOCK_FLE: BlockTypeId = block(2);
/// Block type `clb`.
pub const BLOCK_CLB: BlockTypeId = block(3);
/// Block type `iopad`.
pub const BLOCK_IOPAD: BlockTypeId = block(4);
/// Block type `io`.
pub const BLOCK_IO: BlockTypeId = block(5);

/// Tile type `io`.
pub const TILE_IO: TileTypeId = tile(0);
/// Tile type `clb`.
pub const TILE_CLB: TileTypeId = tile(1);

/// Independent bits of `mux_tree` for fan-in `n`, as listed in the fixture library.
pub fn mux_tree_bits(fan_in: u32) -> u32 {
    match fan_in {
        2 => 1,
        3 | 4 => 2,
        _ => 3,
    }
}

/// Shared bits of every `mux_tree` entry.
pub const MUX_TREE_SHARED_BITS: u32 = 2;

const fn model(i: u32) -> CircuitModelId {
    CircuitModelId::from_raw(i)
}

const fn switch(i: u32) -> SwitchId {
    SwitchId::from_raw(i)
}

const fn block(i: u32) -> BlockTypeId {
    BlockTypeId::from_raw(i)
}

const fn tile(i: u32) -> TileTypeId {
    TileTypeId::from_raw(i)
}

/// Initializes `env_logger` for tests. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds the fixture device.
pub fn fixture_device() -> DeviceContext {
    DeviceContext {
        name: "k4_n2_fixture".to_string(),
        circuits: circuits(),
        mux_library: mux_library(),
        switches: switches(),
        clusters: clusters(),
        tiles: tiles(),
        grid: grid(),
        routing: routing(),
    }
}

/// The fixture device serialized as a JSON device description.
pub fn fixture_device_json() -> String {
    serde_json::to_string_pretty(&fixture_device()).unwrap_or_default()
}

fn cport(name: &str, kind: CircuitPortKind, size: u32) -> CircuitPort {
    CircuitPort {
        name: name.to_string(),
        kind,
        size,
        global: false,
    }
}

fn circuits() -> CircuitLibrary {
    use CircuitPortKind::*;
    let mut reset = cport("reset", Input, 1);
    reset.global = true;
    CircuitLibrary {
        models: vec![
            CircuitModel {
                name: "wire".to_string(),
                kind: CircuitModelKind::Wire,
                ports: vec![cport("in", Input, 1), cport("out", Output, 1)],
                shared_config_bits: 0,
            },
            CircuitModel {
                name: "mux_tree".to_string(),
                kind: CircuitModelKind::Mux,
                ports: Vec::new(),
                shared_config_bits: 0,
            },
            CircuitModel {
                name: "lut4".to_string(),
                kind: CircuitModelKind::Lut,
                ports: vec![
                    cport("in", Input, 4),
                    cport("out", Output, 1),
                    cport("sram", Sram, 16),
                ],
                shared_config_bits: 0,
            },
            CircuitModel {
                name: "dff".to_string(),
                kind: CircuitModelKind::Ff,
                ports: vec![
                    cport("D", Input, 1),
                    cport("Q", Output, 1),
                    cport("clk", Clock, 1),
                    reset,
                ],
                shared_config_bits: 0,
            },
            CircuitModel {
                name: "iopad".to_string(),
                kind: CircuitModelKind::IoPad,
                ports: vec![
                    cport("outpad", Input, 1),
                    cport("inpad", Output, 1),
                    cport("pad", Inout, 1),
                    cport("en", Sram, 1),
                ],
                shared_config_bits: 0,
            },
            CircuitModel {
                name: "sram".to_string(),
                kind: CircuitModelKind::Sram,
                ports: Vec::new(),
                shared_config_bits: 0,
            },
        ],
        default_wire: Some(WIRE),
    }
}

fn mux_library() -> MuxLibrary {
    MuxLibrary::new(
        (2..=8)
            .map(|fan_in| MuxEntry {
                model: MUX_TREE,
                fan_in,
                num_config_bits: mux_tree_bits(fan_in),
                num_shared_config_bits: MUX_TREE_SHARED_BITS,
            })
            .collect(),
    )
}

fn switches() -> Vec<SwitchInf> {
    let sw = |name: &str, r: f64, cout: f64, tdel: f64| SwitchInf {
        name: name.to_string(),
        r,
        cout,
        tdel,
        circuit_model: MUX_TREE,
    };
    vec![
        sw("slow", 2.0, 3.0, 1.0),
        sw("cb", 1.0, 4.0, 1.0),
        sw("direct", 0.0, 0.0, 0.5),
        sw("fast", 1.0, 2.0, 3.0),
    ]
}

fn bport(name: &str, class: PortClass, width: u32) -> BlockPort {
    BlockPort {
        name: name.to_string(),
        class,
        width,
    }
}

fn direct(name: &str, inputs: Vec<PinSpec>, outputs: Vec<PinSpec>) -> Interconnect {
    Interconnect {
        name: name.to_string(),
        kind: InterconnectKind::Direct,
        circuit_model: Some(WIRE),
        inputs,
        outputs,
    }
}

fn primitive(name: &str, ports: Vec<BlockPort>, model: CircuitModelId) -> BlockType {
    BlockType {
        name: name.to_string(),
        ports,
        circuit_model: Some(model),
        modes: Vec::new(),
        physical_mode: None,
    }
}

fn clusters() -> ClusterLibrary {
    use PortClass::*;
    let lut4 = primitive(
        "lut4",
        vec![bport("in", Input, 4), bport("out", Output, 1)],
        LUT4,
    );
    let dff = primitive(
        "dff",
        vec![bport("D", Input, 1), bport("Q", Output, 1), bport("clk", Clock, 1)],
        DFF,
    );

    let n1_lut4 = Mode {
        name: "n1_lut4".to_string(),
        children: vec![
            ChildSlot {
                block: BLOCK_LUT4,
                count: 1,
            },
            ChildSlot {
                block: BLOCK_DFF,
                count: 1,
            },
        ],
        interconnects: vec![
            direct(
                "direct_in",
                (0..4).map(|i| PinSpec::parent("in", i)).collect(),
                (0..4).map(|i| PinSpec::child(0, 0, "in", i)).collect(),
            ),
            direct(
                "direct_ff",
                vec![PinSpec::child(0, 0, "out", 0)],
                vec![PinSpec::child(1, 0, "D", 0)],
            ),
            direct(
                "direct_clk",
                vec![PinSpec::parent("clk", 0)],
                vec![PinSpec::child(1, 0, "clk", 0)],
            ),
            Interconnect {
                name: "mux_out".to_string(),
                kind: InterconnectKind::Mux,
                circuit_model: Some(MUX_TREE),
                inputs: vec![PinSpec::child(1, 0, "Q", 0), PinSpec::child(0, 0, "out", 0)],
                outputs: vec![PinSpec::parent("out", 0)],
            },
        ],
    };
    let lut_only = Mode {
        name: "lut_only".to_string(),
        children: vec![ChildSlot {
            block: BLOCK_LUT4,
            count: 1,
        }],
        interconnects: vec![
            direct(
                "direct_in",
                (0..4).map(|i| PinSpec::parent("in", i)).collect(),
                (0..4).map(|i| PinSpec::child(0, 0, "in", i)).collect(),
            ),
            direct(
                "direct_out",
                vec![PinSpec::child(0, 0, "out", 0)],
                vec![PinSpec::parent("out", 0)],
            ),
        ],
    };
    let fle = BlockType {
        name: "fle".to_string(),
        ports: vec![
            bport("in", Input, 4),
            bport("out", Output, 1),
            bport("clk", Clock, 1),
        ],
        circuit_model: None,
        modes: vec![n1_lut4, lut_only],
        physical_mode: Some(0),
    };

    let mut crossbar_inputs: Vec<PinSpec> = (0..4).map(|i| PinSpec::parent("I", i)).collect();
    crossbar_inputs.push(PinSpec::child(0, 0, "out", 0));
    crossbar_inputs.push(PinSpec::child(0, 1, "out", 0));
    let crossbar_outputs = (0..2)
        .flat_map(|inst| (0..4).map(move |i| PinSpec::child(0, inst, "in", i)))
        .collect();
    let clb = BlockType {
        name: "clb".to_string(),
        ports: vec![
            bport("I", Input, 4),
            bport("O", Output, 2),
            bport("clk", Clock, 1),
        ],
        circuit_model: None,
        modes: vec![Mode {
            name: "default".to_string(),
            children: vec![ChildSlot {
                block: BLOCK_FLE,
                count: 2,
            }],
            interconnects: vec![
                Interconnect {
                    name: "crossbar".to_string(),
                    kind: InterconnectKind::Complete,
                    circuit_model: Some(MUX_TREE),
                    inputs: crossbar_inputs,
                    outputs: crossbar_outputs,
                },
                Interconnect {
                    name: "clks".to_string(),
                    kind: InterconnectKind::Complete,
                    circuit_model: Some(WIRE),
                    inputs: vec![PinSpec::parent("clk", 0)],
                    outputs: vec![PinSpec::child(0, 0, "clk", 0), PinSpec::child(0, 1, "clk", 0)],
                },
                direct(
                    "clbouts",
                    vec![PinSpec::child(0, 0, "out", 0), PinSpec::child(0, 1, "out", 0)],
                    vec![PinSpec::parent("O", 0), PinSpec::parent("O", 1)],
                ),
            ],
        }],
        physical_mode: None,
    };

    let iopad = primitive(
        "iopad",
        vec![bport("outpad", Input, 1), bport("inpad", Output, 1)],
        IOPAD,
    );
    let io = BlockType {
        name: "io".to_string(),
        ports: vec![bport("outpad", Input, 1), bport("inpad", Output, 1)],
        circuit_model: None,
        modes: vec![Mode {
            name: "physical".to_string(),
            children: vec![ChildSlot {
                block: BLOCK_IOPAD,
                count: 1,
            }],
            interconnects: vec![
                direct(
                    "outpad",
                    vec![PinSpec::parent("outpad", 0)],
                    vec![PinSpec::child(0, 0, "outpad", 0)],
                ),
                direct(
                    "inpad",
                    vec![PinSpec::child(0, 0, "inpad", 0)],
                    vec![PinSpec::parent("inpad", 0)],
                ),
            ],
        }],
        physical_mode: None,
    };

    ClusterLibrary {
        blocks: vec![lut4, dff, fle, clb, iopad, io],
    }
}

fn on(sides: &[Side]) -> PinLocation {
    PinLocation {
        sides: sides.to_vec(),
        height: 0,
    }
}

fn tiles() -> Vec<TileType> {
    vec![
        TileType {
            name: "io".to_string(),
            block: BLOCK_IO,
            capacity: 2,
            height: 1,
            is_io: true,
            pins: vec![on(&Side::ALL), on(&Side::ALL)],
        },
        TileType {
            name: "clb".to_string(),
            block: BLOCK_CLB,
            capacity: 1,
            height: 1,
            is_io: false,
            // I[0..4], O[0..2], clk
            pins: vec![
                on(&[Side::Top]),
                on(&[Side::Right]),
                on(&[Side::Bottom]),
                on(&[Side::Left]),
                on(&[Side::Right]),
                on(&[Side::Bottom]),
                on(&[Side::Top]),
            ],
        },
    ]
}

fn grid() -> DeviceGrid {
    let mut placements = Vec::new();
    for i in 1..=2 {
        for (x, y) in [(i, 0), (i, 3), (0, i), (3, i)] {
            placements.push(Placement { x, y, tile: TILE_IO });
        }
        for j in 1..=2 {
            placements.push(Placement {
                x: i,
                y: j,
                tile: TILE_CLB,
            });
        }
    }
    DeviceGrid {
        width: 4,
        height: 4,
        placements,
    }
}

fn node(kind: RrNodeKind, ptc: u32, drivers: &[(u32, SwitchId)]) -> RrNode {
    RrNode {
        kind,
        ptc,
        side: None,
        drivers: drivers
            .iter()
            .map(|&(n, switch)| RrEdge {
                node: RrNodeId::from_raw(n),
                switch,
            })
            .collect(),
    }
}

fn pin(kind: RrNodeKind, ptc: u32, side: Side, drivers: &[(u32, SwitchId)]) -> RrNode {
    RrNode {
        side: Some(side),
        ..node(kind, ptc, drivers)
    }
}

fn n(i: u32) -> RrNodeId {
    RrNodeId::from_raw(i)
}

fn track(i: u32, direction: TrackDirection) -> SbTrack {
    SbTrack {
        node: n(i),
        direction,
    }
}

fn sb_side(side: Side, tracks: Vec<SbTrack>, opins: &[u32]) -> SbSide {
    SbSide {
        side,
        tracks,
        opins: opins.iter().map(|&i| n(i)).collect(),
    }
}

/// Routing nodes of the mirrored switch blocks at (1, 1) and (2, 1).
///
/// With `base` as the first node:
/// `base+2` (right, out) is driven by `base` through [`SW_FAST`] and
/// `base+1` through [`SW_SLOW`]; `base+3` (top, out) has three drivers
/// including the OPIN `base+4`; `base+5` passes straight from left to right;
/// `base+6` (top, out) has a single driver.
fn mirrored_sb_nodes(base: u32) -> Vec<RrNode> {
    use RrNodeKind::*;
    vec![
        node(Chanx, 0, &[]),
        node(Chany, 0, &[]),
        node(Chanx, 1, &[(base, SW_FAST), (base + 1, SW_SLOW)]),
        node(
            Chany,
            1,
            &[(base, SW_SLOW), (base + 1, SW_SLOW), (base + 4, SW_SLOW)],
        ),
        pin(Opin, 4, Side::Right, &[]),
        node(Chanx, 2, &[]),
        node(Chany, 2, &[(base + 1, SW_SLOW)]),
    ]
}

fn mirrored_sb(x: u32, y: u32, base: u32) -> SwitchBlock {
    use TrackDirection::*;
    SwitchBlock {
        x,
        y,
        sides: vec![
            sb_side(
                Side::Top,
                vec![track(base + 3, Out), track(base + 6, Out)],
                &[],
            ),
            sb_side(
                Side::Right,
                vec![track(base + 2, Out), track(base + 5, Out)],
                &[],
            ),
            sb_side(Side::Bottom, vec![track(base + 1, In)], &[base + 4]),
            sb_side(
                Side::Left,
                vec![track(base, In), track(base + 5, In)],
                &[],
            ),
        ],
    }
}

/// Node IDs of interest in the fixture routing graph.
pub mod nodes {
    use weft_arch::RrNodeId;

    /// Left input track X of switch block (1, 1).
    pub const SB11_X: RrNodeId = RrNodeId::from_raw(0);
    /// Bottom input track Y of switch block (1, 1).
    pub const SB11_Y: RrNodeId = RrNodeId::from_raw(1);
    /// Right output track A of switch block (1, 1), driven by X then Y.
    pub const SB11_A: RrNodeId = RrNodeId::from_raw(2);
    /// Top output track of switch block (1, 1) with three drivers.
    pub const SB11_TOP3: RrNodeId = RrNodeId::from_raw(3);
    /// Grid output pin feeding switch block (1, 1).
    pub const SB11_OPIN: RrNodeId = RrNodeId::from_raw(4);
    /// Track passing straight through switch block (1, 1).
    pub const SB11_PASS: RrNodeId = RrNodeId::from_raw(5);
    /// Top output track of switch block (1, 1) with one driver.
    pub const SB11_SINGLE: RrNodeId = RrNodeId::from_raw(6);
    /// Input pin of CBX (1, 1) driven by two tracks.
    pub const CBX11_MUX: RrNodeId = RrNodeId::from_raw(16);
    /// Input pin of CBX (1, 1) driven only by a grid output pin.
    pub const CBX11_OPIN_ONLY: RrNodeId = RrNodeId::from_raw(17);
    /// Input pin of CBX (1, 1) driven by one track.
    pub const CBX11_SINGLE: RrNodeId = RrNodeId::from_raw(18);
    /// Input pin of CBY (1, 1) driven by two tracks.
    pub const CBY11_MUX: RrNodeId = RrNodeId::from_raw(19);
}

fn routing() -> RoutingGraph {
    use RrNodeKind::*;
    let mut nodes = mirrored_sb_nodes(0);
    nodes.extend(mirrored_sb_nodes(7));
    nodes.push(node(Chanx, 0, &[(15, SW_SLOW)])); // 14
    nodes.push(node(Chanx, 1, &[])); // 15
    nodes.push(pin(Ipin, 0, Side::Top, &[(0, SW_CB), (5, SW_CB)])); // 16
    nodes.push(pin(Ipin, 1, Side::Top, &[(4, SW_DIRECT)])); // 17
    nodes.push(pin(Ipin, 2, Side::Top, &[(0, SW_CB)])); // 18
    nodes.push(pin(Ipin, 3, Side::Right, &[(1, SW_CB), (3, SW_CB)])); // 19

    let switch_blocks = vec![
        mirrored_sb(1, 1, 0),
        mirrored_sb(2, 1, 7),
        SwitchBlock {
            x: 1,
            y: 2,
            sides: vec![
                sb_side(
                    Side::Right,
                    vec![track(14, TrackDirection::Out)],
                    &[],
                ),
                sb_side(Side::Left, vec![track(15, TrackDirection::In)], &[]),
            ],
        },
        SwitchBlock {
            x: 0,
            y: 0,
            sides: vec![sb_side(Side::Top, Vec::new(), &[])],
        },
    ];

    let connection_blocks = vec![
        ConnectionBlock {
            kind: CbKind::X,
            x: 1,
            y: 1,
            tracks: vec![n(0), n(5)],
            ipins: vec![
                CbIpin {
                    side: Side::Bottom,
                    node: n(16),
                },
                CbIpin {
                    side: Side::Bottom,
                    node: n(17),
                },
                CbIpin {
                    side: Side::Bottom,
                    node: n(18),
                },
            ],
        },
        ConnectionBlock {
            kind: CbKind::Y,
            x: 1,
            y: 1,
            tracks: vec![n(1), n(3)],
            ipins: vec![CbIpin {
                side: Side::Left,
                node: n(19),
            }],
        },
        ConnectionBlock {
            kind: CbKind::X,
            x: 1,
            y: 2,
            tracks: vec![n(14)],
            ipins: Vec::new(),
        },
    ];

    RoutingGraph {
        nodes,
        switch_blocks,
        connection_blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_is_valid() {
        fixture_device().validate().unwrap();
    }

    #[test]
    fn fixture_survives_json() {
        let device = weft_arch::load_device_from_str(&fixture_device_json()).unwrap();
        assert_eq!(device.routing.nodes.len(), 20);
        assert_eq!(device.grid.placements.len(), 12);
    }
}
