//! Grid tile modules.
//!
//! A tile module holds `capacity` replicas of the tile's top-level block and
//! exposes one port per cluster pin and side. I/O tiles are built once per
//! border side, exposing only the pins facing the core. With duplicated grid
//! pins every output is exposed as an `_upper` and a `_lower` port driven by
//! the same block pin.

use crate::builder::FabricBuilder;
use crate::naming;
use weft_arch::{PortClass, TileTypeId};
use weft_common::{FabricError, FabricResult, Side};
use weft_module::{ModuleId, PinRef, PortDirection};

impl FabricBuilder<'_> {
    /// Finds or creates the module of a tile type on an optional border side.
    pub fn build_tile(&mut self, tile_id: TileTypeId, border: Option<Side>) -> FabricResult<ModuleId> {
        let device = self.device;
        let tile = device.tile(tile_id)?;
        let border = if tile.is_io { border } else { None };
        if let Some(&module) = self.tiles.get(&(tile_id, border)) {
            return Ok(module);
        }
        let name = naming::tile_module(&tile.name, border);

        let clusters = self.clusters();
        let block = clusters.block(tile.block)?;
        let pins_per_block = block.num_pins();
        if tile.pins.len() != pins_per_block as usize {
            return Err(FabricError::structural(format!(
                "tile '{}' locates {} pins but block '{}' has {pins_per_block}",
                tile.name,
                tile.pins.len(),
                block.name
            )));
        }
        let block_module = self.build_block(tile.block)?;
        let exposed = tile.exposed_sides(border);

        let module = self.add_type_module(name, &format!("tile '{}'", tile.name))?;
        for z in 0..tile.capacity {
            let inst = self.graph.add_named_child(
                module,
                block_module,
                naming::block_instance(&block.name, z),
            )?;
            self.mark_if_configurable(module, inst)?;

            for (p, location) in tile.pins.iter().enumerate() {
                let p = p as u32;
                let (port, pin) = block.pin(p).ok_or_else(|| {
                    FabricError::structural(format!("block '{}' has no pin {p}", block.name))
                })?;
                let child_port = self.port_of(block_module, &port.name)?;
                let child_pin = PinRef::child(inst, child_port, pin);
                let sides: Vec<Side> = location
                    .sides
                    .iter()
                    .copied()
                    .filter(|s| exposed.contains(s))
                    .collect();
                let tile_pin = z * pins_per_block + p;

                match port.class {
                    PortClass::Output => {
                        let mut sinks = Vec::with_capacity(sides.len());
                        for side in sides {
                            let base = naming::tile_pin(side, location.height, tile_pin);
                            let names = if self.options.duplicate_grid_pin {
                                vec![
                                    naming::duplicated_pin(&base, true),
                                    naming::duplicated_pin(&base, false),
                                ]
                            } else {
                                vec![base]
                            };
                            for port_name in names {
                                let id = self.graph.add_port(
                                    module,
                                    port_name,
                                    PortDirection::Output,
                                    1,
                                )?;
                                sinks.push(PinRef::local(id, 0));
                            }
                        }
                        if !sinks.is_empty() {
                            self.graph.fan_out(module, child_pin, &sinks)?;
                        }
                    }
                    PortClass::Input | PortClass::Clock => {
                        let side = match sides.as_slice() {
                            [] => continue,
                            [side] => *side,
                            _ => {
                                return Err(FabricError::structural(format!(
                                    "input pin {p} of tile '{}' is placed on several sides",
                                    tile.name
                                )))
                            }
                        };
                        let direction = if port.class == PortClass::Clock {
                            PortDirection::Clock
                        } else {
                            PortDirection::Input
                        };
                        let id = self.graph.add_port(
                            module,
                            naming::tile_pin(side, location.height, tile_pin),
                            direction,
                            1,
                        )?;
                        self.graph.connect(module, PinRef::local(id, 0), child_pin)?;
                    }
                }
            }
        }

        self.rollup_ports(module)?;
        self.tiles.insert((tile_id, border), module);
        log::debug!(
            "built tile '{}' with {} replicas",
            self.graph.try_module(module)?.name,
            tile.capacity
        );
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use crate::{BuildOptions, FabricBuilder};
    use weft_common::{ConfigOrganization, FabricError, Side};
    use weft_module::PortDirection;
    use weft_test_helpers::{fixture_device, TILE_CLB, TILE_IO};

    fn builder(device: &weft_arch::DeviceContext) -> FabricBuilder<'_> {
        builder_with(device, false)
    }

    fn builder_with(device: &weft_arch::DeviceContext, duplicate_grid_pin: bool) -> FabricBuilder<'_> {
        FabricBuilder::new(
            device,
            BuildOptions {
                organization: ConfigOrganization::Standalone,
                compact_routing: false,
                duplicate_grid_pin,
            },
        )
    }

    fn port_names(b: &FabricBuilder<'_>, module: weft_module::ModuleId) -> Vec<String> {
        b.graph()
            .module(module)
            .ports()
            .map(|(_, p)| p.name.clone())
            .collect()
    }

    #[test]
    fn core_tile_ports() {
        let device = fixture_device();
        let mut b = builder(&device);
        let clb = b.build_tile(TILE_CLB, None).unwrap();
        assert_eq!(b.graph().module(clb).name, "grid_clb");
        assert_eq!(
            port_names(&b, clb),
            vec![
                "top_height_0__pin_0_",
                "right_height_0__pin_1_",
                "bottom_height_0__pin_2_",
                "left_height_0__pin_3_",
                "right_height_0__pin_4_",
                "bottom_height_0__pin_5_",
                "top_height_0__pin_6_",
                "reset",
                "config",
            ]
        );
        let m = b.graph().module(clb);
        let clk = m.port(m.find_port("top_height_0__pin_6_").unwrap()).unwrap();
        assert_eq!(clk.direction, PortDirection::Clock);
        let config = m.port(m.find_port("config").unwrap()).unwrap();
        assert_eq!(config.width, 58);
    }

    #[test]
    fn io_tiles_face_the_core() {
        let device = fixture_device();
        let mut b = builder(&device);
        let top = b.build_tile(TILE_IO, Some(Side::Top)).unwrap();
        let left = b.build_tile(TILE_IO, Some(Side::Left)).unwrap();
        assert_ne!(top, left);
        assert_eq!(b.graph().module(top).name, "grid_io_top");
        assert_eq!(
            port_names(&b, top),
            vec![
                "bottom_height_0__pin_0_",
                "bottom_height_0__pin_1_",
                "bottom_height_0__pin_2_",
                "bottom_height_0__pin_3_",
                "pad",
                "config",
            ]
        );
        let m = b.graph().module(top);
        let pad = m.port(m.find_port("pad").unwrap()).unwrap();
        assert_eq!(pad.width, 2);
        assert!(port_names(&b, left)
            .iter()
            .all(|n| !n.contains("height") || n.starts_with("right_")));
    }

    #[test]
    fn building_a_tile_twice_reuses_it() {
        let device = fixture_device();
        let mut b = builder(&device);
        let first = b.build_tile(TILE_IO, Some(Side::Bottom)).unwrap();
        let count = b.graph().len();
        assert_eq!(b.build_tile(TILE_IO, Some(Side::Bottom)).unwrap(), first);
        assert_eq!(b.graph().len(), count);
        // core tiles ignore the border
        let clb = b.build_tile(TILE_CLB, None).unwrap();
        assert_eq!(b.build_tile(TILE_CLB, Some(Side::Top)).unwrap(), clb);
    }

    #[test]
    fn pin_count_mismatch_is_structural_error() {
        let mut device = fixture_device();
        device.tiles[TILE_CLB.index()].pins.pop();
        let mut b = builder(&device);
        assert!(matches!(
            b.build_tile(TILE_CLB, None),
            Err(FabricError::Structural(_))
        ));
    }

    #[test]
    fn input_on_two_sides_is_structural_error() {
        let mut device = fixture_device();
        device.tiles[TILE_CLB.index()].pins[0].sides = vec![Side::Top, Side::Left];
        let mut b = builder(&device);
        assert!(matches!(
            b.build_tile(TILE_CLB, None),
            Err(FabricError::Structural(_))
        ));
    }

    #[test]
    fn duplicated_outputs_share_one_driver() {
        let device = fixture_device();
        let mut b = builder_with(&device, true);
        let clb = b.build_tile(TILE_CLB, None).unwrap();
        assert_eq!(
            port_names(&b, clb),
            vec![
                "top_height_0__pin_0_",
                "right_height_0__pin_1_",
                "bottom_height_0__pin_2_",
                "left_height_0__pin_3_",
                "right_height_0__pin_4_upper",
                "right_height_0__pin_4_lower",
                "bottom_height_0__pin_5_upper",
                "bottom_height_0__pin_5_lower",
                "top_height_0__pin_6_",
                "reset",
                "config",
            ]
        );
        let m = b.graph().module(clb);
        let upper = m.find_port("right_height_0__pin_4_upper").unwrap();
        let lower = m.find_port("right_height_0__pin_4_lower").unwrap();
        let net = m
            .nets()
            .map(|(_, net)| net)
            .find(|net| net.sinks.iter().any(|s| s.instance.is_none() && s.port == upper))
            .unwrap();
        assert!(net.source.unwrap().instance.is_some());
        assert!(net
            .sinks
            .iter()
            .any(|s| s.instance.is_none() && s.port == lower));
    }

    #[test]
    fn tile_types_sharing_a_name_are_consistency_error() {
        let mut device = fixture_device();
        let io = &mut device.tiles[TILE_IO.index()];
        io.name = "clb".to_string();
        io.is_io = false;
        let mut b = builder(&device);
        b.build_tile(TILE_CLB, None).unwrap();
        match b.build_tile(TILE_IO, None) {
            Err(FabricError::Consistency(msg)) => assert!(msg.contains("'grid_clb'"), "{msg}"),
            other => panic!("expected consistency error, got {other:?}"),
        }
    }
}
