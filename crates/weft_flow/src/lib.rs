//! Fabric generation pipeline.
//!
//! [`generate_fabric`] runs the stages in order. The build phase creates
//! every module and then freezes the graph. The read phase counts
//! configuration bits, lays out the bitstream and renders timing
//! constraints from the frozen graph. Artifacts are written only once all
//! of them rendered, and a failed write removes what was already written.
//! [`run`] does the same for a project directory holding a `weft.toml`.

#![warn(missing_docs)]

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use weft_arch::{load_device, DeviceContext};
use weft_bitstream::{
    build_device_bitstream, build_fabric_bitstream, render_bitstream_xml, write_bitstream_xml,
    ConfigBitAccountant, ConfigBits,
};
use weft_build::{BuildOptions, FabricBuilder, FabricModules};
use weft_common::FabricResult;
use weft_config::{load_config, FabricConfig};
use weft_sdc::{write_sdc_files, SdcEmitter, SdcOptions};

/// Summary of one fabric generation run.
#[derive(Debug, Clone, Serialize)]
pub struct FabricReport {
    /// Number of modules in the frozen graph.
    pub module_count: usize,
    /// Configuration bits of every module, by module name.
    pub bits: BTreeMap<String, ConfigBits>,
    /// Written constraint files, in emission order.
    pub sdc_files: Vec<PathBuf>,
    /// The architecture-independent bitstream file, if one was requested.
    pub bitstream: Option<PathBuf>,
    /// Length of the fabric-dependent bit sequence.
    pub fabric_bits: usize,
}

/// Loads `weft.toml` and its device from `project_dir` and generates the
/// fabric, writing artifacts below the same directory.
pub fn run(project_dir: &Path) -> FabricResult<FabricReport> {
    let config = load_config(project_dir)?;
    let device = load_device(&project_dir.join(&config.fabric.device))?;
    generate_fabric(&config, &device, project_dir)
}

/// Builds the module graph for `device` and writes the configured artifacts
/// below `out_dir`.
///
/// The device is validated first. On error no artifact is left behind.
pub fn generate_fabric(
    config: &FabricConfig,
    device: &DeviceContext,
    out_dir: &Path,
) -> FabricResult<FabricReport> {
    device.validate()?;
    let organization = config.fabric.config_organization;
    let compact = config.fabric.compact_routing_hierarchy;
    log::info!(
        "generating fabric '{}' ({:?}, compact routing {})",
        config.fabric.name,
        organization,
        compact
    );

    let start = Instant::now();
    let options = BuildOptions {
        organization,
        compact_routing: compact,
        duplicate_grid_pin: config.fabric.duplicate_grid_pin,
    };
    let FabricModules { graph, placement } = FabricBuilder::new(device, options).build_all()?;
    let graph = graph.freeze()?;
    log::info!(
        "built {} modules in {:.2?}",
        graph.len(),
        start.elapsed()
    );

    let start = Instant::now();
    let accountant = ConfigBitAccountant::new(&graph, device, organization)?;
    let roots = placement.physical_blocks(&graph)?;
    let manager = build_device_bitstream(&graph, &accountant, &roots)?;
    let fabric = build_fabric_bitstream(&manager, organization)?;
    let bitstream_xml = match &config.output.bitstream {
        Some(name) => Some((out_dir.join(name), render_bitstream_xml(&manager)?)),
        None => None,
    };
    log::info!(
        "counted {} configuration bits over {} blocks in {:.2?}",
        fabric.len(),
        manager.len(),
        start.elapsed()
    );

    let sdc_options = SdcOptions {
        constrain_switch_blocks: config.sdc.constrain_switch_blocks,
        constrain_connection_blocks: config.sdc.constrain_connection_blocks,
        compact,
    };
    let sdc = SdcEmitter::new(&graph, &placement, device, sdc_options).render_all()?;
    let bits = accountant
        .iter()
        .map(|(module, bits)| Ok((graph.try_module(module)?.name.clone(), bits)))
        .collect::<FabricResult<BTreeMap<_, _>>>()?;

    let bitstream = match bitstream_xml {
        Some((path, xml)) => {
            write_bitstream_xml(&xml, &path)?;
            Some(path)
        }
        None => None,
    };
    let sdc_dir = out_dir.join(&config.output.sdc_dir);
    let sdc_files = match write_sdc_files(&sdc_dir, &sdc) {
        Ok(files) => files,
        Err(e) => {
            if let Some(path) = &bitstream {
                if let Err(remove) = std::fs::remove_file(path) {
                    log::warn!("could not remove {}: {remove}", path.display());
                }
            }
            return Err(e);
        }
    };
    log::info!(
        "wrote {} constraint files to {}",
        sdc_files.len(),
        sdc_dir.display()
    );

    Ok(FabricReport {
        module_count: graph.len(),
        bits,
        sdc_files,
        bitstream,
        fabric_bits: fabric.len(),
    })
}
