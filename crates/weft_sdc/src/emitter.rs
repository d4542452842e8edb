//! Delay constraints for the routing multiplexers of switch and connection blocks.

use crate::directive::{render_sdc, MaxDelay};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use weft_arch::{CbKind, ConnectionBlock, DeviceContext, SwitchBlock, TrackDirection};
use weft_build::{naming, BlockPortResolver, DriverPort, FabricPlacement};
use weft_common::{FabricError, FabricResult};
use weft_module::{ModuleGraph, ModuleId};

/// What to constrain and how to group it into files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdcOptions {
    /// Emit files for switch blocks.
    pub constrain_switch_blocks: bool,
    /// Emit files for connection blocks.
    pub constrain_connection_blocks: bool,
    /// One file per distinct block module instead of one per position.
    pub compact: bool,
}

impl Default for SdcOptions {
    fn default() -> Self {
        Self {
            constrain_switch_blocks: true,
            constrain_connection_blocks: true,
            compact: true,
        }
    }
}

/// A rendered constraint file, not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct SdcFile {
    /// File name inside the output directory.
    pub file_name: String,
    /// Full file content.
    pub content: String,
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Switch(u32, u32),
    Connection(CbKind, u32, u32),
}

/// Emits `set_max_delay` constraints for every routing multiplexer.
///
/// Each multiplexer input gets one directive from the port feeding it to the
/// port it drives, bounded by the delay of the driving switch. Pass-through
/// tracks, single-driver outputs and input pins fed directly by a grid
/// output are not constrained.
pub struct SdcEmitter<'a> {
    graph: &'a ModuleGraph,
    placement: &'a FabricPlacement,
    device: &'a DeviceContext,
    options: SdcOptions,
}

impl<'a> SdcEmitter<'a> {
    /// Creates an emitter over a finished graph and its placement.
    pub fn new(
        graph: &'a ModuleGraph,
        placement: &'a FabricPlacement,
        device: &'a DeviceContext,
        options: SdcOptions,
    ) -> Self {
        Self {
            graph,
            placement,
            device,
            options,
        }
    }

    fn resolver(&self) -> BlockPortResolver<'a> {
        BlockPortResolver::new(&self.device.routing)
    }

    fn directives(
        &self,
        module: ModuleId,
        prefix: &str,
        sink: &str,
        drivers: &[DriverPort],
    ) -> FabricResult<Vec<MaxDelay>> {
        let m = self.graph.try_module(module)?;
        let check = |port: &str| {
            m.find_port(port).map(|_| ()).ok_or_else(|| {
                FabricError::lookup(format!("module '{}' has no port '{port}'", m.name))
            })
        };
        check(sink)?;
        drivers
            .iter()
            .map(|driver| {
                check(&driver.port)?;
                Ok(MaxDelay {
                    from: format!("{prefix}/{}", driver.port),
                    to: format!("{prefix}/{sink}"),
                    delay_ns: self.device.switch(driver.switch)?.delay(),
                })
            })
            .collect()
    }

    /// Constraints of the multiplexers of a switch block built as `module`,
    /// with ports prefixed by `prefix`.
    pub fn switch_block_constraints(
        &self,
        sb: &SwitchBlock,
        module: ModuleId,
        prefix: &str,
    ) -> FabricResult<Vec<MaxDelay>> {
        let resolver = self.resolver();
        let mut out = Vec::new();
        for side in &sb.sides {
            for track in &side.tracks {
                if track.direction != TrackDirection::Out || resolver.is_passing(sb, track.node) {
                    continue;
                }
                let drivers = resolver.sb_driver_ports(sb, track.node)?;
                if drivers.len() < 2 {
                    continue;
                }
                let sink = resolver.sb_output_port(sb, track.node)?;
                out.extend(self.directives(module, prefix, &sink, &drivers)?);
            }
        }
        Ok(out)
    }

    /// Constraints of the multiplexers of a connection block built as
    /// `module`, with ports prefixed by `prefix`.
    pub fn connection_block_constraints(
        &self,
        cb: &ConnectionBlock,
        module: ModuleId,
        prefix: &str,
    ) -> FabricResult<Vec<MaxDelay>> {
        let resolver = self.resolver();
        let mut out = Vec::new();
        for ipin in &cb.ipins {
            if resolver.is_direct_ipin(ipin.node)? {
                continue;
            }
            let drivers = resolver.cb_driver_ports(cb, ipin.node)?;
            if drivers.len() < 2 {
                continue;
            }
            let sink = resolver.cb_ipin_port(cb, ipin.node)?;
            out.extend(self.directives(module, prefix, &sink, &drivers)?);
        }
        Ok(out)
    }

    /// The blocks to emit, as `(file stem, target, module)`.
    fn targets(&self) -> FabricResult<Vec<(String, Target, ModuleId)>> {
        let mut targets = Vec::new();
        let stem = |module: ModuleId, physical: String| -> FabricResult<String> {
            if self.options.compact {
                Ok(self.graph.try_module(module)?.name.clone())
            } else {
                Ok(physical)
            }
        };
        if self.options.constrain_switch_blocks {
            let blocks: Vec<_> = if self.options.compact {
                self.placement.unique_switch_blocks()
            } else {
                self.placement
                    .switch_blocks
                    .iter()
                    .map(|(&k, &m)| (k, m))
                    .collect()
            };
            for ((x, y), module) in blocks {
                targets.push((
                    stem(module, naming::switch_block(x, y))?,
                    Target::Switch(x, y),
                    module,
                ));
            }
        }
        if self.options.constrain_connection_blocks {
            let blocks: Vec<_> = if self.options.compact {
                self.placement.unique_connection_blocks()
            } else {
                self.placement
                    .connection_blocks
                    .iter()
                    .map(|(&k, &m)| (k, m))
                    .collect()
            };
            for ((kind, x, y), module) in blocks {
                targets.push((
                    stem(module, naming::connection_block(kind, x, y))?,
                    Target::Connection(kind, x, y),
                    module,
                ));
            }
        }
        Ok(targets)
    }

    fn render(&self, stem: &str, target: Target, module: ModuleId) -> FabricResult<SdcFile> {
        let routing = &self.device.routing;
        let (directives, description) = match target {
            Target::Switch(x, y) => {
                let sb = routing.switch_block_at(x, y).ok_or_else(|| {
                    FabricError::lookup(format!("no switch block at ({x}, {y})"))
                })?;
                (
                    self.switch_block_constraints(sb, module, stem)?,
                    format!("Routing multiplexer delays of switch block {stem}"),
                )
            }
            Target::Connection(kind, x, y) => {
                let cb = routing.connection_block_at(kind, x, y).ok_or_else(|| {
                    FabricError::lookup(format!(
                        "no connection block {}",
                        naming::connection_block(kind, x, y)
                    ))
                })?;
                (
                    self.connection_block_constraints(cb, module, stem)?,
                    format!("Routing multiplexer delays of connection block {stem}"),
                )
            }
        };
        Ok(SdcFile {
            file_name: format!("{stem}.sdc"),
            content: render_sdc(&description, &directives),
        })
    }

    /// Renders every constraint file in memory.
    pub fn render_all(&self) -> FabricResult<Vec<SdcFile>> {
        self.targets()?
            .par_iter()
            .map(|(stem, target, module)| self.render(stem, *target, *module))
            .collect()
    }

    /// Renders every constraint file, then writes them all into `dir`.
    ///
    /// Nothing is written unless every file rendered.
    pub fn emit(&self, dir: &Path) -> FabricResult<Vec<PathBuf>> {
        let start = Instant::now();
        log::info!("writing timing constraints to {}...", dir.display());
        let files = self.render_all()?;
        let written = write_sdc_files(dir, &files)?;
        log::info!(
            "wrote {} constraint files in {:.3}s",
            written.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(written)
    }
}

/// Writes rendered constraint files into `dir`, creating it if needed.
///
/// Either every file is written or none is: on the first failure the files
/// already written are removed again, as is `dir` if this call created it.
pub fn write_sdc_files(dir: &Path, files: &[SdcFile]) -> FabricResult<Vec<PathBuf>> {
    let created = !dir.exists();
    std::fs::create_dir_all(dir).map_err(|e| FabricError::io(dir, e))?;
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = dir.join(&file.file_name);
        if let Err(e) = std::fs::write(&path, &file.content) {
            log::warn!(
                "failed to write {}, removing {} constraint files already written",
                path.display(),
                written.len()
            );
            remove_written(&written, created.then_some(dir));
            return Err(FabricError::io(&path, e));
        }
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Best-effort removal of files from an aborted write.
fn remove_written(paths: &[PathBuf], dir: Option<&Path>) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("could not remove {}: {e}", path.display());
        }
    }
    if let Some(dir) = dir {
        let _ = std::fs::remove_dir(dir);
    }
}
