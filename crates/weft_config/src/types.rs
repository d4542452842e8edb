//! Configuration types deserialized from `weft.toml`.

use serde::Deserialize;
use weft_common::ConfigOrganization;

/// The top-level configuration parsed from `weft.toml`.
#[derive(Debug, Deserialize)]
pub struct FabricConfig {
    /// Fabric identity and generation options.
    pub fabric: FabricSection,
    /// Output locations for generated artifacts.
    #[serde(default)]
    pub output: OutputConfig,
    /// Timing-constraint generation switches.
    #[serde(default)]
    pub sdc: SdcConfig,
}

/// The `[fabric]` section.
#[derive(Debug, Deserialize)]
pub struct FabricSection {
    /// The fabric name, used in logs and artifact headers.
    pub name: String,
    /// Path of the JSON device description, relative to the project directory.
    pub device: String,
    /// Share one module between structurally identical routing blocks.
    #[serde(default = "default_true")]
    pub compact_routing_hierarchy: bool,
    /// How configuration memories are organized.
    #[serde(default)]
    pub config_organization: ConfigOrganization,
    /// Expose each tile output pin twice, with `upper` and `lower` suffixes.
    #[serde(default)]
    pub duplicate_grid_pin: bool,
}

/// The `[output]` section.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one `.sdc` file per routing block.
    #[serde(default = "default_sdc_dir")]
    pub sdc_dir: String,
    /// File receiving the architecture-independent bitstream, if any.
    #[serde(default)]
    pub bitstream: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sdc_dir: default_sdc_dir(),
            bitstream: None,
        }
    }
}

/// The `[sdc]` section.
#[derive(Debug, Deserialize)]
pub struct SdcConfig {
    /// Emit constraints for switch-block multiplexers.
    #[serde(default = "default_true")]
    pub constrain_switch_blocks: bool,
    /// Emit constraints for connection-block multiplexers.
    #[serde(default = "default_true")]
    pub constrain_connection_blocks: bool,
}

impl Default for SdcConfig {
    fn default() -> Self {
        Self {
            constrain_switch_blocks: true,
            constrain_connection_blocks: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sdc_dir() -> String {
    "SDC".to_string()
}
