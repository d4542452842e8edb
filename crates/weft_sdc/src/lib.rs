//! Timing constraints for Weft routing blocks.
//!
//! For every routing multiplexer the builder placed in a switch or
//! connection block, [`SdcEmitter`] writes one `set_max_delay` directive per
//! multiplexer input, bounded by the driving switch's delay
//! `R * Cout + Tdel`. Ports are resolved with the same
//! [`BlockPortResolver`](weft_build::BlockPortResolver) ordering the builder
//! wired the multiplexers with.
//!
//! In compact mode one file is written per distinct block module; otherwise
//! one per block position. Both give the same delay for every port pair.

#![warn(missing_docs)]

pub mod directive;
pub mod emitter;

pub use directive::{render_sdc, MaxDelay};
pub use emitter::{write_sdc_files, SdcEmitter, SdcFile, SdcOptions};
