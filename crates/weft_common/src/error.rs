//! Common result and error types for fabric generation.

use std::path::PathBuf;

/// The standard result type for every fallible fabric-generation operation.
pub type FabricResult<T> = Result<T, FabricError>;

/// An unrecoverable fabric-generation error.
///
/// Every variant aborts the current run. A partially built module graph is
/// never handed to the bit accountant or the constraint emitter, and no
/// constraint file is written once an error has been raised.
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// The device description is malformed: a hierarchy node is missing or an
    /// interconnect edge has no valid implementation.
    #[error("structural error: {0}")]
    Structural(String),

    /// An expected module, port, circuit model, or mux-library entry was not found.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Two sides of a connection disagree, e.g. mismatched pin widths or a
    /// second source attached to a net.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// An output file or directory could not be created or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl FabricError {
    /// Creates a [`FabricError::Structural`] error.
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }

    /// Creates a [`FabricError::Lookup`] error.
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup(message.into())
    }

    /// Creates a [`FabricError::Consistency`] error.
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency(message.into())
    }

    /// Wraps an I/O error together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_structural() {
        let err = FabricError::structural("block 'clb' has no physical mode");
        assert_eq!(
            format!("{err}"),
            "structural error: block 'clb' has no physical mode"
        );
    }

    #[test]
    fn display_lookup() {
        let err = FabricError::lookup("no mux entry for mux_tree with fan-in 9");
        assert_eq!(
            format!("{err}"),
            "lookup error: no mux entry for mux_tree with fan-in 9"
        );
    }

    #[test]
    fn display_consistency() {
        let err = FabricError::consistency("width 2 vs 3");
        assert_eq!(format!("{err}"), "consistency error: width 2 vs 3");
    }

    #[test]
    fn display_io_carries_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = FabricError::io("/tmp/sdc/sb_1__1_.sdc", io);
        let display = format!("{err}");
        assert!(display.starts_with("I/O error at /tmp/sdc/sb_1__1_.sdc"));
        assert!(display.ends_with("denied"));
    }

    #[test]
    fn result_propagates_with_question_mark() {
        fn inner() -> FabricResult<u32> {
            Err(FabricError::lookup("missing"))
        }
        fn outer() -> FabricResult<u32> {
            let v = inner()?;
            Ok(v + 1)
        }
        assert!(matches!(outer(), Err(FabricError::Lookup(_))));
    }
}
