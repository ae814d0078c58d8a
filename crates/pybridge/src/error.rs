//! Error taxonomy for the host bridge.

use std::path::PathBuf;

use crate::runtime::RuntimeError;

/// Errors surfaced by the bridge.
///
/// Everything here is fatal to the session except where noted on the
/// operations themselves: per-entry read failures during materialization are
/// logged and skipped rather than reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No host location satisfied the package-detection heuristic.
    #[error("shell package not found; attempted locations: {}", join_paths(.attempted))]
    PackageNotFound {
        /// Every host location that was probed, in probe order.
        attempted: Vec<PathBuf>,
    },

    /// No bootstrap script could be resolved.
    #[error("bootstrap script not found; attempted locations: {}", join_paths(.attempted))]
    ScriptNotFound {
        /// Every host location that was probed, in probe order.
        attempted: Vec<PathBuf>,
    },

    /// A virtual destination could not be created or written.
    #[error("failed to materialize virtual destination {path}: {source}")]
    Materialization {
        /// The virtual path that could not be materialized.
        path: String,
        /// The runtime's own error.
        source: RuntimeError,
    },

    /// The embedded runtime reported a failure executing injected source.
    #[error("embedded runtime execution failed: {0}")]
    RuntimeExecution(#[source] RuntimeError),

    /// Host-side I/O failed (terminal or host filesystem).
    #[error("host I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
