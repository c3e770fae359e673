//! MeshBridgeError: Unified error type for mesh-bridge public APIs
//!
//! Every fallible operation in the crate reports through this enum so that
//! callers embedding the bridge in a larger coupling can match on one type.

use thiserror::Error;

/// Unified error type for mesh-bridge operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshBridgeError {
    /// The data source does not advertise a mesh with this name.
    #[error("no mesh named `{0}` is advertised by the data source")]
    UnknownMesh(String),
    /// The data set kind cannot be expressed in the canonical exposure model.
    #[error("mesh `{mesh}`: cannot expose `{kind}` data sets")]
    UnsupportedDataSet { mesh: String, kind: String },
    /// A structured mesh arrived without the coordinate arrays it requires.
    #[error("mesh `{mesh}`: coordinate arrays are missing or incomplete")]
    MissingCoordinates { mesh: String },
    /// The resolved array is absent even after asking the source to add it.
    #[error("mesh `{mesh}` has no {centering}-centered array `{array}`")]
    MissingArray {
        mesh: String,
        array: String,
        centering: &'static str,
    },
    /// Several meshes advertise arrays and the name carries no `mesh/` qualifier.
    #[error("variable name `{0}` is ambiguous; qualify it as `mesh/array`")]
    AmbiguousVariable(String),
    /// The external name does not map back to any advertised array.
    #[error("variable name `{0}` does not match any advertised array")]
    UnknownVariable(String),
    /// An array's shape is inconsistent with its component count.
    #[error("array `{name}` is malformed: {detail}")]
    InvalidArray { name: String, detail: String },
    /// A data set was assembled from pieces that do not agree with each other.
    #[error("data set construction rejected: {0}")]
    MalformedDataSet(String),
    /// Nesting was requested for a mesh that is not an overlapping AMR collection.
    #[error("mesh `{0}` is not an overlapping AMR collection")]
    NotAmr(String),
    /// A refetch within one query cycle produced a different domain layout.
    #[error("mesh `{0}` changed its domain layout between queries in one cycle")]
    MeshLayoutChanged(String),
    /// The simulation-side data source reported a failure.
    #[error("data source failure during {op}: {detail}")]
    Source { op: &'static str, detail: String },
    /// A collective exchange observed malformed traffic. With a correct
    /// service layer every rank issues the same collective sequence, so this
    /// only fires on transport faults, not on application logic.
    #[error("collective communication fault on rank {rank}: {detail}")]
    CollectiveMismatch { rank: usize, detail: String },
}

impl MeshBridgeError {
    /// Shorthand used by data-source adaptors wrapping foreign failures.
    pub fn source_failure(op: &'static str, detail: impl Into<String>) -> Self {
        MeshBridgeError::Source {
            op,
            detail: detail.into(),
        }
    }
}
