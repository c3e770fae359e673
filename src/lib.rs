#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-bridge
//!
//! mesh-bridge is an in-situ coupling layer for simulation codes: it exposes a
//! running simulation's meshes and fields to an external analysis engine
//! without copying bulk data where the element types allow it. The simulation
//! side implements [`source::DataSource`]; the engine side drives
//! [`source::MeshService`], which [`exposure::MeshBridge`] implements on top of
//! any data source and any communicator.
//!
//! ## Features
//! - Canonical mesh model for uniform, rectilinear, curvilinear, point,
//!   unstructured and overlapping-AMR data, with named point/cell arrays
//! - Per-cycle metadata pass that agrees on domain ownership across ranks and
//!   advertises meshes and variables under stable external names
//! - Zero-copy variable exposure for engine-native element types, element-wise
//!   `f64` widening for the rest
//! - Distributed reconstruction of AMR parent/child nesting from per-rank
//!   patch boxes
//! - Pluggable collectives (serial, in-process, MPI) behind one four-operation
//!   trait
//!
//! ## SPMD contract
//!
//! Every rank must issue the same service calls in the same order. The
//! collective backends exchange raw payloads without tagging; a rank that
//! falls out of step deadlocks instead of reading another call's data.
//!
//! ## Usage
//! Add `mesh-bridge` as a dependency in your `Cargo.toml` and enable features
//! as needed:
//!
//! ```toml
//! [dependencies]
//! mesh-bridge = "0.4.0"
//! # Optional features:
//! # features = ["mpi-support"]
//! ```

pub mod bridge_error;
pub mod comm;
pub mod dataset;
pub mod exposure;
pub mod external;
pub mod runtime;
pub mod source;

pub use bridge_error::MeshBridgeError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::bridge_error::MeshBridgeError;
    pub use crate::comm::Communicator;
    #[cfg(feature = "mpi-support")]
    pub use crate::comm::MpiComm;
    pub use crate::comm::{LocalComm, LocalWorld, NoComm};
    pub use crate::dataset::{
        AmrBox, AmrLevel, Association, AttributeSet, CellKind, DataArray, DataObject,
        DataSet, MultiBlock, OverlappingAmr, PolyData, RectilinearGrid, ScalarValues,
        StructuredGrid, UniformGrid, UnstructuredGrid,
    };
    pub use crate::exposure::{BridgeOptions, MeshBridge};
    pub use crate::external::{
        DomainList, DomainNesting, ExternalMesh, MeshMetadata, MeshType, PatchNesting,
        SimulationMetadata, VariableData, VariableMetadata, VariableValues, WireCellType,
    };
    pub use crate::runtime::RuntimeGuard;
    pub use crate::source::{DataSource, MeshService};
}
