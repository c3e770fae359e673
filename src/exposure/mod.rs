//! Engine-facing exposure of simulation data.
//!
//! [`bridge::MeshBridge`] implements [`crate::source::MeshService`] on
//! top of a [`crate::source::DataSource`]: it fetches meshes once per
//! cycle, agrees on domain ownership across ranks, and converts owned
//! domains into the engine's representations on demand.

pub mod bridge;
pub mod cache;
pub mod convert;
pub mod domains;
pub mod metadata;
pub mod nesting;
pub mod variables;

pub use bridge::MeshBridge;
pub use cache::{MeshCache, MeshEntry};

use crate::bridge_error::MeshBridgeError;
use crate::dataset::DataObject;
use crate::source::DataSource;

/// Default cell array consulted for the prebuilt-ghost advertisement.
pub const DEFAULT_GHOST_ARRAY: &str = "ghost_type";

/// Tunables of the exposure layer.
#[derive(Clone, Debug)]
pub struct BridgeOptions {
    /// Cell array name whose presence marks a mesh as already ghosted.
    pub ghost_array_name: String,
    /// Fetch metadata-time meshes without bulk arrays. Full data is
    /// fetched lazily when a mesh or variable is first requested.
    pub structure_only_metadata: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            ghost_array_name: DEFAULT_GHOST_ARRAY.to_string(),
            structure_only_metadata: true,
        }
    }
}

/// Attach the source's ghost marker arrays to a fetched object. A
/// failed layer query and a failed injection both bubble up; callers
/// treat either as the mesh being unavailable this cycle.
pub(crate) fn inject_ghost_arrays<S: DataSource>(
    source: &mut S,
    mesh: &str,
    object: &mut DataObject,
) -> Result<(), MeshBridgeError> {
    if source.ghost_node_layers(mesh)? > 0 {
        source.add_ghost_nodes(object, mesh)?;
    }
    if source.ghost_cell_layers(mesh)? > 0 {
        source.add_ghost_cells(object, mesh)?;
    }
    Ok(())
}
