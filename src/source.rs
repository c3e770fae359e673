//! Collaborator seams between the simulation and the engine coupling.

use crate::bridge_error::MeshBridgeError;
use crate::dataset::{Association, DataObject};
use crate::external::{
    DomainList, DomainNesting, ExternalMesh, SimulationMetadata, VariableData,
};

/// Simulation-side provider of meshes and arrays.
///
/// Fetch methods take `&mut self` because providers typically assemble
/// objects on demand. A provider reports what it can supply for the
/// current cycle; the bridge caches what it fetches and never asks for
/// the same thing twice within a cycle.
pub trait DataSource {
    /// Names of the meshes the simulation can provide this cycle.
    fn mesh_names(&mut self) -> Result<Vec<String>, MeshBridgeError>;

    /// Fetch a mesh. With `structure_only` the provider may omit bulk
    /// data and supply only the structure needed for metadata.
    fn mesh(&mut self, mesh: &str, structure_only: bool)
    -> Result<DataObject, MeshBridgeError>;

    /// Names of the arrays available on `mesh` with the given centering.
    fn array_names(
        &mut self,
        mesh: &str,
        association: Association,
    ) -> Result<Vec<String>, MeshBridgeError>;

    /// Inject one named array into an already fetched object.
    fn add_array(
        &mut self,
        object: &mut DataObject,
        mesh: &str,
        association: Association,
        name: &str,
    ) -> Result<(), MeshBridgeError>;

    /// Ghost node layer count for `mesh`, zero when it has none.
    fn ghost_node_layers(&mut self, mesh: &str) -> Result<u32, MeshBridgeError>;

    /// Ghost cell layer count for `mesh`, zero when it has none.
    fn ghost_cell_layers(&mut self, mesh: &str) -> Result<u32, MeshBridgeError>;

    /// Inject the ghost node marker array into a fetched object.
    fn add_ghost_nodes(
        &mut self,
        object: &mut DataObject,
        mesh: &str,
    ) -> Result<(), MeshBridgeError>;

    /// Inject the ghost cell marker array into a fetched object.
    fn add_ghost_cells(
        &mut self,
        object: &mut DataObject,
        mesh: &str,
    ) -> Result<(), MeshBridgeError>;

    /// Current simulation cycle number.
    fn time_step(&self) -> i64;

    /// Current simulation time.
    fn time(&self) -> f64;
}

/// Engine-facing query surface, one method per engine request.
///
/// All ranks must issue the same requests in the same order; the
/// implementations run collective operations.
pub trait MeshService {
    /// Describe every mesh and variable available this cycle.
    fn simulation_metadata(&mut self) -> Result<SimulationMetadata, MeshBridgeError>;

    /// Produce one mesh domain. `Ok(None)` when `domain` lives on
    /// another rank.
    fn mesh(&mut self, domain: usize, mesh: &str)
    -> Result<Option<ExternalMesh>, MeshBridgeError>;

    /// Produce one variable on one domain. `Ok(None)` when `domain`
    /// lives on another rank.
    fn variable(
        &mut self,
        domain: usize,
        name: &str,
    ) -> Result<Option<VariableData>, MeshBridgeError>;

    /// Domains of `mesh` owned by the calling rank.
    fn domain_list(&mut self, mesh: &str) -> Result<DomainList, MeshBridgeError>;

    /// Reconstruct the nesting of an overlapping AMR mesh. `Ok(None)`
    /// when the mesh already carries ghost cells, which encode the
    /// nesting implicitly.
    fn domain_nesting(
        &mut self,
        mesh: &str,
    ) -> Result<Option<DomainNesting>, MeshBridgeError>;

    /// Drop per-cycle cached state. Called once the engine is done with
    /// the current cycle.
    fn finish_cycle(&mut self);
}
