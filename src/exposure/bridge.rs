//! The bridge between a data source and the analysis engine.
//!
//! One `MeshBridge` serves one coupled simulation. Its lifetime brackets
//! the engine runtime through [`RuntimeGuard`], and its cache brackets
//! one query cycle: `simulation_metadata` fills it, the mesh, variable,
//! domain and nesting queries read it, `finish_cycle` drops it.
//!
//! Metadata-time fetches are structure-only by default. The first mesh
//! or variable request upgrades the affected entry to a full fetch and
//! re-attaches the source's ghost arrays, which a plain refetch would
//! lose. An upgrade that comes back with a different domain layout is
//! refused: ownership was already agreed across ranks when the entry
//! was built.

use crate::bridge_error::MeshBridgeError;
use crate::comm::Communicator;
use crate::dataset::Association;
use crate::exposure::cache::MeshCache;
use crate::exposure::{
    convert, domains, inject_ghost_arrays, metadata, nesting, variables, BridgeOptions,
};
use crate::external::{
    DomainList, DomainNesting, ExternalMesh, SimulationMetadata, VariableData,
};
use crate::runtime::RuntimeGuard;
use crate::source::{DataSource, MeshService};

/// Engine-facing service over a simulation data source.
pub struct MeshBridge<S, C> {
    source: S,
    comm: C,
    options: BridgeOptions,
    cache: MeshCache,
    _runtime: RuntimeGuard,
}

impl<S, C> MeshBridge<S, C>
where
    S: DataSource,
    C: Communicator,
{
    pub fn new(source: S, comm: C) -> Self {
        Self::with_options(source, comm, BridgeOptions::default())
    }

    pub fn with_options(source: S, comm: C, options: BridgeOptions) -> Self {
        Self {
            source,
            comm,
            options,
            cache: MeshCache::new(),
            _runtime: RuntimeGuard::acquire(),
        }
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    pub fn communicator(&self) -> &C {
        &self.comm
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The simulation advances its state through the source between
    /// cycles; the bridge does not mediate that.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Upgrade a structure-only entry to a full fetch, keeping the
    /// ownership and ghost bookkeeping agreed at metadata time.
    fn ensure_full_entry(&mut self, mesh: &str) -> Result<(), MeshBridgeError> {
        match self.cache.get(mesh) {
            None => return Err(MeshBridgeError::UnknownMesh(mesh.to_string())),
            Some(entry) if !entry.is_structure_only() => return Ok(()),
            Some(_) => {}
        }
        let mut object = self.source.mesh(mesh, false)?;
        inject_ghost_arrays(&mut self.source, mesh, &mut object)?;
        let fresh: Vec<usize> = object.leaves().into_iter().map(|(flat, _)| flat).collect();

        let Some(entry) = self.cache.get_mut(mesh) else {
            return Err(MeshBridgeError::UnknownMesh(mesh.to_string()));
        };
        if fresh != entry.local_domains {
            return Err(MeshBridgeError::MeshLayoutChanged(mesh.to_string()));
        }
        entry.object = object;
        entry.structure_only = false;
        Ok(())
    }
}

impl<S, C> MeshService for MeshBridge<S, C>
where
    S: DataSource,
    C: Communicator,
{
    fn simulation_metadata(&mut self) -> Result<SimulationMetadata, MeshBridgeError> {
        self.cache.clear();
        metadata::build(&mut self.source, &self.comm, &self.options, &mut self.cache)
    }

    fn mesh(
        &mut self,
        domain: usize,
        mesh: &str,
    ) -> Result<Option<ExternalMesh>, MeshBridgeError> {
        self.ensure_full_entry(mesh)?;
        let Some(entry) = self.cache.get(mesh) else {
            return Err(MeshBridgeError::UnknownMesh(mesh.to_string()));
        };
        let Some(dataset) = entry.local_dataset(domain) else {
            return Ok(None);
        };
        convert::convert(mesh, dataset, &self.options.ghost_array_name).map(Some)
    }

    fn variable(
        &mut self,
        domain: usize,
        name: &str,
    ) -> Result<Option<VariableData>, MeshBridgeError> {
        let mesh_names = self.source.mesh_names()?;
        let parsed = variables::parse(name, &mesh_names)?;

        // A bare name settles its centering by probing: point arrays
        // win over cell arrays of the same name, which is why colliding
        // cell arrays are advertised with the `cell_` prefix.
        let association = match parsed.association {
            Some(association) => association,
            None => {
                let points = self
                    .source
                    .array_names(&parsed.mesh, Association::Point)
                    .unwrap_or_default();
                if points.iter().any(|n| *n == parsed.array) {
                    Association::Point
                } else {
                    let cells = self
                        .source
                        .array_names(&parsed.mesh, Association::Cell)
                        .unwrap_or_default();
                    if cells.iter().any(|n| *n == parsed.array) {
                        Association::Cell
                    } else {
                        return Err(MeshBridgeError::UnknownVariable(name.to_string()));
                    }
                }
            }
        };

        self.ensure_full_entry(&parsed.mesh)?;
        let Some(entry) = self.cache.get(&parsed.mesh) else {
            return Err(MeshBridgeError::UnknownMesh(parsed.mesh));
        };
        if entry.local_index(domain).is_none() {
            return Ok(None);
        }
        if let Some(array) = entry
            .local_dataset(domain)
            .and_then(|ds| ds.attributes(association).get(&parsed.array))
        {
            return Ok(Some(convert::variable_data(array)));
        }

        // Not part of the fetched object; ask the source to attach it.
        let Some(entry) = self.cache.get_mut(&parsed.mesh) else {
            return Err(MeshBridgeError::UnknownMesh(parsed.mesh));
        };
        self.source
            .add_array(&mut entry.object, &parsed.mesh, association, &parsed.array)?;
        let Some(array) = entry
            .local_dataset(domain)
            .and_then(|ds| ds.attributes(association).get(&parsed.array))
        else {
            return Err(MeshBridgeError::MissingArray {
                mesh: parsed.mesh,
                array: parsed.array,
                centering: association.label(),
            });
        };
        Ok(Some(convert::variable_data(array)))
    }

    fn domain_list(&mut self, mesh: &str) -> Result<DomainList, MeshBridgeError> {
        domains::domain_list(&self.cache, mesh)
    }

    fn domain_nesting(
        &mut self,
        mesh: &str,
    ) -> Result<Option<DomainNesting>, MeshBridgeError> {
        // Boxes are part of the structure; no full-data upgrade needed.
        let Some(entry) = self.cache.get(mesh) else {
            return Err(MeshBridgeError::UnknownMesh(mesh.to_string()));
        };
        match nesting::reconstruct(&self.comm, mesh, entry) {
            // The engine probes every mesh; no hierarchy is an answer,
            // not a fault.
            Err(MeshBridgeError::NotAmr(_)) => Ok(None),
            outcome => outcome,
        }
    }

    fn finish_cycle(&mut self) {
        self.cache.clear();
    }
}
