//! Per-cycle mesh cache.
//!
//! One entry per mesh name, holding the fetched object and the domain
//! bookkeeping derived from it. Entries are snapshots of a single
//! timestep: the whole cache is dropped when the cycle finishes.

use std::collections::HashMap;

use crate::bridge_error::MeshBridgeError;
use crate::comm::Communicator;
use crate::dataset::{DataObject, DataSet};

/// Cached state for one mesh.
#[derive(Clone, Debug)]
pub struct MeshEntry {
    pub(crate) object: DataObject,
    pub(crate) structure_only: bool,
    /// Flat domain ids owned by this rank, ascending.
    pub(crate) local_domains: Vec<usize>,
    /// Owned domain count of every rank, index = rank.
    pub(crate) domains_per_rank: Vec<i32>,
    pub(crate) has_ghost_cells: bool,
}

impl MeshEntry {
    /// Unpack `object` and agree on per-rank domain counts. Collective:
    /// every rank must construct the entry for the same mesh together.
    pub fn new<C: Communicator>(
        object: DataObject,
        structure_only: bool,
        comm: &C,
    ) -> Result<Self, MeshBridgeError> {
        let local_domains: Vec<usize> =
            object.leaves().into_iter().map(|(flat, _)| flat).collect();
        let domains_per_rank = comm.all_gather_i32(local_domains.len() as i32)?;
        Ok(Self {
            object,
            structure_only,
            local_domains,
            domains_per_rank,
            has_ghost_cells: false,
        })
    }

    pub fn object(&self) -> &DataObject {
        &self.object
    }

    pub fn is_structure_only(&self) -> bool {
        self.structure_only
    }

    pub fn has_ghost_cells(&self) -> bool {
        self.has_ghost_cells
    }

    pub fn local_domains(&self) -> &[usize] {
        &self.local_domains
    }

    pub fn domains_per_rank(&self) -> &[i32] {
        &self.domains_per_rank
    }

    /// Domains owned across all ranks.
    pub fn total_domains(&self) -> usize {
        self.domains_per_rank.iter().map(|&n| n as usize).sum()
    }

    /// Position of a flat domain id in the owned list, `None` when the
    /// domain lives on another rank.
    pub fn local_index(&self, domain: usize) -> Option<usize> {
        self.local_domains.iter().position(|&d| d == domain)
    }

    /// Locally owned dataset for a flat domain id.
    pub fn local_dataset(&self, domain: usize) -> Option<&DataSet> {
        self.local_index(domain)
            .and_then(|_| self.object.leaf(domain))
    }

    /// Lowest rank owning at least one domain. `None` means no rank has
    /// data for this mesh.
    pub fn representative_rank(&self) -> Option<usize> {
        self.domains_per_rank.iter().position(|&n| n > 0)
    }
}

/// All mesh entries of the current query cycle, keyed by mesh name.
#[derive(Debug, Default)]
pub struct MeshCache {
    entries: HashMap<String, MeshEntry>,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replacing any previous entry for the same mesh.
    pub fn insert(&mut self, mesh: impl Into<String>, entry: MeshEntry) {
        self.entries.insert(mesh.into(), entry);
    }

    pub fn get(&self, mesh: &str) -> Option<&MeshEntry> {
        self.entries.get(mesh)
    }

    pub fn get_mut(&mut self, mesh: &str) -> Option<&mut MeshEntry> {
        self.entries.get_mut(mesh)
    }

    pub fn contains(&self, mesh: &str) -> bool {
        self.entries.contains_key(mesh)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::NoComm;
    use crate::dataset::{
        AmrBox, AmrLevel, DataArray, OverlappingAmr, ScalarValues, UniformGrid,
    };

    fn patch(extent: [i32; 6]) -> DataSet {
        DataSet::Uniform(
            UniformGrid::new(extent, [0.0; 3], [1.0; 3]).unwrap(),
        )
    }

    fn partially_owned_amr() -> DataObject {
        let mut coarse = AmrLevel::new(2, 1).unwrap();
        coarse.set_box(0, AmrBox::new([0, 0, 0], [9, 9, 0]).unwrap()).unwrap();
        coarse.set_patch(0, patch([0, 10, 0, 10, 0, 0])).unwrap();
        let mut fine = AmrLevel::new(2, 2).unwrap();
        fine.set_box(0, AmrBox::new([0, 0, 0], [9, 9, 0]).unwrap()).unwrap();
        fine.set_box(1, AmrBox::new([10, 0, 0], [19, 9, 0]).unwrap()).unwrap();
        fine.set_patch(1, patch([10, 20, 0, 10, 0, 0])).unwrap();
        DataObject::Amr(OverlappingAmr::new(vec![coarse, fine]).unwrap())
    }

    #[test]
    fn entry_counts_owned_leaves() {
        let entry = MeshEntry::new(partially_owned_amr(), false, &NoComm).unwrap();
        assert_eq!(entry.local_domains(), &[0, 2]);
        assert_eq!(entry.domains_per_rank(), &[2]);
        assert_eq!(entry.total_domains(), 2);
        assert_eq!(entry.representative_rank(), Some(0));
    }

    #[test]
    fn local_index_is_position_in_owned_list() {
        let entry = MeshEntry::new(partially_owned_amr(), false, &NoComm).unwrap();
        assert_eq!(entry.local_index(0), Some(0));
        assert_eq!(entry.local_index(2), Some(1));
        assert_eq!(entry.local_index(1), None);
        assert!(entry.local_dataset(2).is_some());
        assert!(entry.local_dataset(1).is_none());
    }

    #[test]
    fn cache_replaces_and_clears() {
        let mut cache = MeshCache::new();
        let single = DataObject::Single(patch([0, 4, 0, 4, 0, 4]));
        cache.insert("mesh", MeshEntry::new(single, true, &NoComm).unwrap());
        assert!(cache.get("mesh").unwrap().is_structure_only());

        let full = DataObject::Single(patch([0, 4, 0, 4, 0, 4]));
        cache.insert("mesh", MeshEntry::new(full, false, &NoComm).unwrap());
        assert!(!cache.get("mesh").unwrap().is_structure_only());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn empty_mesh_has_no_representative() {
        let level = AmrLevel::new(1, 1).unwrap();
        let object = DataObject::Amr(OverlappingAmr::new(vec![level]).unwrap());
        let entry = MeshEntry::new(object, false, &NoComm).unwrap();
        assert_eq!(entry.representative_rank(), None);
        assert_eq!(entry.total_domains(), 0);
    }

    #[test]
    fn point_data_reachable_through_entry() {
        let mut grid = UniformGrid::new([0, 1, 0, 1, 0, 0], [0.0; 3], [1.0; 3]).unwrap();
        grid.point_data_mut().insert(
            DataArray::new("t", 1, ScalarValues::F64(vec![0.0, 1.0, 2.0, 3.0])).unwrap(),
        );
        let object = DataObject::Single(DataSet::Uniform(grid));
        let entry = MeshEntry::new(object, false, &NoComm).unwrap();
        let ds = entry.local_dataset(0).unwrap();
        assert!(ds.point_data().get("t").is_some());
    }
}
