//! Global-to-local domain translation.
//!
//! Domains carry one global id shared by every rank (the flat index of
//! the leaf within the mesh object). Each rank owns a subset; these
//! helpers answer ownership questions against the cycle cache.

use crate::bridge_error::MeshBridgeError;
use crate::exposure::cache::MeshCache;
use crate::external::DomainList;

/// Domains of `mesh` across all ranks.
pub fn total_domains(cache: &MeshCache, mesh: &str) -> Result<usize, MeshBridgeError> {
    cache
        .get(mesh)
        .map(|entry| entry.total_domains())
        .ok_or_else(|| MeshBridgeError::UnknownMesh(mesh.to_string()))
}

/// Local dataset index for a global domain id. `Ok(None)` when another
/// rank owns the domain, which is the usual outcome on most ranks.
pub fn local_index(
    cache: &MeshCache,
    mesh: &str,
    domain: usize,
) -> Result<Option<usize>, MeshBridgeError> {
    cache
        .get(mesh)
        .map(|entry| entry.local_index(domain))
        .ok_or_else(|| MeshBridgeError::UnknownMesh(mesh.to_string()))
}

/// Global domain ids owned by the calling rank.
pub fn local_domain_ids(
    cache: &MeshCache,
    mesh: &str,
) -> Result<Vec<usize>, MeshBridgeError> {
    cache
        .get(mesh)
        .map(|entry| entry.local_domains().to_vec())
        .ok_or_else(|| MeshBridgeError::UnknownMesh(mesh.to_string()))
}

/// Answer a "what do I own" query from the engine.
pub fn domain_list(cache: &MeshCache, mesh: &str) -> Result<DomainList, MeshBridgeError> {
    let entry = cache
        .get(mesh)
        .ok_or_else(|| MeshBridgeError::UnknownMesh(mesh.to_string()))?;
    Ok(DomainList {
        total_domains: entry.total_domains(),
        local_domain_ids: entry.local_domains().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::comm::LocalWorld;
    use crate::dataset::{
        AmrBox, AmrLevel, DataObject, DataSet, OverlappingAmr, UniformGrid,
    };
    use crate::exposure::cache::MeshEntry;

    fn patch() -> DataSet {
        DataSet::Uniform(UniformGrid::new([0, 4, 0, 4, 0, 0], [0.0; 3], [1.0; 3]).unwrap())
    }

    // Box layout is global; each rank fills only the patches it owns.
    fn amr_for_rank(rank: usize) -> DataObject {
        let mut coarse = AmrLevel::new(2, 1).unwrap();
        coarse.set_box(0, AmrBox::new([0, 0, 0], [9, 9, 0]).unwrap()).unwrap();
        let mut fine = AmrLevel::new(2, 2).unwrap();
        fine.set_box(0, AmrBox::new([0, 0, 0], [9, 9, 0]).unwrap()).unwrap();
        fine.set_box(1, AmrBox::new([10, 0, 0], [19, 9, 0]).unwrap()).unwrap();
        if rank == 0 {
            coarse.set_patch(0, patch()).unwrap();
        } else {
            fine.set_patch(0, patch()).unwrap();
            fine.set_patch(1, patch()).unwrap();
        }
        DataObject::Amr(OverlappingAmr::new(vec![coarse, fine]).unwrap())
    }

    #[test]
    fn ownership_agrees_across_ranks() {
        let world = LocalWorld::new(2);
        let handles: Vec<_> = (0..2)
            .map(|rank| {
                let world = Arc::clone(&world);
                thread::spawn(move || {
                    let comm = world.comm(rank);
                    let entry = MeshEntry::new(amr_for_rank(rank), false, &comm).unwrap();
                    let mut cache = MeshCache::new();
                    cache.insert("amr", entry);
                    (rank, domain_list(&cache, "amr").unwrap())
                })
            })
            .collect();
        for handle in handles {
            let (rank, list) = handle.join().unwrap();
            assert_eq!(list.total_domains, 3);
            if rank == 0 {
                assert_eq!(list.local_domain_ids, vec![0]);
            } else {
                assert_eq!(list.local_domain_ids, vec![1, 2]);
            }
        }
    }

    #[test]
    fn unknown_mesh_is_an_error() {
        let cache = MeshCache::new();
        assert!(matches!(
            domain_list(&cache, "absent"),
            Err(MeshBridgeError::UnknownMesh(_))
        ));
        assert!(matches!(
            total_domains(&cache, "absent"),
            Err(MeshBridgeError::UnknownMesh(_))
        ));
        assert!(matches!(
            local_index(&cache, "absent", 0),
            Err(MeshBridgeError::UnknownMesh(_))
        ));
    }
}
