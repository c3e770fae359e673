//! AMR nesting reconstruction.
//!
//! No rank holds box extents for every patch, so reconstruction runs in
//! three collective phases: an element-wise maximum reduction recovers
//! all patch extents everywhere (real extents are never negative, so the
//! -1 sentinel loses against any owner's value), a statically
//! partitioned parent/child scan splits the quadratic intersection work
//! across ranks, and a variable all-gather hands every rank the complete
//! relation set. Every rank finishes with the same nesting.

use crate::bridge_error::MeshBridgeError;
use crate::comm::Communicator;
use crate::exposure::cache::MeshEntry;
use crate::external::{DomainNesting, PatchNesting};

const UNSET: i32 = -1;

fn in_range(value: i32, lo: i32, hi: i32) -> bool {
    value >= lo && value <= hi
}

/// Endpoint overlap test between a parent extent scaled onto the child
/// level and a candidate child extent, both `[ilo, ihi, jlo, jhi, klo,
/// khi]`. The z axis is skipped for flat parents.
fn boxes_nest(parent: &[i32], child: &[i32], ratio: i32) -> bool {
    let scaled: [i32; 6] = std::array::from_fn(|i| parent[i] * ratio);
    let in_x = in_range(child[0], scaled[0], scaled[1])
        || in_range(child[1], scaled[0], scaled[1]);
    let in_y = in_range(child[2], scaled[2], scaled[3])
        || in_range(child[3], scaled[2], scaled[3]);
    let in_z = if scaled[4] == 0 && scaled[5] == 0 {
        true
    } else {
        in_range(child[4], scaled[4], scaled[5])
            || in_range(child[5], scaled[4], scaled[5])
    };
    in_x && in_y && in_z
}

fn malformed(rank: usize, detail: String) -> MeshBridgeError {
    MeshBridgeError::CollectiveMismatch { rank, detail }
}

/// `[lo_i, lo_j, lo_k, hi_i, hi_j, hi_k]` from a pairwise extent row.
fn logical_extent(ext: &[i32]) -> [i32; 6] {
    [ext[0], ext[2], ext[4], ext[1], ext[3], ext[5]]
}

/// Rebuild the global parent/child nesting of an AMR mesh.
///
/// `Ok(None)` when the mesh already carries ghost cells: ghosting
/// encodes the nesting implicitly and recomputing it would be
/// redundant. Requires a matching call on every rank.
pub fn reconstruct<C: Communicator>(
    comm: &C,
    mesh: &str,
    entry: &MeshEntry,
) -> Result<Option<DomainNesting>, MeshBridgeError> {
    if entry.has_ghost_cells() {
        log::debug!("mesh `{mesh}` has prebuilt ghost cells; skipping nesting");
        return Ok(None);
    }
    let amr = entry
        .object()
        .as_amr()
        .ok_or_else(|| MeshBridgeError::NotAmr(mesh.to_string()))?;

    let total = amr.total_patches();
    let level_count = amr.level_count();
    let rank = comm.rank();
    let size = comm.size();

    // Recover every patch extent on every rank. Unknown rows keep the
    // sentinel through the reduction; they are diagnostic only and are
    // never scaled or dereferenced as real geometry.
    let mut extents = vec![UNSET; 6 * total];
    for (flat, row) in extents.chunks_exact_mut(6).enumerate() {
        if let Some((level, patch)) = amr.level_and_patch(flat) {
            if let Some(amr_box) = amr.level(level).and_then(|l| l.box_at(patch)) {
                row.copy_from_slice(&amr_box.extent());
            }
        }
    }
    comm.all_reduce_max_i32(&mut extents)?;

    // Any z span wider than one cell makes the hierarchy 3D.
    let topological_dim = if extents
        .chunks_exact(6)
        .any(|row| row[5] > row[4])
    {
        3
    } else {
        2
    };

    let level_refinement_ratios: Vec<[i32; 3]> = (0..level_count)
        .map(|level| {
            let r = amr.level(level).map(|l| l.refinement_ratio()).unwrap_or(1);
            [r, r, if topological_dim > 2 { r } else { 1 }]
        })
        .collect();

    // Every non-finest patch needs its children computed exactly once.
    // Split the list into contiguous runs with round-robin sizes; the
    // partition is deterministic, so no coordination is needed.
    let mut work = Vec::new();
    for level in 0..level_count.saturating_sub(1) {
        let patches_here = amr.level(level).map(|l| l.patch_count()).unwrap_or(0);
        for patch in 0..patches_here {
            work.push(amr.flat_index(level, patch));
        }
    }
    let mut counts = vec![0usize; size];
    for item in 0..work.len() {
        counts[item % size] += 1;
    }
    let offset: usize = counts[..rank].iter().sum();
    let my_work = &work[offset..offset + counts[rank]];

    // Records of `{patch, child count, children...}`.
    let mut child_data: Vec<i32> = Vec::new();
    for &dom in my_work {
        let header = child_data.len();
        child_data.push(dom as i32);
        child_data.push(0);
        let Some((level, _)) = amr.level_and_patch(dom) else {
            continue;
        };
        let ratio = amr.level(level).map(|l| l.refinement_ratio()).unwrap_or(1);
        let next = level + 1;
        let next_patches = amr.level(next).map(|l| l.patch_count()).unwrap_or(0);
        for patch in 0..next_patches {
            let child = amr.flat_index(next, patch);
            let parent_ext = &extents[6 * dom..6 * dom + 6];
            let child_ext = &extents[6 * child..6 * child + 6];
            if boxes_nest(parent_ext, child_ext, ratio) {
                child_data.push(child as i32);
                child_data[header + 1] += 1;
            }
        }
    }

    let gathered = comm.all_gather_varying_i32(&child_data)?;

    let mut patches: Vec<Option<PatchNesting>> = vec![None; total];
    let mut at = 0;
    while at < gathered.len() {
        if at + 2 > gathered.len() {
            return Err(malformed(rank, "truncated nesting record".to_string()));
        }
        let dom = gathered[at];
        let children = gathered[at + 1];
        if dom < 0 || children < 0 {
            return Err(malformed(
                rank,
                format!("nesting record with negative fields {dom}/{children}"),
            ));
        }
        let dom = dom as usize;
        let n = children as usize;
        let Some(ids) = gathered.get(at + 2..at + 2 + n) else {
            return Err(malformed(rank, "truncated nesting child list".to_string()));
        };
        let Some((level, _)) = amr.level_and_patch(dom) else {
            return Err(malformed(rank, format!("nesting record for unknown patch {dom}")));
        };
        let ext = &extents[6 * dom..6 * dom + 6];
        patches[dom] = Some(PatchNesting {
            patch: dom,
            level,
            children: ids.iter().map(|&c| c as usize).collect(),
            logical_extent: logical_extent(ext),
        });
        at += 2 + n;
    }

    // Finest-level patches were excluded from the work list; they have
    // no children by construction.
    let finest = level_count - 1;
    let finest_patches = amr.level(finest).map(|l| l.patch_count()).unwrap_or(0);
    for patch in 0..finest_patches {
        let dom = amr.flat_index(finest, patch);
        let ext = &extents[6 * dom..6 * dom + 6];
        patches[dom] = Some(PatchNesting {
            patch: dom,
            level: finest,
            children: Vec::new(),
            logical_extent: logical_extent(ext),
        });
    }

    let patches: Vec<PatchNesting> = patches
        .into_iter()
        .enumerate()
        .map(|(dom, patch)| {
            patch.ok_or_else(|| malformed(rank, format!("no nesting record for patch {dom}")))
        })
        .collect::<Result<_, _>>()?;

    Ok(Some(DomainNesting {
        patch_count: total,
        level_count,
        topological_dim,
        level_refinement_ratios,
        patches,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::NoComm;
    use crate::dataset::{
        AmrBox, AmrLevel, DataObject, DataSet, OverlappingAmr, UniformGrid,
    };

    fn patch() -> DataSet {
        DataSet::Uniform(UniformGrid::new([0, 4, 0, 4, 0, 0], [0.0; 3], [1.0; 3]).unwrap())
    }

    fn entry_for(object: DataObject) -> MeshEntry {
        MeshEntry::new(object, false, &NoComm).unwrap()
    }

    #[test]
    fn endpoint_overlap_respects_scaling() {
        let parent = [0, 4, 0, 4, 0, 0];
        assert!(boxes_nest(&parent, &[0, 4, 0, 4, 0, 0], 2));
        assert!(boxes_nest(&parent, &[5, 9, 0, 4, 0, 0], 2));
        assert!(!boxes_nest(&parent, &[10, 19, 0, 4, 0, 0], 2));

        // A flat parent ignores z entirely.
        assert!(boxes_nest(&parent, &[0, 4, 0, 4, 7, 8], 2));
        // A thick parent does not.
        let thick = [0, 4, 0, 4, 1, 2];
        assert!(!boxes_nest(&thick, &[0, 4, 0, 4, 7, 8], 2));
        assert!(boxes_nest(&thick, &[0, 4, 0, 4, 3, 4], 2));
    }

    #[test]
    fn serial_two_level_nesting() {
        let mut coarse = AmrLevel::new(2, 1).unwrap();
        coarse.set_box(0, AmrBox::new([0, 0, 0], [4, 4, 0]).unwrap()).unwrap();
        coarse.set_patch(0, patch()).unwrap();
        let mut fine = AmrLevel::new(2, 2).unwrap();
        fine.set_box(0, AmrBox::new([0, 0, 0], [4, 4, 0]).unwrap()).unwrap();
        fine.set_box(1, AmrBox::new([5, 0, 0], [9, 4, 0]).unwrap()).unwrap();
        fine.set_patch(0, patch()).unwrap();
        fine.set_patch(1, patch()).unwrap();
        let amr = OverlappingAmr::new(vec![coarse, fine]).unwrap();
        let entry = entry_for(DataObject::Amr(amr));

        let nesting = reconstruct(&NoComm, "amr", &entry).unwrap().unwrap();
        assert_eq!(nesting.patch_count, 3);
        assert_eq!(nesting.level_count, 2);
        assert_eq!(nesting.topological_dim, 2);
        assert_eq!(nesting.level_refinement_ratios, vec![[2, 2, 1], [2, 2, 1]]);

        assert_eq!(nesting.patches[0].children, vec![1, 2]);
        assert_eq!(nesting.patches[0].logical_extent, [0, 0, 0, 4, 4, 0]);
        assert_eq!(nesting.patches[0].level, 0);
        assert!(nesting.patches[1].children.is_empty());
        assert_eq!(nesting.patches[2].logical_extent, [5, 0, 0, 9, 4, 0]);
        assert_eq!(nesting.patches[2].level, 1);

        // The boxes have not moved, so a second pass answers the same.
        let again = reconstruct(&NoComm, "amr", &entry).unwrap().unwrap();
        assert_eq!(again, nesting);
    }

    #[test]
    fn z_span_turns_the_hierarchy_3d() {
        let mut coarse = AmrLevel::new(2, 1).unwrap();
        coarse.set_box(0, AmrBox::new([0, 0, 0], [3, 3, 3]).unwrap()).unwrap();
        coarse.set_patch(0, patch()).unwrap();
        let mut fine = AmrLevel::new(2, 1).unwrap();
        fine.set_box(0, AmrBox::new([0, 0, 0], [7, 7, 7]).unwrap()).unwrap();
        fine.set_patch(0, patch()).unwrap();
        let amr = OverlappingAmr::new(vec![coarse, fine]).unwrap();
        let entry = entry_for(DataObject::Amr(amr));

        let nesting = reconstruct(&NoComm, "amr", &entry).unwrap().unwrap();
        assert_eq!(nesting.topological_dim, 3);
        assert_eq!(nesting.level_refinement_ratios[0], [2, 2, 2]);
        assert_eq!(nesting.patches[0].children, vec![1]);
    }

    #[test]
    fn unknown_boxes_stay_sentinel() {
        let mut lone = AmrLevel::new(2, 2).unwrap();
        lone.set_box(0, AmrBox::new([0, 0, 0], [4, 4, 0]).unwrap()).unwrap();
        lone.set_patch(0, patch()).unwrap();
        // Patch 1 has no box anywhere: its extent row survives as -1s.
        let amr = OverlappingAmr::new(vec![lone]).unwrap();
        let entry = entry_for(DataObject::Amr(amr));

        let nesting = reconstruct(&NoComm, "amr", &entry).unwrap().unwrap();
        assert_eq!(nesting.patches[1].logical_extent, [-1; 6]);
        assert!(nesting.patches[1].children.is_empty());
    }

    #[test]
    fn ghosted_mesh_skips_reconstruction() {
        let mut level = AmrLevel::new(2, 1).unwrap();
        level.set_box(0, AmrBox::new([0, 0, 0], [4, 4, 0]).unwrap()).unwrap();
        level.set_patch(0, patch()).unwrap();
        let amr = OverlappingAmr::new(vec![level]).unwrap();
        let mut entry = entry_for(DataObject::Amr(amr));
        entry.has_ghost_cells = true;

        assert_eq!(reconstruct(&NoComm, "amr", &entry).unwrap(), None);
    }

    #[test]
    fn non_amr_object_is_rejected() {
        let entry = entry_for(DataObject::Single(patch()));
        assert!(matches!(
            reconstruct(&NoComm, "flat", &entry),
            Err(MeshBridgeError::NotAmr(_))
        ));
    }
}
