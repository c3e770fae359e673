//! Composite data objects: a single data set, a flat multi-block collection,
//! or an overlapping AMR hierarchy.
//!
//! Leaves are addressed by *flat index*: block position for multi-block, and
//! patches of all coarser levels first for AMR. The composite structure
//! (level and patch counts, block count) is identical on every rank even
//! though each rank only holds the leaves it owns.

use crate::bridge_error::MeshBridgeError;
use crate::dataset::DataSet;

/// Inclusive cell-index bounds of one AMR patch in its level's index space.
/// Corners are never negative; the distributed extent reduction depends
/// on that to tell real bounds from its unset marker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AmrBox {
    lo: [i32; 3],
    hi: [i32; 3],
}

impl AmrBox {
    pub fn new(lo: [i32; 3], hi: [i32; 3]) -> Result<Self, MeshBridgeError> {
        for axis in 0..3 {
            if lo[axis] < 0 {
                return Err(MeshBridgeError::MalformedDataSet(format!(
                    "AMR box {lo:?}..{hi:?} has a negative corner on axis {axis}"
                )));
            }
            if hi[axis] < lo[axis] {
                return Err(MeshBridgeError::MalformedDataSet(format!(
                    "AMR box {lo:?}..{hi:?} is inverted on axis {axis}"
                )));
            }
        }
        Ok(Self { lo, hi })
    }

    pub fn lo(&self) -> [i32; 3] {
        self.lo
    }

    pub fn hi(&self) -> [i32; 3] {
        self.hi
    }

    /// Bounds as `[ilo, ihi, jlo, jhi, klo, khi]`.
    pub fn extent(&self) -> [i32; 6] {
        [
            self.lo[0], self.hi[0], self.lo[1], self.hi[1], self.lo[2], self.hi[2],
        ]
    }
}

/// One refinement level of an overlapping AMR hierarchy.
///
/// `boxes[p]` is `None` when this rank does not know patch `p`'s bounds;
/// `patches[p]` is `None` when it does not own the patch data.
#[derive(Clone, Debug, PartialEq)]
pub struct AmrLevel {
    refinement_ratio: i32,
    boxes: Vec<Option<AmrBox>>,
    patches: Vec<Option<DataSet>>,
}

impl AmrLevel {
    /// `refinement_ratio` scales this level's index space into the next finer
    /// level's.
    pub fn new(refinement_ratio: i32, patch_count: usize) -> Result<Self, MeshBridgeError> {
        if refinement_ratio < 1 {
            return Err(MeshBridgeError::MalformedDataSet(format!(
                "refinement ratio must be at least 1, got {refinement_ratio}"
            )));
        }
        Ok(Self {
            refinement_ratio,
            boxes: vec![None; patch_count],
            patches: (0..patch_count).map(|_| None).collect(),
        })
    }

    pub fn refinement_ratio(&self) -> i32 {
        self.refinement_ratio
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    pub fn set_box(&mut self, patch: usize, amr_box: AmrBox) -> Result<(), MeshBridgeError> {
        let slot = self.boxes.get_mut(patch).ok_or_else(|| {
            MeshBridgeError::MalformedDataSet(format!("no patch {patch} in this level"))
        })?;
        *slot = Some(amr_box);
        Ok(())
    }

    pub fn set_patch(&mut self, patch: usize, data: DataSet) -> Result<(), MeshBridgeError> {
        let slot = self.patches.get_mut(patch).ok_or_else(|| {
            MeshBridgeError::MalformedDataSet(format!("no patch {patch} in this level"))
        })?;
        *slot = Some(data);
        Ok(())
    }

    pub fn box_at(&self, patch: usize) -> Option<&AmrBox> {
        self.boxes.get(patch).and_then(|b| b.as_ref())
    }

    pub fn patch(&self, patch: usize) -> Option<&DataSet> {
        self.patches.get(patch).and_then(|p| p.as_ref())
    }
}

/// Overlapping AMR hierarchy, coarsest level first.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlappingAmr {
    levels: Vec<AmrLevel>,
}

impl OverlappingAmr {
    pub fn new(levels: Vec<AmrLevel>) -> Result<Self, MeshBridgeError> {
        if levels.is_empty() {
            return Err(MeshBridgeError::MalformedDataSet(
                "an AMR hierarchy needs at least one level".into(),
            ));
        }
        Ok(Self { levels })
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> Option<&AmrLevel> {
        self.levels.get(level)
    }

    pub fn level_mut(&mut self, level: usize) -> Option<&mut AmrLevel> {
        self.levels.get_mut(level)
    }

    pub fn total_patches(&self) -> usize {
        self.levels.iter().map(AmrLevel::patch_count).sum()
    }

    /// Flat patch index of `(level, patch)`.
    pub fn flat_index(&self, level: usize, patch: usize) -> usize {
        self.levels[..level]
            .iter()
            .map(AmrLevel::patch_count)
            .sum::<usize>()
            + patch
    }

    /// Inverse of [`flat_index`](Self::flat_index).
    pub fn level_and_patch(&self, flat: usize) -> Option<(usize, usize)> {
        let mut remaining = flat;
        for (level, l) in self.levels.iter().enumerate() {
            if remaining < l.patch_count() {
                return Some((level, remaining));
            }
            remaining -= l.patch_count();
        }
        None
    }
}

/// Flat multi-block collection; empty slots stand for blocks owned elsewhere.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiBlock {
    blocks: Vec<Option<DataSet>>,
}

impl MultiBlock {
    pub fn new(blocks: Vec<Option<DataSet>>) -> Self {
        Self { blocks }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, index: usize) -> Option<&DataSet> {
        self.blocks.get(index).and_then(|b| b.as_ref())
    }
}

/// Any mesh object a data source can hand over.
#[derive(Clone, Debug, PartialEq)]
pub enum DataObject {
    Single(DataSet),
    MultiBlock(MultiBlock),
    Amr(OverlappingAmr),
}

impl DataObject {
    /// Number of flat leaf positions, occupied or not.
    pub fn leaf_slots(&self) -> usize {
        match self {
            DataObject::Single(_) => 1,
            DataObject::MultiBlock(mb) => mb.block_count(),
            DataObject::Amr(amr) => amr.total_patches(),
        }
    }

    /// Non-empty leaves as `(flat index, data set)`, in flat-index order.
    pub fn leaves(&self) -> Vec<(usize, &DataSet)> {
        match self {
            DataObject::Single(ds) => vec![(0, ds)],
            DataObject::MultiBlock(mb) => (0..mb.block_count())
                .filter_map(|i| mb.block(i).map(|ds| (i, ds)))
                .collect(),
            DataObject::Amr(amr) => {
                let mut out = Vec::new();
                let mut flat = 0;
                for level in &amr.levels {
                    for patch in 0..level.patch_count() {
                        if let Some(ds) = level.patch(patch) {
                            out.push((flat, ds));
                        }
                        flat += 1;
                    }
                }
                out
            }
        }
    }

    /// The leaf at one flat index, when held locally.
    pub fn leaf(&self, flat: usize) -> Option<&DataSet> {
        match self {
            DataObject::Single(ds) => (flat == 0).then_some(ds),
            DataObject::MultiBlock(mb) => mb.block(flat),
            DataObject::Amr(amr) => {
                let (level, patch) = amr.level_and_patch(flat)?;
                amr.levels[level].patch(patch)
            }
        }
    }

    pub fn leaf_mut(&mut self, flat: usize) -> Option<&mut DataSet> {
        match self {
            DataObject::Single(ds) => (flat == 0).then_some(ds),
            DataObject::MultiBlock(mb) => mb.blocks.get_mut(flat).and_then(|b| b.as_mut()),
            DataObject::Amr(amr) => {
                let (level, patch) = amr.level_and_patch(flat)?;
                amr.levels[level].patches[patch].as_mut()
            }
        }
    }

    pub fn as_amr(&self) -> Option<&OverlappingAmr> {
        match self {
            DataObject::Amr(amr) => Some(amr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::array::{DataArray, ScalarValues};
    use crate::dataset::structured::UniformGrid;

    fn patch(extent: [i32; 6]) -> DataSet {
        DataSet::Uniform(UniformGrid::new(extent, [0.0; 3], [1.0; 3]).unwrap())
    }

    fn two_level_amr() -> OverlappingAmr {
        let mut coarse = AmrLevel::new(2, 1).unwrap();
        coarse
            .set_box(0, AmrBox::new([0, 0, 0], [9, 9, 0]).unwrap())
            .unwrap();
        coarse.set_patch(0, patch([0, 10, 0, 10, 0, 0])).unwrap();
        let mut fine = AmrLevel::new(2, 2).unwrap();
        fine.set_box(1, AmrBox::new([10, 0, 0], [19, 9, 0]).unwrap())
            .unwrap();
        fine.set_patch(1, patch([10, 20, 0, 10, 0, 0])).unwrap();
        OverlappingAmr::new(vec![coarse, fine]).unwrap()
    }

    #[test]
    fn amr_flat_index_counts_coarser_levels_first() {
        let amr = two_level_amr();
        assert_eq!(amr.flat_index(0, 0), 0);
        assert_eq!(amr.flat_index(1, 0), 1);
        assert_eq!(amr.flat_index(1, 1), 2);
        assert_eq!(amr.level_and_patch(2), Some((1, 1)));
        assert_eq!(amr.level_and_patch(3), None);
    }

    #[test]
    fn leaves_skip_unowned_patches() {
        let obj = DataObject::Amr(two_level_amr());
        let flats: Vec<usize> = obj.leaves().iter().map(|(i, _)| *i).collect();
        assert_eq!(flats, vec![0, 2]);
        assert!(obj.leaf(1).is_none());
        assert!(obj.leaf(2).is_some());
    }

    #[test]
    fn negative_box_corner_rejected() {
        assert!(AmrBox::new([-1, 0, 0], [4, 4, 0]).is_err());
        assert!(AmrBox::new([0, 0, 0], [4, -2, 0]).is_err());
    }

    #[test]
    fn single_object_is_flat_index_zero() {
        let x = DataArray::scalars("x", ScalarValues::F64(vec![0.0, 1.0])).unwrap();
        let y = DataArray::scalars("y", ScalarValues::F64(vec![0.0, 1.0])).unwrap();
        let ds = DataSet::Rectilinear(
            crate::dataset::structured::RectilinearGrid::new(x, y, None).unwrap(),
        );
        let obj = DataObject::Single(ds);
        assert_eq!(obj.leaf_slots(), 1);
        assert_eq!(obj.leaves().len(), 1);
        assert!(obj.leaf(1).is_none());
    }
}
