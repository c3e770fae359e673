//! Distributed nesting reconstruction. The fixed case pins the layout
//! of a three-level hierarchy; the property test checks that splitting
//! box knowledge across ranks never changes the outcome.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use mesh_bridge::comm::Communicator;
use mesh_bridge::exposure::nesting;
use mesh_bridge::exposure::MeshEntry;
use mesh_bridge::prelude::*;

fn tiny_patch() -> DataSet {
    DataSet::Uniform(UniformGrid::new([0, 1, 0, 1, 0, 0], [0.0; 3], [1.0; 3]).unwrap())
}

/// Hierarchy with `counts[l]` patches on level `l`, holding only the
/// boxes and patches whose flat id satisfies `owned`.
fn build_object(
    counts: &[usize],
    ratio: i32,
    boxes: &[([i32; 3], [i32; 3])],
    owned: impl Fn(usize) -> bool,
) -> DataObject {
    let mut levels = Vec::new();
    let mut flat = 0;
    for &count in counts {
        let mut level = AmrLevel::new(ratio, count).unwrap();
        for p in 0..count {
            if owned(flat) {
                let (lo, hi) = boxes[flat];
                level.set_box(p, AmrBox::new(lo, hi).unwrap()).unwrap();
                level.set_patch(p, tiny_patch()).unwrap();
            }
            flat += 1;
        }
        levels.push(level);
    }
    DataObject::Amr(OverlappingAmr::new(levels).unwrap())
}

fn reconstruct_on<C: Communicator>(comm: &C, object: DataObject) -> DomainNesting {
    let entry = MeshEntry::new(object, false, comm).unwrap();
    nesting::reconstruct(comm, "blocks", &entry)
        .unwrap()
        .expect("mesh carries no ghost cells")
}

#[test]
fn three_levels_across_two_ranks() {
    // Level 0: one patch. Level 1: two patches side by side. Level 2:
    // two patches under each level-1 patch.
    let counts = [1, 2, 4];
    let boxes = vec![
        ([0, 0, 0], [7, 7, 0]),
        ([0, 0, 0], [7, 7, 0]),
        ([8, 0, 0], [15, 15, 0]),
        ([0, 0, 0], [7, 7, 0]),
        ([8, 8, 0], [15, 15, 0]),
        ([16, 0, 0], [23, 7, 0]),
        ([24, 8, 0], [31, 15, 0]),
    ];

    let world = LocalWorld::new(2);
    let boxes = Arc::new(boxes);
    let handles: Vec<_> = (0..2)
        .map(|rank| {
            let comm = world.comm(rank);
            let boxes = Arc::clone(&boxes);
            std::thread::spawn(move || {
                let object = build_object(&counts, 2, &boxes, |flat| flat % 2 == rank);
                reconstruct_on(&comm, object)
            })
        })
        .collect();
    let results: Vec<DomainNesting> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    for nesting in &results {
        assert_eq!(nesting.patch_count, 7);
        assert_eq!(nesting.level_count, 3);
        assert_eq!(nesting.topological_dim, 2);
        assert_eq!(nesting.level_refinement_ratios, vec![[2, 2, 1]; 3]);
        assert_eq!(nesting.patches[0].children, vec![1, 2]);
        assert_eq!(nesting.patches[1].children, vec![3, 4]);
        assert_eq!(nesting.patches[2].children, vec![5, 6]);
        for leaf in 3..7 {
            assert_eq!(nesting.patches[leaf].children, Vec::<usize>::new());
            assert_eq!(nesting.patches[leaf].level, 2);
        }
        assert_eq!(nesting.patches[4].logical_extent, [8, 8, 0, 15, 15, 0]);
    }
    assert_eq!(results[0], results[1]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn distributed_matches_serial(
        level_count in 1usize..4,
        base_patches in 1usize..4,
        ratio in 2i32..4,
        three_d in proptest::bool::ANY,
    ) {
        // Seed the RNG from the parameters so every case is reproducible.
        let seed = {
            let mut h = DefaultHasher::new();
            level_count.hash(&mut h);
            base_patches.hash(&mut h);
            ratio.hash(&mut h);
            three_d.hash(&mut h);
            h.finish()
        };
        let mut rng = SmallRng::seed_from_u64(seed);

        let counts: Vec<usize> = (0..level_count).map(|l| base_patches + l).collect();
        let total: usize = counts.iter().sum();
        let boxes: Vec<([i32; 3], [i32; 3])> = (0..total)
            .map(|_| {
                let lo = [
                    rng.gen_range(0..20),
                    rng.gen_range(0..20),
                    if three_d { rng.gen_range(0..6) } else { 0 },
                ];
                let hi = [
                    lo[0] + rng.gen_range(1..8),
                    lo[1] + rng.gen_range(1..8),
                    if three_d { lo[2] + rng.gen_range(1..4) } else { 0 },
                ];
                (lo, hi)
            })
            .collect();

        let serial_object = build_object(&counts, ratio, &boxes, |_| true);
        let expected = reconstruct_on(&NoComm, serial_object);

        let world = LocalWorld::new(2);
        let shared = Arc::new((counts, boxes));
        let handles: Vec<_> = (0..2)
            .map(|rank| {
                let comm = world.comm(rank);
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    let (counts, boxes) = &*shared;
                    let object =
                        build_object(counts, ratio, boxes, |flat| flat % 2 == rank);
                    reconstruct_on(&comm, object)
                })
            })
            .collect();
        for handle in handles {
            let got = handle.join().unwrap();
            prop_assert_eq!(&got, &expected);
        }
    }
}
