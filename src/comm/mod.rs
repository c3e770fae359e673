//! Collective exchange façade over serial, in-process, or MPI transports.
//!
//! The exposure layer only ever needs four collectives: an `i32` schema
//! broadcast, an element-wise max all-reduce, a fixed-size all-gather and a
//! variable-size all-gather. Every backend implements exactly those, so the
//! query code above this seam is transport-agnostic.
//!
//! Collective calls must be issued in the same order on every rank. The
//! service layer guarantees that by driving all ranks through identical
//! query sequences; a rank that falls out of step deadlocks instead of
//! reading another collective's payload.

use crate::bridge_error::MeshBridgeError;

mod local;
#[cfg(feature = "mpi-support")]
mod mpi;

pub use local::{LocalComm, LocalWorld};
#[cfg(feature = "mpi-support")]
pub use mpi::MpiComm;

/// Blocking collective interface.
pub trait Communicator: Send + Sync + 'static {
    /// Rank of the calling process in `0..size()`.
    fn rank(&self) -> usize;
    /// Number of participating processes.
    fn size(&self) -> usize;

    /// Overwrite `buf` on every rank with `buf` as held by `root`.
    fn broadcast_i32(&self, root: usize, buf: &mut [i32]) -> Result<(), MeshBridgeError>;

    /// Element-wise maximum across ranks, result left in `buf` on all ranks.
    /// `buf` must have the same length on every rank.
    fn all_reduce_max_i32(&self, buf: &mut [i32]) -> Result<(), MeshBridgeError>;

    /// Gather one value per rank; the result is indexed by rank.
    fn all_gather_i32(&self, value: i32) -> Result<Vec<i32>, MeshBridgeError>;

    /// Gather a varying-length contribution per rank, concatenated in rank
    /// order. Ranks with nothing to contribute pass an empty slice.
    fn all_gather_varying_i32(&self, local: &[i32]) -> Result<Vec<i32>, MeshBridgeError>;
}

/// Compile-time no-op comm for pure serial use and unit tests.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast_i32(&self, root: usize, _buf: &mut [i32]) -> Result<(), MeshBridgeError> {
        debug_assert_eq!(root, 0);
        Ok(())
    }

    fn all_reduce_max_i32(&self, _buf: &mut [i32]) -> Result<(), MeshBridgeError> {
        Ok(())
    }

    fn all_gather_i32(&self, value: i32) -> Result<Vec<i32>, MeshBridgeError> {
        Ok(vec![value])
    }

    fn all_gather_varying_i32(&self, local: &[i32]) -> Result<Vec<i32>, MeshBridgeError> {
        Ok(local.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_comm_identities() {
        let comm = NoComm;
        assert_eq!(comm.rank(), 0);
        assert_eq!(comm.size(), 1);

        let mut buf = [3, -1, 7];
        comm.all_reduce_max_i32(&mut buf).unwrap();
        assert_eq!(buf, [3, -1, 7]);

        assert_eq!(comm.all_gather_i32(5).unwrap(), vec![5]);
        assert_eq!(
            comm.all_gather_varying_i32(&[1, 2, 3]).unwrap(),
            vec![1, 2, 3]
        );
    }
}
