//! MPI backend. Requires the `mpi-support` feature and an MPI installation;
//! the caller must run `mpi::initialize()` before constructing [`MpiComm`].

use mpi::Count;
use mpi::collective::SystemOperation;
use mpi::datatype::PartitionMut;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use crate::bridge_error::MeshBridgeError;
use crate::comm::Communicator;

/// Collectives over the MPI world communicator.
pub struct MpiComm;

impl MpiComm {
    /// Panics if MPI has not been initialized via `mpi::initialize()`.
    pub fn new() -> Self {
        Self
    }

    fn world(&self) -> SimpleCommunicator {
        SimpleCommunicator::world()
    }
}

impl Default for MpiComm {
    fn default() -> Self {
        Self::new()
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world().rank() as usize
    }

    fn size(&self) -> usize {
        self.world().size() as usize
    }

    fn broadcast_i32(&self, root: usize, buf: &mut [i32]) -> Result<(), MeshBridgeError> {
        self.world().process_at_rank(root as i32).broadcast_into(buf);
        Ok(())
    }

    fn all_reduce_max_i32(&self, buf: &mut [i32]) -> Result<(), MeshBridgeError> {
        let send = buf.to_vec();
        self.world()
            .all_reduce_into(&send[..], buf, SystemOperation::max());
        Ok(())
    }

    fn all_gather_i32(&self, value: i32) -> Result<Vec<i32>, MeshBridgeError> {
        let world = self.world();
        let mut out = vec![0i32; world.size() as usize];
        world.all_gather_into(&value, &mut out[..]);
        Ok(out)
    }

    fn all_gather_varying_i32(&self, local: &[i32]) -> Result<Vec<i32>, MeshBridgeError> {
        let world = self.world();
        let counts: Vec<Count> = self.all_gather_i32(local.len() as i32)?;
        let displs: Vec<Count> = counts
            .iter()
            .scan(0, |offset, &count| {
                let here = *offset;
                *offset += count;
                Some(here)
            })
            .collect();
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        // Some MPI stacks reject zero-length gather buffers.
        let mut recv = vec![0i32; total.max(1)];
        {
            let mut partition = PartitionMut::new(&mut recv[..], &counts[..], &displs[..]);
            world.all_gather_varcount_into(local, &mut partition);
        }
        recv.truncate(total);
        Ok(recv)
    }
}
