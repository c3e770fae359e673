//! In-process multi-rank backend: one OS thread per rank, a shared mailbox
//! for payloads. Used by the multi-rank tests and by couplings that run the
//! whole simulation in one process.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::DashMap;

use crate::bridge_error::MeshBridgeError;
use crate::comm::Communicator;

/// Shared state for one group of in-process ranks.
///
/// Collectives are matched purely by sequence number: the n-th collective on
/// one rank pairs with the n-th on every other. Payloads live in `slots`
/// until the last rank of a collective acknowledges, then the whole
/// generation is dropped.
pub struct LocalWorld {
    size: usize,
    slots: DashMap<(u64, usize), Bytes>,
    acks: DashMap<u64, usize>,
}

impl LocalWorld {
    /// Create shared state for `size` ranks.
    pub fn new(size: usize) -> Arc<Self> {
        assert!(size > 0, "a world needs at least one rank");
        Arc::new(Self {
            size,
            slots: DashMap::new(),
            acks: DashMap::new(),
        })
    }

    /// Hand out the communicator for one rank. Call once per rank.
    pub fn comm(self: &Arc<Self>, rank: usize) -> LocalComm {
        assert!(rank < self.size, "rank {rank} out of range");
        LocalComm {
            world: Arc::clone(self),
            rank,
            seq: AtomicU64::new(0),
        }
    }

    fn fetch(&self, seq: u64, rank: usize) -> Bytes {
        loop {
            if let Some(entry) = self.slots.get(&(seq, rank)) {
                return entry.value().clone();
            }
            std::thread::yield_now();
        }
    }

    fn acknowledge(&self, seq: u64) {
        let done = {
            let mut entry = self.acks.entry(seq).or_insert(0);
            *entry += 1;
            *entry == self.size
        };
        if done {
            self.acks.remove(&seq);
            for rank in 0..self.size {
                self.slots.remove(&(seq, rank));
            }
        }
    }
}

/// One rank's endpoint into a [`LocalWorld`].
pub struct LocalComm {
    world: Arc<LocalWorld>,
    rank: usize,
    seq: AtomicU64,
}

impl LocalComm {
    /// Post our payload, spin until every rank's payload for this collective
    /// is visible, and return them in rank order.
    fn exchange(&self, payload: Bytes) -> Vec<Bytes> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.world.slots.insert((seq, self.rank), payload);
        let gathered = (0..self.world.size)
            .map(|rank| self.world.fetch(seq, rank))
            .collect();
        self.world.acknowledge(seq);
        gathered
    }

    fn decode_i32(&self, bytes: &Bytes) -> Result<Vec<i32>, MeshBridgeError> {
        if bytes.len() % size_of::<i32>() != 0 {
            return Err(MeshBridgeError::CollectiveMismatch {
                rank: self.rank,
                detail: format!("payload of {} bytes is not a whole number of i32", bytes.len()),
            });
        }
        // Bytes buffers carry no alignment guarantee; fall back to a copy
        // when the zero-copy cast is refused.
        match bytemuck::try_cast_slice::<u8, i32>(bytes) {
            Ok(ints) => Ok(ints.to_vec()),
            Err(_) => Ok(bytes
                .chunks_exact(size_of::<i32>())
                .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .collect()),
        }
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.world.size
    }

    fn broadcast_i32(&self, root: usize, buf: &mut [i32]) -> Result<(), MeshBridgeError> {
        let payload = if self.rank == root {
            Bytes::copy_from_slice(bytemuck::cast_slice(buf))
        } else {
            Bytes::new()
        };
        let gathered = self.exchange(payload);
        let ints = self.decode_i32(&gathered[root])?;
        if ints.len() != buf.len() {
            return Err(MeshBridgeError::CollectiveMismatch {
                rank: self.rank,
                detail: format!(
                    "broadcast expected {} values from rank {root}, got {}",
                    buf.len(),
                    ints.len()
                ),
            });
        }
        buf.copy_from_slice(&ints);
        Ok(())
    }

    fn all_reduce_max_i32(&self, buf: &mut [i32]) -> Result<(), MeshBridgeError> {
        let gathered = self.exchange(Bytes::copy_from_slice(bytemuck::cast_slice(buf)));
        for (rank, bytes) in gathered.iter().enumerate() {
            let ints = self.decode_i32(bytes)?;
            if ints.len() != buf.len() {
                return Err(MeshBridgeError::CollectiveMismatch {
                    rank: self.rank,
                    detail: format!(
                        "reduce expected {} values from rank {rank}, got {}",
                        buf.len(),
                        ints.len()
                    ),
                });
            }
            for (out, contributed) in buf.iter_mut().zip(&ints) {
                *out = (*out).max(*contributed);
            }
        }
        Ok(())
    }

    fn all_gather_i32(&self, value: i32) -> Result<Vec<i32>, MeshBridgeError> {
        let gathered = self.exchange(Bytes::copy_from_slice(bytemuck::cast_slice(&[value])));
        let mut out = Vec::with_capacity(self.world.size);
        for (rank, bytes) in gathered.iter().enumerate() {
            let ints = self.decode_i32(bytes)?;
            match ints.as_slice() {
                [single] => out.push(*single),
                other => {
                    return Err(MeshBridgeError::CollectiveMismatch {
                        rank: self.rank,
                        detail: format!("gather expected 1 value from rank {rank}, got {}", other.len()),
                    });
                }
            }
        }
        Ok(out)
    }

    fn all_gather_varying_i32(&self, local: &[i32]) -> Result<Vec<i32>, MeshBridgeError> {
        let gathered = self.exchange(Bytes::copy_from_slice(bytemuck::cast_slice(local)));
        let mut out = Vec::new();
        for bytes in &gathered {
            out.extend(self.decode_i32(bytes)?);
        }
        Ok(out)
    }
}
