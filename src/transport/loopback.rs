//! In-process transport double standing in for real MPI ranks, so the
//! exchange/harvest/conservation invariants (§8) can run under `cargo test`
//! without an MPI runtime. Every simulated rank is one OS thread sharing a
//! [`LoopbackWorld`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Barrier, Condvar, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::partition::Partition;
use crate::transport::{gather_tag, Transport};
use crate::Error;

type Mailbox = Mutex<HashMap<(i32, i32, i32), VecDeque<Vec<u8>>>>;

/// Shared state for a simulated communicator of `size` loopback ranks.
pub struct LoopbackWorld {
    size: i32,
    mailbox: Mailbox,
    mailbox_cv: Condvar,
    // Double-barrier rendezvous slots reused by every collective call, in
    // the program order every rank issues them (the exchange core calls
    // reduce/bcast/gather in lockstep, never interleaved with a different
    // collective on the same communicator).
    reduce_slots: Mutex<Vec<Option<(i64, i64)>>>,
    bcast_slot: Mutex<Option<u8>>,
    barrier_in: Barrier,
    barrier_out: Barrier,
}

impl LoopbackWorld {
    pub fn new(size: i32) -> Arc<Self> {
        Arc::new(Self {
            size,
            mailbox: Mutex::new(HashMap::new()),
            mailbox_cv: Condvar::new(),
            reduce_slots: Mutex::new(vec![None; size as usize]),
            bcast_slot: Mutex::new(None),
            barrier_in: Barrier::new(size as usize),
            barrier_out: Barrier::new(size as usize),
        })
    }

    pub fn rank_transport(self: &Arc<Self>, rank: i32) -> LoopbackTransport {
        LoopbackTransport { world: self.clone(), rank }
    }
}

/// A [`Transport`] implementation bound to one simulated rank within a
/// [`LoopbackWorld`].
pub struct LoopbackTransport {
    world: Arc<LoopbackWorld>,
    rank: i32,
}

impl LoopbackTransport {
    fn send_bytes(&self, dest: i32, tag: i32, bytes: Vec<u8>) {
        let mut mailbox = self.world.mailbox.lock().unwrap();
        mailbox.entry((dest, self.rank, tag)).or_default().push_back(bytes);
        self.world.mailbox_cv.notify_all();
    }

    fn recv_bytes(&self, src: i32, tag: i32) -> Vec<u8> {
        let mut mailbox = self.world.mailbox.lock().unwrap();
        loop {
            if let Some(queue) = mailbox.get_mut(&(self.rank, src, tag)) {
                if let Some(bytes) = queue.pop_front() {
                    return bytes;
                }
            }
            mailbox = self.world.mailbox_cv.wait(mailbox).unwrap();
        }
    }
}

impl Transport for LoopbackTransport {
    fn rank(&self) -> i32 {
        self.rank
    }

    fn size(&self) -> i32 {
        self.world.size
    }

    fn enable_mpi_cores(&self) -> Result<usize, Error> {
        Ok(num_cpus::get())
    }

    fn reduce_sum_pair(&self, local: (i64, i64), root: i32) -> Result<Option<(i64, i64)>, Error> {
        {
            let mut slots = self.world.reduce_slots.lock().unwrap();
            slots[self.rank as usize] = Some(local);
        }
        self.world.barrier_in.wait();
        let result = if self.is_root(root) {
            let slots = self.world.reduce_slots.lock().unwrap();
            let sum = slots
                .iter()
                .map(|s| s.expect("every rank contributes before the barrier releases"))
                .fold((0i64, 0i64), |acc, v| (acc.0 + v.0, acc.1 + v.1));
            Some(sum)
        } else {
            None
        };
        self.world.barrier_out.wait();
        Ok(result)
    }

    fn bcast_u8(&self, value: u8, root: i32) -> Result<u8, Error> {
        if self.is_root(root) {
            *self.world.bcast_slot.lock().unwrap() = Some(value);
        }
        self.world.barrier_in.wait();
        let result = *self.world.bcast_slot.lock().unwrap();
        self.world.barrier_out.wait();
        Ok(result.expect("root published the broadcast value before either barrier released"))
    }

    fn sendrecv_u8(&self, send: u8, peer: i32) -> Result<u8, Error> {
        self.send_bytes(peer, SENDRECV_U8_TAG, vec![send]);
        let bytes = self.recv_bytes(peer, SENDRECV_U8_TAG);
        Ok(bytes[0])
    }

    fn gather_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        local: Option<Partition<T>>,
        root: i32,
        global_index: usize,
    ) -> Result<Option<Partition<T>>, Error> {
        let tag = gather_tag(global_index);
        let bytes = bincode::serialize(&local).map_err(Error::Serialization)?;
        if self.is_root(root) {
            let mut best: Option<Partition<T>> = None;
            for sender in 0..self.size() {
                let candidate: Option<Partition<T>> = if sender == self.rank() {
                    bincode::deserialize(&bytes).map_err(Error::Serialization)?
                } else {
                    let buf = self.recv_bytes(sender, tag);
                    bincode::deserialize(&buf).map_err(Error::Serialization)?
                };
                if let Some(p) = candidate {
                    if !p.is_empty() || best.is_none() {
                        best = Some(p);
                    }
                }
            }
            Ok(Some(best.unwrap_or_else(Partition::empty)))
        } else {
            self.send_bytes(root, tag, bytes);
            Ok(None)
        }
    }

    fn send_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        partition: &Partition<T>,
        peer: i32,
        tag: i32,
    ) -> Result<(), Error> {
        let bytes = bincode::serialize(partition).map_err(Error::Serialization)?;
        self.send_bytes(peer, tag, bytes);
        Ok(())
    }

    fn recv_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        peer: i32,
        tag: i32,
    ) -> Result<Partition<T>, Error> {
        let bytes = self.recv_bytes(peer, tag);
        bincode::deserialize(&bytes).map_err(Error::Serialization)
    }

    fn send_recv_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        send: &Partition<T>,
        peer: i32,
        tag: i32,
    ) -> Result<Partition<T>, Error> {
        let bytes = bincode::serialize(send).map_err(Error::Serialization)?;
        self.send_bytes(peer, tag, bytes);
        let recv_bytes = self.recv_bytes(peer, tag);
        bincode::deserialize(&recv_bytes).map_err(Error::Serialization)
    }
}

const SENDRECV_U8_TAG: i32 = -1;
