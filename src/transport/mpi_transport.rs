//! Real transport backed by the `mpi` crate (rsmpi). Gated behind the
//! `mpi-transport` feature since it links against a system MPI library.

use mpi::topology::{Communicator, Process, SimpleCommunicator};
use mpi::traits::*;
use mpi::Threading;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::partition::Partition;
use crate::transport::{gather_tag, Transport};
use crate::Error;

/// Wraps an MPI universe and its world communicator.
pub struct MpiTransport {
    world: SimpleCommunicator,
    threading: Threading,
}

impl MpiTransport {
    /// Initializes MPI with `Threading::Multiple` (required for the
    /// concurrent collectives/point-to-point calls the thread pool driver
    /// issues) and wraps the resulting world communicator.
    ///
    /// The returned `mpi::initialize::Universe` must be kept alive by the
    /// caller for the lifetime of the program; this constructor leaks it
    /// deliberately, mirroring the process-lifetime ownership MPI programs
    /// normally give their `Universe` handle.
    pub fn init() -> Result<Self, Error> {
        let (universe, threading) = mpi::initialize_with_threading(Threading::Multiple)
            .ok_or_else(|| Error::Threading("mpi::initialize_with_threading failed".into()))?;
        let world = universe.world();
        // Leaked: MpiTransport is expected to live for the process's duration.
        Box::leak(Box::new(universe));
        Ok(Self { world, threading })
    }

    fn root_process(&self, root: i32) -> Process<'_, SimpleCommunicator> {
        self.world.process_at_rank(root)
    }

    fn encode<T: Serialize>(partition: &Option<Partition<T>>) -> Result<Vec<u8>, Error> {
        bincode::serialize(partition).map_err(Error::Serialization)
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<Partition<T>>, Error> {
        bincode::deserialize(bytes).map_err(Error::Serialization)
    }
}

impl Transport for MpiTransport {
    fn rank(&self) -> i32 {
        self.world.rank()
    }

    fn size(&self) -> i32 {
        self.world.size()
    }

    fn enable_mpi_cores(&self) -> Result<usize, Error> {
        if self.threading != Threading::Multiple {
            return Err(Error::Threading(format!(
                "MPI runtime only supports {:?}, need Threading::Multiple",
                self.threading
            )));
        }
        Ok(num_cpus::get())
    }

    fn reduce_sum_pair(&self, local: (i64, i64), root: i32) -> Result<Option<(i64, i64)>, Error> {
        let local = [local.0, local.1];
        let mut sum = [0i64; 2];
        self.root_process(root)
            .reduce_into(&local[..], &mut sum[..], mpi::collective::SystemOperation::sum());
        Ok(self.is_root(root).then(|| (sum[0], sum[1])))
    }

    fn bcast_u8(&self, value: u8, root: i32) -> Result<u8, Error> {
        let mut buf = value;
        self.root_process(root).broadcast_into(&mut buf);
        Ok(buf)
    }

    fn sendrecv_u8(&self, send: u8, peer: i32) -> Result<u8, Error> {
        let (msg, _status) = self.world.process_at_rank(peer).send_receive(&send);
        Ok(msg)
    }

    fn gather_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        local: Option<Partition<T>>,
        root: i32,
        global_index: usize,
    ) -> Result<Option<Partition<T>>, Error> {
        let bytes = Self::encode(&local)?;
        // Tag derived from `global_index` (see DESIGN.md): this lets
        // independent global indices progress concurrently from worker
        // threads without one index's contributions being mistaken for
        // another's.
        let tag = gather_tag(global_index);
        if self.is_root(root) {
            let mut best: Option<Partition<T>> = None;
            for sender in 0..self.size() {
                let candidate = if sender == self.rank() {
                    Self::decode::<T>(&bytes)?
                } else {
                    let (buf, _status) = self
                        .world
                        .process_at_rank(sender)
                        .receive_vec_with_tag::<u8>(tag);
                    Self::decode::<T>(&buf)?
                };
                if let Some(p) = candidate {
                    if !p.is_empty() || best.is_none() {
                        best = Some(p);
                    }
                }
            }
            Ok(Some(best.unwrap_or_else(Partition::empty)))
        } else {
            self.world.process_at_rank(root).send_with_tag(&bytes[..], tag);
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
        self.world.process_at_rank(peer).send_with_tag(&bytes[..], tag);
        Ok(())
    }

    fn recv_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        peer: i32,
        tag: i32,
    ) -> Result<Partition<T>, Error> {
        let (bytes, _status) = self.world.process_at_rank(peer).receive_vec_with_tag::<u8>(tag);
        bincode::deserialize(&bytes).map_err(Error::Serialization)
    }

    fn send_recv_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        send: &Partition<T>,
        peer: i32,
        tag: i32,
    ) -> Result<Partition<T>, Error> {
        let send_bytes = bincode::serialize(send).map_err(Error::Serialization)?;
        let recv_bytes = mpi::request::scope(|scope| {
            let mut sreq = self
                .world
                .process_at_rank(peer)
                .immediate_send_with_tag(scope, &send_bytes[..], tag);
            let (buf, _status) = self.world.process_at_rank(peer).receive_vec_with_tag::<u8>(tag);
            loop {
                match sreq.test() {
                    Ok(_) => break,
                    Err(req) => sreq = req,
                }
            }
            buf
        });
        bincode::deserialize(&recv_bytes).map_err(Error::Serialization)
    }
}
