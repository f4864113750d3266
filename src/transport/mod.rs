//! Transport capability (C1, §4.5): the contract the exchange core consumes
//! from the MPI communicator. Two implementations exist:
//!
//! - [`mpi_transport::MpiTransport`], gated behind the `mpi-transport`
//!   feature, backed by the real `mpi` crate (rsmpi).
//! - [`loopback::LoopbackTransport`], an in-process test double used to
//!   exercise the exchange/harvest/conservation invariants under `cargo
//!   test` without an MPI runtime.

#[cfg(feature = "mpi-transport")]
pub mod mpi_transport;

pub mod loopback;

use crate::partition::Partition;
use crate::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Topology queries and blocking collective/point-to-point operations
/// needed by the exchange core.
pub trait Transport: Send + Sync {
    /// This process's rank within the communicator.
    fn rank(&self) -> i32;

    /// Total number of ranks (executors) in the communicator.
    fn size(&self) -> i32;

    /// True iff `r` is this process's own rank.
    fn is_root(&self, r: i32) -> bool {
        self.rank() == r
    }

    /// Asserts or upgrades the transport's threading level so that
    /// concurrent calls from worker threads are safe, returning the number
    /// of worker threads the caller should use for the parallel loops in
    /// §4.2/§4.3. Fails with [`Error::Threading`] if the underlying
    /// transport cannot provide that guarantee.
    fn enable_mpi_cores(&self) -> Result<usize, Error>;

    /// Sums a pair of `i64` counters across all ranks into rank `root`.
    /// Returns `Some` on `root`, `None` elsewhere.
    fn reduce_sum_pair(&self, local: (i64, i64), root: i32) -> Result<Option<(i64, i64)>, Error>;

    /// Broadcasts a single byte from `root` to every rank.
    fn bcast_u8(&self, value: u8, root: i32) -> Result<u8, Error>;

    /// Exchanges a single byte with `peer` in one blocking matched pair.
    fn sendrecv_u8(&self, send: u8, peer: i32) -> Result<u8, Error>;

    /// Partition-aware `Gather`: every rank contributes `local` (possibly
    /// `None`, standing in for an empty/absent partition at this global
    /// index); `root` receives the one genuinely-owned contribution.
    /// Returns `Some` on `root`, `None` elsewhere.
    ///
    /// `global_index` uniquely identifies this call among the `N` gathers a
    /// full synchronous exchange issues; implementations use it as an
    /// implicit message tag so that worker threads can progress many
    /// indices concurrently against the same root without one index's
    /// contributions being mistaken for another's (§4.2's "Ordering" note).
    fn gather_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        local: Option<Partition<T>>,
        root: i32,
        global_index: usize,
    ) -> Result<Option<Partition<T>>, Error>;

    /// Blocking partition-aware send to `peer`.
    fn send_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        partition: &Partition<T>,
        peer: i32,
        tag: i32,
    ) -> Result<(), Error>;

    /// Blocking partition-aware receive from `peer`.
    fn recv_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        peer: i32,
        tag: i32,
    ) -> Result<Partition<T>, Error>;

    /// Blocking paired partition transfer: send `send` to `peer` while
    /// receiving `peer`'s matching contribution, without risking the
    /// deadlock a naive send-then-recv could hit for large payloads.
    fn send_recv_partition<T: Serialize + DeserializeOwned + Send>(
        &self,
        send: &Partition<T>,
        peer: i32,
        tag: i32,
    ) -> Result<Partition<T>, Error>;
}

/// Derives the point-to-point tag a synchronous-mode gather of `global_index`
/// uses, so concurrently-progressing gathers targeting the same root never
/// have their contributions confused with one another (§4.2's "Ordering"
/// note). Offset by one to avoid colliding with the async path's tag 0.
pub(crate) fn gather_tag(global_index: usize) -> i32 {
    1 + (global_index as i32)
}
