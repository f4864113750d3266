//! # xchange-core
//!
//! All-to-all partition exchange core for a distributed bulk-data executor.
//!
//! Each rank in an MPI communicator holds a [`PartitionGroup`] of data
//! partitions; [`exchange::exchange`] redistributes partitions across ranks
//! so that every rank ends up owning a contiguous, balanced slice of the
//! global partition sequence. The redistribution strategy (synchronous
//! gather-to-owner vs. asynchronous pairwise send/receive) is picked
//! automatically from a cheap sparsity probe, or forced via configuration.

pub mod config;
pub mod exchange;
pub mod partition;
pub mod pool;
pub mod strategy;
pub mod transport;
pub mod util;

pub use config::{ConfigError, FileConfig, MapPropertyBag, PropertyBag};
pub use exchange::exchange;
pub use partition::{Partition, PartitionGroup};
pub use strategy::Strategy;
pub use transport::Transport;

/// Initialize crate-wide logging. Call once from the binary that embeds this
/// crate; library code only ever emits `tracing` events.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

/// Errors surfaced by the exchange core.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("threading error: {0}")]
    Threading(String),

    #[error("partition error: {0}")]
    Partition(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
