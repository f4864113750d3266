//! Exchange entry point (§4.1): picks a strategy and dispatches to the
//! synchronous (C5) or asynchronous (C6) exchange path.

mod async_mode;
mod pairing;
mod plan;
mod sync_mode;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::PropertyBag;
use crate::partition::PartitionGroup;
use crate::pool::ThreadPoolDriver;
use crate::strategy::Strategy;
use crate::transport::Transport;
use crate::Error;

/// Redistributes `in_group` across ranks so every rank ends up owning a
/// contiguous, balanced slice of the global partition sequence (§3),
/// appending surviving non-empty partitions to `out_group` and leaving
/// `in_group` empty.
///
/// `in_group` must have the same length `N` on every rank: slots this rank
/// does not itself hold data for are empty placeholders that the chosen
/// exchange path fills in, drains, or forwards.
pub fn exchange<T, Tr>(
    transport: &Tr,
    bag: &dyn PropertyBag,
    in_group: &mut PartitionGroup<T>,
    out_group: &mut PartitionGroup<T>,
) -> Result<(), Error>
where
    T: Serialize + DeserializeOwned + Send,
    Tr: Transport,
{
    let executors = transport.size();
    if executors == 1 {
        tracing::debug!("single executor, fast path fits and moves every partition");
        for i in 0..in_group.len() {
            if let Some(mut partition) = in_group.take(i) {
                partition.fit();
                out_group.add(partition);
            }
        }
        in_group.clear();
        return Ok(());
    }

    let n = in_group.len();
    let local_empty = (0..n)
        .filter(|&i| in_group.get(i).is_none_or(|p| p.is_empty()))
        .count() as i64;
    let strategy = Strategy::select(transport, bag, n as i64, local_empty)?;

    let mpi_cores = transport.enable_mpi_cores()?;
    let pool = ThreadPoolDriver::new(mpi_cores)?;
    let _timer = crate::util::Timer::new(
        match strategy {
            Strategy::Sync => "exchange.sync",
            Strategy::Async => "exchange.async",
        }
        .to_string(),
    );

    match strategy {
        Strategy::Sync => {
            sync_mode::run(transport, &pool, n, executors as usize, in_group, out_group)
        }
        Strategy::Async => {
            async_mode::run(transport, &pool, n, executors as usize, in_group, out_group)
        }
    }
}
