//! Synchronous exchange execution (C5, §4.2): gather each global partition
//! index to its deterministic owner rank.

use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::plan::build_plan;
use crate::partition::{Partition, PartitionGroup};
use crate::pool::ThreadPoolDriver;
use crate::transport::Transport;
use crate::Error;

pub(super) fn run<T, Tr>(
    transport: &Tr,
    pool: &ThreadPoolDriver,
    n: usize,
    executors: usize,
    in_group: &mut PartitionGroup<T>,
    out_group: &mut PartitionGroup<T>,
) -> Result<(), Error>
where
    T: Serialize + DeserializeOwned + Send,
    Tr: Transport,
{
    let plan = build_plan(n, executors);
    tracing::debug!(n, executors, "synchronous exchange plan built");

    let working: Vec<Mutex<Option<Partition<T>>>> =
        (0..n).map(|i| Mutex::new(in_group.take(i))).collect();

    pool.for_each_static(n, |i| {
        let (p, target) = plan[i];
        let local = working[p].lock().unwrap().take();
        let gathered = transport.gather_partition(local, target as i32, p)?;
        if transport.is_root(target as i32) {
            let mut partition = gathered.unwrap_or_else(Partition::empty);
            partition.fit();
            *working[p].lock().unwrap() = Some(partition);
        } else {
            *working[p].lock().unwrap() = None;
        }
        Ok(())
    })?;

    for (i, slot) in working.into_iter().enumerate() {
        in_group.set(i, slot.into_inner().unwrap());
    }
    in_group.harvest_into(out_group);
    Ok(())
}
