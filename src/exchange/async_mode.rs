//! Asynchronous exchange execution (C6, §4.3): pairwise send/receive over a
//! round-robin tournament, skipping pairs where both sides hold nothing.

use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::pairing::{build_pairing_schedule, bye_peer};
use super::plan::owner_range;
use crate::partition::{Partition, PartitionGroup};
use crate::pool::ThreadPoolDriver;
use crate::transport::Transport;
use crate::Error;

const TAG: i32 = 0;

/// Folds a just-received candidate into `slot`, preferring whichever of the
/// existing and incoming values is non-empty (at most one real owner ever
/// contributes non-empty content for a given index across all rounds, but
/// every other peer still round-trips an empty placeholder for it).
fn merge_received<T>(slot: &Mutex<Option<Partition<T>>>, received: Partition<T>) {
    let mut slot = slot.lock().unwrap();
    if !received.is_empty() || slot.is_none() {
        *slot = Some(received);
    }
}

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
    let e = executors as i32;
    let my_rank = transport.rank() as usize;
    let ranges: Vec<(usize, usize)> = (0..executors).map(|r| owner_range(n, executors, r)).collect();
    let (my_init, my_end) = ranges[my_rank];
    let schedule = build_pairing_schedule(e);
    let my_queue = &schedule[my_rank];
    tracing::debug!(n, executors, rounds = my_queue.len(), "asynchronous exchange pairing built");

    let working: Vec<Mutex<Option<Partition<T>>>> =
        (0..n).map(|i| Mutex::new(in_group.take(i))).collect();

    for &peer in my_queue {
        if peer == bye_peer(e) {
            continue;
        }
        let (other_init, other_end) = ranges[peer as usize];

        let ignore_local = working[other_init..other_end]
            .iter()
            .all(|slot| slot.lock().unwrap().as_ref().is_none_or(|p| p.is_empty()));
        let ignore_remote = transport.sendrecv_u8(ignore_local as u8, peer)? == 1;
        if ignore_local && ignore_remote {
            for slot in &working[other_init..other_end] {
                *slot.lock().unwrap() = None;
            }
            continue;
        }

        let my_len = my_end - my_init;
        let other_len = other_end - other_init;
        let rounds = my_len.max(other_len);
        pool.for_each_static(rounds, |j| {
            let me_in_range = j < my_len;
            let other_in_range = j < other_len;
            let me_part = my_init + j;
            let other_part = other_init + j;
            match (me_in_range, other_in_range) {
                (true, true) => {
                    let send = working[other_part].lock().unwrap().take().unwrap_or_else(Partition::empty);
                    let received = transport.send_recv_partition(&send, peer, TAG)?;
                    merge_received(&working[me_part], received);
                }
                (true, false) => {
                    let received = transport.recv_partition(peer, TAG)?;
                    merge_received(&working[me_part], received);
                }
                (false, true) => {
                    let send = working[other_part].lock().unwrap().take().unwrap_or_else(Partition::empty);
                    transport.send_partition(&send, peer, TAG)?;
                }
                (false, false) => {}
            }
            Ok(())
        })?;
    }

    for (i, slot) in working.into_iter().enumerate() {
        in_group.set(i, slot.into_inner().unwrap());
    }
    in_group.harvest_into(out_group);
    Ok(())
}
