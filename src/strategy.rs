//! Strategy selector (C4, §4.4): picks synchronous vs. asynchronous
//! exchange, either from configuration or from a global sparsity probe.

use crate::config::{ConfigError, PropertyBag};
use crate::transport::Transport;
use crate::Error;

/// Which exchange path §4.2/§4.3 the core should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sync,
    Async,
}

impl Strategy {
    /// Reads the `exchange.type` key. `None` means "unset, run the probe".
    pub fn from_config(bag: &dyn PropertyBag) -> Result<Option<Strategy>, ConfigError> {
        match bag.get("exchange.type").as_deref() {
            None => Ok(None),
            Some("sync") => Ok(Some(Strategy::Sync)),
            Some("async") => Ok(Some(Strategy::Async)),
            Some(other) => Err(ConfigError::InvalidValue {
                key: "exchange.type".to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Resolves the strategy: configuration wins outright; otherwise runs
    /// the sparsity probe (§4.1) — a reduction of `(local_partitions,
    /// local_empty)` to rank 0, a decision, and a one-byte broadcast.
    pub fn select<Tr: Transport>(
        transport: &Tr,
        bag: &dyn PropertyBag,
        local_partitions: i64,
        local_empty: i64,
    ) -> Result<Strategy, Error> {
        if let Some(forced) = Self::from_config(bag)? {
            tracing::debug!(strategy = ?forced, "exchange.type forces strategy");
            return Ok(forced);
        }

        let root = 0;
        let sums = transport.reduce_sum_pair((local_partitions, local_empty), root)?;
        let decision_byte: u8 = if transport.is_root(root) {
            let (total_partitions, total_empty) =
                sums.expect("reduce_sum_pair returns Some on the root rank");
            let executors = transport.size() as i64;
            let sync = total_empty < total_partitions / executors;
            tracing::info!(
                total_partitions,
                total_empty,
                executors,
                sync,
                "sparsity probe decided strategy"
            );
            sync as u8
        } else {
            0
        };
        let byte = transport.bcast_u8(decision_byte, root)?;
        Ok(if byte == 1 { Strategy::Sync } else { Strategy::Async })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapPropertyBag;
    use crate::transport::loopback::LoopbackWorld;
    use std::thread;

    #[test]
    fn config_override_takes_sync() {
        let bag = MapPropertyBag::new().with("exchange.type", "sync");
        assert_eq!(Strategy::from_config(&bag).unwrap(), Some(Strategy::Sync));
    }

    #[test]
    fn config_override_takes_async() {
        let bag = MapPropertyBag::new().with("exchange.type", "async");
        assert_eq!(Strategy::from_config(&bag).unwrap(), Some(Strategy::Async));
    }

    #[test]
    fn unset_config_yields_none() {
        let bag = MapPropertyBag::new();
        assert_eq!(Strategy::from_config(&bag).unwrap(), None);
    }

    #[test]
    fn bogus_config_is_an_error() {
        let bag = MapPropertyBag::new().with("exchange.type", "bogus");
        assert!(Strategy::from_config(&bag).is_err());
    }

    /// S5 (part): sparse distribution (`total_empty >= total_partitions/E`)
    /// auto-selects async; a dense one selects sync.
    #[test]
    fn probe_selects_by_global_sparsity() {
        let run = |counts: [(i64, i64); 2]| -> [Strategy; 2] {
            let world = LoopbackWorld::new(2);
            let bag = MapPropertyBag::new();
            let handles: Vec<_> = (0..2)
                .map(|rank| {
                    let transport = world.rank_transport(rank);
                    let bag = bag.clone();
                    let (partitions, empty) = counts[rank as usize];
                    thread::spawn(move || {
                        Strategy::select(&transport, &bag, partitions, empty).unwrap()
                    })
                })
                .collect();
            let mut results = [Strategy::Sync; 2];
            for (rank, h) in handles.into_iter().enumerate() {
                results[rank] = h.join().unwrap();
            }
            results
        };

        // total_partitions = 6, total_empty = 1 < 6/2=3 -> sync
        let dense = run([(3, 1), (3, 0)]);
        assert_eq!(dense, [Strategy::Sync, Strategy::Sync]);

        // total_partitions = 6, total_empty = 4 >= 3 -> async
        let sparse = run([(3, 2), (3, 2)]);
        assert_eq!(sparse, [Strategy::Async, Strategy::Async]);
    }
}
