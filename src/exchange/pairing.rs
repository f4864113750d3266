//! Asynchronous exchange pairing schedule (C6, §4.3, §3): a circle
//! tournament over `e` real ranks (plus a virtual bye slot when `e` is odd)
//! so every unordered pair of ranks exchanges in exactly one of `e` rounds,
//! and no rank is ever double-booked within a round.

/// Sentinel peer value meaning "this round is a bye" — never a real rank.
pub fn bye_peer(e: i32) -> i32 {
    e
}

/// Builds every real rank's per-round peer queue. `schedule[rank][round]` is
/// either another real rank in `[0, e)` or [`bye_peer`] if `rank` sits out
/// that round (only possible when `e` is odd). Pure function of `e` (§9):
/// every rank computes this identically without coordination.
///
/// The schedule runs `m - 1` rounds (`m` players meet in `m - 1` rounds in a
/// standard circle tournament), which is `e` rounds when `e` is odd (the
/// virtual bye player makes `m = e + 1` even) and `e - 1` rounds when `e` is
/// already even — one round fewer than `e`, since a full pass of `e` rounds
/// would repeat the first round's pairing.
pub fn build_pairing_schedule(e: i32) -> Vec<Vec<i32>> {
    assert!(e >= 1, "pairing schedule needs at least one rank");
    let m = if e % 2 == 0 { e } else { e + 1 };
    let rounds = m - 1;

    let mut schedule = vec![Vec::with_capacity(rounds as usize); e as usize];
    for rank in 0..e {
        let mut id = 0i32;
        let mut id2 = m * m - 2;
        for _round in 0..rounds {
            let mut peer = None;
            if rank == id.rem_euclid(m - 1) {
                peer = Some(m - 1);
            }
            if rank == m - 1 {
                peer = Some(id.rem_euclid(m - 1));
            }
            id += 1;
            for _ in 1..(m / 2) {
                if rank == id.rem_euclid(m - 1) {
                    peer = Some(id2.rem_euclid(m - 1));
                }
                if rank == id2.rem_euclid(m - 1) {
                    peer = Some(id.rem_euclid(m - 1));
                }
                id += 1;
                id2 -= 1;
            }
            schedule[rank as usize].push(peer.expect("every rank is paired or byes every round"));
        }
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_valid_tournament(e: i32) {
        let schedule = build_pairing_schedule(e);
        let m = if e % 2 == 0 { e } else { e + 1 };
        let rounds = (m - 1) as usize;
        assert_eq!(schedule.len(), e as usize);
        for queue in &schedule {
            assert_eq!(queue.len(), rounds, "e={e}");
        }

        let mut seen_pairs: HashSet<(i32, i32)> = HashSet::new();
        let mut bye_count = vec![0usize; e as usize];

        for round in 0..rounds {
            let mut paired_this_round: HashSet<i32> = HashSet::new();
            for rank in 0..e {
                let peer = schedule[rank as usize][round];
                assert_ne!(peer, rank, "rank paired with itself, e={e}");
                if peer == bye_peer(e) {
                    bye_count[rank as usize] += 1;
                    continue;
                }
                assert!(
                    paired_this_round.insert(rank),
                    "rank {rank} double-booked in round {round}, e={e}"
                );
                // the peer's queue must agree rank is its partner this round
                assert_eq!(
                    schedule[peer as usize][round], rank,
                    "asymmetric pairing rank={rank} peer={peer} round={round}, e={e}"
                );
                if rank < peer {
                    assert!(seen_pairs.insert((rank, peer)), "pair {rank:?},{peer:?} repeated, e={e}");
                }
            }
        }

        let expected_pairs = (e as usize * (e as usize - 1)) / 2;
        assert_eq!(seen_pairs.len(), expected_pairs, "e={e}");

        if e % 2 == 0 {
            assert!(bye_count.iter().all(|&c| c == 0), "even e={e} should have no byes");
        } else {
            assert!(bye_count.iter().all(|&c| c == 1), "odd e={e} each rank should bye exactly once");
        }
    }

    /// S4/S5 (pairing completeness): every unordered pair appears exactly
    /// once, no self-pairing, byes only for odd `e`.
    #[test]
    fn round_robin_is_valid_for_small_e() {
        for e in 2..=16 {
            assert_valid_tournament(e);
        }
    }

    #[test]
    fn schedule_is_deterministic() {
        for e in 2..=10 {
            assert_eq!(build_pairing_schedule(e), build_pairing_schedule(e), "e={e}");
        }
    }

    /// S5: with E=3 (odd), rank 0's queue contains exactly one bye.
    #[test]
    fn s5_odd_executor_count_has_one_bye_per_rank() {
        let schedule = build_pairing_schedule(3);
        for queue in &schedule {
            assert_eq!(queue.iter().filter(|&&p| p == bye_peer(3)).count(), 1);
        }
    }

    /// `e=1` is never actually driven through the pairing path (the
    /// exchange entry point's `E == 1` fast path short-circuits first), but
    /// the builder still produces a well-formed single round with a bye.
    #[test]
    fn single_rank_byes_its_only_round() {
        assert_eq!(build_pairing_schedule(1), vec![vec![bye_peer(1)]]);
    }
}
