//! Synchronous exchange plan construction (C5, §4.2, §3).
//!
//! A plan entry `(p, target)` says "the partition at global index `p`
//! belongs to rank `target` after exchange". The plan is a pure function of
//! `(n, e)` — every rank must build the byte-identical sequence (§9).

/// The contiguous range of global indices rank `rank` owns once `n`
/// partitions are split across `e` executors (§3): the first `remainder`
/// ranks get `block + 1` indices each, the rest get `block`.
pub fn owner_range(n: usize, e: usize, rank: usize) -> (usize, usize) {
    let block = n / e;
    let remainder = n % e;
    if rank < remainder {
        let start = (block + 1) * rank;
        (start, start + block + 1)
    } else {
        let start = (block + 1) * remainder + block * (rank - remainder);
        (start, start + block)
    }
}

/// Builds the full `(global_index, owner_rank)` assignment, in the
/// round-robin-scattered order the parallel loop (§4.2 "Execution") walks
/// it in: rank `i`'s `block` (or `block+1`) contiguous indices are laid
/// into a working array interleaved with every other rank's share, so
/// consecutive loop iterations target different owners and the gather
/// collectives spread load evenly across the parallel loop's lifetime.
///
/// Every entry's `target` equals [`owner_range`]'s containing rank for `p`;
/// this is exercised exhaustively in `tests::matches_owner_range`.
pub fn build_plan(n: usize, e: usize) -> Vec<(usize, usize)> {
    let block = n / e;
    let remainder = n % e;
    let width = (block + 1) * e;
    let mut working: Vec<Option<(usize, usize)>> = vec![None; width];

    let mut cursor = 0usize;
    for i in 0..e {
        for j in 0..block {
            working[j * e + i] = Some((cursor + j, i));
        }
        cursor += block;
        if i < remainder {
            working[block * e + i] = Some((cursor, i));
            cursor += 1;
        }
    }

    working.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// S7: the plan is a pure function of `(n, e)`, covers `[0, n)` exactly
    /// once, and every entry's target matches the contiguous range formula —
    /// the open question §9 flags as needing an exhaustive check.
    #[test]
    fn matches_owner_range_exhaustively() {
        for e in 2..=16usize {
            for n in 0..=40usize {
                let plan = build_plan(n, e);
                assert_eq!(plan.len(), n, "n={n} e={e}");

                let seen: HashSet<usize> = plan.iter().map(|(p, _)| *p).collect();
                assert_eq!(seen.len(), n, "duplicate index in plan, n={n} e={e}");
                assert_eq!(seen, (0..n).collect(), "plan does not cover [0,n), n={n} e={e}");

                for &(p, target) in &plan {
                    let (start, end) = owner_range(n, e, target);
                    assert!(
                        (start..end).contains(&p),
                        "index {p} assigned to rank {target} outside its range {start}..{end} (n={n} e={e})"
                    );
                }
            }
        }
    }

    #[test]
    fn plans_are_deterministic() {
        for e in 2..=8usize {
            for n in 0..=20usize {
                assert_eq!(build_plan(n, e), build_plan(n, e), "n={n} e={e}");
            }
        }
    }

    /// S3: E=3, N=7 — rank 0 owns {0,1,2}, rank 1 {3,4}, rank 2 {5,6}.
    #[test]
    fn s3_seven_over_three() {
        assert_eq!(owner_range(7, 3, 0), (0, 3));
        assert_eq!(owner_range(7, 3, 1), (3, 5));
        assert_eq!(owner_range(7, 3, 2), (5, 7));
    }

    /// S2: E=2, N=6 — rank 0 owns {0,1,2}, rank 1 owns {3,4,5}.
    #[test]
    fn s2_six_over_two() {
        assert_eq!(owner_range(6, 2, 0), (0, 3));
        assert_eq!(owner_range(6, 2, 1), (3, 6));
    }

    #[test]
    fn empty_input_yields_empty_plan() {
        assert_eq!(build_plan(0, 4), Vec::new());
    }
}
