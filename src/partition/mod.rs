/*!
 * Range Partitioner
 * Traffic-balanced assignment of tree index stripes to workers
 */

use crate::tree::lowbit;
use log::debug;
use serde::{Deserialize, Serialize};

/// Interior boundaries are advanced to the next multiple of this many
/// indices so neighbouring stripes do not share cache lines.
const BOUNDARY_ALIGN: usize = 64;

/// Half-open interval `[lo, hi)` of 1-based tree indices owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRange {
    pub lo: usize,
    pub hi: usize,
}

impl WorkerRange {
    #[inline]
    pub fn contains(&self, k: usize) -> bool {
        self.lo <= k && k < self.hi
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hi - self.lo
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lo == self.hi
    }
}

/// Expected update traffic per tree index
///
/// `traffic[k]` counts how many of the `n` possible point updates walk
/// through cell `k`: each index contributes one visit to itself, and the
/// whole count propagates to the walk parent `k + lowbit(k)`. Computed in
/// one ascending pass.
pub fn update_traffic(n: usize) -> Vec<u64> {
    let mut traffic = vec![0u64; n + 1];
    for k in 1..=n {
        traffic[k] += 1;
        let parent = k + lowbit(k);
        if parent <= n {
            traffic[parent] += traffic[k];
        }
    }
    traffic
}

/// Partition tree indices `[1, n + 1)` into `workers` disjoint stripes
/// balanced by expected update traffic
///
/// Each worker's target is the remaining traffic divided by the remaining
/// workers. When a cut straddles its target, the closer of the two
/// candidate cuts wins; interior cuts are then advanced to a 64-index
/// boundary. The last worker absorbs whatever remains, so the stripes
/// always cover `[1, n + 1)` exactly.
pub fn partition(n: usize, workers: usize) -> Vec<WorkerRange> {
    assert!(n > 0, "domain must be non-empty");
    assert!(workers > 0, "worker count must be positive");

    let len = n + 1;
    let traffic = update_traffic(n);
    let mut remaining: u64 = traffic[1..].iter().sum();

    let mut ranges = Vec::with_capacity(workers);
    let mut cur = 1usize;

    for w in 0..workers {
        let lo = cur;
        if w + 1 == workers {
            cur = len;
        } else {
            let target = remaining / (workers - w) as u64;
            let mut acc = 0u64;
            while cur < len && acc < target {
                acc += traffic[cur];
                cur += 1;
            }

            // The loop stops at the first cut meeting the target; step back
            // when the previous cut is strictly closer to it.
            if cur > lo + 1 && acc >= target {
                let overshoot = acc - target;
                let undershoot = target - (acc - traffic[cur - 1]);
                if undershoot < overshoot {
                    cur -= 1;
                    acc -= traffic[cur];
                }
            }

            while cur < len && cur % BOUNDARY_ALIGN != 0 {
                acc += traffic[cur];
                cur += 1;
            }

            remaining = remaining.saturating_sub(acc);
        }
        ranges.push(WorkerRange { lo, hi: cur });
    }

    debug!(
        "partitioned [1, {}) into {} stripes: {:?}",
        len,
        workers,
        ranges
            .iter()
            .map(|r| (r.lo, r.hi))
            .collect::<Vec<_>>()
    );
    ranges
}

/// Split the shared cell array into per-worker mutable stripes
///
/// `cells` is the whole Fenwick array including the unused index 0; the
/// returned slices line up with `ranges`, and a worker addresses cell `k`
/// of its stripe as `stripe[k - lo]`. Ranges are contiguous and ascending
/// by construction, so plain `split_at_mut` suffices.
pub(crate) fn split_ranges<'a, T>(
    cells: &'a mut [T],
    ranges: &[WorkerRange],
) -> Vec<&'a mut [T]> {
    let mut stripes = Vec::with_capacity(ranges.len());
    let mut rest = cells;
    let mut offset = 0usize;
    for range in ranges {
        let (_, tail) = rest.split_at_mut(range.lo - offset);
        let (stripe, tail) = tail.split_at_mut(range.hi - range.lo);
        stripes.push(stripe);
        rest = tail;
        offset = range.hi;
    }
    stripes
}
