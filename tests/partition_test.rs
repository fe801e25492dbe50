/*!
 * Partition Tests
 * Stripe cover and balance properties, including under semi-static drift
 */

use fenwick_par::{partition, update_traffic, Generator, Operation, SemiStaticExecutor, WorkerRange};
use fenwick_par::BatchExecutor;
use pretty_assertions::assert_eq;

fn assert_covers(ranges: &[WorkerRange], n: usize) {
    assert_eq!(ranges[0].lo, 1, "first stripe must start at 1");
    assert_eq!(ranges[ranges.len() - 1].hi, n + 1, "last stripe must end at n+1");
    for pair in ranges.windows(2) {
        assert_eq!(pair[0].hi, pair[1].lo, "stripes must be contiguous");
    }
}

#[test]
fn test_cover_across_shapes() {
    for n in [1usize, 2, 63, 64, 65, 1000, 1 << 14] {
        for workers in [1usize, 2, 3, 8] {
            let ranges = partition(n, workers);
            assert_eq!(ranges.len(), workers, "n={} W={}", n, workers);
            assert_covers(&ranges, n);
        }
    }
}

#[test]
fn test_indices_assigned_to_exactly_one_stripe() {
    let n = 2000;
    let ranges = partition(n, 3);
    for k in 1..=n {
        let owners = ranges.iter().filter(|r| r.contains(k)).count();
        assert_eq!(owners, 1, "index {}", k);
    }
}

#[test]
fn test_traffic_conserved_by_partition() {
    let n = 1 << 12;
    let traffic = update_traffic(n);
    let total: u64 = traffic[1..].iter().sum();

    let ranges = partition(n, 4);
    let partitioned: u64 = ranges
        .iter()
        .map(|r| traffic[r.lo..r.hi].iter().sum::<u64>())
        .sum();
    assert_eq!(partitioned, total);
}

#[test]
fn test_traffic_counts_walk_visits() {
    // Every update visits O(log n) cells; the total traffic is the sum of
    // walk lengths from each starting index.
    let n = 256;
    let traffic = update_traffic(n);

    let mut expected = 0u64;
    for start in 1..=n {
        let mut k = start;
        while k <= n {
            expected += 1;
            k += k & k.wrapping_neg();
        }
    }
    assert_eq!(traffic[1..].iter().sum::<u64>(), expected);
}

#[test]
fn test_semi_static_cover_after_ten_batches() {
    let n = 64;
    let mut exec = SemiStaticExecutor::new(n, 3).unwrap();
    let mut generator = Generator::new(n, 0, 3);

    for _ in 0..10 {
        let batch: Vec<Operation> = generator.batch(128);
        exec.execute(&batch);
        assert_covers(exec.ranges(), n);
    }
}

#[test]
fn test_semi_static_stripes_stay_nonempty_on_tiny_domain() {
    let n = 8;
    let mut exec = SemiStaticExecutor::new(n, 2).unwrap();
    let mut generator = Generator::new(n, 0, 11);

    for _ in 0..20 {
        exec.execute(&generator.batch(16));
        assert_covers(exec.ranges(), n);
        assert!(exec.ranges().iter().all(|r| !r.is_empty()));
    }
}
