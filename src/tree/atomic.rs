/*!
 * Atomic Fenwick Tree
 * Lock-free point updates over atomic cells
 */

use super::lowbit;
use crate::core::traits::SharedPrefixSum;
use crate::core::types::Value;
use std::sync::atomic::{AtomicI32, Ordering};

/// Fenwick tree whose cells are atomics
///
/// `add` is lock-free: each visited cell takes one relaxed `fetch_add`.
/// Concurrent adds commute, so any interleaving produces the same final
/// cells. `sum` issues relaxed loads; drivers that need exact results must
/// not run it concurrently with writers. The lazy batch driver separates
/// the two with a fork/join barrier, which also provides the cross-thread
/// ordering.
pub struct AtomicFenwick {
    bits: Vec<AtomicI32>,
}

impl AtomicFenwick {
    /// Create a zeroed tree over the logical domain `[0, n)`
    pub fn new(n: usize) -> Self {
        Self {
            bits: (0..n + 1).map(|_| AtomicI32::new(0)).collect(),
        }
    }

    /// Increment the logical array at `index` by `value`
    #[inline]
    pub fn add(&self, index: usize, value: Value) {
        debug_assert!(index + 1 < self.bits.len(), "index {} out of range", index);
        let mut k = index + 1;
        while k < self.bits.len() {
            self.bits[k].fetch_add(value, Ordering::Relaxed);
            k += lowbit(k);
        }
    }

    /// Prefix sum over `[0, index]`
    #[inline]
    pub fn sum(&self, index: usize) -> Value {
        debug_assert!(index + 1 < self.bits.len(), "index {} out of range", index);
        let mut total = 0;
        let mut k = index + 1;
        while k > 0 {
            total += self.bits[k].load(Ordering::Relaxed);
            k -= lowbit(k);
        }
        total
    }

    /// Size of the logical domain
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SharedPrefixSum for AtomicFenwick {
    fn add(&self, index: usize, value: Value) {
        AtomicFenwick::add(self, index, value)
    }

    fn sum(&self, index: usize) -> Value {
        AtomicFenwick::sum(self, index)
    }

    fn len(&self) -> usize {
        AtomicFenwick::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequential_semantics() {
        let tree = AtomicFenwick::new(8);
        tree.add(0, 1);
        tree.add(3, 2);
        tree.add(5, 4);

        assert_eq!(tree.sum(2), 1);
        assert_eq!(tree.sum(4), 3);
        assert_eq!(tree.sum(7), 7);
    }

    #[test]
    fn test_concurrent_adds_commute() {
        let tree = Arc::new(AtomicFenwick::new(1024));
        let mut handles = vec![];

        for t in 0..4 {
            let tree = Arc::clone(&tree);
            handles.push(thread::spawn(move || {
                for i in 0..1024usize {
                    tree.add(i, (t + 1) as Value);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // 1 + 2 + 3 + 4 applied at every index
        for i in [0usize, 1, 511, 1023] {
            assert_eq!(tree.sum(i), 10 * (i as Value + 1));
        }
    }
}
