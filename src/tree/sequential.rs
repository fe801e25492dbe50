/*!
 * Sequential Fenwick Tree
 * Single-threaded point updates and prefix queries in O(log n)
 */

use super::lowbit;
use crate::core::traits::PrefixSum;
use crate::core::types::{Operation, Value};

/// Single-threaded Fenwick (binary indexed) tree over `[0, n)`
///
/// Cell `bits[k]` holds the sum of the `lowbit(k)` logical entries ending
/// at `k`. Index 0 is unused. All cells start at zero.
#[derive(Debug, Clone)]
pub struct FenwickTree {
    bits: Vec<Value>,
}

impl FenwickTree {
    /// Create a zeroed tree over the logical domain `[0, n)`
    pub fn new(n: usize) -> Self {
        Self {
            bits: vec![0; n + 1],
        }
    }

    /// Increment the logical array at `index` by `value`
    #[inline]
    pub fn add(&mut self, index: usize, value: Value) {
        debug_assert!(index + 1 < self.bits.len(), "index {} out of range", index);
        let mut k = index + 1;
        while k < self.bits.len() {
            self.bits[k] += value;
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
            total += self.bits[k];
            k -= lowbit(k);
        }
        total
    }

    /// Apply every update in `ops`, skipping queries
    pub fn batch_add(&mut self, ops: &[Operation]) {
        for op in ops {
            if let Operation::Add { index, value } = *op {
                self.add(index, value);
            }
        }
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

impl PrefixSum for FenwickTree {
    fn add(&mut self, index: usize, value: Value) {
        FenwickTree::add(self, index, value)
    }

    fn sum(&self, index: usize) -> Value {
        FenwickTree::sum(self, index)
    }

    fn len(&self) -> usize {
        FenwickTree::len(self)
    }
}
