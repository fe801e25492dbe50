/*!
 * Workload Generator
 * Deterministic pseudorandom mixed update/query streams
 */

use crate::core::types::{Operation, Value};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Largest update value produced
const MAX_VALUE: Value = 100;

/// Seeded stream of operations over a fixed domain
///
/// Each draw is a query with probability `query_permille / 1000`, else an
/// update with a uniform index in `[0, domain)` and a uniform value in
/// `[1, 100]`. Two generators with the same seed produce identical
/// streams.
pub struct Generator {
    rng: SmallRng,
    domain: usize,
    query_permille: u32,
}

impl Generator {
    pub fn new(domain: usize, query_permille: u32, seed: u64) -> Self {
        assert!(domain > 0, "domain must be non-empty");
        assert!(query_permille <= 1000, "query permille out of range");
        Self {
            rng: SmallRng::seed_from_u64(seed),
            domain,
            query_permille,
        }
    }

    /// Draw the next operation
    pub fn next_op(&mut self) -> Operation {
        let roll: u32 = self.rng.random_range(1..=1000);
        let index = self.rng.random_range(0..self.domain);
        if roll <= self.query_permille {
            Operation::Query { index }
        } else {
            Operation::Add {
                index,
                value: self.rng.random_range(1..=MAX_VALUE),
            }
        }
    }

    /// Draw a whole batch
    pub fn batch(&mut self, len: usize) -> Vec<Operation> {
        (0..len).map(|_| self.next_op()).collect()
    }
}
