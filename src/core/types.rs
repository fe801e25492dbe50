/*!
 * Core Types
 * Common types used across the crate
 */

use serde::{Deserialize, Serialize};

/// Cell value and query result type
pub type Value = i32;

/// 1-based index into the Fenwick array
pub type TreeIndex = usize;

/// Worker thread identifier
pub type WorkerId = usize;

/// A single entry in a batch workload
///
/// Indices are logical array positions in `[0, n)`. For `Query` the result
/// is the prefix sum `A[0] + ... + A[index]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Add { index: usize, value: Value },
    Query { index: usize },
}

impl Operation {
    /// Logical array index this operation touches
    #[inline]
    pub fn index(&self) -> usize {
        match *self {
            Operation::Add { index, .. } => index,
            Operation::Query { index } => index,
        }
    }

    #[inline]
    pub fn is_query(&self) -> bool {
        matches!(self, Operation::Query { .. })
    }
}

/// Answer to one `Query` in a batch
///
/// `position` is the operation's index within the batch, not the query's
/// ordinal. Executors return one entry per query, in batch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub position: usize,
    pub value: Value,
}

/// Common result type for constructor validation
pub type ConfigResult<T> = Result<T, super::errors::ConfigError>;
