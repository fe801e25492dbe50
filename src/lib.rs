/*!
 * Parallel Prefix-Sum Index
 * Fenwick tree over a dense integer domain with a family of concurrency
 * strategies for bulk application of mixed update/query batches
 */

pub mod core;
pub mod exec;
pub mod partition;
pub mod scheduler;
pub mod tree;
pub mod workload;

pub use crate::core::errors::{ConfigError, StrategyError};
pub use crate::core::traits::{BatchExecutor, PrefixSum, SharedPrefixSum};
pub use crate::core::types::{Operation, QueryResult, Value};
pub use crate::exec::{
    AggregateExecutor, LazyExecutor, LockedExecutor, PipelineExecutor, SemiStaticExecutor,
    SequentialExecutor, Strategy,
};
pub use crate::partition::{partition, update_traffic, WorkerRange};
pub use crate::scheduler::{CentralScheduler, DecentralizedExecutor, LockFreeScheduler};
pub use crate::tree::{AtomicFenwick, FenwickTree, StripedFenwick};
pub use crate::workload::Generator;
