/*!
 * Scheduler Tasks
 * In-band work items carried through each worker's queue
 */

use crate::core::types::Value;

/// One work item for a scheduler worker
///
/// `Sync` and `Finish` travel in-band: a worker that dequeues one has, by
/// FIFO order, already drained everything submitted before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Apply to the receiving worker's private sub-tree
    Update { index: usize, value: Value },
    /// Broadcast: every worker adds its partial sum into `results[position]`
    Query { index: usize, position: usize },
    /// Broadcast barrier acknowledgment
    Sync,
    /// Broadcast shutdown; the worker exits after dequeueing this
    Finish,
}
