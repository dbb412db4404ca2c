use std::fmt::Debug;

use crate::types::Task;

/// Id of the thread-pool dispatcher.
pub const DEFAULT_DISPATCHER_ID: &str = "roost.actor.default-dispatcher";

/// Id of the dispatcher that runs mailboxes on the posting thread.
pub const CALLING_THREAD_DISPATCHER_ID: &str = "roost.actor.calling-thread-dispatcher";

/// Execution policy a mailbox runs under.
pub trait Dispatcher: Send + Sync + Debug {
    fn id(&self) -> &str;

    /// Maximum number of user messages processed per scheduling.
    fn throughput(&self) -> usize;

    /// Runs `task` according to the policy.
    fn execute(&self, task: Task);
}
