use roost_api::dispatch::{Dispatcher, CALLING_THREAD_DISPATCHER_ID};
use roost_api::types::Task;

/// Runs every task inline on the thread that scheduled it.
///
/// Deterministic, which makes it the dispatcher of choice for tests. A post
/// made while the target mailbox is already running on this thread only
/// enqueues; the running loop picks the message up.
#[derive(Debug, Default)]
pub struct CallingThreadDispatcher;

impl CallingThreadDispatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Dispatcher for CallingThreadDispatcher {
    fn id(&self) -> &str {
        CALLING_THREAD_DISPATCHER_ID
    }

    fn throughput(&self) -> usize {
        usize::MAX
    }

    fn execute(&self, task: Task) {
        task()
    }
}
