use std::fmt;

use roost_api::dispatch::Dispatcher;
use roost_api::types::Task;
use tokio::runtime::Handle;

/// Runs mailboxes on the worker threads of a tokio runtime.
pub struct ThreadPoolDispatcher {
    id: String,
    throughput: usize,
    handle: Handle,
}

impl ThreadPoolDispatcher {
    pub fn new(id: impl Into<String>, throughput: usize, handle: Handle) -> Self {
        Self {
            id: id.into(),
            throughput: throughput.max(1),
            handle,
        }
    }
}

impl Dispatcher for ThreadPoolDispatcher {
    fn id(&self) -> &str {
        &self.id
    }

    fn throughput(&self) -> usize {
        self.throughput
    }

    fn execute(&self, task: Task) {
        // the join handle is dropped; the task runs detached
        self.handle.spawn(async move { task() });
    }
}

impl fmt::Debug for ThreadPoolDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPoolDispatcher")
            .field("id", &self.id)
            .field("throughput", &self.throughput)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_execute_runs_on_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let dispatcher = ThreadPoolDispatcher::new("pool", 5, runtime.handle().clone());
        let (tx, rx) = flume::bounded(1);

        dispatcher.execute(Box::new(move || {
            tx.send(std::thread::current().id()).unwrap();
        }));

        let worker = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_ne!(worker, std::thread::current().id());
        assert_eq!(dispatcher.throughput(), 5);
    }
}
