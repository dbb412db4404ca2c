use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use roost_api::dispatch::Dispatcher;
use roost_api::mailbox::{Mailbox, MessageInvoker};
use roost_api::message::{Envelope, SystemMessage};
use roost_api::path::ActorPath;
use tracing::{error, trace, warn};

/// Unbounded mailbox with a separate priority queue for system messages.
///
/// At most one processing run is in flight, guarded by the `scheduled` flag.
/// A run drains pending system messages before each user message and
/// handles at most `throughput` user messages before handing the worker back.
pub struct UnboundedMailbox {
    path: ActorPath,
    this: Weak<UnboundedMailbox>,
    user: SegQueue<Envelope>,
    system: SegQueue<SystemMessage>,
    scheduled: AtomicBool,
    suspended: AtomicUsize,
    closed: AtomicBool,
    dispatcher: OnceLock<Arc<dyn Dispatcher>>,
    invoker: Mutex<Option<Weak<dyn MessageInvoker>>>,
}

impl UnboundedMailbox {
    pub fn new(path: ActorPath) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            path,
            this: this.clone(),
            user: SegQueue::new(),
            system: SegQueue::new(),
            scheduled: AtomicBool::new(false),
            suspended: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            dispatcher: OnceLock::new(),
            invoker: Mutex::new(None),
        })
    }

    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire) > 0
    }

    fn has_work(&self) -> bool {
        !self.system.is_empty() || (!self.is_suspended() && !self.user.is_empty())
    }

    fn schedule(&self) {
        if self.is_closed() || !self.has_work() {
            return;
        }
        if self
            .scheduled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let (Some(dispatcher), Some(this)) = (self.dispatcher.get(), self.this.upgrade()) else {
            self.scheduled.store(false, Ordering::Release);
            return;
        };
        trace!(path = %self.path, "mailbox scheduled");
        dispatcher.execute(Box::new(move || this.run()));
    }

    fn run(&self) {
        let invoker = self.invoker.lock().as_ref().and_then(Weak::upgrade);
        let Some(invoker) = invoker else {
            // not started yet, or closed; register_invoker schedules again
            self.scheduled.store(false, Ordering::Release);
            if self.has_invoker() {
                self.schedule();
            }
            return;
        };
        let throughput = self.dispatcher.get().map_or(1, |d| d.throughput());
        self.process(&*invoker, throughput);
        drop(invoker);

        self.scheduled.store(false, Ordering::Release);
        // work posted between the last pop and the flag reset
        self.schedule();
    }

    fn has_invoker(&self) -> bool {
        self.invoker.lock().as_ref().is_some_and(|weak| weak.strong_count() > 0)
    }

    fn process(&self, invoker: &dyn MessageInvoker, throughput: usize) {
        let mut processed = 0;
        loop {
            self.process_system(invoker);
            if self.is_closed() || self.is_suspended() || processed >= throughput {
                break;
            }
            let Some(envelope) = self.user.pop() else {
                break;
            };
            processed += 1;
            match catch_unwind(AssertUnwindSafe(|| invoker.invoke(envelope))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => crate::log_error!(err, path = %self.path, "message invocation failed"),
                Err(_) => error!(path = %self.path, "actor panicked while handling a message"),
            }
        }
    }

    fn process_system(&self, invoker: &dyn MessageInvoker) {
        while !self.is_closed() {
            let Some(message) = self.system.pop() else {
                break;
            };
            let kind = message.kind();
            match catch_unwind(AssertUnwindSafe(|| invoker.system_invoke(message))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => crate::log_error!(err, path = %self.path, kind, "system invocation failed"),
                Err(_) => error!(path = %self.path, kind, "actor panicked while handling a system message"),
            }
        }
    }
}

impl Mailbox for UnboundedMailbox {
    fn setup(&self, dispatcher: Arc<dyn Dispatcher>) {
        if self.dispatcher.set(dispatcher).is_err() {
            warn!(path = %self.path, "mailbox already bound to a dispatcher");
        }
    }

    fn register_invoker(&self, invoker: Weak<dyn MessageInvoker>) {
        *self.invoker.lock() = Some(invoker);
        self.schedule();
    }

    fn post(&self, envelope: Envelope) {
        if self.is_closed() {
            trace!(path = %self.path, "post to closed mailbox dropped");
            return;
        }
        self.user.push(envelope);
        self.schedule();
    }

    fn post_system(&self, message: SystemMessage) {
        if self.is_closed() {
            trace!(path = %self.path, kind = message.kind(), "system message to closed mailbox dropped");
            return;
        }
        self.system.push(message);
        self.schedule();
    }

    fn suspend(&self) {
        self.suspended.fetch_add(1, Ordering::AcqRel);
    }

    fn resume(&self) {
        let resumed = self
            .suspended
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if resumed.is_ok() {
            self.schedule();
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        while self.user.pop().is_some() {}
        *self.invoker.lock() = None;
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn len(&self) -> usize {
        self.user.len()
    }
}

impl fmt::Debug for UnboundedMailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnboundedMailbox")
            .field("path", &self.path.to_string())
            .field("pending", &self.user.len())
            .field("pending_system", &self.system.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
