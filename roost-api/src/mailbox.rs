use std::fmt::Debug;
use std::sync::{Arc, Weak};

use crate::dispatch::Dispatcher;
use crate::message::{Envelope, SystemMessage};
use crate::types::ActorResult;

/// Id of the mailbox used when `Props` names none.
pub const DEFAULT_MAILBOX_ID: &str = "roost.actor.default-mailbox";

/// Callbacks a mailbox drives, implemented by the cell.
pub trait MessageInvoker: Send + Sync {
    /// Processes one user message.
    fn invoke(&self, envelope: Envelope) -> ActorResult<()>;

    /// Processes one system message.
    fn system_invoke(&self, message: SystemMessage) -> ActorResult<()>;
}

/// Abstract interface for an actor's message queue.
///
/// Implementors must guarantee FIFO ordering per queue, at most one running
/// invocation per mailbox, and that pending system messages are handled
/// before each user message.
pub trait Mailbox: Send + Sync + Debug {
    /// Binds the mailbox to the dispatcher its processing runs on.
    fn setup(&self, dispatcher: Arc<dyn Dispatcher>);

    /// Installs the callbacks that consume messages.
    fn register_invoker(&self, invoker: Weak<dyn MessageInvoker>);

    /// Enqueues a user message and schedules processing if needed.
    fn post(&self, envelope: Envelope);

    /// Enqueues a system message on the priority queue.
    fn post_system(&self, message: SystemMessage);

    /// Stops user-message processing; system messages still run.
    fn suspend(&self);

    /// Resumes processing and reschedules pending work.
    fn resume(&self);

    /// Closes the mailbox; later posts are dropped.
    fn close(&self);

    fn is_closed(&self) -> bool;

    /// Number of pending user messages (snapshot in time).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
