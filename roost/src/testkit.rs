//! Test probe: an actor that hands everything it receives to the test thread.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use roost_api::actor::Actor;
use roost_api::actor_ref::ActorRef;
use roost_api::context::ActorContext;
use roost_api::errors::ActorError;
use roost_api::message::SystemMessage;
use roost_api::props::Props;
use roost_api::types::{ActorResult, Message};

use crate::system::ActorSystem;

/// A message observed by a [`TestProbe`].
#[derive(Debug, Clone)]
pub struct Received {
    pub message: Message,
    pub sender: Option<ActorRef>,
}

struct ProbeActor {
    tx: Sender<Received>,
}

impl Actor for ProbeActor {
    fn receive(&mut self, ctx: &mut dyn ActorContext, message: &Message) -> ActorResult<()> {
        let received = Received {
            message: message.clone(),
            sender: ctx.sender().cloned(),
        };
        // a dropped probe just stops listening
        let _ = self.tx.send(received);
        Ok(())
    }
}

pub struct TestProbe {
    actor: ActorRef,
    rx: Receiver<Received>,
    last_sender: Mutex<Option<ActorRef>>,
}

impl TestProbe {
    /// Probe with a synthesized name under `/system`.
    pub fn new(system: &ActorSystem) -> ActorResult<Self> {
        Self::spawn(system, None)
    }

    pub fn named(system: &ActorSystem, name: &str) -> ActorResult<Self> {
        Self::spawn(system, Some(name))
    }

    fn spawn(system: &ActorSystem, name: Option<&str>) -> ActorResult<Self> {
        let (tx, rx) = flume::unbounded();
        let props = Props::create(move || ProbeActor { tx: tx.clone() });
        let actor = system.system_actor_of(&props, name)?;
        Ok(Self {
            actor,
            rx,
            last_sender: Mutex::new(None),
        })
    }

    pub fn actor_ref(&self) -> &ActorRef {
        &self.actor
    }

    /// Next message, whatever its type.
    pub fn expect_received(&self, timeout: Duration) -> ActorResult<Received> {
        let received = self
            .rx
            .recv_timeout(timeout)
            .map_err(|_| ActorError::Timeout(format!("no message for [{}] within {:?}", self.actor.path(), timeout)))?;
        *self.last_sender.lock() = received.sender.clone();
        Ok(received)
    }

    /// Next message, which must be a `T`.
    pub fn expect_msg<T: Any + Send + Sync>(&self, timeout: Duration) -> ActorResult<Arc<T>> {
        let received = self.expect_received(timeout)?;
        received.message.downcast::<T>().map_err(|_| {
            ActorError::MessageHandlingError(format!(
                "[{}] expected a {}",
                self.actor.path(),
                std::any::type_name::<T>()
            ))
        })
    }

    /// Fails if anything arrives within `within`.
    pub fn expect_no_msg(&self, within: Duration) -> ActorResult<()> {
        match self.rx.recv_timeout(within) {
            Ok(received) => Err(ActorError::MessageHandlingError(format!(
                "[{}] got an unexpected message from {:?}",
                self.actor.path(),
                received.sender.map(|s| s.path().to_string())
            ))),
            Err(_) => Ok(()),
        }
    }

    /// Sender of the message last taken by an `expect_*` call.
    pub fn last_sender(&self) -> Option<ActorRef> {
        self.last_sender.lock().clone()
    }

    /// Subscribes the probe to the termination of `target`.
    pub fn watch(&self, target: &ActorRef) {
        target.send_system_message(SystemMessage::Watch {
            watchee: target.clone(),
            watcher: self.actor.clone(),
        });
    }

    /// Tells `target` a message with the probe as the sender.
    pub fn tell<M: Any + Send + Sync>(&self, target: &ActorRef, message: M) -> ActorResult<()> {
        target.tell(message, Some(&self.actor))
    }
}

impl std::fmt::Debug for TestProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestProbe")
            .field("actor", &self.actor.path().to_string())
            .field("pending", &self.rx.len())
            .finish()
    }
}
