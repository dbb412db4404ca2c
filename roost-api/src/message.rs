//! # Envelopes and System Messages
//!
//! User messages travel as type-erased [`Message`] values wrapped in an
//! [`Envelope`] that remembers the declared sender. Control signals travel on
//! the mailbox's priority path as [`SystemMessage`] values.

use std::fmt;

use crate::actor_ref::ActorRef;
use crate::types::Message;

/// A user message plus its declared sender.
#[derive(Clone)]
pub struct Envelope {
    pub sender: Option<ActorRef>,
    pub message: Message,
}

impl Envelope {
    pub fn new(message: Message, sender: Option<ActorRef>) -> Self {
        Self { sender, message }
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("sender", &self.sender.as_ref().map(|s| s.path().to_string()))
            .field("message", &"<dyn Any>")
            .finish()
    }
}

/// Kernel-defined control signals delivered through `system_invoke`.
#[derive(Debug, Clone)]
pub enum SystemMessage {
    /// `watcher` subscribes to the termination of `watchee`.
    Watch { watchee: ActorRef, watcher: ActorRef },
    /// `watcher` cancels a previous `Watch`.
    Unwatch { watchee: ActorRef, watcher: ActorRef },
    /// Stop the receiving actor and its children.
    Terminate,
}

impl SystemMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            SystemMessage::Watch { .. } => "watch",
            SystemMessage::Unwatch { .. } => "unwatch",
            SystemMessage::Terminate => "terminate",
        }
    }
}

/// Sent to every watcher once the watched actor has stopped.
#[derive(Debug, Clone)]
pub struct Terminated {
    pub actor: ActorRef,
}
