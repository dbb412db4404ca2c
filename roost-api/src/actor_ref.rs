//! # Actor References
//!
//! ## Key Concepts
//! - ActorRef: closed set of send-capability variants behind one `tell`
//! - InternalCell: the runtime seam a Local reference is backed by
//! - DeadLetterActorRef: per-system sink for undeliverable messages
//! - VirtualPathContainer: synthetic subtree (e.g. temporary actors)
//!
//! ## Identity
//! References compare by identity: two Local references are equal only when
//! they are backed by the same cell. Hashing uses the path, which is stable
//! for the lifetime of a cell.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use lazy_static::lazy_static;
use tracing::{debug, trace};

use crate::message::SystemMessage;
use crate::path::{ActorPath, Address};
use crate::props::Props;
use crate::supervisor::SupervisorStrategy;
use crate::types::{ActorResult, Message};

lazy_static! {
    static ref NOBODY_PATH: ActorPath =
        ActorPath::root(Address::new("roost", "all-systems")).child("Nobody");
}

/// Runtime-side surface of an execution cell.
///
/// Implemented by the runtime crate; reference holders only ever reach it
/// through [`ActorRef`].
pub trait InternalCell: Send + Sync + fmt::Debug {
    fn path(&self) -> &ActorPath;

    /// Enqueues a user message. A cell without a mailbox drops it silently.
    fn post(&self, sender: Option<ActorRef>, message: Message) -> ActorResult<()>;

    /// Enqueues a control signal on the priority path.
    fn send_system_message(&self, message: SystemMessage);

    /// Live child, or `ActorRef::Nobody` for missing and reserved names.
    fn child(&self, name: &str) -> ActorRef;

    /// Snapshot of live children.
    fn children(&self) -> Vec<ActorRef>;

    /// Creates a child. Safe to call from any thread.
    fn actor_of(&self, props: &Props, name: Option<&str>) -> ActorResult<ActorRef>;

    fn parent(&self) -> Option<ActorRef>;

    /// Removes `name` if it is still bound to `child`.
    fn remove_child(&self, name: &str, child: &ActorRef) -> bool;

    /// Explicit strategy of this cell, else the nearest ancestor's.
    fn supervisor_strategy(&self) -> SupervisorStrategy;

    fn is_terminated(&self) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// Reference backed by a live cell.
#[derive(Clone)]
pub struct LocalActorRef {
    cell: Arc<dyn InternalCell>,
}

impl LocalActorRef {
    pub fn new(cell: Arc<dyn InternalCell>) -> Self {
        Self { cell }
    }

    /// Backing cell. Runtime-internal.
    pub fn cell(&self) -> &Arc<dyn InternalCell> {
        &self.cell
    }

    pub fn path(&self) -> &ActorPath {
        self.cell.path()
    }
}

struct DeadLetterInner {
    path: ActorPath,
    delivered: AtomicU64,
}

/// Sink for messages that cannot be delivered. One per actor system.
#[derive(Clone)]
pub struct DeadLetterActorRef {
    inner: Arc<DeadLetterInner>,
}

impl DeadLetterActorRef {
    pub fn new(path: ActorPath) -> Self {
        Self {
            inner: Arc::new(DeadLetterInner {
                path,
                delivered: AtomicU64::new(0),
            }),
        }
    }

    pub fn path(&self) -> &ActorPath {
        &self.inner.path
    }

    /// Number of messages received so far.
    pub fn count(&self) -> u64 {
        self.inner.delivered.load(Ordering::Relaxed)
    }

    fn publish(&self, sender: Option<&ActorRef>) {
        let total = self.inner.delivered.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            sender = %sender.map(|s| s.path().to_string()).unwrap_or_else(|| "none".into()),
            total,
            "dead letter"
        );
    }
}

struct ContainerInner {
    path: ActorPath,
    children: DashMap<String, ActorRef>,
}

/// Synthetic node whose children are registered explicitly rather than
/// created by a cell.
#[derive(Clone)]
pub struct VirtualPathContainer {
    inner: Arc<ContainerInner>,
}

impl VirtualPathContainer {
    pub fn new(path: ActorPath) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                path,
                children: DashMap::new(),
            }),
        }
    }

    pub fn path(&self) -> &ActorPath {
        &self.inner.path
    }

    pub fn add_child(&self, name: impl Into<String>, child: ActorRef) {
        self.inner.children.insert(name.into(), child);
    }

    pub fn remove_child(&self, name: &str) -> Option<ActorRef> {
        self.inner.children.remove(name).map(|(_, child)| child)
    }

    pub fn len(&self) -> usize {
        self.inner.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.children.is_empty()
    }

    /// Walks `names` below this container. An empty slice is the container.
    pub fn get_child(&self, names: &[String]) -> ActorRef {
        match names.split_first() {
            None => ActorRef::Container(self.clone()),
            Some((first, rest)) => {
                // clone out of the shard guard before walking further
                let child = self.inner.children.get(first).map(|c| c.value().clone());
                match child {
                    Some(child) => child.get_child(rest),
                    None => ActorRef::Nobody,
                }
            }
        }
    }
}

/// # Actor Reference
///
/// A shareable capability to send messages. Cheap to clone.
#[derive(Clone)]
pub enum ActorRef {
    Local(LocalActorRef),
    DeadLetters(DeadLetterActorRef),
    Container(VirtualPathContainer),
    /// "No such actor". Messages to it are discarded.
    Nobody,
}

impl ActorRef {
    pub fn local(cell: Arc<dyn InternalCell>) -> Self {
        ActorRef::Local(LocalActorRef::new(cell))
    }

    pub fn path(&self) -> &ActorPath {
        match self {
            ActorRef::Local(local) => local.path(),
            ActorRef::DeadLetters(sink) => sink.path(),
            ActorRef::Container(container) => container.path(),
            ActorRef::Nobody => &NOBODY_PATH,
        }
    }

    /// Sends a typed message.
    ///
    /// Pass values, not pre-erased [`Message`]s: use [`ActorRef::tell_message`]
    /// to forward one of those.
    pub fn tell<M: Any + Send + Sync>(&self, message: M, sender: Option<&ActorRef>) -> ActorResult<()> {
        self.tell_message(Arc::new(message), sender.cloned())
    }

    /// Sends an already type-erased message.
    pub fn tell_message(&self, message: Message, sender: Option<ActorRef>) -> ActorResult<()> {
        match self {
            ActorRef::Local(local) => local.cell.post(sender, message),
            ActorRef::DeadLetters(sink) => {
                sink.publish(sender.as_ref());
                Ok(())
            }
            ActorRef::Container(container) => {
                trace!(path = %container.path(), "message to virtual container discarded");
                Ok(())
            }
            ActorRef::Nobody => {
                trace!("message to nobody discarded");
                Ok(())
            }
        }
    }

    /// Delivers a control signal. Only Local references act on it.
    pub fn send_system_message(&self, message: SystemMessage) {
        match self {
            ActorRef::Local(local) => local.cell.send_system_message(message),
            other => debug!(
                target_path = %other.path(),
                kind = message.kind(),
                "system message to non-local reference discarded"
            ),
        }
    }

    /// Asks the actor to stop. Fire-and-forget.
    pub fn stop(&self) {
        self.send_system_message(SystemMessage::Terminate);
    }

    pub fn child(&self, name: &str) -> ActorRef {
        match self {
            ActorRef::Local(local) => local.cell.child(name),
            ActorRef::Container(container) => container.get_child(&[name.to_string()]),
            _ => ActorRef::Nobody,
        }
    }

    pub fn children(&self) -> Vec<ActorRef> {
        match self {
            ActorRef::Local(local) => local.cell.children(),
            ActorRef::Container(container) => container
                .inner
                .children
                .iter()
                .map(|entry| entry.value().clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Walks `names` below this reference; any miss is `Nobody`.
    pub fn get_child(&self, names: &[String]) -> ActorRef {
        let Some((first, rest)) = names.split_first() else {
            return self.clone();
        };
        match self {
            ActorRef::Container(container) => container.get_child(names),
            ActorRef::Local(_) => match self.child(first) {
                ActorRef::Nobody => ActorRef::Nobody,
                child => child.get_child(rest),
            },
            _ => ActorRef::Nobody,
        }
    }

    pub fn as_local(&self) -> Option<&LocalActorRef> {
        match self {
            ActorRef::Local(local) => Some(local),
            _ => None,
        }
    }

    pub fn is_nobody(&self) -> bool {
        matches!(self, ActorRef::Nobody)
    }

    pub fn is_dead_letters(&self) -> bool {
        matches!(self, ActorRef::DeadLetters(_))
    }

    /// True once a Local actor has stopped. Non-local references never terminate.
    pub fn is_terminated(&self) -> bool {
        match self {
            ActorRef::Local(local) => local.cell.is_terminated(),
            _ => false,
        }
    }
}

impl PartialEq for ActorRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ActorRef::Local(a), ActorRef::Local(b)) => Arc::ptr_eq(&a.cell, &b.cell),
            (ActorRef::DeadLetters(a), ActorRef::DeadLetters(b)) => Arc::ptr_eq(&a.inner, &b.inner),
            (ActorRef::Container(a), ActorRef::Container(b)) => Arc::ptr_eq(&a.inner, &b.inner),
            (ActorRef::Nobody, ActorRef::Nobody) => true,
            _ => false,
        }
    }
}

impl Eq for ActorRef {}

impl Hash for ActorRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path().hash(state);
    }
}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ActorRef::Local(_) => "Local",
            ActorRef::DeadLetters(_) => "DeadLetters",
            ActorRef::Container(_) => "Container",
            ActorRef::Nobody => "Nobody",
        };
        write!(f, "ActorRef::{}[{}]", kind, self.path().to_serialization_format())
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().to_serialization_format())
    }
}
