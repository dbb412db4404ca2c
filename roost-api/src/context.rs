//! # Actor Context
//!
//! The explicit execution-context handle passed to every actor callback. It is
//! the only way actor code reaches its own cell: owner-only operations
//! (behavior stack, watch set, current message) are methods on this handle, so
//! they cannot be called from outside the invocation that received it.

use std::any::Any;

use crate::actor::Behavior;
use crate::actor_ref::ActorRef;
use crate::deploy::Deploy;
use crate::path::ActorPath;
use crate::props::Props;
use crate::selection::ActorSelection;
use crate::supervisor::SupervisorStrategy;
use crate::types::{ActorResult, Message};

pub trait ActorContext {
    /// Reference to the actor being invoked.
    fn self_ref(&self) -> ActorRef;

    fn path(&self) -> &ActorPath;

    fn parent(&self) -> Option<ActorRef>;

    /// Declared sender of the message being processed.
    fn sender(&self) -> Option<&ActorRef>;

    /// The message being processed, `None` outside `receive`.
    fn current_message(&self) -> Option<&Message>;

    /// Creates a child actor. A `None` name is synthesized.
    fn actor_of(&mut self, props: &Props, name: Option<&str>) -> ActorResult<ActorRef>;

    /// Live child by name, or `ActorRef::Nobody`.
    fn child(&self, name: &str) -> ActorRef;

    /// Snapshot of the live children.
    fn children(&self) -> Vec<ActorRef>;

    /// Pushes a behavior; it handles messages until popped.
    fn become_behavior(&mut self, behavior: Behavior);

    /// Pops the active behavior. Fails on an empty stack and the failure is
    /// fatal to the current message even if the result is dropped.
    fn unbecome(&mut self) -> ActorResult<()>;

    /// Number of behaviors currently pushed.
    fn behavior_depth(&self) -> usize;

    /// Subscribes to the termination of `target`.
    fn watch(&mut self, target: &ActorRef);

    fn unwatch(&mut self, target: &ActorRef);

    fn is_watching(&self, target: &ActorRef) -> bool;

    /// Deployment resolved for this actor at start-up.
    fn deploy(&self) -> Option<&Deploy>;

    /// Explicit strategy of this actor, else the nearest ancestor's.
    fn supervisor_strategy(&self) -> SupervisorStrategy;

    fn dead_letters(&self) -> ActorRef;

    /// Selection for `path`: relative paths start at this actor, absolute
    /// ones at the root, and full paths must carry the local address.
    fn actor_selection(&self, path: &str) -> ActorResult<ActorSelection>;
}

/// Typed conveniences over [`ActorContext`].
pub trait ActorContextExt: ActorContext {
    /// Sends `message` to the current sender, or to dead letters if none.
    fn reply<M: Any + Send + Sync>(&self, message: M) -> ActorResult<()> {
        let target = self.sender().cloned().unwrap_or_else(|| self.dead_letters());
        target.tell(message, Some(&self.self_ref()))
    }

    /// Tells `target` a message with this actor as the sender.
    fn send<M: Any + Send + Sync>(&self, target: &ActorRef, message: M) -> ActorResult<()> {
        target.tell(message, Some(&self.self_ref()))
    }
}

impl<C: ActorContext + ?Sized> ActorContextExt for C {}
