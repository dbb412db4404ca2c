//! # Actor Cells
//!
//! ## Key Concepts
//! - ActorCell: runtime record behind one live actor
//! - Children: concurrent child table with name reservation
//! - CellContext: the `ActorContext` handed to actor code
//! - RoutedActorCell: cell that forwards messages to routees
//!
//! ## State Split
//! Shared state (child table, uid counter, mailbox slot) may be touched from
//! any thread. Everything else lives behind a lock that only an invocation
//! takes; finding it held means two invocations overlap, which is reported
//! as `ConfinementViolation` instead of blocking.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, MutexGuard, RwLock};
use roost_api::actor::{Actor, ActorState};
use roost_api::actor_ref::{ActorRef, InternalCell};
use roost_api::context::ActorContext;
use roost_api::deploy::Deploy;
use roost_api::errors::ActorError;
use roost_api::mailbox::{Mailbox, MessageInvoker};
use roost_api::message::{Envelope, SystemMessage, Terminated};
use roost_api::path::ActorPath;
use roost_api::props::Props;
use roost_api::supervisor::SupervisorStrategy;
use roost_api::types::{ActorResult, Message};
use tracing::{debug, trace, warn};

use crate::system::SystemInner;

mod children;
mod context;
mod routed;

pub(crate) use children::Children;
pub(crate) use context::{CellContext, ConfinementScope, Confined, CurrentInvocation};
pub use routed::RoutedActorCell;

/// Actor run by cells created without props (the root) and by the guardians.
#[derive(Debug, Default)]
pub struct Guardian;

impl Actor for Guardian {
    fn receive(&mut self, _ctx: &mut dyn ActorContext, message: &Message) -> ActorResult<()> {
        if let Some(Terminated { actor }) = message.downcast_ref::<Terminated>() {
            debug!(child = %actor.path(), "guardian observed termination");
        }
        Ok(())
    }
}

struct CellState {
    actor: Option<Box<dyn Actor>>,
    confined: Confined,
}

pub struct ActorCell {
    this: Weak<ActorCell>,
    outer: Weak<dyn InternalCell>,
    system: Weak<SystemInner>,
    path: ActorPath,
    parent: Option<Weak<dyn InternalCell>>,
    props: Option<Props>,
    children: Children,
    mailbox: RwLock<Option<Arc<dyn Mailbox>>>,
    state: Mutex<CellState>,
    strategy: OnceLock<Option<SupervisorStrategy>>,
    terminated: AtomicBool,
    verify_serialization: bool,
}

impl ActorCell {
    /// Builds a cell that is its own public face.
    pub(crate) fn new(
        system: &Arc<SystemInner>,
        path: ActorPath,
        parent: Option<Weak<dyn InternalCell>>,
        props: Option<Props>,
        mailbox: Arc<dyn Mailbox>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<ActorCell>| {
            let outer: Weak<dyn InternalCell> = this.clone();
            Self::with_outer(system, path, parent, props, mailbox, this.clone(), outer)
        })
    }

    /// Builds a cell whose references point at `outer`, a wrapper such as a
    /// routed cell.
    pub(crate) fn with_outer(
        system: &Arc<SystemInner>,
        path: ActorPath,
        parent: Option<Weak<dyn InternalCell>>,
        props: Option<Props>,
        mailbox: Arc<dyn Mailbox>,
        this: Weak<ActorCell>,
        outer: Weak<dyn InternalCell>,
    ) -> Self {
        Self {
            this,
            outer,
            system: Arc::downgrade(system),
            path,
            parent,
            props,
            children: Children::new(),
            mailbox: RwLock::new(Some(mailbox)),
            state: Mutex::new(CellState {
                actor: None,
                confined: Confined::new(),
            }),
            strategy: OnceLock::new(),
            terminated: AtomicBool::new(false),
            verify_serialization: system.settings().serialize_all_messages,
        }
    }

    pub(crate) fn system(&self) -> ActorResult<Arc<SystemInner>> {
        self.system.upgrade().ok_or(ActorError::SystemTerminated)
    }

    /// Reference other actors use to reach this cell.
    pub fn self_ref(&self) -> ActorRef {
        match self.outer.upgrade() {
            Some(cell) => ActorRef::local(cell),
            None => ActorRef::Nobody,
        }
    }

    pub fn dead_letters(&self) -> ActorRef {
        self.system()
            .and_then(|system| system.provider().dead_letters())
            .unwrap_or(ActorRef::Nobody)
    }

    pub fn props(&self) -> Option<&Props> {
        self.props.as_ref()
    }

    fn lock_state(&self) -> ActorResult<MutexGuard<'_, CellState>> {
        self.state
            .try_lock()
            .ok_or_else(|| ActorError::ConfinementViolation(self.path.to_string()))
    }

    fn current_mailbox(&self) -> Option<Arc<dyn Mailbox>> {
        // clone out so no lock is held while the mailbox runs inline
        self.mailbox.read().clone()
    }

    /// Constructs the actor, runs `pre_start` and opens the mailbox.
    ///
    /// The mailbox must already be bound to its dispatcher and suspended;
    /// messages sent meanwhile wait until start-up has finished. On failure
    /// the children created so far are stopped and the mailbox is closed.
    pub(crate) fn start(
        &self,
        deploy: Option<Deploy>,
        strategy: Option<SupervisorStrategy>,
    ) -> ActorResult<()> {
        let _span = crate::actor_span!(self.path, self.path.uid()).entered();
        {
            let mut guard = self.lock_state()?;
            let _scope = ConfinementScope::enter(self);
            let state = &mut *guard;

            state.confined.deploy = deploy;
            state.confined.behaviors.clear();
            let _ = self.strategy.set(strategy);

            if let Err(err) = self.create_actor(state) {
                self.abort_start(state);
                return Err(err);
            }
        }

        if let Some(mailbox) = self.current_mailbox() {
            let invoker: Weak<dyn MessageInvoker> = self.this.clone();
            mailbox.register_invoker(invoker);
            mailbox.resume();
        }
        crate::log_lifecycle!(self.path, self.path.uid(), "started");
        Ok(())
    }

    fn create_actor(&self, state: &mut CellState) -> ActorResult<()> {
        let mut actor = match &self.props {
            Some(props) => props.new_actor()?,
            None => Box::new(Guardian) as Box<dyn Actor>,
        };

        let mut ctx = CellContext::new(self, &mut state.confined);
        actor.pre_start(&mut ctx)?;
        if let Some(err) = ctx.take_fatal() {
            return Err(err);
        }

        state.actor = Some(actor);
        state.confined.lifecycle = ActorState::Running;
        Ok(())
    }

    fn abort_start(&self, state: &mut CellState) {
        state.confined.lifecycle = ActorState::Stopped;
        for child in self.children.snapshot() {
            child.stop();
        }

        let me = self.self_ref();
        for watched in state.confined.watching.drain() {
            watched.send_system_message(SystemMessage::Unwatch {
                watchee: watched.clone(),
                watcher: me.clone(),
            });
        }
        state.confined.behaviors.clear();

        let mailbox = self.mailbox.write().take();
        if let Some(mailbox) = mailbox {
            mailbox.close();
        }
        self.terminated.store(true, Ordering::Release);
        crate::log_lifecycle!(self.path, self.path.uid(), "start failed");
    }

    /// Stops the children, runs `post_stop`, closes the mailbox, frees the
    /// name in the parent and notifies watchers.
    fn terminate(&self, state: &mut CellState) {
        if matches!(state.confined.lifecycle, ActorState::Stopping | ActorState::Stopped) {
            return;
        }
        state.confined.lifecycle = ActorState::Stopping;

        for child in self.children.snapshot() {
            child.stop();
        }

        if let Some(mut actor) = state.actor.take() {
            let mut ctx = CellContext::new(self, &mut state.confined);
            if let Err(err) = actor.post_stop(&mut ctx) {
                warn!(path = %self.path, error = %err, "post_stop failed");
            }
        }
        state.confined.behaviors.clear();

        let mailbox = self.mailbox.write().take();
        if let Some(mailbox) = mailbox {
            mailbox.close();
        }
        self.terminated.store(true, Ordering::Release);
        state.confined.lifecycle = ActorState::Stopped;

        let me = self.self_ref();
        if let Some(parent) = self.parent() {
            if let Some(cell) = parent.as_local() {
                cell.cell().remove_child(self.path.name(), &me);
            }
        }
        for watched in state.confined.watching.drain() {
            watched.send_system_message(SystemMessage::Unwatch {
                watchee: watched.clone(),
                watcher: me.clone(),
            });
        }
        for watcher in state.confined.watched_by.drain() {
            if let Err(err) = watcher.tell(Terminated { actor: me.clone() }, Some(&me)) {
                warn!(path = %self.path, watcher = %watcher.path(), error = %err, "failed to notify watcher");
            }
        }
        crate::log_lifecycle!(self.path, self.path.uid(), "stopped");
    }

    fn handle_watch(&self, state: &mut CellState, watchee: ActorRef, watcher: ActorRef) {
        let me = self.self_ref();
        if watchee == me && watcher != me {
            if matches!(state.confined.lifecycle, ActorState::Stopped) {
                let _ = watcher.tell(Terminated { actor: me.clone() }, Some(&me));
            } else {
                state.confined.watched_by.insert(watcher);
            }
        } else {
            warn!(path = %self.path, watchee = %watchee.path(), "watch addressed to another actor ignored");
        }
    }

    /// Signals arriving after the mailbox is gone.
    fn system_message_after_termination(&self, message: SystemMessage) {
        match message {
            SystemMessage::Watch { watcher, .. } => {
                let me = self.self_ref();
                let _ = watcher.tell(Terminated { actor: me.clone() }, Some(&me));
            }
            other => trace!(path = %self.path, kind = other.kind(), "system message to terminated actor"),
        }
    }
}

impl MessageInvoker for ActorCell {
    fn invoke(&self, envelope: Envelope) -> ActorResult<()> {
        let mut guard = self.lock_state()?;
        let _scope = ConfinementScope::enter(self);
        let _span = crate::message_span!("user", path = %self.path).entered();
        let state = &mut *guard;

        if state.confined.lifecycle != ActorState::Running {
            return self.dead_letters().tell_message(envelope.message, envelope.sender);
        }
        let Some(actor) = state.actor.as_mut() else {
            return Err(ActorError::ActorNotStarted(self.path.to_string()));
        };

        let behavior = state.confined.behaviors.last().cloned();
        let mut invocation =
            CurrentInvocation::begin(&mut state.confined, envelope.message.clone(), envelope.sender);

        let mut ctx = CellContext::new(self, invocation.confined());
        let result = match behavior {
            Some(behavior) => behavior.invoke(&mut **actor, &mut ctx, &envelope.message),
            None => actor.receive(&mut ctx, &envelope.message),
        };
        match ctx.take_fatal() {
            Some(err) => Err(err),
            None => result,
        }
    }

    fn system_invoke(&self, message: SystemMessage) -> ActorResult<()> {
        let mut guard = self.lock_state()?;
        let _scope = ConfinementScope::enter(self);
        let _span = crate::message_span!(message.kind(), path = %self.path).entered();
        let state = &mut *guard;

        match message {
            SystemMessage::Watch { watchee, watcher } => self.handle_watch(state, watchee, watcher),
            SystemMessage::Unwatch { watchee, watcher } => {
                if watchee == self.self_ref() {
                    state.confined.watched_by.remove(&watcher);
                }
            }
            SystemMessage::Terminate => self.terminate(state),
        }
        Ok(())
    }
}

impl InternalCell for ActorCell {
    fn path(&self) -> &ActorPath {
        &self.path
    }

    fn post(&self, sender: Option<ActorRef>, message: Message) -> ActorResult<()> {
        let Some(mailbox) = self.current_mailbox() else {
            return Ok(());
        };
        let message = if self.verify_serialization {
            self.system()?.serialization().verify(message)?
        } else {
            message
        };
        trace!(path = %self.path, "message posted");
        mailbox.post(Envelope::new(message, sender));
        Ok(())
    }

    fn send_system_message(&self, message: SystemMessage) {
        if let Ok(system) = self.system() {
            system.provider().after_send_system_message(&self.path, &message);
        }
        match self.current_mailbox() {
            Some(mailbox) if !mailbox.is_closed() => mailbox.post_system(message),
            _ => self.system_message_after_termination(message),
        }
    }

    fn child(&self, name: &str) -> ActorRef {
        self.children.get(name)
    }

    fn children(&self) -> Vec<ActorRef> {
        self.children.snapshot()
    }

    fn actor_of(&self, props: &Props, name: Option<&str>) -> ActorResult<ActorRef> {
        let uid = self.children.next_uid();
        let name = Children::child_name(name, uid)?;
        let reservation = self.children.reserve(&name)?;
        let path = self.path.child(name.as_str()).with_uid(uid);

        let system = self.system()?;
        let child = system
            .provider()
            .actor_of(&system, props, self.outer.clone(), path)?;
        reservation.commit(child.clone());
        if child.is_terminated() {
            // stopped during its own start-up, before the name went live
            self.children.remove(&name, &child);
        }
        Ok(child)
    }

    fn parent(&self) -> Option<ActorRef> {
        let parent = self.parent.as_ref()?.upgrade()?;
        Some(ActorRef::local(parent))
    }

    fn remove_child(&self, name: &str, child: &ActorRef) -> bool {
        let removed = self.children.remove(name, child);
        if removed {
            debug!(path = %self.path, child = name, "child removed");
        }
        removed
    }

    fn supervisor_strategy(&self) -> SupervisorStrategy {
        if let Some(Some(strategy)) = self.strategy.get() {
            return *strategy;
        }
        self.parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|parent| parent.supervisor_strategy())
            .unwrap_or_default()
    }

    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for ActorCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorCell")
            .field("path", &self.path.to_serialization_format())
            .field("children", &self.children.snapshot().len())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
