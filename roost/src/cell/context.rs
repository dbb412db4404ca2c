//! Per-invocation context handed to actor code, and the thread-local marker
//! recording which cell the current thread is executing.

use std::cell::Cell;
use std::collections::HashSet;

use roost_api::actor::{ActorState, Behavior};
use roost_api::actor_ref::{ActorRef, InternalCell};
use roost_api::context::ActorContext;
use roost_api::deploy::Deploy;
use roost_api::errors::ActorError;
use roost_api::message::SystemMessage;
use roost_api::path::ActorPath;
use roost_api::props::Props;
use roost_api::selection::ActorSelection;
use roost_api::supervisor::SupervisorStrategy;
use roost_api::types::{ActorResult, Message};

use super::ActorCell;

thread_local! {
    static CURRENT_CELL: Cell<usize> = const { Cell::new(0) };
}

/// Marks the current thread as executing `cell` until dropped. Nested scopes
/// restore the outer cell, also on unwind.
pub(crate) struct ConfinementScope {
    previous: usize,
}

impl ConfinementScope {
    pub(crate) fn enter(cell: &ActorCell) -> Self {
        let previous = CURRENT_CELL.with(|current| current.replace(cell_id(cell)));
        Self { previous }
    }
}

impl Drop for ConfinementScope {
    fn drop(&mut self) {
        CURRENT_CELL.with(|current| current.set(self.previous));
    }
}

fn cell_id(cell: &ActorCell) -> usize {
    cell as *const ActorCell as usize
}

/// Whether the current thread is executing `cell`.
pub(crate) fn is_current(cell: &ActorCell) -> bool {
    CURRENT_CELL.with(|current| current.get() == cell_id(cell))
}

/// State only the executing invocation may touch.
#[derive(Debug)]
pub(crate) struct Confined {
    pub(crate) behaviors: Vec<Behavior>,
    pub(crate) watching: HashSet<ActorRef>,
    pub(crate) watched_by: HashSet<ActorRef>,
    pub(crate) current_message: Option<Message>,
    pub(crate) sender: Option<ActorRef>,
    pub(crate) deploy: Option<Deploy>,
    pub(crate) lifecycle: ActorState,
}

impl Confined {
    pub(crate) fn new() -> Self {
        Self {
            behaviors: Vec::new(),
            watching: HashSet::new(),
            watched_by: HashSet::new(),
            current_message: None,
            sender: None,
            deploy: None,
            lifecycle: ActorState::Starting,
        }
    }
}

/// Current message and sender of one invocation, cleared when dropped so a
/// panicking handler leaves nothing behind.
pub(crate) struct CurrentInvocation<'a> {
    state: &'a mut Confined,
}

impl<'a> CurrentInvocation<'a> {
    pub(crate) fn begin(state: &'a mut Confined, message: Message, sender: Option<ActorRef>) -> Self {
        state.current_message = Some(message);
        state.sender = sender;
        Self { state }
    }

    pub(crate) fn confined(&mut self) -> &mut Confined {
        self.state
    }
}

impl Drop for CurrentInvocation<'_> {
    fn drop(&mut self) {
        self.state.current_message = None;
        self.state.sender = None;
    }
}

pub(crate) struct CellContext<'a> {
    cell: &'a ActorCell,
    state: &'a mut Confined,
    fatal: Option<ActorError>,
}

impl<'a> CellContext<'a> {
    pub(crate) fn new(cell: &'a ActorCell, state: &'a mut Confined) -> Self {
        Self {
            cell,
            state,
            fatal: None,
        }
    }

    /// Error recorded by a misuse the actor may have ignored.
    pub(crate) fn take_fatal(&mut self) -> Option<ActorError> {
        self.fatal.take()
    }

    fn assert_confined(&self) {
        debug_assert!(
            is_current(self.cell),
            "context of [{}] used outside its invocation",
            self.cell.path()
        );
    }
}

impl ActorContext for CellContext<'_> {
    fn self_ref(&self) -> ActorRef {
        self.cell.self_ref()
    }

    fn path(&self) -> &ActorPath {
        self.cell.path()
    }

    fn parent(&self) -> Option<ActorRef> {
        self.cell.parent()
    }

    fn sender(&self) -> Option<&ActorRef> {
        self.state.sender.as_ref()
    }

    fn current_message(&self) -> Option<&Message> {
        self.state.current_message.as_ref()
    }

    fn actor_of(&mut self, props: &Props, name: Option<&str>) -> ActorResult<ActorRef> {
        self.cell.actor_of(props, name)
    }

    fn child(&self, name: &str) -> ActorRef {
        self.cell.child(name)
    }

    fn children(&self) -> Vec<ActorRef> {
        self.cell.children()
    }

    fn become_behavior(&mut self, behavior: Behavior) {
        self.assert_confined();
        self.state.behaviors.push(behavior);
    }

    fn unbecome(&mut self) -> ActorResult<()> {
        self.assert_confined();
        if self.state.behaviors.pop().is_some() {
            return Ok(());
        }
        let path = self.cell.path().to_string();
        self.fatal = Some(ActorError::BehaviorStackUnderflow(path.clone()));
        Err(ActorError::BehaviorStackUnderflow(path))
    }

    fn behavior_depth(&self) -> usize {
        self.state.behaviors.len()
    }

    fn watch(&mut self, target: &ActorRef) {
        self.assert_confined();
        let me = self.cell.self_ref();
        if *target == me || !self.state.watching.insert(target.clone()) {
            return;
        }
        target.send_system_message(SystemMessage::Watch {
            watchee: target.clone(),
            watcher: me,
        });
    }

    fn unwatch(&mut self, target: &ActorRef) {
        self.assert_confined();
        if !self.state.watching.remove(target) {
            return;
        }
        target.send_system_message(SystemMessage::Unwatch {
            watchee: target.clone(),
            watcher: self.cell.self_ref(),
        });
    }

    fn is_watching(&self, target: &ActorRef) -> bool {
        self.state.watching.contains(target)
    }

    fn deploy(&self) -> Option<&Deploy> {
        self.state.deploy.as_ref()
    }

    fn supervisor_strategy(&self) -> SupervisorStrategy {
        self.cell.supervisor_strategy()
    }

    fn dead_letters(&self) -> ActorRef {
        self.cell.dead_letters()
    }

    fn actor_selection(&self, path: &str) -> ActorResult<ActorSelection> {
        let system = self.cell.system()?;
        system.provider().actor_selection(path, &self.cell.self_ref())
    }
}
