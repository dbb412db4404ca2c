use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use downcast_rs::{impl_downcast, Downcast};

use crate::context::ActorContext;
use crate::errors::ActorError;
use crate::types::{ActorResult, Message};

/// Actor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Core Actor trait
///
/// Handlers run synchronously on whichever worker the dispatcher picked, never
/// on two workers at once for the same actor. The context handle is only valid
/// for the duration of the call it was passed to.
pub trait Actor: Downcast + Send {
    /// Default behavior, active while the behavior stack is empty.
    fn receive(&mut self, ctx: &mut dyn ActorContext, message: &Message) -> ActorResult<()>;

    /// Called once, after construction and before the first message.
    fn pre_start(&mut self, _ctx: &mut dyn ActorContext) -> ActorResult<()> {
        Ok(())
    }

    /// Called once when the actor stops.
    fn post_stop(&mut self, _ctx: &mut dyn ActorContext) -> ActorResult<()> {
        Ok(())
    }
}

impl_downcast!(Actor);

type ReceiveFn =
    dyn Fn(&mut (dyn Actor + 'static), &mut dyn ActorContext, &Message) -> ActorResult<()> + Send + Sync;

/// A message handler that can be pushed on an actor's behavior stack.
///
/// Behaviors are typed against the concrete actor they were written for and
/// fail with [`ActorError::BehaviorMismatch`] if installed on another type.
///
/// ```rust
/// use roost_api::actor::{Actor, Behavior};
/// use roost_api::context::ActorContext;
/// use roost_api::types::{ActorResult, Message};
///
/// struct Switch { on: bool }
///
/// impl Actor for Switch {
///     fn receive(&mut self, ctx: &mut dyn ActorContext, _msg: &Message) -> ActorResult<()> {
///         self.on = true;
///         ctx.become_behavior(Behavior::new(|actor: &mut Switch, ctx, _msg| {
///             actor.on = false;
///             ctx.unbecome()
///         }));
///         Ok(())
///     }
/// }
/// ```
#[derive(Clone)]
pub struct Behavior {
    name: &'static str,
    receive: Arc<ReceiveFn>,
}

impl Behavior {
    pub fn new<A, F>(f: F) -> Self
    where
        A: Actor,
        F: Fn(&mut A, &mut dyn ActorContext, &Message) -> ActorResult<()> + Send + Sync + 'static,
    {
        let receive = move |actor: &mut (dyn Actor + 'static), ctx: &mut dyn ActorContext, message: &Message| {
            match actor.downcast_mut::<A>() {
                Some(actor) => f(actor, ctx, message),
                None => Err(ActorError::BehaviorMismatch {
                    path: ctx.path().to_string(),
                    expected: type_name::<A>(),
                }),
            }
        };
        Self {
            name: type_name::<A>(),
            receive: Arc::new(receive),
        }
    }

    /// Type name of the actor this behavior targets.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn invoke(
        &self,
        actor: &mut (dyn Actor + 'static),
        ctx: &mut dyn ActorContext,
        message: &Message,
    ) -> ActorResult<()> {
        (self.receive)(actor, ctx, message)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Behavior({})", self.name)
    }
}

/// Actor that ignores every message. Created by `Props::empty()`.
#[derive(Debug, Default)]
pub struct EmptyActor;

impl Actor for EmptyActor {
    fn receive(&mut self, _ctx: &mut dyn ActorContext, _message: &Message) -> ActorResult<()> {
        Ok(())
    }
}
