//! # Props
//!
//! Immutable recipe for creating an actor: which implementation to construct,
//! with which arguments, on which dispatcher and mailbox, optionally behind a
//! router, with an optional deployment and supervisor strategy.
//!
//! Every `with_*` method returns a new value and leaves the receiver
//! untouched. Arguments and router configuration are shared, so copies are
//! cheap.
//!
//! ```rust
//! use roost_api::actor::EmptyActor;
//! use roost_api::props::Props;
//!
//! let base = Props::create(|| EmptyActor);
//! let pinned = base.with_dispatcher("pinned");
//! assert_eq!(base.dispatcher(), roost_api::dispatch::DEFAULT_DISPATCHER_ID);
//! assert_eq!(pinned.dispatcher(), "pinned");
//! ```

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::actor::{Actor, EmptyActor};
use crate::deploy::Deploy;
use crate::dispatch::DEFAULT_DISPATCHER_ID;
use crate::errors::ActorError;
use crate::mailbox::DEFAULT_MAILBOX_ID;
use crate::routing::RouterConfig;
use crate::supervisor::SupervisorStrategy;
use crate::types::{ActorResult, Argument};

/// Ordered, opaque constructor arguments.
#[derive(Clone, Default)]
pub struct Arguments(Arc<Vec<Argument>>);

impl Arguments {
    pub fn new(args: Vec<Argument>) -> Self {
        Arguments(Arc::new(args))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Typed view of the argument at `index`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> ActorResult<&T> {
        self.0
            .get(index)
            .and_then(|arg| (**arg).downcast_ref::<T>())
            .ok_or(ActorError::ArgumentMismatch {
                index,
                expected: type_name::<T>(),
            })
    }

    pub fn raw(&self, index: usize) -> Option<&Argument> {
        self.0.get(index)
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Arguments({})", self.0.len())
    }
}

/// Constructs actor instances from arguments.
pub trait ActorFactory: Send + Sync {
    fn create(&self, args: &Arguments) -> ActorResult<Box<dyn Actor>>;

    /// Name of the implementation, used in logs.
    fn actor_type(&self) -> &'static str;
}

struct FnFactory<A, F> {
    f: F,
    _actor: std::marker::PhantomData<fn() -> A>,
}

impl<A, F> ActorFactory for FnFactory<A, F>
where
    A: Actor,
    F: Fn(&Arguments) -> ActorResult<A> + Send + Sync,
{
    fn create(&self, args: &Arguments) -> ActorResult<Box<dyn Actor>> {
        (self.f)(args).map(|actor| Box::new(actor) as Box<dyn Actor>)
    }

    fn actor_type(&self) -> &'static str {
        type_name::<A>()
    }
}

#[derive(Clone)]
pub struct Props {
    factory: Arc<dyn ActorFactory>,
    args: Arguments,
    dispatcher: String,
    mailbox: String,
    router: RouterConfig,
    deploy: Option<Deploy>,
    supervisor: Option<SupervisorStrategy>,
}

impl Props {
    /// Props for an infallible, argument-free constructor.
    pub fn create<A, F>(f: F) -> Self
    where
        A: Actor,
        F: Fn() -> A + Send + Sync + 'static,
    {
        Self::try_create(move |_| Ok(f()))
    }

    /// Props for a constructor that may fail. Its error is handed back to the
    /// `actor_of` caller unchanged.
    pub fn try_create<A, F>(f: F) -> Self
    where
        A: Actor,
        F: Fn(&Arguments) -> ActorResult<A> + Send + Sync + 'static,
    {
        Self::with_args(Vec::new(), f)
    }

    /// Props with positional constructor arguments.
    pub fn with_args<A, F>(args: Vec<Argument>, f: F) -> Self
    where
        A: Actor,
        F: Fn(&Arguments) -> ActorResult<A> + Send + Sync + 'static,
    {
        let factory = FnFactory {
            f,
            _actor: std::marker::PhantomData,
        };
        Self::from_factory(Arc::new(factory), Arguments::new(args))
    }

    pub fn from_factory(factory: Arc<dyn ActorFactory>, args: Arguments) -> Self {
        Self {
            factory,
            args,
            dispatcher: DEFAULT_DISPATCHER_ID.to_string(),
            mailbox: DEFAULT_MAILBOX_ID.to_string(),
            router: RouterConfig::NoRouter,
            deploy: None,
            supervisor: None,
        }
    }

    /// Props for an actor that ignores every message.
    pub fn empty() -> Self {
        Self::create(|| EmptyActor)
    }

    pub fn actor_type(&self) -> &'static str {
        self.factory.actor_type()
    }

    pub fn args(&self) -> &Arguments {
        &self.args
    }

    pub fn dispatcher(&self) -> &str {
        &self.dispatcher
    }

    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    pub fn router_config(&self) -> &RouterConfig {
        &self.router
    }

    pub fn deploy(&self) -> Option<&Deploy> {
        self.deploy.as_ref()
    }

    pub fn supervisor_strategy(&self) -> Option<SupervisorStrategy> {
        self.supervisor
    }

    pub fn with_dispatcher(&self, id: impl Into<String>) -> Self {
        Self {
            dispatcher: id.into(),
            ..self.clone()
        }
    }

    pub fn with_mailbox(&self, id: impl Into<String>) -> Self {
        Self {
            mailbox: id.into(),
            ..self.clone()
        }
    }

    pub fn with_router(&self, router: RouterConfig) -> Self {
        Self {
            router,
            ..self.clone()
        }
    }

    pub fn with_deploy(&self, deploy: Deploy) -> Self {
        Self {
            deploy: Some(deploy),
            ..self.clone()
        }
    }

    pub fn with_supervisor_strategy(&self, strategy: SupervisorStrategy) -> Self {
        Self {
            supervisor: Some(strategy),
            ..self.clone()
        }
    }

    /// Builds a new actor instance from the stored factory and arguments.
    pub fn new_actor(&self) -> ActorResult<Box<dyn Actor>> {
        self.factory.create(&self.args)
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("actor_type", &self.actor_type())
            .field("args", &self.args)
            .field("dispatcher", &self.dispatcher)
            .field("mailbox", &self.mailbox)
            .field("router", &self.router)
            .field("deploy", &self.deploy)
            .field("supervisor", &self.supervisor)
            .finish()
    }
}
