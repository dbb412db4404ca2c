//! # Roost Actor Kernel API
//!
//! Value types and collaborator contracts shared by the Roost runtime and the
//! actors it hosts.
//!
//! ## Core Components
//!
//! - **Paths**: hierarchical, human-readable addresses with an incarnation uid
//! - **Props**: immutable recipes for creating actors
//! - **References**: shareable send capabilities (`Local`, `DeadLetters`,
//!   `Container`, `Nobody`)
//! - **Context**: the handle an actor uses to reach its own cell
//! - **Mailbox / Dispatcher**: the queue and execution contracts the runtime
//!   plugs in
//!
//! ## Usage Example
//!
//! ```rust
//! use roost_api::prelude::*;
//!
//! struct Counter { seen: usize }
//!
//! impl Actor for Counter {
//!     fn receive(&mut self, ctx: &mut dyn ActorContext, msg: &Message) -> ActorResult<()> {
//!         if msg.downcast_ref::<u32>().is_some() {
//!             self.seen += 1;
//!             ctx.reply(self.seen)?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let props = Props::create(|| Counter { seen: 0 });
//! assert_eq!(props.mailbox(), DEFAULT_MAILBOX_ID);
//! ```
//!
//! ## Module Organization
//!
//! - [`actor`]: the `Actor` trait and behaviors
//! - [`actor_ref`]: reference variants and the cell seam
//! - [`context`]: per-invocation execution context
//! - [`path`]: addresses and actor paths
//! - [`props`]: actor creation recipes
//! - [`routing`]: router configuration and routing logic
//! - [`selection`]: paths resolved at send time
//! - [`mailbox`] / [`dispatch`]: execution contracts
//! - [`errors`]: the shared error type

pub mod actor;
pub mod actor_ref;
pub mod context;
pub mod deploy;
pub mod dispatch;
pub mod errors;
pub mod mailbox;
pub mod message;
pub mod path;
pub mod props;
pub mod routing;
pub mod selection;
pub mod supervisor;
pub mod types;

pub use actor::{Actor, ActorState, Behavior, EmptyActor};
pub use actor_ref::{ActorRef, DeadLetterActorRef, InternalCell, LocalActorRef, VirtualPathContainer};
pub use context::{ActorContext, ActorContextExt};
pub use deploy::{Deploy, Deployer};
pub use dispatch::Dispatcher;
pub use errors::ActorError;
pub use mailbox::{Mailbox, MessageInvoker};
pub use message::{Envelope, SystemMessage, Terminated};
pub use path::{ActorPath, Address};
pub use props::{ActorFactory, Arguments, Props};
pub use routing::{RouterConfig, RoutingLogic};
pub use selection::ActorSelection;
pub use supervisor::{SupervisionDecision, SupervisorStrategy};
pub use types::{ActorResult, Message};

pub mod prelude {
    pub use crate::actor::{Actor, Behavior};
    pub use crate::actor_ref::ActorRef;
    pub use crate::context::{ActorContext, ActorContextExt};
    pub use crate::dispatch::{CALLING_THREAD_DISPATCHER_ID, DEFAULT_DISPATCHER_ID};
    pub use crate::errors::ActorError;
    pub use crate::mailbox::DEFAULT_MAILBOX_ID;
    pub use crate::message::Terminated;
    pub use crate::path::ActorPath;
    pub use crate::props::Props;
    pub use crate::selection::ActorSelection;
    pub use crate::types::{message, ActorResult, Message};
}
