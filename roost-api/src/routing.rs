//! # Routing
//!
//! Router configuration carried by `Props`, the logic that picks a routee for
//! each message, and the management messages a router understands.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::actor_ref::ActorRef;
use crate::types::Message;

/// Picks the routee that receives a message.
pub trait RoutingLogic: Send + Sync {
    fn select(&self, message: &Message, routees: &[ActorRef]) -> Option<ActorRef>;
}

/// Cycles through the routees in order, starting with the first.
#[derive(Debug, Default)]
pub struct RoundRobinRoutingLogic {
    next: AtomicUsize,
}

impl RoundRobinRoutingLogic {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoutingLogic for RoundRobinRoutingLogic {
    fn select(&self, _message: &Message, routees: &[ActorRef]) -> Option<ActorRef> {
        if routees.is_empty() {
            return None;
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % routees.len();
        Some(routees[idx].clone())
    }
}

/// Builds a fresh logic instance for every router created from one `Props`.
pub type LogicFactory = Arc<dyn Fn() -> Box<dyn RoutingLogic> + Send + Sync>;

/// How an actor created from `Props` routes its messages.
#[derive(Clone, Default)]
pub enum RouterConfig {
    /// Plain actor.
    #[default]
    NoRouter,
    /// Router owning `nr_of_instances` children created from the same props.
    Pool {
        nr_of_instances: usize,
        logic: LogicFactory,
    },
    /// Router over existing actors, addressed by path.
    Group {
        paths: Arc<Vec<String>>,
        logic: LogicFactory,
    },
}

impl RouterConfig {
    pub fn round_robin_pool(nr_of_instances: usize) -> Self {
        RouterConfig::Pool {
            nr_of_instances,
            logic: Arc::new(|| Box::new(RoundRobinRoutingLogic::new())),
        }
    }

    pub fn round_robin_group<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RouterConfig::Group {
            paths: Arc::new(paths.into_iter().map(Into::into).collect()),
            logic: Arc::new(|| Box::new(RoundRobinRoutingLogic::new())),
        }
    }

    pub fn is_router(&self) -> bool {
        !matches!(self, RouterConfig::NoRouter)
    }

    /// New logic instance, `None` for `NoRouter`.
    pub fn create_logic(&self) -> Option<Box<dyn RoutingLogic>> {
        match self {
            RouterConfig::NoRouter => None,
            RouterConfig::Pool { logic, .. } | RouterConfig::Group { logic, .. } => Some(logic()),
        }
    }
}

impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterConfig::NoRouter => write!(f, "NoRouter"),
            RouterConfig::Pool { nr_of_instances, .. } => {
                write!(f, "Pool({} instances)", nr_of_instances)
            }
            RouterConfig::Group { paths, .. } => write!(f, "Group({:?})", paths),
        }
    }
}

/// Delivered to every routee instead of one.
#[derive(Clone)]
pub struct Broadcast(pub Message);

impl Broadcast {
    pub fn new<M: Any + Send + Sync>(message: M) -> Self {
        Broadcast(Arc::new(message))
    }
}

/// Asks a router for its current routees; answered with [`Routees`].
#[derive(Debug, Clone, Copy)]
pub struct GetRoutees;

#[derive(Debug, Clone)]
pub struct Routees(pub Vec<ActorRef>);

#[derive(Debug, Clone)]
pub struct AddRoutee(pub ActorRef);

#[derive(Debug, Clone)]
pub struct RemoveRoutee(pub ActorRef);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_ref::DeadLetterActorRef;
    use crate::path::{ActorPath, Address};
    use crate::types::message;

    fn sink(name: &str) -> ActorRef {
        ActorRef::DeadLetters(DeadLetterActorRef::new(
            ActorPath::root(Address::new("roost", "routing")) / name,
        ))
    }

    #[test]
    fn test_round_robin_cycles_from_first() {
        let routees = vec![sink("a"), sink("b"), sink("c")];
        let logic = RoundRobinRoutingLogic::new();
        let msg = message(1u8);

        let picked: Vec<_> = (0..4)
            .map(|_| logic.select(&msg, &routees).unwrap())
            .collect();

        assert_eq!(picked[0], routees[0]);
        assert_eq!(picked[1], routees[1]);
        assert_eq!(picked[2], routees[2]);
        assert_eq!(picked[3], routees[0]);
    }

    #[test]
    fn test_round_robin_without_routees() {
        let logic = RoundRobinRoutingLogic::new();
        assert!(logic.select(&message(()), &[]).is_none());
    }

    #[test]
    fn test_each_router_gets_fresh_logic() {
        let config = RouterConfig::round_robin_pool(2);
        let routees = vec![sink("a"), sink("b")];
        let msg = message(());

        let first = config.create_logic().unwrap();
        first.select(&msg, &routees);
        let second = config.create_logic().unwrap();

        assert_eq!(second.select(&msg, &routees).unwrap(), routees[0]);
        assert!(RouterConfig::NoRouter.create_logic().is_none());
    }
}
