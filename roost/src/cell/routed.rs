use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use roost_api::actor::Actor;
use roost_api::actor_ref::{ActorRef, InternalCell};
use roost_api::context::ActorContext;
use roost_api::deploy::Deploy;
use roost_api::errors::ActorError;
use roost_api::mailbox::Mailbox;
use roost_api::message::SystemMessage;
use roost_api::path::ActorPath;
use roost_api::props::Props;
use roost_api::routing::{
    AddRoutee, Broadcast, GetRoutees, RemoveRoutee, RouterConfig, Routees, RoutingLogic,
};
use roost_api::supervisor::SupervisorStrategy;
use roost_api::types::{ActorResult, Message};
use tracing::{debug, warn};

use super::ActorCell;
use crate::system::SystemInner;

/// Passive actor behind a router; routed traffic never reaches its mailbox.
#[derive(Debug, Default)]
struct RouterActor;

impl Actor for RouterActor {
    fn receive(&mut self, _ctx: &mut dyn ActorContext, _message: &Message) -> ActorResult<()> {
        Ok(())
    }
}

/// Cell that forwards each user message to one of its routees instead of
/// queueing it.
///
/// Management messages (`Broadcast`, `GetRoutees`, `AddRoutee`,
/// `RemoveRoutee`) are handled on the sending thread. System messages go to
/// the wrapped cell, so stopping a router stops its pool.
pub struct RoutedActorCell {
    cell: Arc<ActorCell>,
    config: RouterConfig,
    routee_props: Props,
    logic: Box<dyn RoutingLogic>,
    routees: RwLock<Vec<ActorRef>>,
}

impl RoutedActorCell {
    pub(crate) fn new(
        system: &Arc<SystemInner>,
        path: ActorPath,
        parent: Weak<dyn InternalCell>,
        props: &Props,
        mailbox: Arc<dyn Mailbox>,
    ) -> ActorResult<Arc<Self>> {
        let config = props.router_config().clone();
        let logic = config.create_logic().ok_or_else(|| {
            ActorError::InitializationError(format!("no router configured for [{}]", path))
        })?;
        let routee_props = props.with_router(RouterConfig::NoRouter);

        Ok(Arc::new_cyclic(|outer: &Weak<RoutedActorCell>| {
            let outer: Weak<dyn InternalCell> = outer.clone();
            let cell = Arc::new_cyclic(|this: &Weak<ActorCell>| {
                ActorCell::with_outer(
                    system,
                    path,
                    Some(parent),
                    Some(Props::create(|| RouterActor)),
                    mailbox,
                    this.clone(),
                    outer,
                )
            });
            Self {
                cell,
                config,
                routee_props,
                logic,
                routees: RwLock::new(Vec::new()),
            }
        }))
    }

    /// Starts the router, then creates (pool) or resolves (group) its routees.
    pub(crate) fn start(
        &self,
        deploy: Option<Deploy>,
        strategy: Option<SupervisorStrategy>,
    ) -> ActorResult<()> {
        self.cell.start(deploy, strategy)?;
        if let Err(err) = self.init_routees() {
            self.cell.self_ref().stop();
            return Err(err);
        }
        Ok(())
    }

    fn init_routees(&self) -> ActorResult<()> {
        match &self.config {
            RouterConfig::NoRouter => Ok(()),
            RouterConfig::Pool { nr_of_instances, .. } => {
                for _ in 0..*nr_of_instances {
                    let routee = self.cell.actor_of(&self.routee_props, None)?;
                    self.routees.write().push(routee);
                }
                debug!(path = %self.cell.path(), routees = nr_of_instances, "pool router started");
                Ok(())
            }
            RouterConfig::Group { paths, .. } => {
                let system = self.cell.system()?;
                for path in paths.iter() {
                    let routee = system.provider().resolve_actor_ref_str(path)?;
                    if routee.is_dead_letters() || routee.is_nobody() {
                        warn!(router = %self.cell.path(), routee = %path, "group routee not found");
                        continue;
                    }
                    self.routees.write().push(routee);
                }
                Ok(())
            }
        }
    }

    /// Routees that have not terminated.
    pub fn routees(&self) -> Vec<ActorRef> {
        let mut routees = self.routees.write();
        routees.retain(|routee| !routee.is_terminated());
        routees.clone()
    }
}

impl InternalCell for RoutedActorCell {
    fn path(&self) -> &ActorPath {
        self.cell.path()
    }

    fn post(&self, sender: Option<ActorRef>, message: Message) -> ActorResult<()> {
        if let Some(Broadcast(inner)) = message.downcast_ref::<Broadcast>() {
            for routee in self.routees() {
                routee.tell_message(inner.clone(), sender.clone())?;
            }
            return Ok(());
        }
        if message.is::<GetRoutees>() {
            let target = sender.unwrap_or_else(|| self.cell.dead_letters());
            return target.tell(Routees(self.routees()), Some(&self.cell.self_ref()));
        }
        if let Some(AddRoutee(routee)) = message.downcast_ref::<AddRoutee>() {
            let mut routees = self.routees.write();
            if !routees.contains(routee) {
                routees.push(routee.clone());
            }
            return Ok(());
        }
        if let Some(RemoveRoutee(routee)) = message.downcast_ref::<RemoveRoutee>() {
            self.routees.write().retain(|r| r != routee);
            return Ok(());
        }

        let routees = self.routees();
        match self.logic.select(&message, &routees) {
            Some(routee) => routee.tell_message(message, sender),
            None => self.cell.dead_letters().tell_message(message, sender),
        }
    }

    fn send_system_message(&self, message: SystemMessage) {
        self.cell.send_system_message(message)
    }

    fn child(&self, name: &str) -> ActorRef {
        self.cell.child(name)
    }

    fn children(&self) -> Vec<ActorRef> {
        self.cell.children()
    }

    fn actor_of(&self, props: &Props, name: Option<&str>) -> ActorResult<ActorRef> {
        self.cell.actor_of(props, name)
    }

    fn parent(&self) -> Option<ActorRef> {
        self.cell.parent()
    }

    fn remove_child(&self, name: &str, child: &ActorRef) -> bool {
        self.cell.remove_child(name, child)
    }

    fn supervisor_strategy(&self) -> SupervisorStrategy {
        self.cell.supervisor_strategy()
    }

    fn is_terminated(&self) -> bool {
        self.cell.is_terminated()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for RoutedActorCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutedActorCell")
            .field("path", &self.cell.path().to_serialization_format())
            .field("config", &self.config)
            .field("routees", &self.routees.read().len())
            .finish()
    }
}
