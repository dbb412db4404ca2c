//! # Local Actor Reference Provider
//!
//! Addressing authority of one actor system. It owns the well-known
//! top-level references and is the only place cells and references are
//! materialized.
//!
//! ## Tree Layout
//! ```text
//! /               root (guardian actor, no parent)
//! /user           user guardian, parent of `ActorSystem::actor_of` actors
//! /system         system guardian
//! /deadLetters    sink for undeliverable messages
//! /temp           container for temporary actors
//! ```

use std::sync::{Arc, OnceLock, Weak};

use roost_api::actor_ref::{ActorRef, DeadLetterActorRef, InternalCell, VirtualPathContainer};
use roost_api::errors::ActorError;
use roost_api::message::SystemMessage;
use roost_api::path::{ActorPath, Address, UNDEFINED_UID};
use roost_api::props::Props;
use roost_api::selection::ActorSelection;
use roost_api::types::ActorResult;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::cell::{ActorCell, Guardian, RoutedActorCell};
use crate::system::SystemInner;

struct ProviderState {
    root: Arc<ActorCell>,
    root_ref: ActorRef,
    dead_letters: ActorRef,
    guardian: ActorRef,
    system_guardian: ActorRef,
    temp_container: VirtualPathContainer,
    temp_path: ActorPath,
}

pub struct LocalActorRefProvider {
    root_path: ActorPath,
    state: OnceLock<ProviderState>,
}

impl LocalActorRefProvider {
    pub fn new(address: Address) -> Self {
        Self {
            root_path: ActorPath::root(address),
            state: OnceLock::new(),
        }
    }

    /// Creates the root, the guardians, dead letters and the temp container.
    pub(crate) fn init(&self, system: &Arc<SystemInner>) -> ActorResult<()> {
        if self.state.get().is_some() {
            return Err(ActorError::InitializationError(format!(
                "provider for [{}] already initialized",
                self.root_path.address()
            )));
        }
        let _span = crate::system_span!("provider_init", address = %self.root_path.address()).entered();

        let settings = system.settings();
        let mailbox = system.mailboxes().create(&settings.default_mailbox, &self.root_path)?;
        mailbox.setup(system.dispatchers().default_dispatcher()?);
        mailbox.suspend();
        let root = ActorCell::new(system, self.root_path.clone(), None, None, mailbox);
        root.start(None, None)?;
        let root_ref = root.self_ref();

        let guardian_props = Props::create(|| Guardian);
        let guardian = root.actor_of(&guardian_props, Some("user"))?;
        let system_guardian = root.actor_of(&guardian_props, Some("system"))?;

        let dead_letters = ActorRef::DeadLetters(DeadLetterActorRef::new(&self.root_path / "deadLetters"));
        let temp_path = &self.root_path / "temp";
        let temp_container = VirtualPathContainer::new(temp_path.clone());

        let state = ProviderState {
            root,
            root_ref,
            dead_letters,
            guardian,
            system_guardian,
            temp_container,
            temp_path,
        };
        if self.state.set(state).is_err() {
            return Err(ActorError::InitializationError("provider initialized concurrently".into()));
        }
        debug!(address = %self.root_path.address(), "provider initialized");
        Ok(())
    }

    fn state(&self) -> ActorResult<&ProviderState> {
        self.state
            .get()
            .ok_or_else(|| ActorError::ActorNotStarted(self.root_path.to_string()))
    }

    pub fn root_path(&self) -> &ActorPath {
        &self.root_path
    }

    pub fn root_guardian(&self) -> ActorResult<ActorRef> {
        Ok(self.state()?.root_ref.clone())
    }

    pub fn guardian(&self) -> ActorResult<ActorRef> {
        Ok(self.state()?.guardian.clone())
    }

    pub fn system_guardian(&self) -> ActorResult<ActorRef> {
        Ok(self.state()?.system_guardian.clone())
    }

    pub fn dead_letters(&self) -> ActorResult<ActorRef> {
        Ok(self.state()?.dead_letters.clone())
    }

    pub fn temp_container(&self) -> ActorResult<VirtualPathContainer> {
        Ok(self.state()?.temp_container.clone())
    }

    /// Materializes the mailbox and cell for `path` and starts it.
    ///
    /// The deployment registered for the path wins over the one in `props`;
    /// its dispatcher and mailbox override the props' ids.
    pub(crate) fn actor_of(
        &self,
        system: &Arc<SystemInner>,
        props: &Props,
        parent: Weak<dyn InternalCell>,
        path: ActorPath,
    ) -> ActorResult<ActorRef> {
        let deploy = system
            .deployer()
            .lookup(&path.to_string_without_address())
            .or_else(|| props.deploy().cloned());
        let dispatcher_id = deploy
            .as_ref()
            .and_then(|d| d.dispatcher())
            .unwrap_or(props.dispatcher());
        let mailbox_id = deploy
            .as_ref()
            .and_then(|d| d.mailbox())
            .unwrap_or(props.mailbox());

        let dispatcher = system.dispatchers().from_config(dispatcher_id)?;
        let mailbox = system.mailboxes().create(mailbox_id, &path)?;
        mailbox.setup(dispatcher);
        mailbox.suspend();

        let strategy = props.supervisor_strategy();
        if props.router_config().is_router() {
            let cell = RoutedActorCell::new(system, path, parent, props, mailbox)?;
            cell.start(deploy, strategy)?;
            Ok(ActorRef::local(cell))
        } else {
            let cell = ActorCell::new(system, path, Some(parent), Some(props.clone()), mailbox);
            cell.start(deploy, strategy)?;
            Ok(ActorRef::local(cell))
        }
    }

    /// Resolves a path to the reference currently bound to it.
    ///
    /// Missing actors, and actors whose uid differs from a uid carried by the
    /// path, resolve to dead letters.
    pub fn resolve_actor_ref(&self, path: &ActorPath) -> ActorResult<ActorRef> {
        if path.address() != self.root_path.address() {
            return Err(ActorError::UnsupportedPath(path.to_string()));
        }
        let state = self.state()?;
        let elements = path.elements();
        let found = match elements.split_first() {
            None => return Ok(state.root_ref.clone()),
            Some((first, rest)) if first == "temp" => state.temp_container.get_child(rest),
            Some((first, rest)) if first == "deadLetters" && rest.is_empty() => {
                return Ok(state.dead_letters.clone())
            }
            Some(_) => state.root_ref.get_child(elements),
        };
        if found.is_nobody() {
            trace!(path = %path, "unresolved path degraded to dead letters");
            return Ok(state.dead_letters.clone());
        }
        if path.uid() != UNDEFINED_UID && found.path().uid() != path.uid() {
            trace!(path = %path.to_serialization_format(), "stale incarnation degraded to dead letters");
            return Ok(state.dead_letters.clone());
        }
        Ok(found)
    }

    /// Resolves a full path string, or an absolute path such as `/user/a`
    /// against the local address. The empty string is `Nobody`.
    pub fn resolve_actor_ref_str(&self, path: &str) -> ActorResult<ActorRef> {
        if path.is_empty() {
            return Ok(ActorRef::Nobody);
        }
        let path = if path.starts_with('/') {
            self.root_path.descendant(path)?
        } else {
            ActorPath::parse(path)?
        };
        self.resolve_actor_ref(&path)
    }

    /// Root reference for `address`, which must be this system's.
    pub fn root_guardian_at(&self, address: &Address) -> ActorResult<ActorRef> {
        if address != self.root_path.address() {
            return Err(ActorError::UnsupportedPath(address.to_string()));
        }
        self.root_guardian()
    }

    /// Builds a selection without resolving it.
    ///
    /// Full paths start at the root of their (local) address, absolute paths
    /// at the local root, and relative paths at `anchor`. The empty string
    /// selects dead letters.
    pub fn actor_selection(&self, path: &str, anchor: &ActorRef) -> ActorResult<ActorSelection> {
        if path.is_empty() {
            return Ok(ActorSelection::new(self.dead_letters()?, Vec::<String>::new()));
        }
        if path.contains("://") {
            let parsed = ActorPath::parse(path)?;
            self.root_guardian_at(parsed.address())?;
            return self.select_from_root(parsed.elements());
        }
        let elements = path
            .split('/')
            .filter(|e| !e.is_empty())
            .map(|e| {
                ActorPath::validate_element(e)
                    .map(|_| e.to_string())
                    .map_err(|_| ActorError::InvalidPath(path.to_string()))
            })
            .collect::<ActorResult<Vec<_>>>()?;
        if path.starts_with('/') {
            self.select_from_root(&elements)
        } else {
            Ok(ActorSelection::new(anchor.clone(), elements))
        }
    }

    fn select_from_root(&self, elements: &[String]) -> ActorResult<ActorSelection> {
        let state = self.state()?;
        let selection = match elements.split_first() {
            Some((first, rest)) if first == "temp" => {
                ActorSelection::new(ActorRef::Container(state.temp_container.clone()), rest.to_vec())
            }
            Some((first, rest)) if first == "deadLetters" && rest.is_empty() => {
                ActorSelection::new(state.dead_letters.clone(), Vec::<String>::new())
            }
            _ => ActorSelection::new(state.root_ref.clone(), elements.to_vec()),
        };
        Ok(selection)
    }

    /// Fresh, unique path under `/temp`.
    pub fn temp_path(&self) -> ActorResult<ActorPath> {
        let name = Uuid::new_v4().simple().to_string();
        Ok(&self.state()?.temp_path / name.as_str())
    }

    pub fn register_temp_actor(&self, actor: ActorRef, path: &ActorPath) -> ActorResult<()> {
        let state = self.state()?;
        self.check_temp_path(state, path)?;
        state.temp_container.add_child(path.name(), actor);
        Ok(())
    }

    pub fn unregister_temp_actor(&self, path: &ActorPath) -> ActorResult<()> {
        let state = self.state()?;
        self.check_temp_path(state, path)?;
        state.temp_container.remove_child(path.name());
        Ok(())
    }

    fn check_temp_path(&self, state: &ProviderState, path: &ActorPath) -> ActorResult<()> {
        match path.parent() {
            Some(parent) if parent == state.temp_path => Ok(()),
            _ => Err(ActorError::InvalidPath(format!(
                "[{}] is not a temporary actor path",
                path
            ))),
        }
    }

    /// Hook run for every system message sent to a local cell.
    pub fn after_send_system_message(&self, target: &ActorPath, message: &SystemMessage) {
        trace!(target_path = %target, kind = message.kind(), "system message sent");
    }

    /// Root cell. Runtime-internal.
    pub(crate) fn root_cell(&self) -> ActorResult<&Arc<ActorCell>> {
        Ok(&self.state()?.root)
    }
}

impl std::fmt::Debug for LocalActorRefProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalActorRefProvider")
            .field("root_path", &self.root_path.to_string())
            .field("initialized", &self.state.get().is_some())
            .finish()
    }
}
