//! # Actor System
//!
//! Owns the collaborators one actor tree runs on: dispatchers, mailboxes,
//! serialization, deployments and the reference provider. Cells keep only a
//! weak handle to it, so dropping the `ActorSystem` releases the whole tree.
//!
//! ```rust,no_run
//! use roost::prelude::*;
//!
//! struct Echo;
//!
//! impl Actor for Echo {
//!     fn receive(&mut self, ctx: &mut dyn ActorContext, msg: &Message) -> ActorResult<()> {
//!         match ctx.sender().cloned() {
//!             Some(sender) => sender.tell_message(msg.clone(), Some(ctx.self_ref())),
//!             None => Ok(()),
//!         }
//!     }
//! }
//!
//! let system = ActorSystem::new("demo", Settings::default()).unwrap();
//! let echo = system.actor_of(&Props::create(|| Echo), Some("echo")).unwrap();
//! assert_eq!(echo.path().to_string(), "roost://demo/user/echo");
//! ```

use std::fmt;
use std::sync::Arc;

use roost_api::actor_ref::{ActorRef, InternalCell};
use roost_api::deploy::Deployer;
use roost_api::errors::ActorError;
use roost_api::path::{ActorPath, Address};
use roost_api::props::Props;
use roost_api::selection::ActorSelection;
use roost_api::types::ActorResult;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::info;

use crate::config::Settings;
use crate::deploy::LocalDeployer;
use crate::dispatch::Dispatchers;
use crate::mailbox::Mailboxes;
use crate::provider::LocalActorRefProvider;
use crate::serialization::Serialization;

/// State shared by every cell of one system.
pub struct SystemInner {
    name: String,
    settings: Settings,
    dispatchers: Dispatchers,
    mailboxes: Mailboxes,
    serialization: Serialization,
    deployer: Arc<dyn Deployer>,
    provider: LocalActorRefProvider,
}

impl SystemInner {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dispatchers(&self) -> &Dispatchers {
        &self.dispatchers
    }

    pub fn mailboxes(&self) -> &Mailboxes {
        &self.mailboxes
    }

    pub fn serialization(&self) -> &Serialization {
        &self.serialization
    }

    pub fn deployer(&self) -> &Arc<dyn Deployer> {
        &self.deployer
    }

    pub fn provider(&self) -> &LocalActorRefProvider {
        &self.provider
    }
}

impl fmt::Debug for SystemInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemInner")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("provider", &self.provider)
            .finish()
    }
}

/// Handle to a running actor system.
pub struct ActorSystem {
    inner: Arc<SystemInner>,
    // None when the system borrows an ambient tokio runtime
    runtime: Option<Runtime>,
}

impl ActorSystem {
    /// Starts a system with an empty deployment table.
    pub fn new(name: &str, settings: Settings) -> ActorResult<Self> {
        Self::with_deployer(name, settings, Arc::new(LocalDeployer::new()))
    }

    /// Starts a system that consults `deployer` when actors start.
    ///
    /// The default dispatcher runs on the ambient tokio runtime when called
    /// from inside one, otherwise on a runtime owned by the system.
    pub fn with_deployer(
        name: &str,
        settings: Settings,
        deployer: Arc<dyn Deployer>,
    ) -> ActorResult<Self> {
        validate_system_name(name)?;
        let _span = crate::system_span!("system_start", system = name).entered();

        let (handle, runtime) = match Handle::try_current() {
            Ok(handle) => (handle, None),
            Err(_) => {
                let runtime = Builder::new_multi_thread()
                    .worker_threads(settings.pool_size.max(1))
                    .thread_name(format!("{}-dispatcher", name))
                    .enable_all()
                    .build()
                    .map_err(|e| ActorError::InitializationError(format!("dispatcher runtime: {}", e)))?;
                (runtime.handle().clone(), Some(runtime))
            }
        };

        let address = Address::new(settings.protocol.clone(), name);
        let inner = Arc::new(SystemInner {
            name: name.to_string(),
            dispatchers: Dispatchers::new(&settings, handle),
            mailboxes: Mailboxes::new(&settings),
            serialization: Serialization::new(),
            deployer,
            provider: LocalActorRefProvider::new(address),
            settings,
        });
        inner.provider.init(&inner)?;
        info!(system = name, "actor system started");

        Ok(Self { inner, runtime })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn address(&self) -> &Address {
        self.inner.provider.root_path().address()
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Creates an actor under `/user`.
    pub fn actor_of(&self, props: &Props, name: Option<&str>) -> ActorResult<ActorRef> {
        let guardian = self.inner.provider.guardian()?;
        local_cell(&guardian)?.actor_of(props, name)
    }

    /// Creates an actor under `/system`.
    pub fn system_actor_of(&self, props: &Props, name: Option<&str>) -> ActorResult<ActorRef> {
        let guardian = self.inner.provider.system_guardian()?;
        local_cell(&guardian)?.actor_of(props, name)
    }

    pub fn resolve_actor_ref(&self, path: &ActorPath) -> ActorResult<ActorRef> {
        self.inner.provider.resolve_actor_ref(path)
    }

    pub fn resolve_actor_ref_str(&self, path: &str) -> ActorResult<ActorRef> {
        self.inner.provider.resolve_actor_ref_str(path)
    }

    /// Selection for `path`; relative paths start at `/user`.
    pub fn actor_selection(&self, path: &str) -> ActorResult<ActorSelection> {
        let guardian = self.inner.provider.guardian()?;
        self.inner.provider.actor_selection(path, &guardian)
    }

    pub fn dead_letters(&self) -> ActorResult<ActorRef> {
        self.inner.provider.dead_letters()
    }

    pub fn guardian(&self) -> ActorResult<ActorRef> {
        self.inner.provider.guardian()
    }

    pub fn system_guardian(&self) -> ActorResult<ActorRef> {
        self.inner.provider.system_guardian()
    }

    pub fn root_guardian(&self) -> ActorResult<ActorRef> {
        self.inner.provider.root_guardian()
    }

    pub fn temp_path(&self) -> ActorResult<ActorPath> {
        self.inner.provider.temp_path()
    }

    pub fn register_temp_actor(&self, actor: ActorRef, path: &ActorPath) -> ActorResult<()> {
        self.inner.provider.register_temp_actor(actor, path)
    }

    pub fn unregister_temp_actor(&self, path: &ActorPath) -> ActorResult<()> {
        self.inner.provider.unregister_temp_actor(path)
    }

    pub fn dispatchers(&self) -> &Dispatchers {
        &self.inner.dispatchers
    }

    pub fn mailboxes(&self) -> &Mailboxes {
        &self.inner.mailboxes
    }

    pub fn serialization(&self) -> &Serialization {
        &self.inner.serialization
    }

    pub fn deployer(&self) -> &Arc<dyn Deployer> {
        &self.inner.deployer
    }

    pub fn provider(&self) -> &LocalActorRefProvider {
        &self.inner.provider
    }

    /// Stops every actor, guardians included.
    pub fn terminate(&self) {
        if let Ok(root) = self.inner.provider.root_cell() {
            if !root.is_terminated() {
                info!(system = %self.inner.name, "actor system terminating");
                root.self_ref().stop();
            }
        }
    }
}

impl Drop for ActorSystem {
    fn drop(&mut self) {
        self.terminate();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSystem")
            .field("name", &self.inner.name)
            .field("address", &self.address().to_string())
            .field("owns_runtime", &self.runtime.is_some())
            .finish()
    }
}

fn local_cell(actor: &ActorRef) -> ActorResult<&Arc<dyn InternalCell>> {
    actor
        .as_local()
        .map(|local| local.cell())
        .ok_or_else(|| ActorError::InvalidPath(format!("[{}] is not a local actor", actor.path())))
}

fn validate_system_name(name: &str) -> ActorResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ActorError::InitializationError(format!(
            "invalid actor system name [{}]: use ASCII letters, digits, '-' and '_'",
            name
        )))
    }
}
