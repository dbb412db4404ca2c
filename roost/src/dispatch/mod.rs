//! Dispatchers and their registry.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use roost_api::dispatch::{Dispatcher, DEFAULT_DISPATCHER_ID};
use roost_api::errors::ActorError;
use roost_api::types::ActorResult;
use tokio::runtime::Handle;
use tracing::debug;

use crate::config::Settings;

pub mod calling_thread;
pub mod pool;

pub use calling_thread::CallingThreadDispatcher;
pub use pool::ThreadPoolDispatcher;

/// Dispatchers known to one actor system, keyed by id.
///
/// `roost.actor.default-dispatcher` resolves to whatever
/// `Settings::default_dispatcher` names.
pub struct Dispatchers {
    registry: DashMap<String, Arc<dyn Dispatcher>>,
    default_id: String,
}

impl Dispatchers {
    /// Registry with the thread pool and calling-thread dispatchers.
    pub fn new(settings: &Settings, handle: Handle) -> Self {
        let dispatchers = Self {
            registry: DashMap::new(),
            default_id: settings.default_dispatcher.clone(),
        };
        dispatchers.register(Arc::new(ThreadPoolDispatcher::new(
            DEFAULT_DISPATCHER_ID,
            settings.throughput,
            handle,
        )));
        dispatchers.register(Arc::new(CallingThreadDispatcher::new()));
        dispatchers
    }

    /// Adds or replaces a dispatcher under its own id.
    pub fn register(&self, dispatcher: Arc<dyn Dispatcher>) {
        debug!(id = dispatcher.id(), "dispatcher registered");
        self.registry.insert(dispatcher.id().to_string(), dispatcher);
    }

    pub fn has_dispatcher(&self, id: &str) -> bool {
        self.registry.contains_key(self.resolve_alias(id))
    }

    pub fn from_config(&self, id: &str) -> ActorResult<Arc<dyn Dispatcher>> {
        self.registry
            .get(self.resolve_alias(id))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ActorError::DispatcherNotFound(id.to_string()))
    }

    pub fn default_dispatcher(&self) -> ActorResult<Arc<dyn Dispatcher>> {
        self.from_config(DEFAULT_DISPATCHER_ID)
    }

    fn resolve_alias<'a>(&'a self, id: &'a str) -> &'a str {
        if id == DEFAULT_DISPATCHER_ID {
            &self.default_id
        } else {
            id
        }
    }
}

impl fmt::Debug for Dispatchers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.registry.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("Dispatchers")
            .field("registered", &ids)
            .field("default", &self.default_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_api::dispatch::CALLING_THREAD_DISPATCHER_ID;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread().build().unwrap()
    }

    #[test]
    fn test_builtin_dispatchers() {
        let rt = runtime();
        let dispatchers = Dispatchers::new(&Settings::default(), rt.handle().clone());

        let default = dispatchers.from_config(DEFAULT_DISPATCHER_ID).unwrap();
        assert_eq!(default.id(), DEFAULT_DISPATCHER_ID);
        let inline = dispatchers.from_config(CALLING_THREAD_DISPATCHER_ID).unwrap();
        assert_eq!(inline.throughput(), usize::MAX);
    }

    #[test]
    fn test_default_alias_follows_settings() {
        let rt = runtime();
        let settings = Settings::default().with_default_dispatcher(CALLING_THREAD_DISPATCHER_ID);
        let dispatchers = Dispatchers::new(&settings, rt.handle().clone());

        let default = dispatchers.default_dispatcher().unwrap();
        assert_eq!(default.id(), CALLING_THREAD_DISPATCHER_ID);
    }

    #[test]
    fn test_unknown_dispatcher() {
        let rt = runtime();
        let dispatchers = Dispatchers::new(&Settings::default(), rt.handle().clone());
        assert!(matches!(
            dispatchers.from_config("missing"),
            Err(ActorError::DispatcherNotFound(id)) if id == "missing"
        ));
        assert!(!dispatchers.has_dispatcher("missing"));
    }
}
