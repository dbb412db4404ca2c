//! Mailbox implementations and their registry.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use roost_api::errors::ActorError;
use roost_api::mailbox::{Mailbox, DEFAULT_MAILBOX_ID};
use roost_api::path::ActorPath;
use roost_api::types::ActorResult;

use crate::config::Settings;

pub mod unbounded;

pub use unbounded::UnboundedMailbox;

/// Creates mailboxes of one kind.
pub trait MailboxType: Send + Sync {
    fn create(&self, path: &ActorPath) -> Arc<dyn Mailbox>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnboundedMailboxType;

impl MailboxType for UnboundedMailboxType {
    fn create(&self, path: &ActorPath) -> Arc<dyn Mailbox> {
        UnboundedMailbox::new(path.clone())
    }
}

/// Mailbox kinds known to one actor system, keyed by id.
pub struct Mailboxes {
    registry: DashMap<String, Arc<dyn MailboxType>>,
    default_id: String,
}

impl Mailboxes {
    pub fn new(settings: &Settings) -> Self {
        let mailboxes = Self {
            registry: DashMap::new(),
            default_id: settings.default_mailbox.clone(),
        };
        mailboxes.register(DEFAULT_MAILBOX_ID, Arc::new(UnboundedMailboxType));
        mailboxes
    }

    pub fn register(&self, id: impl Into<String>, mailbox_type: Arc<dyn MailboxType>) {
        self.registry.insert(id.into(), mailbox_type);
    }

    pub fn from_config(&self, id: &str) -> ActorResult<Arc<dyn MailboxType>> {
        let key = if id == DEFAULT_MAILBOX_ID { self.default_id.as_str() } else { id };
        self.registry
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ActorError::MailboxNotFound(id.to_string()))
    }

    /// New mailbox of kind `id` for the actor at `path`.
    pub fn create(&self, id: &str, path: &ActorPath) -> ActorResult<Arc<dyn Mailbox>> {
        Ok(self.from_config(id)?.create(path))
    }
}

impl fmt::Debug for Mailboxes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.registry.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("Mailboxes").field("registered", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_api::path::Address;

    #[test]
    fn test_default_mailbox_is_unbounded() {
        let mailboxes = Mailboxes::new(&Settings::default());
        let path = ActorPath::root(Address::new("roost", "mb")) / "user";
        let mailbox = mailboxes.create(DEFAULT_MAILBOX_ID, &path).unwrap();
        assert!(mailbox.is_empty());
        assert!(!mailbox.is_closed());
    }

    #[test]
    fn test_unknown_mailbox() {
        let mailboxes = Mailboxes::new(&Settings::default());
        assert!(matches!(
            mailboxes.from_config("bounded"),
            Err(ActorError::MailboxNotFound(id)) if id == "bounded"
        ));
    }
}
