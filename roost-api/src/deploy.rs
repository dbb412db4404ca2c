//! Deployment descriptors.
//!
//! A [`Deploy`] overrides where and how an actor runs. Deployments are looked
//! up by the address-less path (`/user/a/b`) when the actor starts; a miss
//! falls back to the deployment carried by its `Props`.

/// Deployment overrides for one actor path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deploy {
    path: String,
    dispatcher: Option<String>,
    mailbox: Option<String>,
}

impl Deploy {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            dispatcher: None,
            mailbox: None,
        }
    }

    pub fn with_dispatcher(mut self, id: impl Into<String>) -> Self {
        self.dispatcher = Some(id.into());
        self
    }

    pub fn with_mailbox(mut self, id: impl Into<String>) -> Self {
        self.mailbox = Some(id.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dispatcher(&self) -> Option<&str> {
        self.dispatcher.as_deref()
    }

    pub fn mailbox(&self) -> Option<&str> {
        self.mailbox.as_deref()
    }
}

/// Source of deployments.
pub trait Deployer: Send + Sync {
    /// Deployment registered for an address-less path such as `/user/a`.
    fn lookup(&self, path: &str) -> Option<Deploy>;
}
