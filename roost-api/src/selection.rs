//! # Actor Selection
//!
//! A path looked up lazily: an anchor reference plus the names to walk
//! below it. Each send resolves the path again, so a selection keeps
//! working across incarnations of the actor it names.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::actor_ref::ActorRef;
use crate::types::{ActorResult, Message};

#[derive(Clone)]
pub struct ActorSelection {
    anchor: ActorRef,
    elements: Vec<String>,
}

impl ActorSelection {
    pub fn new<I, S>(anchor: ActorRef, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            anchor,
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    pub fn anchor(&self) -> &ActorRef {
        &self.anchor
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Reference currently bound to the path, or `Nobody`.
    pub fn resolve(&self) -> ActorRef {
        self.anchor.get_child(&self.elements)
    }

    pub fn tell<M: Any + Send + Sync>(&self, message: M, sender: Option<&ActorRef>) -> ActorResult<()> {
        self.tell_message(Arc::new(message), sender.cloned())
    }

    /// Resolves the path and sends to whatever is there now.
    pub fn tell_message(&self, message: Message, sender: Option<ActorRef>) -> ActorResult<()> {
        self.resolve().tell_message(message, sender)
    }
}

impl fmt::Display for ActorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = self.anchor.path().clone();
        for element in &self.elements {
            path = path / element.as_str();
        }
        write!(f, "{}", path)
    }
}

impl fmt::Debug for ActorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSelection")
            .field("anchor", &self.anchor.path().to_string())
            .field("elements", &self.elements)
            .finish()
    }
}
