//! # Actor Kernel Error Types
//!
//! This module defines the error type shared by the Roost kernel and its
//! collaborators.
//!
//! ## Error Classes
//!
//! - Caller-recoverable: `DuplicateName`, `InvalidActorName`, `UnsupportedPath`,
//!   `InvalidPath`
//! - Construction failures: `InitializationError` and whatever a user factory
//!   or start-up hook returns, always handed back to the `actor_of` caller
//!   unchanged
//! - Programmer misuse: `BehaviorStackUnderflow`, `ConfinementViolation`,
//!   `BehaviorMismatch`; fatal to the message being processed
//! - Collaborator lookups: `DispatcherNotFound`, `MailboxNotFound`,
//!   `Serialization`
//!
//! ## Usage Example
//!
//! ```rust
//! use roost_api::errors::ActorError;
//!
//! fn describe(error: &ActorError) -> &'static str {
//!     match error {
//!         ActorError::DuplicateName(_) => "pick another name",
//!         ActorError::UnsupportedPath(_) => "ask a remote resolver",
//!         _ => "unexpected",
//!     }
//! }
//! ```

use thiserror::Error;

/// Core error type for the actor kernel.
#[derive(Error, Debug)]
pub enum ActorError {
    /// A child with this name is already live or reserved under the parent.
    #[error("Actor name [{0}] is not unique")]
    DuplicateName(String),

    /// The path's address does not belong to this addressing authority.
    #[error("Unsupported actor path [{0}]: address is not local")]
    UnsupportedPath(String),

    /// The requested child name is empty, reserved, or contains separators.
    #[error("Invalid actor name [{0}]")]
    InvalidActorName(String),

    /// The path string could not be parsed.
    #[error("Invalid actor path [{0}]")]
    InvalidPath(String),

    /// Error during actor construction or its start-up hook.
    ///
    /// # Parameters
    /// * String - Detailed error message explaining the initialization failure
    #[error("Actor initialization failed: {0}")]
    InitializationError(String),

    /// Error during message processing.
    #[error("Message handling failed: {0}")]
    MessageHandlingError(String),

    /// `unbecome` was called with an empty behavior stack.
    #[error("Behavior stack underflow in actor [{0}]")]
    BehaviorStackUnderflow(String),

    /// Two invocations overlapped on the same cell.
    #[error("Concurrent invocation detected on actor [{0}]")]
    ConfinementViolation(String),

    /// A behavior was installed on an actor of a different type.
    #[error("Behavior for [{expected}] cannot run on actor [{path}]")]
    BehaviorMismatch { path: String, expected: &'static str },

    /// Constructor argument missing or of the wrong type.
    #[error("Constructor argument {index} is missing or not a {expected}")]
    ArgumentMismatch { index: usize, expected: &'static str },

    /// No dispatcher is registered under the id.
    #[error("Dispatcher [{0}] not configured")]
    DispatcherNotFound(String),

    /// No mailbox type is registered under the id.
    #[error("Mailbox [{0}] not configured")]
    MailboxNotFound(String),

    /// Serialization verification failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A message reached a cell whose actor has not been constructed.
    #[error("Actor [{0}] has not been started")]
    ActorNotStarted(String),

    /// Waiting for a message took longer than allowed.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The owning actor system is gone.
    #[error("Actor system terminated")]
    SystemTerminated,

    /// Catch-all for other errors, preserving the source chain.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ActorError {
    /// Whether the error is a programmer-misuse error that must not be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ActorError::BehaviorStackUnderflow(_)
                | ActorError::ConfinementViolation(_)
                | ActorError::BehaviorMismatch { .. }
        )
    }
}
