use crate::errors::ActorError;
use std::any::Any;
use std::sync::Arc;

// Type aliases for common types
pub type Message = Arc<dyn Any + Send + Sync>;
pub type Argument = Arc<dyn Any + Send + Sync>;
pub type ActorResult<T> = Result<T, ActorError>;
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Wraps a typed value into a type-erased message.
pub fn message<M: Any + Send + Sync>(value: M) -> Message {
    Arc::new(value)
}
