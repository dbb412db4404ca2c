//! # Roost Actor Kernel
//!
//! Runtime half of Roost: cells, the local reference provider, dispatchers,
//! mailboxes and the `ActorSystem` that ties them together. The value types
//! and contracts live in `roost-api` and are re-exported here.
//!
//! ## Module Organization
//!
//! - [`system`]: `ActorSystem`, the entry point
//! - [`provider`]: path resolution and the top-level tree
//! - [`cell`]: per-actor runtime records, including routers
//! - [`dispatch`] / [`mailbox`]: execution and queueing
//! - [`serialization`]: message serializers and send-time verification
//! - [`deploy`]: per-path deployment overrides
//! - [`config`] / [`logging`]: settings and tracing setup
//! - [`testkit`]: probes for tests

pub mod cell;
pub mod config;
pub mod deploy;
pub mod dispatch;
pub mod logging;
pub mod mailbox;
pub mod provider;
pub mod serialization;
pub mod system;
pub mod testkit;

pub use roost_api;

pub use cell::{ActorCell, RoutedActorCell};
pub use config::Settings;
pub use deploy::LocalDeployer;
pub use provider::LocalActorRefProvider;
pub use serialization::{JsonSerializer, Serialization, Serializer};
pub use system::ActorSystem;
pub use testkit::TestProbe;

pub mod prelude {
    pub use roost_api::prelude::*;

    pub use crate::config::Settings;
    pub use crate::system::ActorSystem;
}
