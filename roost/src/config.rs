use roost_api::dispatch::DEFAULT_DISPATCHER_ID;
use roost_api::mailbox::DEFAULT_MAILBOX_ID;

/// Protocol segment of local actor addresses.
pub const DEFAULT_PROTOCOL: &str = "roost";

// --- System Configuration ---

/// Configuration for an `ActorSystem`.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Protocol used in the system's address.
    pub protocol: String,

    /// Worker threads backing the default dispatcher.
    pub pool_size: usize,

    /// Max user messages a mailbox processes per scheduling run.
    pub throughput: usize,

    /// Dispatcher used when `Props` does not name one.
    pub default_dispatcher: String,

    /// Mailbox used when `Props` does not name one.
    pub default_mailbox: String,

    /// Round-trip every user message through the serialization registry.
    pub serialize_all_messages: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_string(),
            pool_size: num_cpus::get(),
            throughput: 10,
            default_dispatcher: DEFAULT_DISPATCHER_ID.to_string(),
            default_mailbox: DEFAULT_MAILBOX_ID.to_string(),
            serialize_all_messages: false,
        }
    }
}

impl Settings {
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn with_throughput(mut self, throughput: usize) -> Self {
        self.throughput = throughput.max(1);
        self
    }

    pub fn with_default_dispatcher(mut self, id: impl Into<String>) -> Self {
        self.default_dispatcher = id.into();
        self
    }

    pub fn with_default_mailbox(mut self, id: impl Into<String>) -> Self {
        self.default_mailbox = id.into();
        self
    }

    pub fn with_serialize_all_messages(mut self, enabled: bool) -> Self {
        self.serialize_all_messages = enabled;
        self
    }
}
