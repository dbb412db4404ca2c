// Logging for Roost
//
// Built on the `tracing` ecosystem. The kernel itself only emits events; this
// module installs a global subscriber for applications and tests.
//
// # Usage Examples
//
// ```rust
// use roost::logging;
//
// // INFO level, console output
// logging::init_default();
//
// // Or a custom configuration
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: false,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// ## Span Macros
//
// ```rust
// let span = roost::actor_span!("/user/worker", 3u64);
// let _guard = span.enter();
// roost::log_lifecycle!("/user/worker", 3u64, "started");
// ```

use std::sync::Once;

use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for the Roost logging system
///
/// # Examples
///
/// ```rust
/// use roost::logging::LogConfig;
/// use tracing::Level;
///
/// let config = LogConfig {
///     level: Level::DEBUG,
///     target_filters: Some("roost::cell=trace".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            target_filters: None,
        }
    }
}

impl LogConfig {
    /// DEBUG for the kernel, TRACE for mailbox delivery.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            target_filters: Some("roost=debug,roost::mailbox=trace".to_string()),
            ..Default::default()
        }
    }

    /// JSON output without source locations.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json_format: true,
            show_file_line: false,
            ..Default::default()
        }
    }

    /// Warnings and errors only, compact.
    pub fn test() -> Self {
        Self {
            level: Level::WARN,
            show_thread_info: false,
            ..Default::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::from_default_env().add_directive(self.level.into());
        if let Some(filters) = &self.target_filters {
            for directive in filters.split(',').filter_map(|f| f.trim().parse().ok()) {
                filter = filter.add_directive(directive);
            }
        }
        filter
    }
}

// Only the first initialization takes effect
static INIT: Once = Once::new();

/// Installs the global subscriber. Later calls are ignored.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(config.env_filter());

        let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json_format {
            Box::new(registry.with(fmt::layer().json().flatten_event(true)))
        } else {
            Box::new(
                registry.with(
                    fmt::layer()
                        .with_ansi(atty::is(atty::Stream::Stdout))
                        .with_file(config.show_file_line)
                        .with_line_number(config.show_file_line)
                        .with_thread_names(config.show_thread_info)
                        .with_thread_ids(config.show_thread_info),
                ),
            )
        };
        set_global_subscriber(subscriber);
    });
}

fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

pub fn init_default() {
    init(LogConfig::default());
}

pub fn init_development() {
    init(LogConfig::development());
}

pub fn init_production() {
    init(LogConfig::production());
}

/// Quiet logging for tests.
///
/// ```rust
/// #[test]
/// fn my_test() {
///     roost::logging::init_test();
/// }
/// ```
pub fn init_test() {
    init(LogConfig::test());
}

/// Span covering work done on behalf of one actor.
#[macro_export]
macro_rules! actor_span {
    ($path:expr, $uid:expr) => {
        tracing::debug_span!("actor", path = %$path, uid = $uid)
    };
    ($path:expr, $uid:expr, $($fields:tt)*) => {
        tracing::debug_span!("actor", path = %$path, uid = $uid, $($fields)*)
    };
}

/// Span covering one message invocation.
#[macro_export]
macro_rules! message_span {
    ($kind:expr) => {
        tracing::trace_span!("message", kind = $kind)
    };
    ($kind:expr, $($fields:tt)*) => {
        tracing::trace_span!("message", kind = $kind, $($fields)*)
    };
}

/// Span covering a system-level operation.
#[macro_export]
macro_rules! system_span {
    ($operation:expr) => {
        tracing::info_span!("system", operation = $operation)
    };
    ($operation:expr, $($fields:tt)*) => {
        tracing::info_span!("system", operation = $operation, $($fields)*)
    };
}

/// Actor lifecycle transitions.
#[macro_export]
macro_rules! log_lifecycle {
    ($path:expr, $uid:expr, $event:expr) => {
        tracing::debug!(path = %$path, uid = $uid, event = $event)
    };
    ($path:expr, $uid:expr, $event:expr, $($fields:tt)*) => {
        tracing::debug!(path = %$path, uid = $uid, event = $event, $($fields)*)
    };
}

/// Error with structured fields, as logged by mailboxes for failed invocations.
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {
        tracing::error!(error = %$error)
    };
    ($error:expr, $($fields:tt)*) => {
        tracing::error!(error = %$error, $($fields)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(LogConfig::development().level, Level::DEBUG);
        assert!(LogConfig::production().json_format);
        assert!(!LogConfig::test().show_thread_info);
    }

    #[test]
    fn test_target_filters_are_applied() {
        let config = LogConfig {
            target_filters: Some("roost::cell=trace, not a directive".to_string()),
            ..Default::default()
        };
        let rendered = config.env_filter().to_string();
        assert!(rendered.contains("roost::cell=trace"));
    }

    #[test]
    fn test_init_is_idempotent() {
        init_test();
        init_test();
        tracing::warn!("logging initialized twice");
    }
}
