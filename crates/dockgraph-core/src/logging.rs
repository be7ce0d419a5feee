#![forbid(unsafe_code)]

//! Logging façade.
//!
//! With the `tracing` feature enabled this module re-exports the `tracing`
//! event macros, and the crate root re-exports them again, so downstream code
//! writes `dockgraph_core::debug!(...)` regardless of configuration. Without
//! the feature the same names are `#[macro_export]`ed no-op macros. They
//! still type-check their fields, so a value used only in an event does not
//! trip unused-variable lints, but never evaluate them.
//!
//! # Conventions
//!
//! Events carry a dotted `message` such as `"dock.apply"` followed by
//! structured fields:
//!
//! ```ignore
//! debug!(message = "dock.apply", op = "pin", revision = 7u64);
//! ```
//!
//! # JSON output
//!
//! The `tracing-json` feature adds [`init_from_env`], which installs a JSON
//! formatter filtered by `RUST_LOG` (default `info`).

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};

/// Type-check the fields of a disabled event without evaluating them, so
/// values used only for logging still count as used.
#[cfg(not(feature = "tracing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __discard_fields {
    () => {};
    ($name:ident = ?$value:expr $(, $($rest:tt)*)?) => {
        let _ = &$value;
        $($crate::__discard_fields!($($rest)*);)?
    };
    ($name:ident = %$value:expr $(, $($rest:tt)*)?) => {
        let _ = &$value;
        $($crate::__discard_fields!($($rest)*);)?
    };
    ($name:ident = $value:expr $(, $($rest:tt)*)?) => {
        let _ = &$value;
        $($crate::__discard_fields!($($rest)*);)?
    };
    ($name:ident $(, $($rest:tt)*)?) => {
        let _ = &$name;
        $($crate::__discard_fields!($($rest)*);)?
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        let _ = ($(&$arg,)*);
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {{
        if false {
            $crate::__discard_fields!($($arg)*);
        }
    }};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        if false {
            $crate::__discard_fields!($($arg)*);
        }
    }};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        if false {
            $crate::__discard_fields!($($arg)*);
        }
    }};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        if false {
            $crate::__discard_fields!($($arg)*);
        }
    }};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        if false {
            $crate::__discard_fields!($($arg)*);
        }
    }};
}

/// Failure to install the global JSON subscriber.
#[cfg(feature = "tracing-json")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingInitError {
    reason: String,
}

#[cfg(feature = "tracing-json")]
impl std::fmt::Display for LoggingInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to install tracing subscriber: {}", self.reason)
    }
}

#[cfg(feature = "tracing-json")]
impl std::error::Error for LoggingInitError {}

/// Install a global JSON subscriber filtered by `RUST_LOG`.
///
/// Returns an error if a global subscriber is already set.
#[cfg(feature = "tracing-json")]
pub fn init_from_env() -> Result<(), LoggingInitError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| LoggingInitError {
            reason: err.to_string(),
        })
}
