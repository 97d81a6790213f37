//! Caller-supplied log sink
//!
//! The controller reports request outcomes here in addition to its own
//! `tracing` events. Hooks run inline on the request path and must not block.

/// Severity of a hook message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Descriptor passed to hooks for requests that bypass the pool
pub const NO_PROXY: &str = "No proxy";

pub trait LogHook: Send + Sync {
    /// `proxy` is a masked proxy URL, or [`NO_PROXY`]
    fn log(&self, level: LogLevel, message: &str, proxy: &str);
}

/// Default hook; discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogHook;

impl LogHook for NoopLogHook {
    fn log(&self, _level: LogLevel, _message: &str, _proxy: &str) {}
}

impl<F> LogHook for F
where
    F: Fn(LogLevel, &str, &str) + Send + Sync,
{
    fn log(&self, level: LogLevel, message: &str, proxy: &str) {
        self(level, message, proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_closure_hook() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hook = move |level: LogLevel, message: &str, proxy: &str| {
            sink.lock().push(format!("{} {} [{}]", level, message, proxy));
        };

        hook.log(LogLevel::Warn, "retrying", NO_PROXY);
        NoopLogHook.log(LogLevel::Error, "dropped", NO_PROXY);

        assert_eq!(*seen.lock(), vec!["warn retrying [No proxy]".to_string()]);
    }
}
