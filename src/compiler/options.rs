//! Compiler configuration shared by every engine (spec §4.3).

use std::sync::Arc;

/// Where compiler/evaluator diagnostics go. Supplying both a handler and a
/// tracing level is allowed; whichever was configured most recently wins,
/// since both live in the same `Option<LogSink>` field.
#[derive(Clone)]
pub enum LogSink {
    Handler(Arc<dyn Fn(&str) + Send + Sync>),
    Tracing(tracing::Level),
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogSink::Handler(_) => write!(f, "LogSink::Handler(..)"),
            LogSink::Tracing(level) => write!(f, "LogSink::Tracing({level})"),
        }
    }
}

impl LogSink {
    pub fn emit(&self, message: &str) {
        match self {
            LogSink::Handler(handler) => handler(message),
            LogSink::Tracing(level) => match *level {
                tracing::Level::ERROR => tracing::error!("{message}"),
                tracing::Level::WARN => tracing::warn!("{message}"),
                tracing::Level::DEBUG => tracing::debug!("{message}"),
                tracing::Level::TRACE => tracing::trace!("{message}"),
                _ => tracing::info!("{message}"),
            },
        }
    }
}

/// Options recognised by every engine's compiler.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Names of top-level variables the script is permitted to reference;
    /// the compiler records them so the evaluator can predeclare them as
    /// placeholders before the real data bundle is bound.
    pub globals: Vec<String>,
    pub log_sink: Option<LogSink>,
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_globals(mut self, globals: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.globals = globals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_handler(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log_sink = Some(LogSink::Handler(Arc::new(handler)));
        self
    }

    pub fn with_tracing(mut self, level: tracing::Level) -> Self {
        self.log_sink = Some(LogSink::Tracing(level));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn most_recent_log_sink_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let opts = CompilerOptions::new()
            .with_tracing(tracing::Level::DEBUG)
            .with_handler(move |_| {
                calls2.fetch_add(1, Ordering::SeqCst);
            });

        match &opts.log_sink {
            Some(LogSink::Handler(_)) => {}
            other => panic!("expected handler to win, got {other:?}"),
        }
        opts.log_sink.unwrap().emit("hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
