//! Error types for the engine-agnostic pipeline.
//!
//! Every component gets its own closed, `thiserror`-derived error enum so
//! callers can pattern-match on a specific inner kind. [`PolyscriptError`]
//! wraps them all via `#[from]` for callers that just want one type.

use thiserror::Error;

/// Errors raised while producing a byte stream for script source.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("unsupported source scheme: {0}")]
    UnsupportedScheme(String),

    #[error("script not available: HTTP {status}")]
    ScriptNotAvailable { status: u16 },

    #[error("source input is empty or whitespace-only")]
    InputEmpty,

    #[error("I/O failure reading source")]
    Io(#[source] anyhow::Error),
}

/// Errors raised by a [`crate::provider::DataProvider`].
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("unit has no data provider configured")]
    NoProvider,

    #[error("provider failed to assemble bundle: {message}")]
    ProviderError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("static provider cannot be extended; compose it behind a context provider")]
    StaticNotExtendable,
}

impl ProviderError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::ProviderError {
            message: message.into(),
            source: None,
        }
    }

    pub fn provider_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ProviderError {
            message: message.into(),
            source: Some(source),
        }
    }
}

/// Errors raised while compiling source into a [`crate::unit::Bytecode`] artifact.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("source content is nil")]
    ContentNil,

    #[error("source produced no executable instructions")]
    NoInstructions,

    #[error("validation failed: {message}")]
    ValidationFailed {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("compiler produced nil bytecode")]
    BytecodeNil,

    #[error("failed to create executable artifact: {message}")]
    ExecCreationFailed {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl CompileError {
    pub fn validation_failed(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ValidationFailed {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn exec_creation_failed(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ExecCreationFailed {
            message: message.into(),
            source: Some(source),
        }
    }
}

/// Errors raised while building an [`crate::unit::ExecutableUnit`].
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("compiler is nil")]
    CompilerNil,

    #[error("loader I/O failed")]
    LoaderIo(#[source] anyhow::Error),

    #[error("failed to close loader stream")]
    LoaderClose(#[source] anyhow::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Loader(#[from] LoaderError),
}

/// Errors raised by a [`crate::evaluator::Evaluator`].
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("executable unit is nil")]
    UnitNil,

    #[error("bytecode is nil")]
    BytecodeNil,

    #[error("engine mismatch: evaluator expects {expected}, unit is {actual}")]
    EngineMismatch { expected: String, actual: String },

    #[error("executable unit id is empty")]
    IdEmpty,

    #[error("value conversion failed: {0}")]
    ConversionFailed(String),

    #[error("runtime error: {message}")]
    RuntimeError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("evaluation cancelled")]
    Cancelled,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl EvalError {
    pub fn runtime(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::RuntimeError {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn runtime_simple(message: impl Into<String>) -> Self {
        Self::RuntimeError {
            message: message.into(),
            source: None,
        }
    }
}

/// Errors raised by the engine dispatch factory.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("unknown engine discriminator: {0}")]
    UnknownEngine(String),

    #[error("options type mismatch for engine {engine}: expected {expected}")]
    OptionsTypeMismatch { engine: String, expected: String },
}

/// Unifying error type for callers who want a single type to match on while
/// still being able to downcast to the specific inner kind via `#[source]`.
#[derive(Error, Debug)]
pub enum PolyscriptError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl PolyscriptError {
    /// Render the full error chain top-to-bottom, one cause per line.
    pub fn inspect(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str("\ncaused by: ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}
