//! Compiler (per engine): parse and compile source into engine-specific
//! bytecode (spec §4.3).

mod common;
mod config;
mod expr;
mod options;
mod wasm;

pub use config::ConfigCompiler;
pub use expr::ExprCompiler;
pub use options::{CompilerOptions, LogSink};
pub use wasm::{WasmCompiler, WasmCompilerOptions};

use std::io::Read;

use crate::error::CompileError;
use crate::unit::Bytecode;

/// Implemented by each engine's compiler. Each concrete compiler carries
/// its own configuration (constructed via `with_options`); `compile` takes
/// only the stream so `ExecutableUnit::build` doesn't need to thread
/// per-engine option types through its own, engine-agnostic signature.
pub trait Compiler {
    fn compile(&self, stream: Box<dyn Read + Send>) -> Result<Bytecode, CompileError>;
}
