//! Dynamic-expression engine compiler (Risor-like), backed by `rhai`.
//!
//! rhai's `AST` is the closest real-crate analogue of Risor's own bytecode:
//! `Engine::compile` parses once into a `Clone`-able, `Send + Sync` (with
//! the `sync` feature) artifact that can be evaluated many times, which is
//! exactly the compile-once/evaluate-many shape spec §2 asks for.

use std::io::Read;
use std::sync::Arc;

use rhai::{Engine, Scope};

use crate::error::CompileError;
use crate::unit::{Bytecode, CompiledArtifact, EngineType};

use super::common::{read_all, validate_non_empty};
use super::{Compiler, CompilerOptions};

/// Global name every script may reference without declaring it, regardless
/// of `options.globals` — the data bundle binding (spec §4.2/§6).
const CTX_GLOBAL: &str = "ctx";

pub struct ExprCompiler {
    engine: Engine,
    options: CompilerOptions,
}

impl ExprCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        let mut engine = Engine::new();
        // Strict variables mode turns a reference to a name absent from the
        // scope below into a parse-time error instead of a runtime one, so
        // `globals` acts as predeclared placeholders (spec §4.3) rather than
        // documentation the evaluator quietly ignores.
        engine.set_strict_variables_mode(true);
        Self { engine, options }
    }

    fn predeclared_scope(&self) -> Scope<'static> {
        let mut scope = Scope::new();
        scope.push_constant(CTX_GLOBAL, ());
        for global in &self.options.globals {
            scope.push_constant(global.clone(), ());
        }
        scope
    }
}

impl Compiler for ExprCompiler {
    fn compile(&self, stream: Box<dyn Read + Send>) -> Result<Bytecode, CompileError> {
        let bytes = read_all(stream)?;
        let text = validate_non_empty(&bytes)?;

        if let Some(sink) = &self.options.log_sink {
            sink.emit(&format!("compiling expression script ({} bytes)", bytes.len()));
        }

        let scope = self.predeclared_scope();
        let ast = self
            .engine
            .compile_with_scope(&scope, &text)
            .map_err(|e| CompileError::validation_failed(
                format!("expression compile error: {e}"),
                anyhow::anyhow!(e.to_string()),
            ))?;

        Ok(Bytecode::new(
            EngineType::Risor,
            text,
            CompiledArtifact::Expr(Arc::new(ast)),
            self.options.globals.clone(),
        ))
    }
}
