//! Config/declarative engine compiler (Starlark-like), backed by
//! `starlark-rust`.
//!
//! `starlark::syntax::AstModule` is consumed by evaluation (it is not a
//! `Clone`-able reusable artifact the way `rhai::AST` is), so this compiler
//! only validates parseability up front and stores the validated source
//! text on [`Bytecode`]; the [`crate::evaluator::ConfigEvaluator`] re-parses
//! a fresh `AstModule` from that text at each `eval` call.

use std::io::Read;

use starlark::syntax::{AstModule, Dialect};

use crate::error::CompileError;
use crate::unit::{Bytecode, CompiledArtifact, EngineType};

use super::common::{read_all, validate_non_empty};
use super::{Compiler, CompilerOptions};

pub struct ConfigCompiler {
    options: CompilerOptions,
}

impl ConfigCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }
}

impl Compiler for ConfigCompiler {
    fn compile(&self, stream: Box<dyn Read + Send>) -> Result<Bytecode, CompileError> {
        let bytes = read_all(stream)?;
        let text = validate_non_empty(&bytes)?;

        if let Some(sink) = &self.options.log_sink {
            sink.emit(&format!("compiling config script ({} bytes)", bytes.len()));
        }

        AstModule::parse("script.star", text.clone(), &Dialect::Standard).map_err(|e| {
            CompileError::validation_failed(
                format!("config parse error: {e}"),
                anyhow::anyhow!(e.to_string()),
            )
        })?;

        Ok(Bytecode::new(
            EngineType::Starlark,
            text,
            CompiledArtifact::Config,
            self.options.globals.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(s: &str) -> Box<dyn Read + Send> {
        Box::new(Cursor::new(s.as_bytes().to_vec()))
    }

    #[test]
    fn compiles_valid_config() {
        let compiler = ConfigCompiler::new(CompilerOptions::new());
        let bc = compiler
            .compile(stream("result = {\"greeting\": \"hi\"}\n"))
            .unwrap();
        assert_eq!(bc.engine, EngineType::Starlark);
    }

    #[test]
    fn rejects_empty_source() {
        let compiler = ConfigCompiler::new(CompilerOptions::new());
        assert!(matches!(compiler.compile(stream("")), Err(CompileError::NoInstructions)));
    }

    #[test]
    fn rejects_invalid_syntax() {
        let compiler = ConfigCompiler::new(CompilerOptions::new());
        assert!(matches!(
            compiler.compile(stream("def f(:\n")),
            Err(CompileError::ValidationFailed { .. })
        ));
    }
}
