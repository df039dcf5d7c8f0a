//! WASM plugin engine compiler (Extism-like), backed by `wasmtime`.
//!
//! Compiles guest bytes into a `wasmtime::Module`, which is cheap to clone
//! and safe to reuse across many evaluations — the same compile-once shape
//! the teacher's own `wasm.rs` relies on.

use std::io::Read;

use wasmtime::{Config, Engine, Module};

use crate::error::CompileError;
use crate::unit::{Bytecode, CompiledArtifact, EngineType, WasmArtifact};

use super::common::read_all;
use super::{Compiler, CompilerOptions};

/// Adds the guest entry-point name to the common compiler options.
#[derive(Debug, Clone)]
pub struct WasmCompilerOptions {
    pub base: CompilerOptions,
    pub entrypoint: String,
}

impl WasmCompilerOptions {
    pub fn new(entrypoint: impl Into<String>) -> Self {
        Self {
            base: CompilerOptions::new(),
            entrypoint: entrypoint.into(),
        }
    }

    pub fn with_base(mut self, base: CompilerOptions) -> Self {
        self.base = base;
        self
    }
}

pub struct WasmCompiler {
    engine: Engine,
    options: WasmCompilerOptions,
}

impl WasmCompiler {
    pub fn new(options: WasmCompilerOptions) -> Self {
        // Epoch interruption lets `WasmEvaluator` install a deadline driven
        // by the call's `CancellationToken` instead of polling (spec §4.5).
        let mut config = Config::new();
        config.epoch_interruption(true);
        let engine = Engine::new(&config).expect("wasmtime config is always valid");
        Self { engine, options }
    }
}

impl Compiler for WasmCompiler {
    fn compile(&self, stream: Box<dyn Read + Send>) -> Result<Bytecode, CompileError> {
        let bytes = read_all(stream)?;
        if bytes.is_empty() {
            return Err(CompileError::NoInstructions);
        }

        if let Some(sink) = &self.options.base.log_sink {
            sink.emit(&format!("compiling wasm module ({} bytes)", bytes.len()));
        }

        let module = Module::new(&self.engine, &bytes).map_err(|e| {
            CompileError::validation_failed(
                format!("wasm module compile error: {e}"),
                anyhow::anyhow!(e.to_string()),
            )
        })?;

        if module.exports().count() == 0 {
            return Err(CompileError::NoInstructions);
        }

        let source = String::from_utf8_lossy(&bytes).into_owned();
        Ok(Bytecode::new(
            EngineType::Extism,
            source,
            CompiledArtifact::Wasm(WasmArtifact {
                engine: self.engine.clone(),
                module,
                entrypoint: self.options.entrypoint.clone(),
            }),
            self.options.base.globals.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(bytes: &[u8]) -> Box<dyn Read + Send> {
        Box::new(Cursor::new(bytes.to_vec()))
    }

    const MINIMAL_WAT: &str = r#"
        (module
            (func $run (export "run") (result i32)
                i32.const 0)
        )
    "#;

    #[test]
    fn compiles_valid_module() {
        let bytes = wat::parse_str(MINIMAL_WAT).unwrap();
        let compiler = WasmCompiler::new(WasmCompilerOptions::new("run"));
        let bc = compiler.compile(stream(&bytes)).unwrap();
        assert_eq!(bc.engine, EngineType::Extism);
    }

    #[test]
    fn rejects_empty_bytes() {
        let compiler = WasmCompiler::new(WasmCompilerOptions::new("run"));
        assert!(matches!(compiler.compile(stream(&[])), Err(CompileError::NoInstructions)));
    }

    #[test]
    fn rejects_malformed_module() {
        let compiler = WasmCompiler::new(WasmCompilerOptions::new("run"));
        assert!(matches!(
            compiler.compile(stream(b"not a wasm module")),
            Err(CompileError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn rejects_module_with_no_exports() {
        let wat = r#"(module (func $run (result i32) i32.const 0))"#;
        let bytes = wat::parse_str(wat).unwrap();
        let compiler = WasmCompiler::new(WasmCompilerOptions::new("run"));
        assert!(matches!(
            compiler.compile(stream(&bytes)),
            Err(CompileError::NoInstructions)
        ));
    }
}
