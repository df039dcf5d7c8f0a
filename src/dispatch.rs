//! Engine Dispatch: the factory seam that resolves an [`EngineType`] (or its
//! wire tag) to a concrete compiler or evaluator (spec §4.7).

use crate::compiler::{Compiler, CompilerOptions, ConfigCompiler, ExprCompiler, WasmCompiler, WasmCompilerOptions};
use crate::error::DispatchError;
use crate::evaluator::{ConfigEvaluator, Evaluator, ExprEvaluator, WasmEvaluator};
use crate::unit::{EngineType, ExecutableUnit};

/// Per-engine compiler options, since each engine's compiler carries its
/// own configuration type (composition, not inheritance — spec §4.3).
pub enum AnyCompilerOptions {
    Expr(CompilerOptions),
    Config(CompilerOptions),
    Wasm(WasmCompilerOptions),
}

impl AnyCompilerOptions {
    fn kind_name(&self) -> &'static str {
        match self {
            AnyCompilerOptions::Expr(_) => "CompilerOptions (expr)",
            AnyCompilerOptions::Config(_) => "CompilerOptions (config)",
            AnyCompilerOptions::Wasm(_) => "WasmCompilerOptions",
        }
    }
}

/// Resolve a compiler for `engine`, given options of the matching kind.
pub fn compiler_for(engine: EngineType, opts: AnyCompilerOptions) -> Result<Box<dyn Compiler>, DispatchError> {
    match (engine, opts) {
        (EngineType::Risor, AnyCompilerOptions::Expr(o)) => Ok(Box::new(ExprCompiler::new(o))),
        (EngineType::Starlark, AnyCompilerOptions::Config(o)) => Ok(Box::new(ConfigCompiler::new(o))),
        (EngineType::Extism, AnyCompilerOptions::Wasm(o)) => Ok(Box::new(WasmCompiler::new(o))),
        (engine, opts) => Err(DispatchError::OptionsTypeMismatch {
            engine: engine.as_str().to_string(),
            expected: opts.kind_name().to_string(),
        }),
    }
}

/// Resolve a compiler by the engine's wire tag (`"risor"`/`"starlark"`/`"extism"`),
/// for callers that only have a string discriminator on hand.
pub fn compiler_for_tag(tag: &str, opts: AnyCompilerOptions) -> Result<Box<dyn Compiler>, DispatchError> {
    let engine: EngineType = tag
        .parse()
        .map_err(|_| DispatchError::UnknownEngine(tag.to_string()))?;
    compiler_for(engine, opts)
}

/// Resolve the evaluator matching `unit`'s engine discriminator.
pub fn evaluator_for(unit: &ExecutableUnit) -> Result<Box<dyn Evaluator>, DispatchError> {
    match unit.engine_type() {
        EngineType::Risor => Ok(Box::new(ExprEvaluator::new())),
        EngineType::Starlark => Ok(Box::new(ConfigEvaluator::new())),
        EngineType::Extism => Ok(Box::new(WasmEvaluator::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_for_tag_rejects_unknown() {
        let err = compiler_for_tag("cobol", AnyCompilerOptions::Expr(CompilerOptions::new())).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownEngine(_)));
    }

    #[test]
    fn compiler_for_rejects_mismatched_options() {
        let err = compiler_for(EngineType::Risor, AnyCompilerOptions::Config(CompilerOptions::new())).unwrap_err();
        assert!(matches!(err, DispatchError::OptionsTypeMismatch { .. }));
    }

    #[test]
    fn compiler_for_tag_dispatches_matching_options() {
        let compiler = compiler_for_tag("risor", AnyCompilerOptions::Expr(CompilerOptions::new()));
        assert!(compiler.is_ok());
    }
}
