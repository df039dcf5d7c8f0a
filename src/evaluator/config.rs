//! Configuration engine evaluator (Starlark-like), backed by
//! `starlark-rust`.
//!
//! `AstModule` is consumed by evaluation, so a fresh module is parsed from
//! the validated source text stored on [`crate::unit::Bytecode`] at every
//! call — see the note on [`crate::unit::CompiledArtifact::Config`].

use std::time::Instant;

use async_trait::async_trait;
use starlark::environment::{Globals, Module};
use starlark::eval::Evaluator as StarlarkEvaluator;
use starlark::syntax::{AstModule, Dialect};
use starlark::values::Value as StarlarkValue;

use crate::context::EvalContext;
use crate::conversion::starlark::{host_to_starlark, starlark_to_host};
use crate::error::EvalError;
use crate::provider::DataProviderExt;
use crate::result::EvalResult;
use crate::unit::{CompiledArtifact, EngineType, ExecutableUnit};
use crate::value::Value;

use super::common::check_preconditions;
use super::Evaluator;

/// Binding names checked in order for the module's result (spec §4.5).
const RESULT_BINDINGS: [&str; 2] = ["_", "result"];

pub struct ConfigEvaluator;

impl ConfigEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConfigEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Evaluator for ConfigEvaluator {
    fn engine_type(&self) -> EngineType {
        EngineType::Starlark
    }

    async fn eval(&self, unit: &ExecutableUnit, ctx: EvalContext) -> Result<EvalResult, EvalError> {
        let bytecode = check_preconditions(unit, EngineType::Starlark)?;
        if !matches!(bytecode.artifact, CompiledArtifact::Config) {
            return Err(EvalError::ConversionFailed(
                "expected config artifact on a starlark unit".into(),
            ));
        }

        if ctx.is_cancelled() {
            return Err(EvalError::Cancelled);
        }

        let bundle = match unit.provider() {
            Some(provider) => provider.get(&ctx).await?,
            None => Value::Map(Default::default()),
        };

        let ast = AstModule::parse("script.star", bytecode.source.to_string(), &Dialect::Standard)
            .map_err(|e| EvalError::runtime(format!("re-parse failed: {e}"), anyhow::anyhow!(e.to_string())))?;

        let module = Module::new();
        let globals = Globals::standard();
        let started = Instant::now();
        {
            let heap = module.heap();
            let ctx_value = host_to_starlark(heap, &bundle);
            module.set("ctx", ctx_value);

            let bundle_map = bundle.as_map();
            for global in &bytecode.declared_globals {
                // Declared-but-absent-from-this-bundle is not an error, same
                // as the expression engine: `globals` fixes which names are
                // known, not that every call's bundle must supply all of
                // them.
                let value = bundle_map
                    .and_then(|m| m.get(global))
                    .map(|v| host_to_starlark(heap, v))
                    .unwrap_or_else(StarlarkValue::new_none);
                module.set(global, value);
            }

            let mut eval = StarlarkEvaluator::new(&module);

            eval.eval_module(ast, &globals).map_err(|e| {
                EvalError::runtime(format!("module evaluation failed: {e}"), e)
            })?;
        }

        let bound = RESULT_BINDINGS.iter().find_map(|name| module.get(name));
        let Some(bound) = bound else {
            return Err(EvalError::runtime_simple(
                "script bound neither `_` nor `result`",
            ));
        };

        let result_value = if bound.get_type() == "function" || bound.get_type() == "native_function" {
            let mut eval = StarlarkEvaluator::new(&module);
            let called = eval
                .eval_function(bound, &[], &[])
                .map_err(|e| EvalError::runtime(format!("result function call failed: {e}"), e))?;
            starlark_to_host(called)?
        } else {
            starlark_to_host(bound)?
        };
        let exec_duration = started.elapsed();

        if ctx.is_cancelled() {
            return Err(EvalError::Cancelled);
        }

        Ok(EvalResult::new(result_value, exec_duration, unit.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{Compiler, CompilerOptions, ConfigCompiler};
    use crate::source::Loader;

    async fn build_unit(source: &str) -> ExecutableUnit {
        build_unit_with_globals(source, &[]).await
    }

    async fn build_unit_with_globals(source: &str, globals: &[&str]) -> ExecutableUnit {
        let compiler = ConfigCompiler::new(CompilerOptions::new().with_globals(globals.to_vec()));
        let loader = Loader::from_string(source).unwrap();
        ExecutableUnit::build(None, loader, &compiler, None, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn config_map_result() {
        let unit = build_unit("_ = {\"greeting\": \"Hello, World!\", \"length\": 13}\n").await;
        let evaluator = ConfigEvaluator::new();
        let result = evaluator.eval(&unit, EvalContext::new()).await.unwrap();
        let Value::Map(m) = result.value else { panic!("expected map") };
        assert_eq!(m.get("length"), Some(&Value::Int(13)));
    }

    #[tokio::test]
    async fn config_callable_result_is_invoked() {
        let unit = build_unit("def f():\n    return 42\n_ = f\n").await;
        let evaluator = ConfigEvaluator::new();
        let result = evaluator.eval(&unit, EvalContext::new()).await.unwrap();
        assert_eq!(result.value, Value::Int(42));
    }

    #[tokio::test]
    async fn result_binding_fallback_used_when_underscore_absent() {
        let unit = build_unit("result = 7\n").await;
        let evaluator = ConfigEvaluator::new();
        let r = evaluator.eval(&unit, EvalContext::new()).await.unwrap();
        assert_eq!(r.value, Value::Int(7));
    }

    #[tokio::test]
    async fn declared_global_is_bound_on_the_module() {
        let unit = build_unit_with_globals("_ = greeting\n", &["greeting"]).await;
        let evaluator = ConfigEvaluator::new();
        let r = evaluator.eval(&unit, EvalContext::new()).await.unwrap();
        assert_eq!(r.value, Value::Null);
    }
}
