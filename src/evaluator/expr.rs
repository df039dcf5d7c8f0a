//! Dynamic-expression engine evaluator (Risor-like), backed by `rhai`.

use std::time::Instant;

use async_trait::async_trait;
use rhai::{Engine, Scope};

use crate::context::EvalContext;
use crate::conversion::rhai::{host_to_rhai, rhai_to_host};
use crate::error::EvalError;
use crate::provider::DataProviderExt;
use crate::result::EvalResult;
use crate::unit::{CompiledArtifact, EngineType, ExecutableUnit};

use super::common::check_preconditions;
use super::Evaluator;

/// Statement-count interval at which the script's cancellation is polled;
/// rhai has no native interrupt, so cancellation is cooperative (spec §4.5).
const CANCEL_CHECK_OPS: u64 = 2048;

pub struct ExprEvaluator {
    engine: Engine,
}

impl ExprEvaluator {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(0);
        Self { engine }
    }
}

impl Default for ExprEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Evaluator for ExprEvaluator {
    fn engine_type(&self) -> EngineType {
        EngineType::Risor
    }

    async fn eval(&self, unit: &ExecutableUnit, ctx: EvalContext) -> Result<EvalResult, EvalError> {
        let bytecode = check_preconditions(unit, EngineType::Risor)?;
        let CompiledArtifact::Expr(ast) = &bytecode.artifact else {
            return Err(EvalError::ConversionFailed(
                "expected rhai artifact on a risor unit".into(),
            ));
        };

        if ctx.is_cancelled() {
            return Err(EvalError::Cancelled);
        }

        let bundle = match unit.provider() {
            Some(provider) => provider.get(&ctx).await?,
            None => crate::value::Value::Map(Default::default()),
        };

        let bundle_map = match &bundle {
            crate::value::Value::Map(m) => Some(m),
            _ => None,
        };

        let mut scope = Scope::new();
        scope.push("ctx", host_to_rhai(&bundle));
        for global in &bytecode.declared_globals {
            // Declared-but-absent-from-this-bundle is not an error: `globals`
            // only fixes which names are known at compile time (spec §4.3),
            // not that every call's bundle must supply all of them.
            let value = bundle_map
                .and_then(|m| m.get(global))
                .map(host_to_rhai)
                .unwrap_or(rhai::Dynamic::UNIT);
            scope.push(global.clone(), value);
        }

        let cancel = ctx.cancellation_token();
        let mut engine = self.engine.clone();
        let cancel_for_hook = cancel.clone();
        engine.on_progress(move |count| {
            if count % CANCEL_CHECK_OPS == 0 && cancel_for_hook.is_cancelled() {
                Some(rhai::Dynamic::UNIT)
            } else {
                None
            }
        });

        // rhai's evaluation is synchronous and can run arbitrarily long
        // (the progress hook above is the only cancellation point), so it
        // runs on a blocking-pool thread rather than the async worker the
        // rest of this call is polled on (mirrors `WasmEvaluator::eval`).
        let ast = ast.clone();
        let started = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || {
            engine.eval_ast_with_scope::<rhai::Dynamic>(&mut scope, &ast)
        })
        .await;
        let exec_duration = started.elapsed();

        if cancel.is_cancelled() {
            return Err(EvalError::Cancelled);
        }

        let dynamic = outcome
            .map_err(|e| EvalError::runtime("expression eval task panicked", anyhow::anyhow!(e)))?
            .map_err(|e| EvalError::runtime(format!("expression evaluation failed: {e}"), anyhow::anyhow!(e.to_string())))?;

        let value = rhai_to_host(dynamic)?;
        Ok(EvalResult::new(value, exec_duration, unit.id()))
    }
}
