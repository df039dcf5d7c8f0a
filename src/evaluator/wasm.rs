//! WASM plugin engine evaluator (Extism-like), backed by `wasmtime`.
//!
//! A fresh `Store` is instantiated per call (spec §5). Cancellation is
//! wired through `wasmtime`'s epoch-interruption mechanism: a ticker task
//! bumps the engine's epoch on an interval, and the deadline callback traps
//! as soon as it observes the call's `CancellationToken` fired — installing
//! the interrupt directly on the VM rather than spawning a watcher that
//! merely polls a flag from outside (spec §9 Design Note).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use wasmtime::{Instance, Linker, Store, UpdateDeadline};

use crate::context::EvalContext;
use crate::conversion::json::{host_to_wasm_json, wasm_json_to_host};
use crate::error::EvalError;
use crate::provider::DataProviderExt;
use crate::result::EvalResult;
use crate::unit::{CompiledArtifact, EngineType, ExecutableUnit, WasmArtifact};
use crate::value::Value;

use super::common::check_preconditions;
use super::memory;
use super::Evaluator;

const EPOCH_TICK: Duration = Duration::from_millis(10);

pub struct WasmEvaluator;

impl WasmEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WasmEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Evaluator for WasmEvaluator {
    fn engine_type(&self) -> EngineType {
        EngineType::Extism
    }

    async fn eval(&self, unit: &ExecutableUnit, ctx: EvalContext) -> Result<EvalResult, EvalError> {
        let bytecode = check_preconditions(unit, EngineType::Extism)?;
        let CompiledArtifact::Wasm(artifact) = &bytecode.artifact else {
            return Err(EvalError::ConversionFailed(
                "expected wasm artifact on an extism unit".into(),
            ));
        };

        if ctx.is_cancelled() {
            return Err(EvalError::Cancelled);
        }

        let bundle = match unit.provider() {
            Some(provider) => provider.get(&ctx).await?,
            None => Value::Map(Default::default()),
        };
        let input_json = serde_json::to_vec(&host_to_wasm_json(&bundle))
            .map_err(|e| EvalError::runtime("failed to serialise bundle", anyhow::anyhow!(e)))?;

        let artifact = artifact.clone();
        let cancel = ctx.cancellation_token();
        let ticker_cancel = cancel.clone();
        let ticker_engine = artifact.engine.clone();
        let ticker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ticker_cancel.cancelled() => break,
                    _ = tokio::time::sleep(EPOCH_TICK) => {
                        ticker_engine.increment_epoch();
                    }
                }
            }
        });

        let call_cancel = cancel.clone();
        let started = Instant::now();
        let call_result = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, EvalError> {
            call_entrypoint(&artifact, &input_json, call_cancel)
        })
        .await;
        let exec_duration = started.elapsed();
        ticker.abort();

        if cancel.is_cancelled() {
            return Err(EvalError::Cancelled);
        }

        let output_bytes = call_result
            .map_err(|e| EvalError::runtime("wasm call task panicked", anyhow::anyhow!(e)))??;

        let json: serde_json::Value = serde_json::from_slice(&output_bytes)
            .map_err(|e| EvalError::ConversionFailed(format!("wasm output is not valid JSON: {e}")))?;
        let value = wasm_json_to_host(json)?;

        Ok(EvalResult::new(value, exec_duration, unit.id()))
    }
}

fn call_entrypoint(
    artifact: &WasmArtifact,
    input: &[u8],
    cancel: tokio_util::sync::CancellationToken,
) -> Result<Vec<u8>, EvalError> {
    let mut store = Store::new(&artifact.engine, ());
    store.set_epoch_deadline(1);
    store.epoch_deadline_callback(move |_store| {
        if cancel.is_cancelled() {
            Err(anyhow::anyhow!("evaluation cancelled"))
        } else {
            Ok(UpdateDeadline::Continue(1))
        }
    });

    let linker: Linker<()> = Linker::new(&artifact.engine);
    let instance: Instance = linker
        .instantiate(&mut store, &artifact.module)
        .map_err(|e| EvalError::runtime("failed to instantiate wasm module", anyhow::anyhow!(e)))?;

    let memory = instance
        .get_memory(&mut store, "memory")
        .ok_or_else(|| EvalError::runtime_simple("wasm module has no memory export"))?;

    let input_ptr = memory::write_bundle(&mut store, &memory, input)?;

    let entry = instance
        .get_typed_func::<(u32, u32), u32>(&mut store, &artifact.entrypoint)
        .map_err(|e| {
            EvalError::runtime(
                format!("entry point `{}` not found or has wrong signature", artifact.entrypoint),
                anyhow::anyhow!(e),
            )
        })?;

    let output_ptr = entry
        .call(&mut store, (input_ptr, input.len() as u32))
        .map_err(|e| EvalError::runtime(format!("entry point `{}` call failed", artifact.entrypoint), anyhow::anyhow!(e)))?;

    memory::read_bundle(&store, &memory, output_ptr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{Compiler, WasmCompiler, WasmCompilerOptions};
    use crate::source::Loader;

    fn echo_module() -> Vec<u8> {
        wat::parse_str(
            r#"
            (module
                (memory (export "memory") 2)
                (func $run (export "run") (param $ptr i32) (param $len i32) (result i32)
                    local.get $ptr)
            )
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn echoes_serialised_bundle_back() {
        let bytes = echo_module();
        let compiler = WasmCompiler::new(WasmCompilerOptions::new("run"));
        let loader = Loader::from_reader("echo.wasm", bytes).unwrap();
        let unit = ExecutableUnit::build(None, loader, &compiler, None, None)
            .await
            .unwrap();

        let evaluator = WasmEvaluator::new();
        let result = evaluator.eval(&unit, EvalContext::new()).await.unwrap();
        let Value::Map(m) = result.value else { panic!("expected map") };
        assert!(m.is_empty());
    }

    #[tokio::test]
    async fn rejects_when_cancelled_before_entry() {
        let bytes = echo_module();
        let compiler = WasmCompiler::new(WasmCompilerOptions::new("run"));
        let loader = Loader::from_reader("echo2.wasm", bytes).unwrap();
        let unit = ExecutableUnit::build(None, loader, &compiler, None, None)
            .await
            .unwrap();

        let ctx = EvalContext::new();
        ctx.cancel();
        let evaluator = WasmEvaluator::new();
        let err = evaluator.eval(&unit, ctx).await.unwrap_err();
        assert!(matches!(err, EvalError::Cancelled));
    }
}
