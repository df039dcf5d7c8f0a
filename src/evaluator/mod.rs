//! Evaluator (per engine): executes compiled bytecode against a data
//! bundle and produces a typed, timed result (spec §4.5).

mod common;
mod config;
mod expr;
mod memory;
mod wasm;

pub use config::ConfigEvaluator;
pub use expr::ExprEvaluator;
pub use wasm::WasmEvaluator;

use async_trait::async_trait;

use crate::context::EvalContext;
use crate::error::EvalError;
use crate::result::EvalResult;
use crate::unit::{EngineType, ExecutableUnit};

/// Implemented by each engine's evaluator. `eval` alone carries the
/// execution contract; `prepare` (spec §4.5) is thin enough to live
/// directly on [`ExecutableUnit::prepare`] instead, since it only needs the
/// unit's provider, not anything engine-specific.
#[async_trait]
pub trait Evaluator: Send + Sync {
    fn engine_type(&self) -> EngineType;

    async fn eval(&self, unit: &ExecutableUnit, ctx: EvalContext) -> Result<EvalResult, EvalError>;
}
