//! polyscript-core
//!
//! Engine-agnostic compile-once / evaluate-many pipeline for embedded
//! scripting VMs.
//!
//! # Overview
//!
//! polyscript-core loads script source from a pluggable origin, compiles it
//! once into engine-specific bytecode, and evaluates the resulting
//! [`unit::ExecutableUnit`] any number of times against per-call data
//! bundles supplied by a composable [`provider::DataProvider`]. Three
//! engine adapters are provided out of the box:
//!
//! - a dynamic-expression engine, backed by `rhai`
//! - a declarative configuration engine, backed by `starlark-rust`
//! - a WASM plugin engine, backed by `wasmtime`
//!
//! # Architecture
//!
//! ```text
//! Loader ──► Compiler ──► ExecutableUnit
//!                              │
//!                              ▼
//! host ──► unit.prepare(ctx, data) ──► Evaluator.eval(ctx) ──► EvalResult
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use polyscript_core::compiler::{CompilerOptions, ExprCompiler};
//! use polyscript_core::context::EvalContext;
//! use polyscript_core::evaluator::{Evaluator, ExprEvaluator};
//! use polyscript_core::source::Loader;
//! use polyscript_core::unit::ExecutableUnit;
//! use polyscript_core::value::Value;
//! use std::collections::BTreeMap;
//!
//! #[tokio::main]
//! async fn main() {
//!     let compiler = ExprCompiler::new(CompilerOptions::new());
//!     let loader = Loader::from_string(r#"ctx["name"]"#).unwrap();
//!
//!     let mut data = BTreeMap::new();
//!     data.insert("name".to_string(), Value::String("World".into()));
//!
//!     let unit = ExecutableUnit::build(None, loader, &compiler, None, Some(data))
//!         .await
//!         .unwrap();
//!
//!     let evaluator = ExprEvaluator::new();
//!     let result = evaluator.eval(&unit, EvalContext::new()).await.unwrap();
//!     println!("{result}");
//! }
//! ```

pub mod compiler;
pub mod context;
pub mod conversion;
pub mod dispatch;
pub mod error;
pub mod evaluator;
pub mod provider;
pub mod result;
pub mod source;
pub mod unit;
pub mod value;

pub use error::PolyscriptError;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name, as surfaced in diagnostics.
pub const NAME: &str = "polyscript-core";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "polyscript-core");
    }
}
