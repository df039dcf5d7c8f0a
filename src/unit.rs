//! Bytecode Artifact and Executable Unit (spec §3 / §4.4).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::compiler::Compiler;
use crate::context::EvalContext;
use crate::error::{ProviderError, UnitError};
use crate::provider::{layer_static, DataProvider, DataProviderExt};
use crate::source::{Loader, SourceRef};
use crate::value::Value;

/// Closed set of engine discriminators (spec §6). Internally the three
/// engines are named after the role they play (`Expr`, `Config`, `Wasm`);
/// `as_str`/`FromStr` map to the wire tags `risor`/`starlark`/`extism` so the
/// external vocabulary of spec §6 is preserved without tying the
/// implementation's internal naming to a specific upstream VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineType {
    Risor,
    Starlark,
    Extism,
}

impl EngineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineType::Risor => "risor",
            EngineType::Starlark => "starlark",
            EngineType::Extism => "extism",
        }
    }
}

impl std::fmt::Display for EngineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EngineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "risor" => Ok(EngineType::Risor),
            "starlark" => Ok(EngineType::Starlark),
            "extism" => Ok(EngineType::Extism),
            other => Err(format!("unknown engine discriminator: {other}")),
        }
    }
}

/// A compiled WASM artifact: the wasmtime engine it was compiled against
/// plus the compiled module. Kept together because instantiating the
/// module always needs its originating engine (mirrors the teacher's
/// `WasmInstance { engine, module, .. }`).
#[derive(Clone)]
pub struct WasmArtifact {
    pub engine: wasmtime::Engine,
    pub module: wasmtime::Module,
    pub entrypoint: String,
}

/// The engine-specific compiled representation. `Expr` holds a real,
/// reusable `rhai::AST` (rhai's own compile-once/eval-many primitive).
/// `Config` has no separate compiled form to hold — starlark-rust's
/// `AstModule` is consumed by evaluation, so the validated source text
/// (already stored on [`Bytecode`]) is re-parsed fresh at each `eval` call;
/// this variant exists to carry the `ConfigCompiler`'s validation stamp.
/// `Wasm` holds the compiled module as `wasmtime::Module` is cheaply
/// cloneable and safe to reuse across evaluations.
#[derive(Clone)]
pub enum CompiledArtifact {
    Expr(Arc<rhai::AST>),
    Config,
    Wasm(WasmArtifact),
}

/// Engine-tagged opaque value plus the original source bytes. The
/// discriminator determines which evaluator may consume `artifact`;
/// mismatch is a fatal, detectable `EvalError::EngineMismatch`.
#[derive(Clone)]
pub struct Bytecode {
    pub engine: EngineType,
    pub source: Arc<str>,
    pub artifact: CompiledArtifact,
    pub declared_globals: Vec<String>,
}

impl Bytecode {
    pub fn new(
        engine: EngineType,
        source: String,
        artifact: CompiledArtifact,
        declared_globals: Vec<String>,
    ) -> Self {
        Self {
            engine,
            source: Arc::from(source),
            artifact,
            declared_globals,
        }
    }
}

/// Immutable post-compile bundle of bytecode, provider, and identity.
/// Never mutated after construction; safe to share across threads/tasks
/// without external locking (spec §5).
#[derive(Clone)]
pub struct ExecutableUnit {
    id: String,
    created_at: DateTime<Utc>,
    source_ref: Arc<dyn SourceRef>,
    bytecode: Arc<Bytecode>,
    provider: Option<Arc<DataProvider>>,
    engine_type: EngineType,
}

impl ExecutableUnit {
    /// Build an executable unit: open the loader, compile, derive an id if
    /// none was supplied, and layer `static_data` beneath `provider` via a
    /// composite (spec §4.4).
    pub async fn build(
        id: Option<String>,
        loader: Loader,
        compiler: &impl Compiler,
        provider: Option<DataProvider>,
        static_data: Option<std::collections::BTreeMap<String, Value>>,
    ) -> Result<Self, UnitError> {
        let stream = loader.open().await.map_err(UnitError::Loader)?;
        let bytecode = compiler.compile(stream)?;

        let id = id.unwrap_or_else(|| derive_id(bytecode.source.as_ref()));
        let provider = layer_static(static_data, provider);
        let engine_type = bytecode.engine;

        Ok(Self {
            id,
            created_at: Utc::now(),
            source_ref: Arc::new(loader),
            bytecode: Arc::new(bytecode),
            provider: provider.map(Arc::new),
            engine_type,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn source_ref(&self) -> &Arc<dyn SourceRef> {
        &self.source_ref
    }

    pub fn bytecode(&self) -> &Arc<Bytecode> {
        &self.bytecode
    }

    pub fn provider(&self) -> Option<&Arc<DataProvider>> {
        self.provider.as_ref()
    }

    pub fn engine_type(&self) -> EngineType {
        self.engine_type
    }

    /// Thin delegation to this unit's provider's `add` (spec §4.5). Fails
    /// with `no-provider` if the unit has none; the returned context keeps
    /// whatever data landed even on partial failure.
    pub async fn prepare(
        &self,
        ctx: EvalContext,
        data: Vec<Value>,
    ) -> (EvalContext, Result<(), ProviderError>) {
        match &self.provider {
            Some(provider) => provider.add(ctx, data).await,
            None => (ctx, Err(ProviderError::NoProvider)),
        }
    }
}

fn derive_id(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_id_is_twelve_hex_chars() {
        let id = derive_id("name := ctx.get(\"name\")");
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn derive_id_is_deterministic() {
        assert_eq!(derive_id("abc"), derive_id("abc"));
        assert_ne!(derive_id("abc"), derive_id("abd"));
    }

    #[test]
    fn engine_type_round_trips_through_str() {
        use std::str::FromStr;
        for tag in ["risor", "starlark", "extism"] {
            let engine = EngineType::from_str(tag).unwrap();
            assert_eq!(engine.as_str(), tag);
        }
        assert!(EngineType::from_str("cobol").is_err());
    }
}
