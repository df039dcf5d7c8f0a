//! Data Provider: supplies and merges the per-evaluation data bundle.
//!
//! A closed enum of three variants (spec §4.2) rather than an open trait —
//! the only genuinely open seam is composition, which `Composite` already
//! covers. Hosts needing a bespoke fourth kind implement
//! [`DataProviderExt`] directly and box it.

pub mod request;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::{EvalContext, EVAL_DATA_KEY, REQUEST_KEY};
use crate::error::ProviderError;
use crate::value::Value;

/// Shared behavior implemented by every provider variant.
#[async_trait]
pub trait DataProviderExt: Send + Sync {
    /// Assemble the bundle for this evaluation.
    async fn get(&self, ctx: &EvalContext) -> Result<Value, ProviderError>;

    /// Return a *new* context enriched with `items`, so a later `get` can
    /// see them. Partial-success contexts are returned even on error.
    async fn add(
        &self,
        ctx: EvalContext,
        items: Vec<Value>,
    ) -> (EvalContext, Result<(), ProviderError>);
}

/// Constructed from a fixed bundle; `get` always returns it, `add` always
/// fails (`static-not-extendable`) — compose it behind a [`ContextProvider`]
/// via [`DataProvider::composite`] to layer dynamic data on top.
pub struct StaticProvider {
    bundle: BTreeMap<String, Value>,
}

impl StaticProvider {
    pub fn new(bundle: BTreeMap<String, Value>) -> Self {
        Self { bundle }
    }
}

/// Parameterized by a well-known context key; `add` coerces positional
/// inputs into bundle entries and stores the merged bundle under that key.
pub struct ContextProvider {
    key: String,
}

impl ContextProvider {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The conventional provider reading/writing [`EVAL_DATA_KEY`].
    pub fn eval_data() -> Self {
        Self::new(EVAL_DATA_KEY)
    }
}

/// Ordered list of providers; `get` merges outputs in declaration order
/// (later providers override earlier keys), `add` fans out to every child.
pub struct CompositeProvider {
    children: Vec<DataProvider>,
}

impl CompositeProvider {
    pub fn new(children: Vec<DataProvider>) -> Self {
        Self { children }
    }
}

/// The three provider variants.
pub enum DataProvider {
    Static(StaticProvider),
    Context(ContextProvider),
    Composite(CompositeProvider),
}

impl DataProvider {
    pub fn static_data(bundle: BTreeMap<String, Value>) -> Self {
        DataProvider::Static(StaticProvider::new(bundle))
    }

    pub fn context(key: impl Into<String>) -> Self {
        DataProvider::Context(ContextProvider::new(key))
    }

    /// The conventional static-overlaid-by-dynamic composition used by
    /// [`crate::unit::ExecutableUnit::build`] when static data is supplied.
    pub fn composite(children: Vec<DataProvider>) -> Self {
        DataProvider::Composite(CompositeProvider::new(children))
    }
}

#[async_trait]
impl DataProviderExt for DataProvider {
    async fn get(&self, ctx: &EvalContext) -> Result<Value, ProviderError> {
        match self {
            DataProvider::Static(s) => Ok(Value::Map(s.bundle.clone())),
            DataProvider::Context(c) => {
                Ok(ctx.get(&c.key).unwrap_or_else(|| Value::Map(BTreeMap::new())))
            }
            DataProvider::Composite(comp) => {
                let mut merged = BTreeMap::new();
                for child in &comp.children {
                    let v = child.get(ctx).await?;
                    if let Value::Map(m) = v {
                        merged.extend(m);
                    }
                }
                Ok(Value::Map(merged))
            }
        }
    }

    async fn add(
        &self,
        ctx: EvalContext,
        items: Vec<Value>,
    ) -> (EvalContext, Result<(), ProviderError>) {
        match self {
            DataProvider::Static(_) => (ctx, Err(ProviderError::StaticNotExtendable)),
            DataProvider::Context(c) => {
                let mut bundle = match ctx.get(&c.key) {
                    Some(Value::Map(m)) => m,
                    _ => BTreeMap::new(),
                };
                for item in items {
                    match item {
                        Value::Request(req) => {
                            let flattened = request::flatten(&req);
                            bundle.insert(
                                REQUEST_KEY.to_string(),
                                Value::Map(flattened),
                            );
                        }
                        Value::Map(m) => bundle.extend(m),
                        other => {
                            return (
                                ctx,
                                Err(ProviderError::provider(format!(
                                    "cannot coerce value of type {} into bundle",
                                    other.type_tag()
                                ))),
                            );
                        }
                    }
                }
                let new_ctx = ctx.with_value(c.key.clone(), Value::Map(bundle));
                (new_ctx, Ok(()))
            }
            DataProvider::Composite(comp) => {
                let mut ctx = ctx;
                let mut failures = 0usize;
                for child in &comp.children {
                    let (new_ctx, res) = Box::pin(child.add(ctx.clone(), items.clone())).await;
                    match res {
                        Ok(()) => ctx = new_ctx,
                        Err(_) => failures += 1,
                    }
                }
                if failures == 0 {
                    (ctx, Ok(()))
                } else {
                    (
                        ctx,
                        Err(ProviderError::provider(format!(
                            "{failures} of {} providers failed to add data",
                            comp.children.len()
                        ))),
                    )
                }
            }
        }
    }
}

/// Convenience: wrap `provider` (if any) behind a composite with `static_data`
/// layered beneath it, matching [`crate::unit::ExecutableUnit::build`]'s step 3.
pub fn layer_static(static_data: Option<BTreeMap<String, Value>>, provider: Option<DataProvider>) -> Option<DataProvider> {
    match (static_data, provider) {
        (None, provider) => provider,
        (Some(data), None) => Some(DataProvider::static_data(data)),
        (Some(data), Some(provider)) => Some(DataProvider::composite(vec![
            DataProvider::static_data(data),
            provider,
        ])),
    }
}

/// Shared, reference-counted handle to a provider, stored on
/// [`crate::unit::ExecutableUnit`].
pub type SharedProvider = Arc<DataProvider>;
