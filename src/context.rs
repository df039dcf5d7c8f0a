//! Evaluation Context: the per-call ambient carrier (cancellation + value bag).
//!
//! Mirrors the teacher's `WasmState`/`RequestContext` split — a small,
//! cheaply-cloneable struct passed by value through `prepare`/`eval` — but
//! generalized away from HTTP and wrapped around `tokio_util`'s
//! `CancellationToken` instead of the teacher's goroutine-watches-a-context
//! style, per the Design Note in spec §9: install the token directly on the
//! VM rather than spawning a watcher task.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::value::Value;

/// Context key under which the merged per-call data bundle is stored.
pub const EVAL_DATA_KEY: &str = "eval_data";
/// Sub-key under `eval_data` holding a flattened HTTP-request value.
pub const REQUEST_KEY: &str = "request";
/// Sub-key under `eval_data` holding compile-time static data.
pub const SCRIPT_DATA_KEY: &str = "script_data";

/// Per-call ambient carrier. Cloning an `EvalContext` is cheap (it shares the
/// same cancellation token and value bag); `with_items` returns a new
/// context with its own bag, leaving the original untouched, so providers
/// stay safe to share across threads (spec §5).
#[derive(Clone)]
pub struct EvalContext {
    cancel: CancellationToken,
    bag: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            bag: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// A child context whose cancellation follows the parent's.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            bag: Arc::new(RwLock::new(self.bag.read().clone())),
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.bag.read().get(key).cloned()
    }

    /// Return a *new* context with `key` set to `value`; the receiver is
    /// never mutated. This is the primitive [`crate::provider::ContextProvider::add`]
    /// builds on.
    pub fn with_value(&self, key: impl Into<String>, value: Value) -> Self {
        let mut bag = self.bag.read().clone();
        bag.insert(key.into(), value);
        Self {
            cancel: self.cancel.clone(),
            bag: Arc::new(RwLock::new(bag)),
        }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_value_does_not_mutate_original() {
        let ctx = EvalContext::new();
        let ctx2 = ctx.with_value("k", Value::Int(1));
        assert!(ctx.get("k").is_none());
        assert_eq!(ctx2.get("k"), Some(Value::Int(1)));
    }

    #[test]
    fn cancel_before_eval_observed() {
        let ctx = EvalContext::new();
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn child_inherits_cancellation() {
        let ctx = EvalContext::new();
        let child = ctx.child();
        ctx.cancel();
        assert!(child.is_cancelled());
    }
}
