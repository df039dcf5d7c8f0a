//! Host Value <-> engine-native value conversion (spec §4.6).
//!
//! One submodule per engine; each direction is a free function so the
//! evaluators stay thin dispatchers over these. Every function rejects
//! values it cannot faithfully round-trip with `EvalError::ConversionFailed`
//! naming the offending type, rather than lossily coercing.

pub mod json;
pub mod rhai;
pub mod starlark;
