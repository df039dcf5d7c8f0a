//! Preconditions verified at the entry of every `eval` call (spec §4.5),
//! each reported as its own distinct fatal error rather than collapsed into
//! one generic "bad input" variant.

use crate::error::EvalError;
use crate::unit::{Bytecode, EngineType, ExecutableUnit};

pub fn check_preconditions<'u>(
    unit: &'u ExecutableUnit,
    expected: EngineType,
) -> Result<&'u Bytecode, EvalError> {
    if unit.id().is_empty() {
        return Err(EvalError::IdEmpty);
    }
    if unit.engine_type() != expected {
        return Err(EvalError::EngineMismatch {
            expected: expected.as_str().to_string(),
            actual: unit.engine_type().as_str().to_string(),
        });
    }
    Ok(unit.bytecode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompilerOptions, ExprCompiler};
    use crate::source::Loader;

    #[tokio::test]
    async fn rejects_engine_mismatch() {
        let compiler = ExprCompiler::new(CompilerOptions::new());
        let loader = Loader::from_string("1 + 1").unwrap();
        let unit = ExecutableUnit::build(None, loader, &compiler, None, None)
            .await
            .unwrap();

        let err = check_preconditions(&unit, EngineType::Starlark).unwrap_err();
        assert!(matches!(err, EvalError::EngineMismatch { .. }));
    }
}
