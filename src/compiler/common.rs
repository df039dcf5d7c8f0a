//! Shared compilation algorithm steps (spec §4.3, steps 1–3) run identically
//! by every engine's compiler ahead of its own parse step, so the two
//! "reject" boundary behaviours are uniform across engines rather than each
//! adapter re-deriving its own notion of empty/comment-only input (spec §9:
//! unify on reject for all engines). Empty and whitespace-only input are both
//! `no-instructions` (spec §4.3 step 2) — `content-nil` is a distinct error
//! kind, never raised by this check.

use std::io::Read;

use crate::error::CompileError;

/// Read the stream to completion. Closing failure and read failure both
/// surface as `exec-creation-failed` — the teacher's pattern of wrapping
/// the underlying I/O cause rather than discarding it.
pub fn read_all(mut stream: Box<dyn Read + Send>) -> Result<Vec<u8>, CompileError> {
    let mut buf = Vec::new();
    stream
        .read_to_end(&mut buf)
        .map_err(|e| CompileError::exec_creation_failed("failed to read source stream", anyhow::anyhow!(e)))?;
    Ok(buf)
}

/// Validate non-empty, non-whitespace-only, non-comment-only content and
/// return it decoded as UTF-8 text.
pub fn validate_non_empty(bytes: &[u8]) -> Result<String, CompileError> {
    if bytes.is_empty() {
        return Err(CompileError::NoInstructions);
    }

    let text = String::from_utf8_lossy(bytes).into_owned();

    if text.trim().is_empty() {
        return Err(CompileError::NoInstructions);
    }

    let only_comments = text
        .lines()
        .all(|line| {
            let trimmed = line.trim();
            trimmed.is_empty() || trimmed.starts_with('#')
        });
    if only_comments {
        return Err(CompileError::NoInstructions);
    }

    Ok(text)
}
