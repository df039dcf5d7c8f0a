//! Evaluation result: the typed, timed, attributable outcome of one `eval`
//! call (spec §4.5/§6).

use std::time::Duration;

use crate::value::{TypeTag, Value};

/// Outcome of a single `eval` call. `exec_duration` is measured wall-clock
/// from just before the engine runs to just after; `exe_id` is the
/// producing unit's id, so results can be traced back without holding the
/// unit itself.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    pub value: Value,
    pub type_tag: TypeTag,
    pub exec_duration: Duration,
    pub exe_id: String,
}

impl EvalResult {
    pub fn new(value: Value, exec_duration: Duration, exe_id: impl Into<String>) -> Self {
        let type_tag = value.type_tag();
        Self {
            value,
            type_tag,
            exec_duration,
            exe_id: exe_id.into(),
        }
    }

    /// Language-neutral textual rendering of the value alone.
    pub fn inspect(&self) -> String {
        self.value.inspect()
    }
}

impl std::fmt::Display for EvalResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {}, exe={})",
            self.inspect(),
            self.type_tag,
            format_duration(self.exec_duration),
            self.exe_id
        )
    }
}

/// Renders e.g. `Duration::from_micros(17_300)` as `"17.3ms"`, matching
/// spec §6's example format.
fn format_duration(d: Duration) -> String {
    let micros = d.as_micros();
    if micros < 1_000 {
        format!("{}\u{b5}s", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1_000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
