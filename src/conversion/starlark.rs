//! Host `Value` <-> starlark-rust `Value` conversion.
//!
//! Conversion to starlark allocates on a caller-supplied `Heap`; conversion
//! back must happen before that heap (or the `FrozenModule` it froze into)
//! is dropped.

use std::collections::BTreeMap;

use starlark::values::dict::DictRef;
use starlark::values::list::ListRef;
use starlark::values::{Heap, Value as StarlarkValue};

use crate::error::EvalError;
use crate::value::Value;

pub fn host_to_starlark<'v>(heap: &'v Heap, value: &Value) -> StarlarkValue<'v> {
    match value {
        Value::Null => StarlarkValue::new_none(),
        Value::Bool(b) => StarlarkValue::new_bool(*b),
        Value::Int(i) => heap.alloc(*i),
        Value::Float(f) => heap.alloc(*f),
        Value::String(s) => heap.alloc_str(s).to_value(),
        Value::List(items) | Value::Tuple(items) => {
            let values: Vec<StarlarkValue<'v>> =
                items.iter().map(|v| host_to_starlark(heap, v)).collect();
            heap.alloc(values)
        }
        Value::Map(m) => {
            let pairs: Vec<(StarlarkValue<'v>, StarlarkValue<'v>)> = m
                .iter()
                .map(|(k, v)| (heap.alloc_str(k).to_value(), host_to_starlark(heap, v)))
                .collect();
            heap.alloc(starlark::collections::SmallMap::from_iter(pairs))
        }
        Value::StringListMap(m) => {
            let pairs: Vec<(StarlarkValue<'v>, StarlarkValue<'v>)> = m
                .iter()
                .map(|(k, v)| {
                    let list: Vec<StarlarkValue<'v>> =
                        v.iter().map(|s| heap.alloc_str(s).to_value()).collect();
                    (heap.alloc_str(k).to_value(), heap.alloc(list))
                })
                .collect();
            heap.alloc(starlark::collections::SmallMap::from_iter(pairs))
        }
        Value::Set(s) => {
            let values: Vec<StarlarkValue<'v>> =
                s.iter().map(|v| heap.alloc_str(v).to_value()).collect();
            heap.alloc(values)
        }
        Value::Request(req) => {
            host_to_starlark(heap, &Value::Map(crate::provider::request::flatten(req)))
        }
        Value::Function(name) => heap.alloc_str(name).to_value(),
        Value::Error(msg) => heap.alloc_str(msg).to_value(),
    }
}

pub fn starlark_to_host(value: StarlarkValue) -> Result<Value, EvalError> {
    if value.is_none() {
        return Ok(Value::Null);
    }
    if let Some(b) = value.unpack_bool() {
        return Ok(Value::Bool(b));
    }
    if let Some(i) = value.unpack_i32() {
        return Ok(Value::Int(i as i64));
    }
    if let Some(s) = value.unpack_str() {
        return Ok(Value::String(s.to_string()));
    }
    if let Some(list) = ListRef::from_value(value) {
        let items = list
            .iter()
            .map(starlark_to_host)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::List(items));
    }
    if let Some(dict) = DictRef::from_value(value) {
        let mut out = BTreeMap::new();
        for (k, v) in dict.iter() {
            let key = k
                .unpack_str()
                .ok_or_else(|| EvalError::ConversionFailed("non-string dict key".into()))?;
            out.insert(key.to_string(), starlark_to_host(v)?);
        }
        return Ok(Value::Map(out));
    }

    Err(EvalError::ConversionFailed(format!(
        "unsupported starlark value of type {}",
        value.get_type()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_primitives() {
        let heap = Heap::new();
        for v in [Value::Null, Value::Bool(true), Value::Int(3)] {
            let sv = host_to_starlark(&heap, &v);
            assert_eq!(starlark_to_host(sv).unwrap(), v);
        }
    }

    #[test]
    fn round_trips_string() {
        let heap = Heap::new();
        let v = Value::String("hello".into());
        let sv = host_to_starlark(&heap, &v);
        assert_eq!(starlark_to_host(sv).unwrap(), v);
    }

    #[test]
    fn round_trips_map() {
        let heap = Heap::new();
        let mut m = BTreeMap::new();
        m.insert("greeting".to_string(), Value::String("hi".into()));
        let v = Value::Map(m);
        let sv = host_to_starlark(&heap, &v);
        assert_eq!(starlark_to_host(sv).unwrap(), v);
    }
}
