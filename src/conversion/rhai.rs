//! Host `Value` <-> `rhai::Dynamic` conversion.

use std::collections::BTreeMap;

use rhai::{Array, Dynamic, Map};

use crate::error::EvalError;
use crate::value::Value;

pub fn host_to_rhai(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(*b),
        Value::Int(i) => Dynamic::from(*i),
        Value::Float(f) => Dynamic::from(*f),
        Value::String(s) => Dynamic::from(s.clone()),
        Value::List(items) | Value::Tuple(items) => {
            let arr: Array = items.iter().map(host_to_rhai).collect();
            Dynamic::from(arr)
        }
        Value::Map(m) => {
            let mut map = Map::new();
            for (k, v) in m {
                map.insert(k.as_str().into(), host_to_rhai(v));
            }
            Dynamic::from(map)
        }
        Value::StringListMap(m) => {
            let mut map = Map::new();
            for (k, v) in m {
                let arr: Array = v.iter().map(|s| Dynamic::from(s.clone())).collect();
                map.insert(k.as_str().into(), Dynamic::from(arr));
            }
            Dynamic::from(map)
        }
        Value::Set(s) => {
            let arr: Array = s.iter().map(|v| Dynamic::from(v.clone())).collect();
            Dynamic::from(arr)
        }
        Value::Request(req) => {
            let flattened = crate::provider::request::flatten(req);
            host_to_rhai(&Value::Map(flattened))
        }
        Value::Function(name) => Dynamic::from(name.clone()),
        Value::Error(msg) => Dynamic::from(msg.clone()),
    }
}

pub fn rhai_to_host(dynamic: Dynamic) -> Result<Value, EvalError> {
    if dynamic.is_unit() {
        return Ok(Value::Null);
    }
    if let Some(b) = dynamic.clone().try_cast::<bool>() {
        return Ok(Value::Bool(b));
    }
    if let Some(i) = dynamic.clone().try_cast::<i64>() {
        return Ok(Value::Int(i));
    }
    if let Some(f) = dynamic.clone().try_cast::<f64>() {
        return Ok(Value::Float(f));
    }
    if dynamic.is_string() {
        return Ok(Value::String(dynamic.into_string().unwrap_or_default()));
    }
    if dynamic.is_array() {
        let arr = dynamic.cast::<Array>();
        let items = arr
            .into_iter()
            .map(rhai_to_host)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::List(items));
    }
    if dynamic.is_map() {
        let map = dynamic.cast::<Map>();
        let mut out = BTreeMap::new();
        for (k, v) in map {
            out.insert(k.to_string(), rhai_to_host(v)?);
        }
        return Ok(Value::Map(out));
    }
    if dynamic.is::<rhai::FnPtr>() {
        let fp = dynamic.cast::<rhai::FnPtr>();
        return Err(EvalError::ConversionFailed(format!(
            "uncalled function `{}` cannot convert to a host value",
            fp.fn_name()
        )));
    }

    Err(EvalError::ConversionFailed(format!(
        "unsupported rhai value of type {}",
        dynamic.type_name()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_primitives() {
        for v in [Value::Null, Value::Bool(true), Value::Int(7), Value::Float(1.5)] {
            let d = host_to_rhai(&v);
            assert_eq!(rhai_to_host(d).unwrap(), v);
        }
    }

    #[test]
    fn round_trips_string() {
        let v = Value::String("hi".into());
        assert_eq!(rhai_to_host(host_to_rhai(&v)).unwrap(), v);
    }

    #[test]
    fn round_trips_map() {
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), Value::Int(1));
        let v = Value::Map(m);
        assert_eq!(rhai_to_host(host_to_rhai(&v)).unwrap(), v);
    }

    #[test]
    fn uncalled_function_fails_conversion() {
        let fp = Dynamic::from(rhai::FnPtr::new("greet").unwrap());
        assert!(matches!(
            rhai_to_host(fp),
            Err(EvalError::ConversionFailed(_))
        ));
    }
}
